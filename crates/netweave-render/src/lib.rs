//! # netweave-render
//!
//! Renders a declarative virtual network topology into host resources
//! and tracks every created resource for precise teardown.
//!
//! A [`TopologyConfig`] describes subnets, inter-subnet links, and peers
//! attached to subnets. [`Renderer::render`] validates the description,
//! derives collision-free resource names from live host inventory,
//! allocates sequential addresses under mask-override precedence, and
//! drives the capability surface in dependency order. The resulting
//! [`RenderedTopology`] is the sole source of truth for reversing the
//! build via [`Renderer::teardown`] — including after a mid-build
//! failure, where the accumulated ledger is returned with the error.

pub mod addr;
pub mod config;
pub mod engine;
pub mod names;
pub mod rendered;
pub mod shaping;
pub mod validate;

pub use config::{PeerSpec, SubnetSpec, TopologyConfig};
pub use engine::{RenderError, Renderer};
pub use rendered::RenderedTopology;
pub use shaping::{LinkSpec, parse_link_rate, parse_percentage};

//! # netweave-core
//!
//! The host capability surface for the netweave render engine.
//!
//! This crate provides:
//! - **[`capability::HostCapability`]**: the synchronous trait through
//!   which the engine creates and destroys namespaces, virtual switches,
//!   and cable pairs, applies link shaping, and scans live inventory.
//! - **[`host::LinuxHost`]**: the Linux implementation, shelling out to
//!   `ip`, `ovs-vsctl`, and `tc`.
//! - **[`testing::MockHost`]**: an in-memory test double that records
//!   every call.

pub mod capability;
pub mod host;
pub mod testing;

pub use capability::{DeviceState, HostCapability};
pub use host::LinuxHost;

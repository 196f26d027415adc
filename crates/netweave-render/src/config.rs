//! Declarative topology description supplied by the caller.
//!
//! A config is read-only in meaning during rendering: the engine never
//! mutates the description, though link specs cache their parsed
//! shaping descriptor internally on first use.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use netweave_common::types::ResourceKind;

use crate::shaping::LinkSpec;

/// A named logical network with an address range and links to other
/// subnets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubnetSpec {
    /// Name of the subnet, used only in configuration, never rendered.
    pub name: String,
    /// CIDR address range, e.g. `"10.1.1.0/24"`.
    pub ip_range: String,
    /// Subnets this one is linked to, each with an optional shaping
    /// spec. A present key with `None` means linked but unshaped.
    #[serde(default)]
    pub links: BTreeMap<String, Option<LinkSpec>>,
    /// Default dotted address mask applied to peers attached to this
    /// subnet when they carry no override of their own.
    #[serde(default)]
    pub bind_mask: Option<String>,
}

/// A named logical endpoint rendered as an isolated network stack.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeerSpec {
    /// Name of the peer.
    pub name: String,
    /// Subnets this peer is attached to, each with an optional shaping
    /// spec. A present key with `None` means linked but unshaped.
    #[serde(default)]
    pub links: BTreeMap<String, Option<LinkSpec>>,
    /// Default dotted address mask for addresses assigned to this peer;
    /// takes precedence over the subnet's own default.
    #[serde(default)]
    pub bind_mask: Option<String>,
}

/// The complete topology description rendered in one pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopologyConfig {
    /// Subnet descriptions, rendered in order.
    pub subnets: Vec<SubnetSpec>,
    /// Peer descriptions, rendered in order.
    pub peers: Vec<PeerSpec>,
    /// Naming-prefix overrides per resource kind; kinds not named here
    /// keep their built-in prefix.
    #[serde(default)]
    pub prefixes: BTreeMap<ResourceKind, String>,
}

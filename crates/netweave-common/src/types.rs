//! Domain primitive types used across the netweave workspace.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{NetweaveError, Result};

/// The closed set of host resource kinds that receive allocated names.
///
/// Each kind owns an independent naming-counter space, determined by a
/// live inventory scan at allocation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// A virtual switch backing one subnet.
    Bridge,
    /// A cable endpoint destined for a peer's namespace.
    Interface,
    /// A patch port connecting two switches.
    Patch,
    /// A cable endpoint attached to a switch.
    Port,
    /// An isolated network stack for a peer.
    Namespace,
}

impl ResourceKind {
    /// Returns the naming prefix used when no override is configured.
    #[must_use]
    pub const fn default_prefix(self) -> &'static str {
        match self {
            Self::Bridge => "br",
            Self::Interface => "veth",
            Self::Patch => "patch",
            Self::Port => "tap",
            Self::Namespace => "ns",
        }
    }

    /// All resource kinds, in prefix-table order.
    pub const ALL: [Self; 5] = [
        Self::Bridge,
        Self::Interface,
        Self::Patch,
        Self::Port,
        Self::Namespace,
    ];
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bridge => write!(f, "bridge"),
            Self::Interface => write!(f, "interface"),
            Self::Patch => write!(f, "patch"),
            Self::Port => write!(f, "port"),
            Self::Namespace => write!(f, "namespace"),
        }
    }
}

/// Mapping from resource kind to naming prefix.
///
/// Built once per render pass from the defaults plus any user overrides,
/// and validated at that point rather than probed per allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixTable {
    prefixes: BTreeMap<ResourceKind, String>,
}

impl PrefixTable {
    /// Builds a prefix table from the defaults plus the given overrides.
    ///
    /// # Errors
    ///
    /// Returns a validation error if an override prefix is empty.
    pub fn with_overrides(overrides: &BTreeMap<ResourceKind, String>) -> Result<Self> {
        let mut table = Self::default();
        for (kind, prefix) in overrides {
            if prefix.is_empty() {
                return Err(NetweaveError::Validation {
                    message: format!("empty naming prefix for resource kind \"{kind}\""),
                });
            }
            let _ = table.prefixes.insert(*kind, prefix.clone());
        }
        Ok(table)
    }

    /// Returns the prefix for the given resource kind.
    #[must_use]
    pub fn prefix(&self, kind: ResourceKind) -> &str {
        self.prefixes
            .get(&kind)
            .map_or_else(|| kind.default_prefix(), String::as_str)
    }
}

impl Default for PrefixTable {
    fn default() -> Self {
        Self {
            prefixes: ResourceKind::ALL
                .iter()
                .map(|k| (*k, k.default_prefix().to_string()))
                .collect(),
        }
    }
}

/// Normalized link-shaping parameters in machine units.
///
/// Produced exactly once per link spec by the link-spec parser and then
/// reused for every application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapingProfile {
    /// One-way latency in whole milliseconds.
    pub latency_ms: u64,
    /// Latency variation in whole milliseconds.
    pub jitter_ms: u64,
    /// Available bandwidth in bits per second.
    pub bandwidth_bps: u64,
    /// Packet loss percentage. Values outside `[0, 100]` are accepted
    /// as-is; no clamping is performed.
    pub loss_percent: u64,
}

impl ShapingProfile {
    /// True when no shaping parameter is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.latency_ms == 0
            && self.jitter_ms == 0
            && self.bandwidth_bps == 0
            && self.loss_percent == 0
    }
}

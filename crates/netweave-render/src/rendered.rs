//! The teardown ledger: every resource actually created on the host.
//!
//! The ledger grows only when a capability call reports success and
//! shrinks only when a resource is confirmed destroyed. It is the sole
//! source of truth for reversing a build, including a partial one.
//! Serializing it preserves the three public collections exactly, so a
//! later out-of-process teardown sees the same record; the internal
//! lookup tables exist only for the duration of a render pass.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use netweave_common::error::{NetweaveError, Result};
use netweave_common::types::PrefixTable;

/// Record of the host resources created by one render pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderedTopology {
    /// Names of created virtual switches.
    pub bridges: BTreeSet<String>,
    /// Mapping from peer name to the namespace created for it.
    pub namespaces: BTreeMap<String, String>,
    /// Names of created cable endpoints.
    pub interfaces: BTreeSet<String>,

    /// Subnet name to switch name, valid for the active pass only.
    #[serde(skip)]
    pub(crate) subnets: BTreeMap<String, String>,
    /// Prefix table the pass was rendered with.
    #[serde(skip)]
    pub(crate) prefixes: PrefixTable,
}

impl RenderedTopology {
    /// True when no created resource remains recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bridges.is_empty() && self.namespaces.is_empty() && self.interfaces.is_empty()
    }

    /// Looks up the switch rendered for a subnet.
    pub(crate) fn bridge_for(&self, subnet: &str) -> Result<&str> {
        self.subnets
            .get(subnet)
            .map(String::as_str)
            .ok_or_else(|| NetweaveError::InternalState {
                message: format!("no switch recorded for subnet \"{subnet}\""),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn serialization_preserves_the_three_collections() {
        let mut rendered = RenderedTopology::default();
        let _ = rendered.bridges.insert("br0".into());
        let _ = rendered.namespaces.insert("c1".into(), "ns0".into());
        let _ = rendered.interfaces.insert("veth0".into());
        let _ = rendered.interfaces.insert("tap0".into());
        let _ = rendered.subnets.insert("home".into(), "br0".into());

        let json = serde_json::to_string(&rendered).unwrap();
        let restored: RenderedTopology = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.bridges, rendered.bridges);
        assert_eq!(restored.namespaces, rendered.namespaces);
        assert_eq!(restored.interfaces, rendered.interfaces);
        assert!(restored.subnets.is_empty());
    }

    #[test]
    fn empty_ledger_reports_empty() {
        assert!(RenderedTopology::default().is_empty());
    }
}

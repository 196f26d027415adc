//! Collision-free resource name allocation.
//!
//! Names are `<prefix><n>` where `n` is one past the highest numeric
//! suffix among taken names sharing the prefix. Freshness is determined
//! by a live inventory scan on every call — there is no cross-call
//! caching — so concurrent allocation against the same host requires
//! external mutual exclusion.

use netweave_common::error::Result;
use netweave_common::types::{PrefixTable, ResourceKind};
use netweave_core::capability::HostCapability;

/// Returns the next free numeric suffix for `prefix` given the taken
/// names. Taken names sharing the prefix with a non-numeric suffix are
/// skipped, not errors.
fn fresh_index(prefix: &str, existing: &[String]) -> u64 {
    let mut found = false;
    let mut max = 0_u64;
    for name in existing {
        if let Some(suffix) = name.strip_prefix(prefix) {
            found = true;
            if let Ok(num) = suffix.parse::<u64>() {
                max = max.max(num);
            }
        }
    }
    if found { max + 1 } else { 0 }
}

/// Generates a name based on `prefix` that collides with nothing in
/// `existing`.
#[must_use]
pub fn fresh_name(prefix: &str, existing: &[String]) -> String {
    format!("{prefix}{}", fresh_index(prefix, existing))
}

/// Allocates names for host resources from live inventory.
///
/// Each resource kind draws from the inventory that its names must not
/// collide with: bridges against all interfaces, cable endpoints
/// against veth-kind interfaces, namespaces against the namespace
/// inventory.
pub struct NameAllocator<'a> {
    host: &'a dyn HostCapability,
    prefixes: PrefixTable,
}

impl<'a> NameAllocator<'a> {
    /// Creates an allocator scanning through `host` with the given
    /// prefix table.
    #[must_use]
    pub fn new(host: &'a dyn HostCapability, prefixes: PrefixTable) -> Self {
        Self { host, prefixes }
    }

    fn scan(&self, kind: ResourceKind) -> Result<Vec<String>> {
        match kind {
            ResourceKind::Bridge => self.host.list_interfaces(),
            ResourceKind::Interface | ResourceKind::Patch | ResourceKind::Port => {
                self.host.list_veth_interfaces()
            }
            ResourceKind::Namespace => self.host.list_namespaces(),
        }
    }

    /// Allocates one fresh name for the given resource kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the inventory scan fails.
    pub fn fresh(&self, kind: ResourceKind) -> Result<String> {
        let names = self.scan(kind)?;
        Ok(fresh_name(self.prefixes.prefix(kind), &names))
    }

    /// Allocates two consecutive fresh names for the given resource
    /// kind from a single scan.
    ///
    /// Needed when both ends of a cable pair share a prefix: the first
    /// name is not visible to a rescan until the pair exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the inventory scan fails.
    pub fn fresh_pair(&self, kind: ResourceKind) -> Result<(String, String)> {
        let names = self.scan(kind)?;
        let prefix = self.prefixes.prefix(kind);
        let n = fresh_index(prefix, &names);
        Ok((format!("{prefix}{n}"), format!("{prefix}{}", n + 1)))
    }
}

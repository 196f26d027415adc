//! Sequential address allocation within a subnet.
//!
//! Each pool hands out host addresses starting at one past the network
//! base, in CIDR notation, under mask-override precedence: a valid
//! caller-supplied mask wins, then the subnet's configured default,
//! then the subnet's own declared prefix. Addresses are never reused
//! within a render pass and there is no bounds check against subnet
//! capacity; allocation past the range wraps through 32-bit address
//! arithmetic, which carries across octets.

use std::net::Ipv4Addr;

use ipnet::Ipv4Net;

use netweave_common::error::{NetweaveError, Result};

/// Parses a dotted mask such as `"255.255.0.0"` into a prefix length.
/// Empty or invalid masks yield `None` so precedence falls through.
fn mask_to_prefix(mask: Option<&str>) -> Option<u8> {
    let mask = mask?.trim();
    if mask.is_empty() {
        return None;
    }
    let addr: Ipv4Addr = mask.parse().ok()?;
    ipnet::ipv4_mask_to_prefix(addr).ok()
}

/// Monotonic per-subnet address allocator.
#[derive(Debug)]
pub struct AddressPool {
    network: Ipv4Net,
    bind_mask: Option<String>,
    offset: u32,
}

impl AddressPool {
    /// Creates a pool over the subnet's CIDR range.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the subnet if the range is not
    /// valid CIDR notation.
    pub fn new(subnet: &str, ip_range: &str, bind_mask: Option<String>) -> Result<Self> {
        let network: Ipv4Net = ip_range.parse().map_err(|_| NetweaveError::Validation {
            message: format!("subnet \"{subnet}\" has invalid address range \"{ip_range}\""),
        })?;
        Ok(Self {
            network,
            bind_mask,
            offset: 0,
        })
    }

    /// Returns the next host address in CIDR notation.
    ///
    /// `override_mask` takes precedence over the subnet's default mask;
    /// both fall through when empty or invalid.
    pub fn next_address(&mut self, override_mask: Option<&str>) -> String {
        self.offset = self.offset.wrapping_add(1);
        let base = u32::from(self.network.network());
        let ip = Ipv4Addr::from(base.wrapping_add(self.offset));
        let prefix = mask_to_prefix(override_mask)
            .or_else(|| mask_to_prefix(self.bind_mask.as_deref()))
            .unwrap_or_else(|| self.network.prefix_len());
        format!("{ip}/{prefix}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn allocation_is_sequential_from_base_plus_one() {
        let mut pool = AddressPool::new("home", "10.1.1.0/24", None).unwrap();
        assert_eq!(pool.next_address(None), "10.1.1.1/24");
        assert_eq!(pool.next_address(None), "10.1.1.2/24");
    }

    #[test]
    fn override_mask_wins_over_declared_prefix() {
        let mut pool = AddressPool::new("home", "10.1.1.0/24", None).unwrap();
        assert_eq!(pool.next_address(Some("255.255.0.0")), "10.1.1.1/16");
    }

    #[test]
    fn subnet_default_mask_applies_without_override() {
        let mut pool =
            AddressPool::new("home", "10.1.1.0/24", Some("255.0.0.0".to_string())).unwrap();
        assert_eq!(pool.next_address(None), "10.1.1.1/8");
        assert_eq!(pool.next_address(Some("255.255.0.0")), "10.1.1.2/16");
    }

    #[test]
    fn invalid_masks_fall_through_the_precedence_chain() {
        let mut pool =
            AddressPool::new("home", "10.1.1.0/24", Some("not-a-mask".to_string())).unwrap();
        assert_eq!(pool.next_address(Some("")), "10.1.1.1/24");
    }

    #[test]
    fn carries_propagate_across_octets() {
        let mut pool = AddressPool::new("wide", "10.1.1.0/16", None).unwrap();
        let mut last = String::new();
        for _ in 0..256 {
            last = pool.next_address(None);
        }
        // 10.1.0.0 + 256 = 10.1.1.0
        assert_eq!(last, "10.1.1.0/16");
    }

    #[test]
    fn range_must_be_valid_cidr() {
        let err = AddressPool::new("bad", "10.1.1.0", None).unwrap_err();
        assert!(err.to_string().contains("bad"), "got: {err}");
    }
}

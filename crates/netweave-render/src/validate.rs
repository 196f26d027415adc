//! Referential and uniqueness validation of a topology description.
//!
//! Runs before any host side effect; a failure here means nothing was
//! created. Fails fast on the first violation found and never mutates
//! the config.

use std::collections::HashSet;

use netweave_common::error::{NetweaveError, Result};

use crate::config::TopologyConfig;

/// Validates a topology description for semantic correctness.
///
/// # Checks performed
///
/// 1. No duplicate subnet names.
/// 2. No duplicate peer names.
/// 3. Every subnet link targets a defined subnet.
/// 4. Every peer link targets a defined subnet.
///
/// # Errors
///
/// Returns a validation error naming the offending entity.
pub fn validate(config: &TopologyConfig) -> Result<()> {
    tracing::debug!(
        subnets = config.subnets.len(),
        peers = config.peers.len(),
        "validating topology"
    );
    check_duplicate_subnets(config)?;
    check_duplicate_peers(config)?;
    check_subnet_links(config)?;
    check_peer_links(config)?;
    Ok(())
}

fn check_duplicate_subnets(config: &TopologyConfig) -> Result<()> {
    let mut seen = HashSet::new();
    for subnet in &config.subnets {
        if !seen.insert(&subnet.name) {
            return Err(NetweaveError::Validation {
                message: format!("duplicate subnet name: \"{}\"", subnet.name),
            });
        }
    }
    Ok(())
}

fn check_duplicate_peers(config: &TopologyConfig) -> Result<()> {
    let mut seen = HashSet::new();
    for peer in &config.peers {
        if !seen.insert(&peer.name) {
            return Err(NetweaveError::Validation {
                message: format!("duplicate peer name: \"{}\"", peer.name),
            });
        }
    }
    Ok(())
}

fn check_subnet_links(config: &TopologyConfig) -> Result<()> {
    let names: HashSet<&str> = config.subnets.iter().map(|s| s.name.as_str()).collect();
    for subnet in &config.subnets {
        for target in subnet.links.keys() {
            if !names.contains(target.as_str()) {
                return Err(NetweaveError::Validation {
                    message: format!(
                        "subnet \"{}\" links to nonexistent subnet \"{target}\"",
                        subnet.name
                    ),
                });
            }
        }
    }
    Ok(())
}

fn check_peer_links(config: &TopologyConfig) -> Result<()> {
    let names: HashSet<&str> = config.subnets.iter().map(|s| s.name.as_str()).collect();
    for peer in &config.peers {
        for target in peer.links.keys() {
            if !names.contains(target.as_str()) {
                return Err(NetweaveError::Validation {
                    message: format!(
                        "peer \"{}\" links to nonexistent subnet \"{target}\"",
                        peer.name
                    ),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PeerSpec, SubnetSpec};

    fn subnet(name: &str) -> SubnetSpec {
        SubnetSpec {
            name: name.into(),
            ip_range: "10.0.0.0/24".into(),
            ..SubnetSpec::default()
        }
    }

    fn peer_linked_to(name: &str, target: &str) -> PeerSpec {
        PeerSpec {
            name: name.into(),
            links: [(target.to_string(), None)].into(),
            ..PeerSpec::default()
        }
    }

    #[test]
    fn empty_config_is_valid() {
        assert!(validate(&TopologyConfig::default()).is_ok());
    }

    #[test]
    fn valid_config_passes() {
        let config = TopologyConfig {
            subnets: vec![subnet("home"), subnet("office")],
            peers: vec![peer_linked_to("c1", "home")],
            ..TopologyConfig::default()
        };
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn duplicate_subnet_names_fail() {
        let config = TopologyConfig {
            subnets: vec![subnet("home"), subnet("home")],
            ..TopologyConfig::default()
        };
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("duplicate subnet"), "got: {err}");
    }

    #[test]
    fn duplicate_peer_names_fail() {
        let config = TopologyConfig {
            subnets: vec![subnet("home")],
            peers: vec![peer_linked_to("c1", "home"), peer_linked_to("c1", "home")],
            ..TopologyConfig::default()
        };
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("duplicate peer"), "got: {err}");
    }

    #[test]
    fn peer_link_to_missing_subnet_names_the_target() {
        let config = TopologyConfig {
            subnets: vec![subnet("home")],
            peers: vec![peer_linked_to("c1", "X")],
            ..TopologyConfig::default()
        };
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("\"X\""), "got: {err}");
    }

    #[test]
    fn subnet_link_to_missing_subnet_fails() {
        let mut home = subnet("home");
        let _ = home.links.insert("ghost".into(), None);
        let config = TopologyConfig {
            subnets: vec![home],
            ..TopologyConfig::default()
        };
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("ghost"), "got: {err}");
    }
}

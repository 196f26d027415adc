//! The render engine: drives capability calls in dependency order.
//!
//! A render pass is single-threaded, synchronous, and strictly ordered;
//! each step blocks on its capability call before the next is
//! attempted. Side effects are recorded into the ledger strictly after
//! the corresponding call reports success. On the first failure the
//! pass stops and returns the ledger accumulated so far together with
//! the error — there is no automatic rollback, the caller decides when
//! to feed the ledger to [`Renderer::teardown`].

use std::collections::BTreeMap;

use thiserror::Error;

use netweave_common::error::{NetweaveError, Result};
use netweave_common::types::{PrefixTable, ResourceKind};
use netweave_core::capability::{DeviceState, HostCapability};

use crate::addr::AddressPool;
use crate::config::TopologyConfig;
use crate::names::NameAllocator;
use crate::rendered::RenderedTopology;
use crate::shaping::LinkSpec;
use crate::validate;

/// A failed render pass: the cause plus the ledger of everything that
/// was created before the failure, ready to hand to teardown.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct RenderError {
    /// Resources created before the failure.
    pub rendered: RenderedTopology,
    /// The failure that stopped the pass.
    #[source]
    pub source: NetweaveError,
}

/// Renders topology descriptions against a host capability surface and
/// tears rendered topologies back down.
pub struct Renderer<'a> {
    host: &'a dyn HostCapability,
}

impl<'a> Renderer<'a> {
    /// Creates a renderer driving the given capability surface.
    #[must_use]
    pub fn new(host: &'a dyn HostCapability) -> Self {
        Self { host }
    }

    /// Renders a topology description into host resources.
    ///
    /// Validation and shaping-string parsing run before any side
    /// effect, so invalid input never creates anything.
    ///
    /// # Errors
    ///
    /// Returns the error together with the ledger accumulated so far;
    /// an error before the first capability call carries an empty
    /// ledger.
    pub fn render(
        &self,
        config: &TopologyConfig,
    ) -> std::result::Result<RenderedTopology, RenderError> {
        let mut rendered = RenderedTopology::default();
        match self.build(config, &mut rendered) {
            Ok(()) => Ok(rendered),
            Err(source) => Err(RenderError { rendered, source }),
        }
    }

    fn build(&self, config: &TopologyConfig, rendered: &mut RenderedTopology) -> Result<()> {
        validate::validate(config)?;
        rendered.prefixes = PrefixTable::with_overrides(&config.prefixes)?;

        parse_link_specs(config)?;
        let mut pools = build_pools(config)?;
        // The ledger's table is the one allocation draws from for the
        // whole pass.
        let alloc = NameAllocator::new(self.host, rendered.prefixes.clone());

        self.create_bridges(config, rendered, &alloc)?;
        self.patch_subnet_links(config, rendered, &alloc)?;
        self.create_namespaces(config, rendered, &alloc)?;
        self.wire_peer_links(config, rendered, &alloc, &mut pools)
    }

    fn create_bridges(
        &self,
        config: &TopologyConfig,
        rendered: &mut RenderedTopology,
        alloc: &NameAllocator<'_>,
    ) -> Result<()> {
        for subnet in &config.subnets {
            let bridge = alloc.fresh(ResourceKind::Bridge)?;
            self.host.create_bridge(&bridge)?;
            let _ = rendered.bridges.insert(bridge.clone());
            let _ = rendered.subnets.insert(subnet.name.clone(), bridge.clone());
            tracing::info!(subnet = %subnet.name, bridge = %bridge, "created bridge");
        }
        Ok(())
    }

    fn patch_subnet_links(
        &self,
        config: &TopologyConfig,
        rendered: &mut RenderedTopology,
        alloc: &NameAllocator<'_>,
    ) -> Result<()> {
        for subnet in &config.subnets {
            let bridge = rendered.bridge_for(&subnet.name)?.to_string();
            for (target, spec) in &subnet.links {
                let target_bridge = rendered.bridge_for(target)?.to_string();
                self.patch_bridges(rendered, alloc, &bridge, &target_bridge, spec.as_ref())?;
                tracing::info!(from = %subnet.name, to = %target, "patched subnets");
            }
        }
        Ok(())
    }

    /// Connects two switches with a cable pair whose ends are patch
    /// ports peered to each other. Shaping, if any, lands on the first
    /// endpoint.
    fn patch_bridges(
        &self,
        rendered: &mut RenderedTopology,
        alloc: &NameAllocator<'_>,
        a: &str,
        b: &str,
        spec: Option<&LinkSpec>,
    ) -> Result<()> {
        let (ab, ba) = alloc.fresh_pair(ResourceKind::Port)?;
        self.host.create_veth_pair(&ab, &ba)?;
        let _ = rendered.interfaces.insert(ab.clone());
        let _ = rendered.interfaces.insert(ba.clone());

        self.host.bridge_add_port(a, &ab)?;
        self.host.port_set_parameter(&ab, "type", "patch")?;
        self.host.port_set_option(&ab, "peer", &ba)?;
        self.host.bridge_add_port(b, &ba)?;
        self.host.port_set_parameter(&ba, "type", "patch")?;
        self.host.port_set_option(&ba, "peer", &ab)?;

        if let Some(spec) = spec {
            spec.apply(self.host, &ab)?;
        }
        Ok(())
    }

    fn create_namespaces(
        &self,
        config: &TopologyConfig,
        rendered: &mut RenderedTopology,
        alloc: &NameAllocator<'_>,
    ) -> Result<()> {
        for peer in &config.peers {
            let ns = alloc.fresh(ResourceKind::Namespace)?;
            self.host.create_namespace(&ns)?;
            let _ = rendered.namespaces.insert(peer.name.clone(), ns.clone());
            tracing::info!(peer = %peer.name, namespace = %ns, "created namespace");
        }
        Ok(())
    }

    fn wire_peer_links(
        &self,
        config: &TopologyConfig,
        rendered: &mut RenderedTopology,
        alloc: &NameAllocator<'_>,
        pools: &mut BTreeMap<String, AddressPool>,
    ) -> Result<()> {
        for peer in &config.peers {
            let ns = rendered
                .namespaces
                .get(&peer.name)
                .cloned()
                .ok_or_else(|| NetweaveError::InternalState {
                    message: format!("no namespace recorded for peer \"{}\"", peer.name),
                })?;

            for (subnet_name, spec) in &peer.links {
                let bridge = rendered.bridge_for(subnet_name)?.to_string();
                let inner = alloc.fresh(ResourceKind::Interface)?;
                let port = alloc.fresh(ResourceKind::Port)?;

                self.host.create_veth_pair(&inner, &port)?;
                let _ = rendered.interfaces.insert(inner.clone());
                let _ = rendered.interfaces.insert(port.clone());

                self.host.bridge_add_port(&bridge, &port)?;
                self.host.move_to_namespace(&inner, &ns)?;
                self.host
                    .netns_exec(&ns, &["ip", "link", "set", "dev", "lo", "up"])?;
                self.host
                    .netns_exec(&ns, &["ip", "link", "set", "dev", inner.as_str(), "up"])?;
                self.host.set_device_state(&port, DeviceState::Up)?;

                let pool =
                    pools
                        .get_mut(subnet_name)
                        .ok_or_else(|| NetweaveError::InternalState {
                            message: format!("no address pool for subnet \"{subnet_name}\""),
                        })?;
                let address = pool.next_address(peer.bind_mask.as_deref());
                self.host.netns_exec(
                    &ns,
                    &["ip", "addr", "add", address.as_str(), "dev", inner.as_str()],
                )?;

                if let Some(spec) = spec {
                    spec.apply(self.host, &port)?;
                }
                tracing::info!(
                    peer = %peer.name,
                    subnet = %subnet_name,
                    address = %address,
                    "attached peer"
                );
            }
        }
        Ok(())
    }

    /// Destroys every resource recorded in the ledger: cable endpoints
    /// first, then namespaces, then switches, since endpoints may
    /// reference the other two.
    ///
    /// Each confirmed destruction removes its entry, so the ledger
    /// passed back after a failure reflects exactly what remains.
    ///
    /// # Errors
    ///
    /// Stops at the first per-resource failure and returns it; calling
    /// again with the shrunk ledger resumes where teardown stopped.
    pub fn teardown(&self, rendered: &mut RenderedTopology) -> Result<()> {
        for iface in rendered.interfaces.clone() {
            self.host.delete_interface(&iface)?;
            let _ = rendered.interfaces.remove(&iface);
            tracing::info!(interface = %iface, "destroyed endpoint");
        }
        for (peer, ns) in rendered.namespaces.clone() {
            self.host.delete_namespace(&ns)?;
            let _ = rendered.namespaces.remove(&peer);
            tracing::info!(peer = %peer, namespace = %ns, "destroyed namespace");
        }
        for bridge in rendered.bridges.clone() {
            self.host.delete_bridge(&bridge)?;
            let _ = rendered.bridges.remove(&bridge);
            tracing::info!(bridge = %bridge, "destroyed bridge");
        }
        rendered.subnets.clear();
        Ok(())
    }
}

/// Parses every link-shaping spec in the config so malformed strings
/// abort the pass before any side effect.
fn parse_link_specs(config: &TopologyConfig) -> Result<()> {
    let subnet_specs = config.subnets.iter().flat_map(|s| s.links.values());
    let peer_specs = config.peers.iter().flat_map(|p| p.links.values());
    for spec in subnet_specs.chain(peer_specs).flatten() {
        let _ = spec.parse()?;
    }
    Ok(())
}

fn build_pools(config: &TopologyConfig) -> Result<BTreeMap<String, AddressPool>> {
    let mut pools = BTreeMap::new();
    for subnet in &config.subnets {
        let pool = AddressPool::new(&subnet.name, &subnet.ip_range, subnet.bind_mask.clone())?;
        let _ = pools.insert(subnet.name.clone(), pool);
    }
    Ok(pools)
}

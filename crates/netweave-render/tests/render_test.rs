//! End-to-end tests for the render/teardown engine.
//!
//! These tests drive the full pipeline against an in-memory mock host:
//! 1. Validation failures before any capability call
//! 2. Single-subnet, single-peer render and full teardown
//! 3. Inter-subnet patch links with shaping
//! 4. Mid-build failure returning the partial ledger
//! 5. Resumable teardown after a destruction failure

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::field_reassign_with_default)]

use std::collections::BTreeMap;

use netweave_common::error::NetweaveError;
use netweave_common::types::ResourceKind;
use netweave_core::testing::MockHost;
use netweave_render::{LinkSpec, PeerSpec, Renderer, SubnetSpec, TopologyConfig};

fn subnet(name: &str, ip_range: &str) -> SubnetSpec {
    SubnetSpec {
        name: name.into(),
        ip_range: ip_range.into(),
        ..SubnetSpec::default()
    }
}

fn peer(name: &str, target: &str) -> PeerSpec {
    PeerSpec {
        name: name.into(),
        links: [(target.to_string(), None)].into(),
        ..PeerSpec::default()
    }
}

// ── Validation ───────────────────────────────────────────────────────

#[test]
fn duplicate_subnet_names_issue_zero_capability_calls() {
    let host = MockHost::new();
    let config = TopologyConfig {
        subnets: vec![subnet("net", "10.0.0.0/24"), subnet("net", "10.0.1.0/24")],
        ..TopologyConfig::default()
    };

    let err = Renderer::new(&host).render(&config).unwrap_err();
    assert!(
        matches!(err.source, NetweaveError::Validation { .. }),
        "got: {err}"
    );
    assert!(err.rendered.is_empty());
    assert!(host.calls().is_empty(), "calls: {:?}", host.calls());
}

#[test]
fn peer_link_to_missing_subnet_names_it_and_creates_nothing() {
    let host = MockHost::new();
    let config = TopologyConfig {
        subnets: vec![subnet("net", "10.0.0.0/24")],
        peers: vec![peer("p", "X")],
        ..TopologyConfig::default()
    };

    let err = Renderer::new(&host).render(&config).unwrap_err();
    assert!(err.to_string().contains("\"X\""), "got: {err}");
    assert!(host.calls().is_empty());
}

#[test]
fn malformed_shaping_string_aborts_before_any_side_effect() {
    let host = MockHost::new();
    let mut p = peer("p", "net");
    let mut bad = LinkSpec::default();
    bad.bandwidth = Some("10xbit".into());
    let _ = p.links.insert("net".into(), Some(bad));
    let config = TopologyConfig {
        subnets: vec![subnet("net", "10.0.0.0/24")],
        peers: vec![p],
        ..TopologyConfig::default()
    };

    let err = Renderer::new(&host).render(&config).unwrap_err();
    assert!(matches!(err.source, NetweaveError::Parse { .. }), "got: {err}");
    assert!(host.calls().is_empty());
}

// ── Render and teardown ──────────────────────────────────────────────

#[test]
fn single_peer_topology_renders_and_tears_down_cleanly() {
    let host = MockHost::new();
    let config = TopologyConfig {
        subnets: vec![subnet("net", "10.0.0.0/24")],
        peers: vec![peer("p", "net")],
        ..TopologyConfig::default()
    };

    let renderer = Renderer::new(&host);
    let mut rendered = renderer.render(&config).expect("render");

    assert_eq!(rendered.bridges.len(), 1);
    assert!(rendered.bridges.contains("br0"));
    assert_eq!(
        rendered.namespaces.get("p").map(String::as_str),
        Some("ns0")
    );
    assert_eq!(rendered.interfaces.len(), 2);
    assert!(rendered.interfaces.contains("veth0"));
    assert!(rendered.interfaces.contains("tap0"));

    // The first address past the base, assigned from inside the namespace.
    let calls = host.calls();
    assert!(
        calls
            .iter()
            .any(|c| c == "netns_exec ns0 ip addr add 10.0.0.1/24 dev veth0"),
        "calls: {calls:?}"
    );

    renderer.teardown(&mut rendered).expect("teardown");
    assert!(rendered.is_empty());
    assert!(host.is_clean());
}

#[test]
fn peer_bind_mask_overrides_the_subnet_prefix() {
    let host = MockHost::new();
    let mut p = peer("p", "net");
    p.bind_mask = Some("255.255.0.0".into());
    let config = TopologyConfig {
        subnets: vec![subnet("net", "10.1.1.0/24")],
        peers: vec![p],
        ..TopologyConfig::default()
    };

    let _rendered = Renderer::new(&host).render(&config).expect("render");
    assert!(
        host.calls()
            .iter()
            .any(|c| c.contains("ip addr add 10.1.1.1/16")),
        "calls: {:?}",
        host.calls()
    );
}

#[test]
fn addresses_are_sequential_across_peers_on_one_subnet() {
    let host = MockHost::new();
    let config = TopologyConfig {
        subnets: vec![subnet("net", "10.0.0.0/24")],
        peers: vec![peer("a", "net"), peer("b", "net")],
        ..TopologyConfig::default()
    };

    let _rendered = Renderer::new(&host).render(&config).expect("render");
    let calls = host.calls();
    assert!(calls.iter().any(|c| c.contains("ip addr add 10.0.0.1/24")));
    assert!(calls.iter().any(|c| c.contains("ip addr add 10.0.0.2/24")));
}

#[test]
fn prefix_overrides_shape_generated_names() {
    let host = MockHost::new();
    let config = TopologyConfig {
        subnets: vec![subnet("net", "10.0.0.0/24")],
        prefixes: BTreeMap::from([(ResourceKind::Bridge, "sw".to_string())]),
        ..TopologyConfig::default()
    };

    let rendered = Renderer::new(&host).render(&config).expect("render");
    assert!(rendered.bridges.contains("sw0"), "got: {:?}", rendered.bridges);
}

#[test]
fn subnet_link_renders_a_peered_patch_pair() {
    let host = MockHost::new();
    let mut office = subnet("office", "10.1.2.0/24");
    let mut slow = LinkSpec::default();
    slow.latency = Some("50ms".into());
    let _ = office.links.insert("home".into(), Some(slow));
    let config = TopologyConfig {
        subnets: vec![subnet("home", "10.1.1.0/24"), office],
        ..TopologyConfig::default()
    };

    let rendered = Renderer::new(&host).render(&config).expect("render");
    assert_eq!(rendered.bridges.len(), 2);
    assert_eq!(rendered.interfaces.len(), 2);

    let calls = host.calls();
    assert!(calls.iter().any(|c| c == "create_veth_pair tap0 tap1"));
    assert!(calls.iter().any(|c| c == "port_set_parameter tap0 type=patch"));
    assert!(calls.iter().any(|c| c == "port_set_parameter tap0 options:peer=tap1"));
    assert!(calls.iter().any(|c| c == "port_set_parameter tap1 type=patch"));
    assert!(calls.iter().any(|c| c == "port_set_parameter tap1 options:peer=tap0"));

    // Shaping lands on the first endpoint of the pair.
    let shaped = host.shaped();
    assert_eq!(shaped.len(), 1);
    assert_eq!(shaped[0].0, "tap0");
    assert_eq!(shaped[0].1.latency_ms, 50);
}

// ── Failure handling ─────────────────────────────────────────────────

#[test]
fn mid_build_failure_returns_the_partial_ledger() {
    let host = MockHost::failing_on("create_namespace");
    let config = TopologyConfig {
        subnets: vec![subnet("net", "10.0.0.0/24")],
        peers: vec![peer("p", "net")],
        ..TopologyConfig::default()
    };

    let renderer = Renderer::new(&host);
    let mut err = renderer.render(&config).unwrap_err();
    assert!(
        matches!(err.source, NetweaveError::Capability { .. }),
        "got: {err}"
    );
    // The bridge was created and recorded; the namespace never was.
    assert!(err.rendered.bridges.contains("br0"));
    assert!(err.rendered.namespaces.is_empty());

    renderer.teardown(&mut err.rendered).expect("teardown");
    assert!(err.rendered.is_empty());
    assert!(host.is_clean());
}

#[test]
fn teardown_stops_at_the_first_failure_with_a_shrunk_ledger() {
    let host = MockHost::failing_on("delete_namespace");
    let config = TopologyConfig {
        subnets: vec![subnet("net", "10.0.0.0/24")],
        peers: vec![peer("p", "net")],
        ..TopologyConfig::default()
    };

    let renderer = Renderer::new(&host);
    let mut rendered = renderer.render(&config).expect("render");

    let err = renderer.teardown(&mut rendered).unwrap_err();
    assert!(matches!(err, NetweaveError::Capability { .. }), "got: {err}");
    // Endpoints were destroyed and unrecorded; the namespace and bridge
    // remain for a retry.
    assert!(rendered.interfaces.is_empty());
    assert_eq!(rendered.namespaces.len(), 1);
    assert_eq!(rendered.bridges.len(), 1);
}

// ── Ledger persistence ───────────────────────────────────────────────

#[test]
fn persisted_ledger_still_drives_teardown() {
    let host = MockHost::new();
    let config = TopologyConfig {
        subnets: vec![subnet("net", "10.0.0.0/24")],
        peers: vec![peer("p", "net")],
        ..TopologyConfig::default()
    };

    let renderer = Renderer::new(&host);
    let rendered = renderer.render(&config).expect("render");

    let json = serde_json::to_string(&rendered).expect("serialize");
    let mut restored: netweave_render::RenderedTopology =
        serde_json::from_str(&json).expect("deserialize");

    renderer.teardown(&mut restored).expect("teardown");
    assert!(restored.is_empty());
    assert!(host.is_clean());
}

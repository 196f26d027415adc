//! In-memory test double for the host capability surface.
//!
//! [`MockHost`] tracks created resources in plain sets and records every
//! capability call in order, so tests can assert both on the resulting
//! host state and on exactly which calls were issued. It is namespace
//! unaware: an endpoint moved into a namespace stays in the global
//! inventory and remains deletable by name.

use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError};

use netweave_common::error::{NetweaveError, Result};
use netweave_common::types::ShapingProfile;

use crate::capability::{DeviceState, HostCapability};

#[derive(Debug, Default)]
struct HostState {
    interfaces: BTreeSet<String>,
    veths: BTreeSet<String>,
    bridges: BTreeSet<String>,
    namespaces: BTreeSet<String>,
    calls: Vec<String>,
    shaped: Vec<(String, ShapingProfile)>,
}

/// Recording fake of [`HostCapability`] for engine tests.
#[derive(Debug, Default)]
pub struct MockHost {
    state: Mutex<HostState>,
    fail_step: Option<String>,
}

impl MockHost {
    /// Creates a mock host with empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock host where every call whose name matches `step`
    /// fails with a capability error.
    #[must_use]
    pub fn failing_on(step: &str) -> Self {
        Self {
            state: Mutex::default(),
            fail_step: Some(step.to_string()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Logs a call, failing it if failure injection matches `step`.
    fn record(&self, step: &str, detail: &str) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(format!("{step} {detail}"));
        if self.fail_step.as_deref() == Some(step) {
            return Err(NetweaveError::Capability {
                step: step.to_string(),
                reason: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    /// Every capability call issued so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Interfaces currently present in the inventory.
    #[must_use]
    pub fn interfaces(&self) -> BTreeSet<String> {
        self.lock().interfaces.clone()
    }

    /// Bridges currently present in the inventory.
    #[must_use]
    pub fn bridges(&self) -> BTreeSet<String> {
        self.lock().bridges.clone()
    }

    /// Namespaces currently present in the inventory.
    #[must_use]
    pub fn namespaces(&self) -> BTreeSet<String> {
        self.lock().namespaces.clone()
    }

    /// Shaping profiles applied so far, in order.
    #[must_use]
    pub fn shaped(&self) -> Vec<(String, ShapingProfile)> {
        self.lock().shaped.clone()
    }

    /// True when no created resource remains on the host.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        let state = self.lock();
        state.interfaces.is_empty() && state.bridges.is_empty() && state.namespaces.is_empty()
    }
}

impl HostCapability for MockHost {
    fn create_namespace(&self, name: &str) -> Result<()> {
        self.record("create_namespace", name)?;
        let _ = self.lock().namespaces.insert(name.to_string());
        Ok(())
    }

    fn delete_namespace(&self, name: &str) -> Result<()> {
        self.record("delete_namespace", name)?;
        let _ = self.lock().namespaces.remove(name);
        Ok(())
    }

    fn create_bridge(&self, name: &str) -> Result<()> {
        self.record("create_bridge", name)?;
        let mut state = self.lock();
        let _ = state.bridges.insert(name.to_string());
        let _ = state.interfaces.insert(name.to_string());
        Ok(())
    }

    fn delete_bridge(&self, name: &str) -> Result<()> {
        self.record("delete_bridge", name)?;
        let mut state = self.lock();
        let _ = state.bridges.remove(name);
        let _ = state.interfaces.remove(name);
        Ok(())
    }

    fn bridge_add_port(&self, bridge: &str, iface: &str) -> Result<()> {
        self.record("bridge_add_port", &format!("{bridge} {iface}"))
    }

    fn port_set_parameter(&self, port: &str, param: &str, value: &str) -> Result<()> {
        self.record("port_set_parameter", &format!("{port} {param}={value}"))
    }

    fn create_veth(&self, name: &str) -> Result<()> {
        self.record("create_veth", name)?;
        let mut state = self.lock();
        let _ = state.veths.insert(name.to_string());
        let _ = state.interfaces.insert(name.to_string());
        Ok(())
    }

    fn create_veth_pair(&self, a: &str, b: &str) -> Result<()> {
        self.record("create_veth_pair", &format!("{a} {b}"))?;
        let mut state = self.lock();
        for name in [a, b] {
            let _ = state.veths.insert(name.to_string());
            let _ = state.interfaces.insert(name.to_string());
        }
        Ok(())
    }

    fn delete_interface(&self, name: &str) -> Result<()> {
        self.record("delete_interface", name)?;
        let mut state = self.lock();
        let _ = state.veths.remove(name);
        let _ = state.interfaces.remove(name);
        Ok(())
    }

    fn move_to_namespace(&self, iface: &str, ns: &str) -> Result<()> {
        self.record("move_to_namespace", &format!("{iface} {ns}"))
    }

    fn set_device_state(&self, dev: &str, state: DeviceState) -> Result<()> {
        self.record("set_device_state", &format!("{dev} {}", state.as_str()))
    }

    fn netns_exec(&self, ns: &str, cmd: &[&str]) -> Result<()> {
        self.record("netns_exec", &format!("{ns} {}", cmd.join(" ")))
    }

    fn apply_shaping(&self, iface: &str, profile: &ShapingProfile) -> Result<()> {
        self.record("apply_shaping", iface)?;
        self.lock().shaped.push((iface.to_string(), *profile));
        Ok(())
    }

    fn list_interfaces(&self) -> Result<Vec<String>> {
        self.record("list_interfaces", "")?;
        Ok(self.lock().interfaces.iter().cloned().collect())
    }

    fn list_veth_interfaces(&self) -> Result<Vec<String>> {
        self.record("list_veth_interfaces", "")?;
        Ok(self.lock().veths.iter().cloned().collect())
    }

    fn list_namespaces(&self) -> Result<Vec<String>> {
        self.record("list_namespaces", "")?;
        Ok(self.lock().namespaces.iter().cloned().collect())
    }
}

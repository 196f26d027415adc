//! Host capability abstraction consumed by the render engine.
//!
//! Every call is synchronous and either runs to completion or fails
//! outright with the host's failure text; no timeouts or cancellation
//! are defined at this layer.

use netweave_common::error::Result;
use netweave_common::types::ShapingProfile;

/// Desired administrative state of a network device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// Device passes traffic.
    Up,
    /// Device is administratively down.
    Down,
}

impl DeviceState {
    /// Returns the `ip link set` keyword for this state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

/// Synchronous surface over the host's network-virtualization primitives.
///
/// Implementors handle the platform-specific details; the render engine
/// drives these calls in dependency order and records each side effect
/// only after the call reports success.
pub trait HostCapability: Send + Sync {
    /// Creates an isolated network namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace cannot be created.
    fn create_namespace(&self, name: &str) -> Result<()>;

    /// Destroys a network namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace cannot be destroyed.
    fn delete_namespace(&self, name: &str) -> Result<()>;

    /// Creates a virtual switch.
    ///
    /// # Errors
    ///
    /// Returns an error if the switch cannot be created.
    fn create_bridge(&self, name: &str) -> Result<()>;

    /// Destroys a virtual switch.
    ///
    /// # Errors
    ///
    /// Returns an error if the switch cannot be destroyed.
    fn delete_bridge(&self, name: &str) -> Result<()>;

    /// Attaches an interface to a switch as a port.
    ///
    /// # Errors
    ///
    /// Returns an error if the port cannot be added.
    fn bridge_add_port(&self, bridge: &str, iface: &str) -> Result<()>;

    /// Sets a parameter on a switch port.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter cannot be set.
    fn port_set_parameter(&self, port: &str, param: &str, value: &str) -> Result<()>;

    /// Sets an option on a switch port.
    ///
    /// # Errors
    ///
    /// Returns an error if the option cannot be set.
    fn port_set_option(&self, port: &str, option: &str, value: &str) -> Result<()> {
        self.port_set_parameter(port, &format!("options:{option}"), value)
    }

    /// Creates a single virtual cable endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint cannot be created.
    fn create_veth(&self, name: &str) -> Result<()>;

    /// Creates a connected pair of virtual cable endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error if the pair cannot be created.
    fn create_veth_pair(&self, a: &str, b: &str) -> Result<()>;

    /// Deletes a cable endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint exists but cannot be deleted.
    fn delete_interface(&self, name: &str) -> Result<()>;

    /// Moves a cable endpoint into a network namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint cannot be moved.
    fn move_to_namespace(&self, iface: &str, ns: &str) -> Result<()>;

    /// Sets a device's administrative up/down state.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be changed.
    fn set_device_state(&self, dev: &str, state: DeviceState) -> Result<()>;

    /// Runs a command inside a network namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the command exits non-zero.
    fn netns_exec(&self, ns: &str, cmd: &[&str]) -> Result<()>;

    /// Applies link-shaping parameters to an interface.
    ///
    /// # Errors
    ///
    /// Returns an error if shaping cannot be configured.
    fn apply_shaping(&self, iface: &str, profile: &ShapingProfile) -> Result<()>;

    /// Lists the names of all network interfaces on the host.
    ///
    /// # Errors
    ///
    /// Returns an error if the inventory cannot be scanned.
    fn list_interfaces(&self) -> Result<Vec<String>>;

    /// Lists the names of all virtual-cable-kind interfaces on the host.
    ///
    /// # Errors
    ///
    /// Returns an error if the inventory cannot be scanned.
    fn list_veth_interfaces(&self) -> Result<Vec<String>>;

    /// Lists the names of all network namespaces on the host.
    ///
    /// An absent namespace inventory is reported as an empty list, not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the inventory exists but cannot be scanned.
    fn list_namespaces(&self) -> Result<Vec<String>>;
}

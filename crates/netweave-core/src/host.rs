//! Linux implementation of the host capability surface.
//!
//! Shells out to `ip` for namespaces and cable pairs, `ovs-vsctl` for
//! virtual switches, and `tc` for link shaping. Every non-zero exit is
//! wrapped as a capability error carrying the attempted step and the
//! trimmed combined output of the failed command.

use std::path::PathBuf;
use std::process::Command;
use std::sync::OnceLock;

use regex::Regex;

use netweave_common::error::{NetweaveError, Result};
use netweave_common::types::ShapingProfile;

use crate::capability::{DeviceState, HostCapability};

/// Default location of the named-namespace inventory on Linux.
const NETNS_DIR: &str = "/var/run/netns";

/// Capability surface backed by the Linux `ip`, `ovs-vsctl`, and `tc`
/// command-line tools.
#[derive(Debug, Clone)]
pub struct LinuxHost {
    netns_dir: PathBuf,
}

impl LinuxHost {
    /// Creates a host surface using the standard inventory paths.
    #[must_use]
    pub fn new() -> Self {
        Self {
            netns_dir: PathBuf::from(NETNS_DIR),
        }
    }

    /// Creates a host surface that scans namespaces under `netns_dir`.
    #[must_use]
    pub fn with_netns_dir(netns_dir: PathBuf) -> Self {
        Self { netns_dir }
    }
}

impl Default for LinuxHost {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs a command, returning its stdout or a capability error with the
/// trimmed combined output on non-zero exit.
fn run_checked(step: &str, program: &str, args: &[&str]) -> Result<String> {
    tracing::debug!(step, program, args = ?args, "host call");
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| NetweaveError::Capability {
            step: step.to_string(),
            reason: e.to_string(),
        })?;
    if output.status.success() {
        return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let mut reason = stderr.trim().to_string();
    if reason.is_empty() {
        reason = String::from_utf8_lossy(&output.stdout).trim().to_string();
    }
    Err(NetweaveError::Capability {
        step: step.to_string(),
        reason,
    })
}

/// Extracts interface names from `ip link show type veth` output.
///
/// Lines look like `12: veth3@tap1: <BROADCAST,...> mtu 1500 ...`; the
/// name before the optional `@peer` suffix is the interface.
#[allow(clippy::expect_used)]
fn parse_veth_listing(out: &str) -> Vec<String> {
    static VETH_LINE: OnceLock<Regex> = OnceLock::new();
    let re = VETH_LINE.get_or_init(|| {
        Regex::new(r"^[0-9]+: ([A-Za-z0-9_.-]+)(@[A-Za-z0-9_.-]+)?:").expect("static regex")
    });
    out.lines()
        .filter_map(|line| re.captures(line))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

impl HostCapability for LinuxHost {
    fn create_namespace(&self, name: &str) -> Result<()> {
        run_checked("create namespace", "ip", &["netns", "add", name]).map(|_| ())
    }

    fn delete_namespace(&self, name: &str) -> Result<()> {
        run_checked("delete namespace", "ip", &["netns", "del", name]).map(|_| ())
    }

    fn create_bridge(&self, name: &str) -> Result<()> {
        run_checked("create bridge", "ovs-vsctl", &["add-br", name]).map(|_| ())
    }

    fn delete_bridge(&self, name: &str) -> Result<()> {
        run_checked("delete bridge", "ovs-vsctl", &["del-br", name]).map(|_| ())
    }

    fn bridge_add_port(&self, bridge: &str, iface: &str) -> Result<()> {
        run_checked("bridge add port", "ovs-vsctl", &["add-port", bridge, iface]).map(|_| ())
    }

    fn port_set_parameter(&self, port: &str, param: &str, value: &str) -> Result<()> {
        let assignment = format!("{param}={value}");
        run_checked(
            "set port parameter",
            "ovs-vsctl",
            &["set", "interface", port, &assignment],
        )
        .map(|_| ())
    }

    fn create_veth(&self, name: &str) -> Result<()> {
        run_checked("create veth", "ip", &["link", "add", name, "type", "veth"]).map(|_| ())
    }

    fn create_veth_pair(&self, a: &str, b: &str) -> Result<()> {
        run_checked(
            "create veth pair",
            "ip",
            &["link", "add", a, "type", "veth", "peer", "name", b],
        )
        .map(|_| ())
    }

    fn delete_interface(&self, name: &str) -> Result<()> {
        // Deleting one end of a cable pair removes both ends, so a
        // later delete of the peer must count as already destroyed.
        match run_checked("delete interface", "ip", &["link", "del", name]) {
            Err(NetweaveError::Capability { reason, .. })
                if reason.contains("Cannot find device") =>
            {
                Ok(())
            }
            other => other.map(|_| ()),
        }
    }

    fn move_to_namespace(&self, iface: &str, ns: &str) -> Result<()> {
        run_checked(
            "move interface to namespace",
            "ip",
            &["link", "set", iface, "netns", ns],
        )
        .map(|_| ())
    }

    fn set_device_state(&self, dev: &str, state: DeviceState) -> Result<()> {
        run_checked(
            "set device state",
            "ip",
            &["link", "set", "dev", dev, state.as_str()],
        )
        .map(|_| ())
    }

    fn netns_exec(&self, ns: &str, cmd: &[&str]) -> Result<()> {
        let mut args = vec!["netns", "exec", ns];
        args.extend_from_slice(cmd);
        run_checked("exec in namespace", "ip", &args).map(|_| ())
    }

    fn apply_shaping(&self, iface: &str, profile: &ShapingProfile) -> Result<()> {
        // Clean slate: remove any existing root qdisc, ignoring failure
        // when none is installed.
        let _ = run_checked("clear shaping", "tc", &["qdisc", "del", "dev", iface, "root"]);

        if profile.is_empty() {
            return Ok(());
        }

        let mut owned: Vec<String> = Vec::new();
        if profile.latency_ms > 0 {
            owned.push("delay".into());
            owned.push(format!("{}ms", profile.latency_ms));
            if profile.jitter_ms > 0 {
                owned.push(format!("{}ms", profile.jitter_ms));
            }
        }
        if profile.loss_percent > 0 {
            owned.push("loss".into());
            owned.push(format!("{}%", profile.loss_percent));
        }
        if profile.bandwidth_bps > 0 {
            owned.push("rate".into());
            owned.push(format!("{}bit", profile.bandwidth_bps));
        }

        let mut args = vec!["qdisc", "add", "dev", iface, "root", "netem"];
        args.extend(owned.iter().map(String::as_str));
        run_checked("apply shaping", "tc", &args).map(|_| ())
    }

    fn list_interfaces(&self) -> Result<Vec<String>> {
        let sysfs = PathBuf::from("/sys/class/net");
        let entries = std::fs::read_dir(&sysfs).map_err(|e| NetweaveError::Io {
            path: sysfs,
            source: e,
        })?;
        let mut names = Vec::new();
        for entry in entries {
            match entry {
                Ok(e) => names.push(e.file_name().to_string_lossy().into_owned()),
                Err(e) => {
                    return Err(NetweaveError::Io {
                        path: PathBuf::from("/sys/class/net"),
                        source: e,
                    });
                }
            }
        }
        Ok(names)
    }

    fn list_veth_interfaces(&self) -> Result<Vec<String>> {
        let out = run_checked("list veth interfaces", "ip", &["link", "show", "type", "veth"])?;
        Ok(parse_veth_listing(&out))
    }

    fn list_namespaces(&self) -> Result<Vec<String>> {
        let entries = match std::fs::read_dir(&self.netns_dir) {
            Ok(entries) => entries,
            // No namespace directory means no namespaces yet.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(NetweaveError::Io {
                    path: self.netns_dir.clone(),
                    source: e,
                });
            }
        };
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| NetweaveError::Io {
                path: self.netns_dir.clone(),
                source: e,
            })?;
            if entry.file_type().is_ok_and(|t| t.is_dir()) {
                continue;
            }
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }
}

//! Link-spec parsing: human-readable shaping strings to machine units.
//!
//! A [`LinkSpec`] carries up to four optional strings (latency, jitter,
//! bandwidth, packet loss). Parsing normalizes them into a
//! [`ShapingProfile`] exactly once; the frozen descriptor is cached on
//! the spec and reused for every application.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use netweave_common::error::{NetweaveError, Result};
use netweave_common::types::ShapingProfile;
use netweave_core::capability::HostCapability;

fn parse_error(field: &'static str, message: impl Into<String>) -> NetweaveError {
    NetweaveError::Parse {
        field,
        message: message.into(),
    }
}

/// Parses a human-readable link rate into bits per second.
///
/// Accepts a decimal magnitude, an optional single-letter metric prefix
/// (`k`/`m`/`g`/`t`, each a power of 1024), and the mandatory literal
/// suffix `bit`. An empty string means unset and yields `0` without
/// error.
///
/// # Errors
///
/// Returns a parse error naming the offending token if the suffix is
/// missing, the metric prefix is unrecognized, the magnitude is not a
/// decimal integer, or the scaled rate exceeds 64 bits.
pub fn parse_link_rate(s: &str) -> Result<u64> {
    if s.is_empty() {
        return Ok(0);
    }
    let Some(body) = s.strip_suffix("bit") else {
        return Err(parse_error("link rate", format!("\"{s}\" must end in 'bit'")));
    };
    if body.is_empty() {
        return Err(parse_error("link rate", format!("\"{s}\" has no magnitude")));
    }
    let (digits, multiplier) = match body.as_bytes()[body.len() - 1] {
        b'0'..=b'9' => (body, 1u64),
        b'k' => (&body[..body.len() - 1], 1 << 10),
        b'm' => (&body[..body.len() - 1], 1 << 20),
        b'g' => (&body[..body.len() - 1], 1 << 30),
        b't' => (&body[..body.len() - 1], 1_u64 << 40),
        c => {
            return Err(parse_error(
                "link rate",
                format!("invalid metric prefix '{}'", c as char),
            ));
        }
    };
    let magnitude: u64 = digits
        .parse()
        .map_err(|_| parse_error("link rate", format!("invalid magnitude \"{digits}\"")))?;
    magnitude
        .checked_mul(multiplier)
        .ok_or_else(|| parse_error("link rate", format!("\"{s}\" overflows bits per second")))
}

/// Parses a percentage string such as `"5%"`.
///
/// An empty string means unset and yields `0` without error. Values
/// outside `[0, 100]` are accepted as-is; no clamping is performed.
///
/// # Errors
///
/// Returns a parse error if the `%` suffix is missing or the magnitude
/// is not a decimal integer.
pub fn parse_percentage(s: &str) -> Result<u64> {
    if s.is_empty() {
        return Ok(0);
    }
    let Some(digits) = s.strip_suffix('%') else {
        return Err(parse_error("percentage", format!("\"{s}\" must end in '%'")));
    };
    digits
        .parse()
        .map_err(|_| parse_error("percentage", format!("invalid magnitude \"{digits}\"")))
}

/// Parses a standard duration string (`"50ms"`, `"1.5s"`, `"1h30m"`)
/// into whole milliseconds.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_duration_ms(field: &'static str, s: &str) -> Result<u64> {
    if s.is_empty() {
        return Err(parse_error(field, "empty duration string"));
    }
    let mut rest = s;
    let mut total_ns = 0.0_f64;
    while !rest.is_empty() {
        let split = rest
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(rest.len());
        if split == 0 {
            return Err(parse_error(field, format!("expected a number at \"{rest}\"")));
        }
        let (digits, tail) = rest.split_at(split);
        let magnitude: f64 = digits
            .parse()
            .map_err(|_| parse_error(field, format!("invalid number \"{digits}\"")))?;
        let unit_end = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_end);
        let scale_ns = match unit {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 6e10,
            "h" => 3.6e12,
            _ => return Err(parse_error(field, format!("unknown time unit \"{unit}\""))),
        };
        total_ns += magnitude * scale_ns;
        rest = next;
    }
    Ok((total_ns / 1e6) as u64)
}

/// Human-readable shaping parameters for one link edge.
///
/// All four fields are optional; `None` or an empty string both mean
/// unset. The parsed descriptor is a pure function of the four strings
/// and is computed at most once per spec.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkSpec {
    /// One-way latency as a duration string, e.g. `"50ms"`.
    #[serde(default)]
    pub latency: Option<String>,
    /// Latency variation as a duration string.
    #[serde(default)]
    pub jitter: Option<String>,
    /// Available bandwidth, e.g. `"10mbit"`.
    #[serde(default)]
    pub bandwidth: Option<String>,
    /// Packet loss percentage, e.g. `"5%"`.
    #[serde(default)]
    pub packet_loss: Option<String>,

    #[serde(skip)]
    parsed: OnceLock<ShapingProfile>,
}

impl LinkSpec {
    /// True when none of the four fields carries a value.
    #[must_use]
    pub fn is_unset(&self) -> bool {
        [
            &self.latency,
            &self.jitter,
            &self.bandwidth,
            &self.packet_loss,
        ]
        .iter()
        .all(|f| f.as_deref().unwrap_or("").is_empty())
    }

    /// Normalizes the string fields into a [`ShapingProfile`], caching
    /// the result for reuse.
    ///
    /// # Errors
    ///
    /// Returns a parse error naming the offending field and token.
    pub fn parse(&self) -> Result<ShapingProfile> {
        if let Some(profile) = self.parsed.get() {
            return Ok(*profile);
        }
        let profile = self.compute()?;
        let _ = self.parsed.set(profile);
        Ok(profile)
    }

    fn compute(&self) -> Result<ShapingProfile> {
        let latency_ms = match self.latency.as_deref() {
            None | Some("") => 0,
            Some(s) => parse_duration_ms("latency", s)?,
        };
        let jitter_ms = match self.jitter.as_deref() {
            None | Some("") => 0,
            Some(s) => parse_duration_ms("jitter", s)?,
        };
        let bandwidth_bps = parse_link_rate(self.bandwidth.as_deref().unwrap_or(""))?;
        let loss_percent = parse_percentage(self.packet_loss.as_deref().unwrap_or(""))?;
        Ok(ShapingProfile {
            latency_ms,
            jitter_ms,
            bandwidth_bps,
            loss_percent,
        })
    }

    /// Returns the cached descriptor, if [`parse`](Self::parse) has run.
    #[must_use]
    pub fn profile(&self) -> Option<&ShapingProfile> {
        self.parsed.get()
    }

    /// Applies this spec's shaping to the named interface.
    ///
    /// A no-op when all four fields are unset.
    ///
    /// # Errors
    ///
    /// Returns an internal-state error if the spec has not been parsed,
    /// or a capability error if the shaping operation fails.
    pub fn apply(&self, host: &dyn HostCapability, iface: &str) -> Result<()> {
        if self.is_unset() {
            return Ok(());
        }
        let profile = self
            .profile()
            .ok_or_else(|| NetweaveError::InternalState {
                message: format!("link spec applied to \"{iface}\" before being parsed"),
            })?;
        host.apply_shaping(iface, profile)
    }
}

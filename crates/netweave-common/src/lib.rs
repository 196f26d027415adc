//! # netweave-common
//!
//! Shared types and error definitions used across the netweave workspace.
//!
//! This crate is the leaf of the dependency graph — it depends on no other
//! internal crate and provides the foundational primitives that the
//! capability surface and the render engine build upon.

pub mod error;
pub mod types;

//! M.A.S.H. firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod protocol;
pub mod safety;

mod pins;

// Hardware-facing modules compile on every target; the ESP-IDF paths
// are selected by cfg attributes inside.
pub mod adapters;
pub mod drivers;
pub mod sensors;

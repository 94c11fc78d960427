//! Host-link wire protocol.
//!
//! Newline-delimited text in both directions.  Inbound lines are commands
//! ([`command`]), outbound lines are JSON telemetry and status objects
//! ([`telemetry`]).  [`line`] does the framing.

pub mod command;
pub mod line;
pub mod telemetry;

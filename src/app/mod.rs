//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the control loop for the M.A.S.H. controller:
//! host command dispatch, acquisition scheduling and the link-loss
//! policy.  All interaction with hardware happens through **port traits**
//! defined in [`ports`], keeping this layer fully testable without real
//! peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;

//! Application core: pure domain logic, zero I/O.
//!
//! This module holds the business rules of the tester: the service that
//! ties the local-interface FSM, the safety gate, the test run and the
//! result store together, plus the host command and event types.  All
//! interaction with hardware happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;

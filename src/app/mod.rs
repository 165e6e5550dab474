//! Application core: pure domain logic, zero I/O.
//!
//! The ingest side ([`ingest`]) and the alert engine ([`service`]) share
//! nothing but [`SharedState`](crate::state::SharedState). All interaction
//! with hardware happens through **port traits** defined in [`ports`],
//! keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ingest;
pub mod ports;
pub mod service;

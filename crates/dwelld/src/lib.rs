//! dwelld HTTP surface
//!
//! The binary in `main.rs` wires configuration, the store and the tracker
//! together; this library exposes the router so it can be exercised in tests.

pub mod api;

//! Wire contract for the dwelld HTTP API
//!
//! This crate defines the stable, explicitly-typed bodies exchanged with
//! learners' clients:
//! - Per-endpoint responses (start, heartbeat, complete, status, summary)
//! - Error codes and the error body
//! - Versioning

mod errors;
mod types;

pub use errors::*;
pub use types::*;

/// Current API version
pub const API_VERSION: u32 = 1;

//! Shared utilities for dwelld
//!
//! This crate provides:
//! - ID types (UserId, SubsectionId, ProgressKey, SessionId)
//! - Clock abstraction (system clock and a manual clock for tests)
//! - Sliding-window rate limiting
//! - Default paths for config and data directories

mod ids;
mod paths;
mod rate_limit;
mod time;

pub use ids::*;
pub use paths::*;
pub use rate_limit::*;
pub use time::*;

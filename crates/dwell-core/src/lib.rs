//! Core tracking engine for dwelld
//!
//! This crate contains:
//! - Completion policy (time spent → percentage)
//! - Session state machine (Idle -> Active -> Idle, with a sticky Completed marker)
//! - Per-heartbeat activity validation and statistical bot detection
//! - Collaborator seams: policy lookup, completion cascade, verification gate

mod bot;
mod collaborators;
mod completion;
mod error;
mod locks;
mod tracker;
mod validator;

pub use bot::*;
pub use collaborators::*;
pub use completion::*;
pub use error::*;
pub use locks::*;
pub use tracker::*;
pub use validator::*;

//! Shared utilities for toastyd
//!
//! This crate provides:
//! - ID types (CustomerId, FobNum, BedNum, SessionId, ClientId)
//! - Wall-clock helpers (mock-able `now()`, epoch seconds, local midnight)
//! - Error types
//! - Default paths for socket, data, and config

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;

//! Protocol types for toastyd IPC
//!
//! This crate defines the stable API between toastyd and its clients
//! (kiosk front-ends, the operator CLI):
//! - Commands, one statically typed shape per operation
//! - Responses carrying a numeric error code
//! - Request validation
//! - Versioning

mod commands;
mod types;

pub use commands::*;
pub use types::*;

/// Current API version
pub const API_VERSION: u32 = 1;

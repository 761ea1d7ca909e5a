//! Bed actuator interface for toastyd
//!
//! This crate defines the narrow contract between the service core and
//! whatever drives the bed controllers. It contains no hardware code itself.

mod mock;
mod traits;

pub use mock::*;
pub use traits::*;

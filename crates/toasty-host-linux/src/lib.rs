//! Linux bed actuator for toastyd
//!
//! Provides:
//! - A [`BedActuator`](toasty_host_api::BedActuator) that runs the configured
//!   device-control command once per bed command
//! - Process-group isolation and a hard timeout per controller call
//! - Exit status and stderr capture for the reconciliation log

mod adapter;
mod process;

pub use adapter::*;
pub use process::*;

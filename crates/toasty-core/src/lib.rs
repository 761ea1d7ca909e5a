//! Core admission engine and session lifecycle for toastyd
//!
//! This crate contains:
//! - Admission rules (authorization, grace window, same-day limits)
//! - Session lifecycle (record on confirmed start, cancel inside grace window)
//! - Two-phase bed actuation dispatched as detached tasks
//! - The `CoreEngine` that the service routes every request through

mod actuator;
mod audit;
mod eligibility;
mod engine;
mod executor;
mod lifecycle;

pub use actuator::*;
pub use eligibility::*;
pub use engine::*;
pub use executor::*;
pub use lifecycle::*;

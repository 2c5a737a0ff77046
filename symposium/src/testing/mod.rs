//! Test doubles for symposium runs.
//!
//! - [`ScriptedService`]: a [`GenerationService`](crate::service::GenerationService)
//!   answering from a script and recording every call
//! - [`ManualClock`]: a [`Clock`](crate::ratelimit::Clock) for deterministic
//!   rate-window tests

mod mocks;

pub use mocks::{ManualClock, ScriptedService};

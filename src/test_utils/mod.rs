//! Test utilities.
//!
//! This module provides:
//! - Test data factories with override closures
//! - In-memory repository implementations for mocking persistence
//! - Scripted fakes for the payment gateway and premium backends
//! - `TestAppStateBuilder` for HTTP-level tests

mod app_state_builder;
mod factories;
mod gateway_mocks;
mod repo_mocks;

pub use app_state_builder::*;
pub use factories::*;
pub use gateway_mocks::*;
pub use repo_mocks::*;

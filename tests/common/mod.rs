//! Common test utilities and helpers
//!
//! This module provides shared test infrastructure including:
//! - PEM fixtures generated on the fly
//! - Canned CA responses
//! - A mock Puppet CA server

pub mod fixtures;

pub use fixtures::*;
pub use mocks::*;

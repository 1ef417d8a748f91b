//! Testing utilities for Tessera.
//!
//! This crate provides the shared scenario catalogs used by the resolver's
//! integration tests and benchmarks, proptest strategies for the core value
//! types, and a tracing initializer for tests.
//!
//! # Modules
//!
//! - [`fixtures`]: Pre-built catalogs for the resolver scenarios
//! - [`strategies`]: Proptest strategies for versions, names, and ids
//! - [`logging`]: Tracing initialization for tests

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod fixtures;
pub mod logging;
pub mod strategies;

/// Re-export commonly used testing utilities.
pub mod prelude {
    pub use crate::fixtures::Fixtures;
    pub use crate::logging::init_tracing;
    pub use crate::strategies::*;

    // Re-export common testing crates
    pub use pretty_assertions::{assert_eq, assert_ne};
    pub use proptest::prelude::*;
}

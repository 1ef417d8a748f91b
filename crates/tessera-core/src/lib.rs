//! Core identity types for the Tessera module system.
//!
//! This crate provides the foundational value types used throughout Tessera:
//! - [`Version`]: dotted, possibly alphanumeric module versions
//! - [`VersionQuery`]: relational queries over versions (`=`, `<`, `<=`, `>`, `>=`)
//! - [`ModuleId`]: a module name paired with an optional version
//! - [`ModuleIdQuery`]: a module name paired with a version query
//!
//! All types are cheap to clone (names are shared `Arc<str>`), value-comparable,
//! and round-trip through their textual forms (`x@1.2`, `z@>=3`).

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod error;
mod ident;
mod version;

pub use error::ParseError;
pub use ident::{ModuleId, ModuleIdQuery, is_valid_module_name};
pub use version::{Component, Version, VersionQuery};

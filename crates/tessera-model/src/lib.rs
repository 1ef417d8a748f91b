//! Module metadata model for the Tessera module system.
//!
//! A [`ModuleInfo`] is the immutable description of one installed module:
//! its identity, its views (the default view plus any named views, each with
//! exports, permits, aliases, service provisions, and an optional main
//! class), its module and service dependences, and the classes it carries.
//!
//! Metadata enters the system through [`ModuleInfoBuilder`], which validates
//! the model invariants (views share the module version, no module declares
//! itself as a view, names within a module are unique) and produces a value
//! that is never mutated afterwards.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod builder;
mod dependence;
mod info;
mod view;

pub use builder::{ModelError, ModuleInfoBuilder, ViewBuilder};
pub use dependence::{Modifiers, ServiceDependence, ViewDependence};
pub use info::{ModuleInfo, SuppliedName};
pub use view::ModuleView;

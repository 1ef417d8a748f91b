//! Typed dependence records.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tessera_core::ModuleIdQuery;

/// Modifier flags on a module dependence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Modifiers {
    /// Re-export the dependee's visibility to this module's own dependents.
    pub public: bool,
    /// Absence of a satisfying candidate is not an error.
    pub optional: bool,
    /// The dependee must be merged into the dependent's context.
    pub local: bool,
}

impl Modifiers {
    /// No modifiers.
    pub const NONE: Self = Self {
        public: false,
        optional: false,
        local: false,
    };

    /// Only `public`.
    pub const PUBLIC: Self = Self {
        public: true,
        optional: false,
        local: false,
    };

    /// Only `optional`.
    pub const OPTIONAL: Self = Self {
        public: false,
        optional: true,
        local: false,
    };

    /// Only `local`.
    pub const LOCAL: Self = Self {
        public: false,
        optional: false,
        local: true,
    };
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        for (set, word) in [
            (self.public, "public"),
            (self.optional, "optional"),
            (self.local, "local"),
        ] {
            if set {
                write!(f, "{sep}{word}")?;
                sep = " ";
            }
        }
        Ok(())
    }
}

/// A dependence on another module (or one of its views or aliases).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ViewDependence {
    /// Modifier flags.
    pub modifiers: Modifiers,
    /// The requested name and version constraint.
    pub query: ModuleIdQuery,
}

impl ViewDependence {
    /// Create a dependence.
    #[must_use]
    pub const fn new(modifiers: Modifiers, query: ModuleIdQuery) -> Self {
        Self { modifiers, query }
    }
}

impl fmt::Display for ViewDependence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers == Modifiers::NONE {
            write!(f, "requires {}", self.query)
        } else {
            write!(f, "requires {} {}", self.modifiers, self.query)
        }
    }
}

/// A dependence on a service interface, to be bound to providers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ServiceDependence {
    /// Whether the absence of any resolvable provider is acceptable.
    pub optional: bool,
    /// The service interface name.
    pub service: Arc<str>,
}

impl ServiceDependence {
    /// Create a service dependence.
    #[must_use]
    pub const fn new(optional: bool, service: Arc<str>) -> Self {
        Self { optional, service }
    }
}

impl fmt::Display for ServiceDependence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.optional {
            write!(f, "requires optional service {}", self.service)
        } else {
            write!(f, "requires service {}", self.service)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifiers_display() {
        assert_eq!(Modifiers::NONE.to_string(), "");
        assert_eq!(Modifiers::LOCAL.to_string(), "local");
        let all = Modifiers {
            public: true,
            optional: true,
            local: true,
        };
        assert_eq!(all.to_string(), "public optional local");
    }

    #[test]
    fn dependence_display() {
        let dep = ViewDependence::new(
            Modifiers::OPTIONAL,
            ModuleIdQuery::parse("z@>=3").unwrap(),
        );
        assert_eq!(dep.to_string(), "requires optional z@>=3");

        let plain = ViewDependence::new(Modifiers::NONE, ModuleIdQuery::parse("y").unwrap());
        assert_eq!(plain.to_string(), "requires y");
    }

    #[test]
    fn service_dependence_display() {
        let dep = ServiceDependence::new(true, Arc::from("app.Spi"));
        assert_eq!(dep.to_string(), "requires optional service app.Spi");
    }
}

//! Module identities and identity queries.

use crate::error::ParseError;
use crate::version::{Version, VersionQuery};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Whether `name` is a valid module name: a non-empty, dot-separated sequence
/// of segments, each starting with an ASCII letter or `_` and continuing with
/// letters, digits, `_`, or `-`.
#[must_use]
pub fn is_valid_module_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
                _ => return false,
            }
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        })
}

fn parse_module_name(name: &str) -> Result<Arc<str>, ParseError> {
    if name.is_empty() {
        return Err(ParseError::EmptyModuleName);
    }
    if !is_valid_module_name(name) {
        return Err(ParseError::InvalidModuleName {
            input: name.to_string(),
        });
    }
    Ok(Arc::from(name))
}

/// A module identity: a name plus an optional version.
///
/// Equality is exact over the pair; two ids with the same name and equal
/// versions (`x@1` and `x@1.0`) are the same id.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ModuleId {
    name: Arc<str>,
    version: Option<Version>,
}

impl ModuleId {
    /// Create an id from an already-validated name and version.
    pub fn new(name: &str, version: Option<Version>) -> Result<Self, ParseError> {
        Ok(Self {
            name: parse_module_name(name)?,
            version,
        })
    }

    /// Parse `name` or `name@version`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tessera_core::ModuleId;
    ///
    /// let id = ModuleId::parse("x.y@1.2").unwrap();
    /// assert_eq!(id.name(), "x.y");
    /// assert_eq!(id.version().unwrap().to_string(), "1.2");
    /// assert!(ModuleId::parse("x@").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        match input.split_once('@') {
            Some((name, version)) => {
                if version.is_empty() {
                    return Err(ParseError::DanglingVersion {
                        input: input.to_string(),
                    });
                }
                Ok(Self {
                    name: parse_module_name(name)?,
                    version: Some(Version::parse(version)?),
                })
            }
            None => Ok(Self {
                name: parse_module_name(input)?,
                version: None,
            }),
        }
    }

    /// The module name.
    #[must_use]
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The module name as a shared string.
    #[must_use]
    #[inline]
    pub fn name_arc(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    /// The version, if any.
    #[must_use]
    #[inline]
    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }
}

impl fmt::Debug for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleId({self})")
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}@{}", self.name, v),
            None => write!(f, "{}", self.name),
        }
    }
}

impl PartialOrd for ModuleId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ModuleId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| match (&self.version, &other.version) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

impl FromStr for ModuleId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ModuleId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ModuleId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A query for a module: a name plus a version query.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ModuleIdQuery {
    name: Arc<str>,
    version_query: VersionQuery,
}

impl ModuleIdQuery {
    /// Create a query from an already-validated name and version query.
    pub fn new(name: &str, version_query: VersionQuery) -> Result<Self, ParseError> {
        Ok(Self {
            name: parse_module_name(name)?,
            version_query,
        })
    }

    /// Parse `name` (matches any version) or `name@<version query>`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tessera_core::{ModuleId, ModuleIdQuery};
    ///
    /// let q = ModuleIdQuery::parse("z@>=3").unwrap();
    /// assert!(q.matches(&ModuleId::parse("z@4").unwrap()));
    /// assert!(!q.matches(&ModuleId::parse("z@2").unwrap()));
    /// ```
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        match input.split_once('@') {
            Some((name, query)) => {
                if query.is_empty() {
                    return Err(ParseError::DanglingVersion {
                        input: input.to_string(),
                    });
                }
                Ok(Self {
                    name: parse_module_name(name)?,
                    version_query: VersionQuery::parse(query)?,
                })
            }
            None => Ok(Self {
                name: parse_module_name(input)?,
                version_query: VersionQuery::Any,
            }),
        }
    }

    /// The queried name.
    #[must_use]
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The queried name as a shared string.
    #[must_use]
    #[inline]
    pub fn name_arc(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    /// The version query.
    #[must_use]
    #[inline]
    pub fn version_query(&self) -> &VersionQuery {
        &self.version_query
    }

    /// Whether the given id has this query's name and a satisfying version.
    #[must_use]
    pub fn matches(&self, id: &ModuleId) -> bool {
        *self.name == *id.name() && self.version_query.matches_optional(id.version())
    }
}

impl From<ModuleId> for ModuleIdQuery {
    /// The query matching exactly the given id.
    fn from(id: ModuleId) -> Self {
        let version_query = match id.version {
            Some(v) => VersionQuery::Eq(v),
            None => VersionQuery::Any,
        };
        Self {
            name: id.name,
            version_query,
        }
    }
}

impl fmt::Debug for ModuleIdQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleIdQuery({self})")
    }
}

impl fmt::Display for ModuleIdQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version_query {
            VersionQuery::Any => write!(f, "{}", self.name),
            q => write!(f, "{}@{}", self.name, q),
        }
    }
}

impl FromStr for ModuleIdQuery {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ModuleIdQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ModuleIdQuery {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

//! Module version handling.
//!
//! Versions are dotted sequences of numeric or alphanumeric components, for
//! example `1.2.3`, `2.0-beta`, `9_1+42`. Comparison is component-wise:
//! numeric components compare numerically, textual components compare
//! lexicographically, and a numeric component orders below a textual one at
//! the first differing position. Trailing zero components are insignificant,
//! so `1 == 1.0 == 1.0.0` while `1.0.0.1 > 1`.
//!
//! Queries support the relational operators `=`, `<`, `<=`, `>`, `>=` plus
//! bare equality (`1.2` means `=1.2`) and the match-anything query.

use crate::error::ParseError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

/// One version component: a maximal run of digits or of letters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Component {
    /// Numeric component, compared numerically.
    Number(u64),
    /// Textual component, compared lexicographically.
    Text(Arc<str>),
}

impl Component {
    /// The implicit component used to pad a shorter version during comparison.
    const ZERO: Self = Self::Number(0);

    fn is_zero(&self) -> bool {
        matches!(self, Self::Number(0))
    }
}

impl PartialOrd for Component {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Component {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            // A numeric component orders below a textual one.
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

/// A parsed module version.
///
/// Keeps the original string for display while comparing by components, so
/// `Version::parse("1.0")? == Version::parse("1")?` even though the two
/// display differently.
#[derive(Clone)]
pub struct Version {
    components: SmallVec<[Component; 4]>,
    original: Arc<str>,
}

const SEPARATORS: [char; 4] = ['.', '_', '-', '+'];

impl Version {
    /// Parse a version string.
    ///
    /// Components are maximal runs of ASCII digits or letters; the separators
    /// `.`, `_`, `-`, `+` delimit components, and a digit/letter boundary
    /// inside a run also splits (`1a2` parses as `1`, `a`, `2`). Empty
    /// strings, leading/trailing separators, and adjacent separators are
    /// rejected.
    ///
    /// # Examples
    ///
    /// ```
    /// use tessera_core::Version;
    ///
    /// let v = Version::parse("1.2.3").unwrap();
    /// assert_eq!(v.to_string(), "1.2.3");
    /// assert_eq!(v, Version::parse("1.2.3.0").unwrap());
    /// assert!(Version::parse("1.").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        if input.is_empty() {
            return Err(ParseError::EmptyVersion);
        }

        let mut components = SmallVec::new();
        let mut run_start: Option<usize> = None;
        let mut prev_sep = true; // a separator at position 0 is dangling

        let flush = |components: &mut SmallVec<[Component; 4]>,
                     run: &str|
         -> Result<(), ParseError> {
            // Split the run at digit/letter boundaries.
            let bytes = run.as_bytes();
            let mut start = 0;
            for i in 1..=bytes.len() {
                let boundary = i == bytes.len()
                    || bytes[i].is_ascii_digit() != bytes[start].is_ascii_digit();
                if boundary {
                    let piece = &run[start..i];
                    if piece.as_bytes()[0].is_ascii_digit() {
                        let n: u64 =
                            piece.parse().map_err(|_| ParseError::NumberOverflow {
                                input: input.to_string(),
                            })?;
                        components.push(Component::Number(n));
                    } else {
                        components.push(Component::Text(Arc::from(piece)));
                    }
                    start = i;
                }
            }
            Ok(())
        };

        for (i, c) in input.char_indices() {
            if SEPARATORS.contains(&c) {
                if prev_sep {
                    return Err(ParseError::DanglingSeparator {
                        input: input.to_string(),
                    });
                }
                if let Some(start) = run_start.take() {
                    flush(&mut components, &input[start..i])?;
                }
                prev_sep = true;
            } else if c.is_ascii_alphanumeric() {
                if run_start.is_none() {
                    run_start = Some(i);
                }
                prev_sep = false;
            } else {
                return Err(ParseError::InvalidVersionCharacter {
                    input: input.to_string(),
                    character: c,
                });
            }
        }

        match run_start {
            Some(start) => flush(&mut components, &input[start..])?,
            // Input ended on a separator.
            None => {
                return Err(ParseError::DanglingSeparator {
                    input: input.to_string(),
                });
            }
        }

        Ok(Self {
            components,
            original: Arc::from(input),
        })
    }

    /// The original string form.
    #[must_use]
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// The parsed components, including any trailing zeros.
    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Components with trailing zeros trimmed; the basis of comparison.
    fn significant(&self) -> &[Component] {
        let mut len = self.components.len();
        while len > 0 && self.components[len - 1].is_zero() {
            len -= 1;
        }
        &self.components[..len]
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Version").field(&self.original).finish()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.significant() == other.significant()
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let a = self.significant();
        let b = other.significant();
        let len = a.len().max(b.len());
        for i in 0..len {
            let ca = a.get(i).unwrap_or(&Component::ZERO);
            let cb = b.get(i).unwrap_or(&Component::ZERO);
            match ca.cmp(cb) {
                Ordering::Equal => {}
                other => return other,
            }
        }
        Ordering::Equal
    }
}

impl FromStr for Version {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.original)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A relational query over versions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum VersionQuery {
    /// Matches any version, including absent ones.
    #[default]
    Any,
    /// Matches versions equal to the given one.
    Eq(Version),
    /// Matches versions strictly below the given one.
    Lt(Version),
    /// Matches versions at or below the given one.
    Le(Version),
    /// Matches versions strictly above the given one.
    Gt(Version),
    /// Matches versions at or above the given one.
    Ge(Version),
}

impl VersionQuery {
    /// Parse a query string: an optional operator (`=`, `<`, `<=`, `>`, `>=`)
    /// followed by a version. A bare version means equality; `*` matches
    /// anything. Bare operators are rejected.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        if input.is_empty() {
            return Err(ParseError::EmptyVersionQuery);
        }
        if input == "*" {
            return Ok(Self::Any);
        }

        let (op, rest): (fn(Version) -> Self, &str) = if let Some(r) = input.strip_prefix(">=") {
            (Self::Ge, r)
        } else if let Some(r) = input.strip_prefix("<=") {
            (Self::Le, r)
        } else if let Some(r) = input.strip_prefix('>') {
            (Self::Gt, r)
        } else if let Some(r) = input.strip_prefix('<') {
            (Self::Lt, r)
        } else if let Some(r) = input.strip_prefix('=') {
            (Self::Eq, r)
        } else {
            (Self::Eq, input)
        };

        if rest.is_empty() {
            return Err(ParseError::MissingQueryVersion {
                input: input.to_string(),
            });
        }

        Ok(op(Version::parse(rest)?))
    }

    /// Whether the given version satisfies this query.
    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        match self {
            Self::Any => true,
            Self::Eq(v) => version == v,
            Self::Lt(v) => version < v,
            Self::Le(v) => version <= v,
            Self::Gt(v) => version > v,
            Self::Ge(v) => version >= v,
        }
    }

    /// Whether a possibly-absent version satisfies this query.
    ///
    /// An absent version satisfies only [`VersionQuery::Any`].
    #[must_use]
    pub fn matches_optional(&self, version: Option<&Version>) -> bool {
        match version {
            Some(v) => self.matches(v),
            None => matches!(self, Self::Any),
        }
    }

    /// Whether this is the match-anything query.
    #[must_use]
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }
}

impl fmt::Display for VersionQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "*"),
            Self::Eq(v) => write!(f, "{v}"),
            Self::Lt(v) => write!(f, "<{v}"),
            Self::Le(v) => write!(f, "<={v}"),
            Self::Gt(v) => write!(f, ">{v}"),
            Self::Ge(v) => write!(f, ">={v}"),
        }
    }
}

impl FromStr for VersionQuery {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for VersionQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionQuery {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod parsing {
        use super::*;
        use pretty_assertions::assert_eq;
        use test_case::test_case;

        #[test]
        fn numeric_components() {
            let v = Version::parse("1.2.3").unwrap();
            assert_eq!(
                v.components(),
                &[
                    Component::Number(1),
                    Component::Number(2),
                    Component::Number(3)
                ]
            );
        }

        #[test]
        fn alphanumeric_components() {
            let v = Version::parse("2.0-beta").unwrap();
            assert_eq!(
                v.components(),
                &[
                    Component::Number(2),
                    Component::Number(0),
                    Component::Text(Arc::from("beta"))
                ]
            );
        }

        #[test]
        fn mixed_run_splits_at_type_boundary() {
            let v = Version::parse("1a2").unwrap();
            assert_eq!(
                v.components(),
                &[
                    Component::Number(1),
                    Component::Text(Arc::from("a")),
                    Component::Number(2)
                ]
            );
        }

        #[test]
        fn all_separators_accepted() {
            let v = Version::parse("1_2-3+4").unwrap();
            assert_eq!(v.components().len(), 4);
        }

        #[test_case("" ; "empty")]
        #[test_case("." ; "lone separator")]
        #[test_case(".1" ; "leading separator")]
        #[test_case("1." ; "trailing separator")]
        #[test_case("1..2" ; "adjacent separators")]
        #[test_case("1 .2" ; "whitespace")]
        #[test_case("1.2é" ; "non ascii")]
        fn rejects(input: &str) {
            assert!(Version::parse(input).is_err(), "{input:?} should not parse");
        }

        #[test]
        fn rejects_numeric_overflow() {
            let err = Version::parse("99999999999999999999999").unwrap_err();
            assert!(matches!(err, ParseError::NumberOverflow { .. }));
        }

        #[test]
        fn display_round_trips_original() {
            assert_eq!(Version::parse("1.0").unwrap().to_string(), "1.0");
            assert_eq!(Version::parse("2-rc_1").unwrap().to_string(), "2-rc_1");
        }
    }

    mod ordering {
        use super::*;
        use pretty_assertions::assert_eq;
        use std::cmp::Ordering;
        use test_case::test_case;

        #[test_case("1", "1.0", Ordering::Equal)]
        #[test_case("1", "1.0.0.0", Ordering::Equal)]
        #[test_case("1", "1.0.0.1", Ordering::Less)]
        #[test_case("1.2", "1.10", Ordering::Less ; "numeric not lexicographic")]
        #[test_case("2", "10", Ordering::Less)]
        #[test_case("1.0", "1.0-alpha", Ordering::Less ; "number below text")]
        #[test_case("1-alpha", "1-beta", Ordering::Less)]
        #[test_case("3", "2.9.9", Ordering::Greater)]
        fn compares(a: &str, b: &str, expected: Ordering) {
            let a = Version::parse(a).unwrap();
            let b = Version::parse(b).unwrap();
            assert_eq!(a.cmp(&b), expected);
            assert_eq!(b.cmp(&a), expected.reverse());
        }

        #[test]
        fn equal_versions_hash_identically() {
            use std::collections::hash_map::DefaultHasher;
            let hash = |v: &Version| {
                let mut h = DefaultHasher::new();
                v.hash(&mut h);
                h.finish()
            };
            let a = Version::parse("1").unwrap();
            let b = Version::parse("1.0.0").unwrap();
            assert_eq!(a, b);
            assert_eq!(hash(&a), hash(&b));
        }
    }

    mod queries {
        use super::*;
        use pretty_assertions::assert_eq;
        use test_case::test_case;

        #[test]
        fn bare_version_is_equality() {
            let q = VersionQuery::parse("1.2").unwrap();
            assert_eq!(q, VersionQuery::Eq(Version::parse("1.2").unwrap()));
        }

        #[test_case(">=3", "3", true)]
        #[test_case(">=3", "9", true)]
        #[test_case(">=3", "2.9", false)]
        #[test_case("<=4", "4.0", true)]
        #[test_case("<=4", "4.0.1", false)]
        #[test_case("<2", "2", false)]
        #[test_case(">1", "1.0.0", false)]
        #[test_case("=1.0", "1", true ; "trailing zeros equal")]
        #[test_case("*", "7", true)]
        fn matching(query: &str, version: &str, expected: bool) {
            let q = VersionQuery::parse(query).unwrap();
            let v = Version::parse(version).unwrap();
            assert_eq!(q.matches(&v), expected);
        }

        #[test]
        fn any_matches_absent_version() {
            assert!(VersionQuery::Any.matches_optional(None));
            let q = VersionQuery::parse("1").unwrap();
            assert!(!q.matches_optional(None));
        }

        #[test_case("=" ; "bare eq")]
        #[test_case("<" ; "bare lt")]
        #[test_case(">" ; "bare gt")]
        #[test_case("<=" ; "bare le")]
        #[test_case(">=" ; "bare ge")]
        #[test_case("" ; "empty")]
        fn rejects_bare_operators(input: &str) {
            assert!(VersionQuery::parse(input).is_err());
        }

        #[test]
        fn display_round_trips() {
            for s in [">=1.0", "<=2", "<3.1", ">4", "*"] {
                let q = VersionQuery::parse(s).unwrap();
                assert_eq!(VersionQuery::parse(&q.to_string()).unwrap(), q);
            }
        }
    }

    mod serde_impls {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn version_as_string() {
            let v = Version::parse("1.2-rc").unwrap();
            let json = serde_json::to_string(&v).unwrap();
            assert_eq!(json, "\"1.2-rc\"");
            let back: Version = serde_json::from_str(&json).unwrap();
            assert_eq!(back, v);
        }

        #[test]
        fn query_as_string() {
            let q = VersionQuery::parse(">=3").unwrap();
            let json = serde_json::to_string(&q).unwrap();
            assert_eq!(json, "\">=3\"");
            let back: VersionQuery = serde_json::from_str(&json).unwrap();
            assert_eq!(back, q);
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn version_string() -> impl Strategy<Value = String> {
            (
                prop::collection::vec(0u64..30, 1..4),
                prop::option::of("[a-z]{1,5}"),
            )
                .prop_map(|(numbers, tail)| {
                    let mut s = numbers
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(".");
                    if let Some(tail) = tail {
                        s.push('-');
                        s.push_str(&tail);
                    }
                    s
                })
        }

        proptest! {
            #[test]
            fn display_round_trips(s in version_string()) {
                let v = Version::parse(&s).unwrap();
                prop_assert_eq!(Version::parse(&v.to_string()).unwrap(), v);
            }

            #[test]
            fn trailing_zero_is_insignificant(s in version_string()) {
                let v = Version::parse(&s).unwrap();
                let padded = Version::parse(&format!("{s}.0")).unwrap();
                prop_assert_eq!(v, padded);
            }

            #[test]
            fn comparison_is_antisymmetric(a in version_string(), b in version_string()) {
                let a = Version::parse(&a).unwrap();
                let b = Version::parse(&b).unwrap();
                prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
            }

            #[test]
            fn queries_agree_with_ordering(a in version_string(), b in version_string()) {
                let a = Version::parse(&a).unwrap();
                let b = Version::parse(&b).unwrap();
                prop_assert_eq!(VersionQuery::Ge(b.clone()).matches(&a), a >= b);
                prop_assert_eq!(VersionQuery::Lt(b.clone()).matches(&a), a < b);
                prop_assert_eq!(VersionQuery::Eq(b.clone()).matches(&a), a == b);
            }
        }
    }
}

#![forbid(unsafe_code)]

//! Property routes: dot/bracket paths naming one field of a model.
//!
//! A route such as `address.city` or `hobbies[2].name` is the unit of
//! subscription in vigil. Field bindings key their subscriptions by route and
//! filter engine events by route equality, so two routes are the same field
//! only when their text is identical (no normalisation is applied beyond
//! trimming surrounding whitespace at parse time).

use std::borrow::Borrow;
use std::fmt;

/// Path string identifying one field within a (possibly nested) model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyRoute(String);

impl PropertyRoute {
    /// Create a route from raw text without validation.
    #[must_use]
    pub fn new(route: impl Into<String>) -> Self {
        Self(route.into())
    }

    /// Parse a declared binding target. Blank input yields `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_owned()))
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split the route into its segments.
    ///
    /// `hobbies[2].name` yields `["hobbies", "2", "name"]`. Empty segments
    /// (from `a..b` or a leading `[`) are skipped.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0
            .split(['.', '[', ']'])
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
    }
}

impl fmt::Display for PropertyRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for PropertyRoute {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PropertyRoute {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PropertyRoute {
    fn from(route: &str) -> Self {
        Self::new(route)
    }
}

impl From<String> for PropertyRoute {
    fn from(route: String) -> Self {
        Self(route)
    }
}

impl PartialEq<str> for PropertyRoute {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for PropertyRoute {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn parse_trims_and_rejects_blank() {
        assert_eq!(PropertyRoute::parse("  name "), Some(PropertyRoute::new("name")));
        assert_eq!(PropertyRoute::parse(""), None);
        assert_eq!(PropertyRoute::parse("   "), None);
    }

    #[test]
    fn segments_split_dots_and_brackets() {
        let route = PropertyRoute::new("hobbies[2].name");
        assert_eq!(route.segments().collect::<Vec<_>>(), vec!["hobbies", "2", "name"]);
    }

    #[test]
    fn flat_route_is_one_segment() {
        let route = PropertyRoute::new("age");
        assert_eq!(route.segments().collect::<Vec<_>>(), vec!["age"]);
    }

    #[test]
    fn map_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(PropertyRoute::new("address.city"), 1);
        assert_eq!(map.get("address.city"), Some(&1));
    }

    #[test]
    fn display_is_raw_text() {
        assert_eq!(PropertyRoute::new("a.b").to_string(), "a.b");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn parse_trims_or_rejects(raw in "[ \t]{0,3}[a-z0-9.\\[\\] ]{0,16}[ \t]{0,3}") {
                match PropertyRoute::parse(&raw) {
                    Some(route) => {
                        prop_assert_eq!(route.as_str(), raw.trim());
                        prop_assert!(!route.as_str().is_empty());
                    }
                    None => {
                        prop_assert!(raw.trim().is_empty());
                    }
                }
            }

            #[test]
            fn segments_are_never_empty(raw in "[a-z0-9.\\[\\] ]{0,24}") {
                let route = PropertyRoute::new(raw.clone());
                for segment in route.segments() {
                    prop_assert!(!segment.is_empty());
                    prop_assert!(!segment.contains(['.', '[', ']']));
                    prop_assert_eq!(segment, segment.trim());
                }
            }

            #[test]
            fn dotted_names_round_trip_through_segments(
                names in proptest::collection::vec("[a-z][a-z0-9]{0,6}", 1..5),
            ) {
                let route = PropertyRoute::new(names.join("."));
                let expected: Vec<&str> = names.iter().map(String::as_str).collect();
                prop_assert_eq!(route.segments().collect::<Vec<_>>(), expected);
            }
        }
    }
}

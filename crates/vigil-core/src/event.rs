#![forbid(unsafe_code)]

//! Events emitted by validation engines and by validated owners.

use std::collections::BTreeMap;

use crate::route::PropertyRoute;

/// Current error per property for one owner. Empty means the owner is valid.
pub type ModelErrors = BTreeMap<PropertyRoute, String>;

/// A property was (re-)evaluated by the validation engine.
///
/// Events are immutable once constructed. Within one property's stream they
/// arrive in evaluation order; across properties no order is implied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyStateChangedEvent {
    pub property: PropertyRoute,
    pub is_valid: bool,
    pub error: Option<String>,
}

impl PropertyStateChangedEvent {
    /// The property passed all of its rules.
    #[must_use]
    pub fn valid(property: impl Into<PropertyRoute>) -> Self {
        Self {
            property: property.into(),
            is_valid: true,
            error: None,
        }
    }

    /// The property failed with `error`.
    #[must_use]
    pub fn invalid(property: impl Into<PropertyRoute>, error: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            is_valid: false,
            error: Some(error.into()),
        }
    }

    /// Error text, treating an empty message the same as no message.
    #[must_use]
    pub fn effective_error(&self) -> Option<&str> {
        self.error.as_deref().filter(|error| !error.is_empty())
    }

    #[must_use]
    pub fn is_for(&self, route: &PropertyRoute) -> bool {
        self.property == *route
    }
}

/// Published by an owner whenever its aggregate validity flips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelStateChanged {
    pub is_valid: bool,
    pub errors: ModelErrors,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_validity() {
        let ok = PropertyStateChangedEvent::valid("name");
        assert!(ok.is_valid);
        assert_eq!(ok.error, None);

        let bad = PropertyStateChangedEvent::invalid("name", "required");
        assert!(!bad.is_valid);
        assert_eq!(bad.effective_error(), Some("required"));
    }

    #[test]
    fn empty_error_is_no_error() {
        let event = PropertyStateChangedEvent {
            property: PropertyRoute::new("name"),
            is_valid: false,
            error: Some(String::new()),
        };
        assert_eq!(event.effective_error(), None);
    }

    #[test]
    fn is_for_compares_exact_route() {
        let event = PropertyStateChangedEvent::valid("address.city");
        assert!(event.is_for(&PropertyRoute::new("address.city")));
        assert!(!event.is_for(&PropertyRoute::new("address")));
    }
}

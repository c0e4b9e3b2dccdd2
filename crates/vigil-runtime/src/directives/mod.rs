#![forbid(unsafe_code)]

//! Element-attachment directives.
//!
//! - [`ShowErrorDirective`] (`show-error`): one field, one property route,
//!   one view strategy.
//! - [`ValidationSummaryDirective`] (`validation-summary`): every property of
//!   one or more groups, rendered by a summary strategy.
//!
//! Both follow the host framework's `bind`/`unbind` lifecycle. A bind that
//! lacks what it needs (no group, no route, unknown strategy) does nothing and
//! reports why through [`BindOutcome`]; it never fails the component.

use std::fmt;

use crate::component::ValidationContext;
use crate::element::ElementRef;
use crate::engine::SharedGroup;

pub mod show_error;
pub mod validation_summary;

pub use show_error::ShowErrorDirective;
pub use validation_summary::ValidationSummaryDirective;

/// Value expression attached to a directive.
#[derive(Clone, Default)]
pub enum BindingValue {
    /// No expression: the owner's own group is used.
    #[default]
    None,
    Group(SharedGroup),
    Groups(Vec<SharedGroup>),
}

impl fmt::Debug for BindingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Group(_) => f.write_str("Group(..)"),
            Self::Groups(groups) => write!(f, "Groups(len = {})", groups.len()),
        }
    }
}

impl From<SharedGroup> for BindingValue {
    fn from(group: SharedGroup) -> Self {
        Self::Group(group)
    }
}

impl From<Vec<SharedGroup>> for BindingValue {
    fn from(groups: Vec<SharedGroup>) -> Self {
        Self::Groups(groups)
    }
}

/// What a bind did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindOutcome {
    /// Subscriptions were opened and tracked on the owner.
    Bound { subscriptions: usize },
    /// Neither the binding nor the owner supplied a validation group.
    NoValidationGroup,
    /// The element declares no property route.
    NoPropertyRoute,
    /// The requested strategy is not registered.
    UnknownStrategy(String),
}

impl BindOutcome {
    #[must_use]
    pub fn is_bound(&self) -> bool {
        matches!(self, Self::Bound { .. })
    }
}

/// An element-attachment directive.
pub trait Directive {
    fn bind(&self, element: &ElementRef, value: &BindingValue, owner: &ValidationContext)
    -> BindOutcome;

    /// Detach from `element`. Returns how many live subscriptions were
    /// cancelled.
    fn unbind(&self, element: &ElementRef, value: &BindingValue, owner: &ValidationContext)
    -> usize;
}

#![forbid(unsafe_code)]

//! Contract with the validation engine.
//!
//! The engine evaluates rules; vigil only consumes what it produces. A
//! [`Ruleset`] knows how to build a [`ValidationGroup`] over a model, and the
//! group exposes a live stream of [`PropertyStateChangedEvent`]s plus a
//! display-name lookup. [`create_group`] mirrors the engine's builder:
//!
//! ```ignore
//! let group = create_group()
//!     .as_reactive_group()
//!     .and_validate_on_start()
//!     .build(model, &ruleset);
//! ```

use std::rc::Rc;

use vigil_core::{PropertyRoute, PropertyStateChangedEvent};

use crate::reactive::EventStream;
use crate::virtual_model::ModelSource;

/// A live binding of one ruleset to one model.
pub trait ValidationGroup {
    /// Stream of per-property evaluation results.
    fn property_state_changed(&self) -> &EventStream<PropertyStateChangedEvent>;

    /// Human name for `route`. Groups without one return the route itself.
    fn property_display_name(&self, route: &PropertyRoute) -> String {
        route.to_string()
    }

    /// Stop evaluating and close the event stream. Must be idempotent; after
    /// it returns no further events may be delivered.
    fn release(&self);

    fn is_released(&self) -> bool;
}

/// Shared handle to a validation group.
pub type SharedGroup = Rc<dyn ValidationGroup>;

/// How a group should evaluate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupSettings {
    /// Re-evaluate whenever the model changes.
    pub reactive: bool,
    /// Evaluate every property once at construction.
    pub validate_on_start: bool,
}

/// Engine-side ruleset able to build groups.
pub trait Ruleset {
    fn build_group(&self, model: Rc<dyn ModelSource>, settings: GroupSettings) -> SharedGroup;
}

/// Builder for a validation group.
#[derive(Debug, Clone, Copy, Default)]
#[must_use]
pub struct GroupBuilder {
    settings: GroupSettings,
}

/// Start building a validation group.
pub fn create_group() -> GroupBuilder {
    GroupBuilder::default()
}

impl GroupBuilder {
    pub fn as_reactive_group(mut self) -> Self {
        self.settings.reactive = true;
        self
    }

    pub fn and_validate_on_start(mut self) -> Self {
        self.settings.validate_on_start = true;
        self
    }

    pub fn build(self, model: Rc<dyn ModelSource>, ruleset: &dyn Ruleset) -> SharedGroup {
        tracing::debug!(
            reactive = self.settings.reactive,
            validate_on_start = self.settings.validate_on_start,
            "building validation group"
        );
        ruleset.build_group(model, self.settings)
    }
}

/// Display name for `route` across `groups`.
///
/// A single group is asked directly. With several, every group is asked in
/// order and the last answer that differs from the route wins; if none
/// differs the route itself is returned.
pub fn resolve_display_name(groups: &[SharedGroup], route: &PropertyRoute) -> String {
    if let [only] = groups {
        return only.property_display_name(route);
    }
    groups
        .iter()
        .map(|group| group.property_display_name(route))
        .filter(|name| name != route.as_str())
        .last()
        .unwrap_or_else(|| route.to_string())
}

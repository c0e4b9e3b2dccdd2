#![forbid(unsafe_code)]

//! `show-error`: drive one field's view strategy from its property's events.
//!
//! # Bind
//!
//! 1. Resolve the owner's validation group, else no-op.
//! 2. Resolve the element's property route, else no-op.
//! 3. Resolve the element's view strategy (default `inline`), else no-op.
//! 4. Subscribe to the group's stream, filtered at subscribe time to events
//!    for that route, and park the handle on the owner under the route,
//!    cancelling any handle already parked there.
//!
//! Each delivered event calls the strategy with the field's *prior* state,
//! then records the new state, then updates the owner's `model_errors`.
//! Options are read once at bind time.
//!
//! # State machine
//!
//! `unknown → valid ⇄ invalid`. Nothing returns to `unknown`; unbind is
//! terminal.

use std::cell::Cell;
use std::rc::Rc;

use vigil_core::{ModelErrors, PropertyRoute, PropertyStateChangedEvent, ValidationState};

use super::{BindOutcome, BindingValue, Directive};
use crate::component::ValidationContext;
use crate::config::DEFAULT_VIEW_STRATEGY;
use crate::element::{ElementAttributes, ElementRef};
use crate::reactive::Tracked;
use crate::strategy::{ViewOptions, ViewStrategy, ViewStrategyRegistry};

/// Per-field controller living inside the subscription handler.
struct FieldController {
    element: ElementRef,
    route: PropertyRoute,
    strategy: Rc<dyn ViewStrategy>,
    options: ViewOptions,
    state: Cell<ValidationState>,
    model_errors: Tracked<ModelErrors>,
}

impl FieldController {
    fn handle(&self, event: &PropertyStateChangedEvent) {
        let prior = self.state.get();
        tracing::trace!(route = %self.route, %prior, is_valid = event.is_valid, "field event");
        match event.effective_error() {
            None => {
                self.strategy.property_become_valid(
                    self.element.as_ref(),
                    &self.route,
                    prior,
                    &self.options,
                );
                self.state.set(ValidationState::Valid);
                self.model_errors.update(|errors| {
                    errors.remove(&self.route);
                });
            }
            Some(error) => {
                self.strategy.property_become_invalid(
                    self.element.as_ref(),
                    error,
                    &self.route,
                    prior,
                    &self.options,
                );
                self.state.set(ValidationState::Invalid);
                self.model_errors.update(|errors| {
                    errors.insert(self.route.clone(), error.to_owned());
                });
            }
        }
    }
}

/// The `show-error` directive.
#[derive(Debug)]
pub struct ShowErrorDirective {
    strategies: Rc<ViewStrategyRegistry>,
    default_strategy: String,
    attributes: ElementAttributes,
}

impl ShowErrorDirective {
    pub fn new(strategies: Rc<ViewStrategyRegistry>) -> Self {
        Self {
            strategies,
            default_strategy: DEFAULT_VIEW_STRATEGY.to_owned(),
            attributes: ElementAttributes::default(),
        }
    }

    #[must_use]
    pub fn with_default_strategy(mut self, name: impl Into<String>) -> Self {
        self.default_strategy = name.into();
        self
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: ElementAttributes) -> Self {
        self.attributes = attributes;
        self
    }
}

impl Directive for ShowErrorDirective {
    fn bind(
        &self,
        element: &ElementRef,
        _value: &BindingValue,
        owner: &ValidationContext,
    ) -> BindOutcome {
        let Some(group) = owner.validation_group() else {
            tracing::debug!("show-error: owner has no validation group");
            return BindOutcome::NoValidationGroup;
        };
        let Some(route) = self.attributes.property_route_from(element.as_ref()) else {
            tracing::debug!("show-error: element declares no property route");
            return BindOutcome::NoPropertyRoute;
        };
        let name = self
            .attributes
            .view_strategy_from(element.as_ref())
            .unwrap_or_else(|| self.default_strategy.clone());
        let Some(strategy) = self.strategies.get_strategy_named(&name) else {
            tracing::debug!(route = %route, strategy = %name, "show-error: unknown view strategy");
            return BindOutcome::UnknownStrategy(name);
        };

        let controller = FieldController {
            element: Rc::clone(element),
            route: route.clone(),
            strategy,
            options: self.attributes.view_options_from(element.as_ref()),
            state: Cell::new(ValidationState::Unknown),
            model_errors: owner.model_errors_tracked().clone(),
        };
        let wanted = route.clone();
        let handle = group.property_state_changed().subscribe_filtered(
            move |event| controller.handle(event),
            move |event: &PropertyStateChangedEvent| event.is_for(&wanted),
        );

        let replaced = owner.with_metadata(|metadata| {
            metadata
                .validation_subscriptions
                .register(route.clone(), handle)
        });
        tracing::debug!(route = %route, strategy = %name, replaced, "show-error bound");
        BindOutcome::Bound { subscriptions: 1 }
    }

    fn unbind(
        &self,
        element: &ElementRef,
        _value: &BindingValue,
        owner: &ValidationContext,
    ) -> usize {
        let Some(route) = self.attributes.property_route_from(element.as_ref()) else {
            return 0;
        };
        let cancelled =
            owner.with_metadata(|metadata| metadata.validation_subscriptions.cancel(&route));
        tracing::debug!(route = %route, cancelled, "show-error unbound");
        usize::from(cancelled)
    }
}

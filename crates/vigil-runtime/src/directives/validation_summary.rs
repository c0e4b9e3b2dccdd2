#![forbid(unsafe_code)]

//! `validation-summary`: feed every property event of one or more groups
//! into a summary strategy.
//!
//! Target groups come from the binding value when it has one, else from the
//! owner. Each target gets its own unfiltered subscription, all parked in the
//! owner's summary list so unbind can cancel them together. Display names are
//! resolved per event across *all* targets (see [`resolve_display_name`]).

use std::rc::{Rc, Weak};

use vigil_core::{PropertyRoute, PropertyStateChangedEvent};

use super::{BindOutcome, BindingValue, Directive};
use crate::component::ValidationContext;
use crate::config::DEFAULT_SUMMARY_STRATEGY;
use crate::element::{ElementAttributes, ElementRef};
use crate::engine::{SharedGroup, ValidationGroup, resolve_display_name};
use crate::strategy::{SummaryStrategy, SummaryStrategyRegistry, ViewOptions};

/// Display-name lookup over the bound groups.
///
/// Holds the groups weakly: the handlers live inside the groups' own streams,
/// and a strong reference back would keep a released group alive.
struct DisplayNames {
    groups: Vec<Weak<dyn ValidationGroup>>,
}

impl DisplayNames {
    fn resolve(&self, route: &PropertyRoute) -> String {
        let live: Vec<SharedGroup> = self.groups.iter().filter_map(Weak::upgrade).collect();
        resolve_display_name(&live, route)
    }
}

/// Shared state of one summary bind.
struct SummaryController {
    element: ElementRef,
    strategy: Rc<dyn SummaryStrategy>,
    options: ViewOptions,
    names: DisplayNames,
}

impl SummaryController {
    fn handle(&self, event: &PropertyStateChangedEvent) {
        let display_name = self.names.resolve(&event.property);
        tracing::trace!(
            route = %event.property,
            %display_name,
            is_valid = event.is_valid,
            "summary event"
        );
        if event.is_valid {
            self.strategy
                .property_become_valid(self.element.as_ref(), &display_name, &self.options);
        } else {
            self.strategy.property_become_invalid(
                self.element.as_ref(),
                event.error.as_deref().unwrap_or_default(),
                &display_name,
                &self.options,
            );
        }
    }
}

/// The `validation-summary` directive.
#[derive(Debug)]
pub struct ValidationSummaryDirective {
    strategies: Rc<SummaryStrategyRegistry>,
    default_strategy: String,
    attributes: ElementAttributes,
}

impl ValidationSummaryDirective {
    pub fn new(strategies: Rc<SummaryStrategyRegistry>) -> Self {
        Self {
            strategies,
            default_strategy: DEFAULT_SUMMARY_STRATEGY.to_owned(),
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

fn target_groups(value: &BindingValue, owner: &ValidationContext) -> Option<Vec<SharedGroup>> {
    match value {
        BindingValue::Group(group) => Some(vec![Rc::clone(group)]),
        BindingValue::Groups(groups) => Some(groups.clone()),
        BindingValue::None => owner.validation_group().map(|group| vec![Rc::clone(group)]),
    }
}

impl Directive for ValidationSummaryDirective {
    fn bind(
        &self,
        element: &ElementRef,
        value: &BindingValue,
        owner: &ValidationContext,
    ) -> BindOutcome {
        let Some(groups) = target_groups(value, owner) else {
            tracing::debug!("validation-summary: no group to summarise");
            return BindOutcome::NoValidationGroup;
        };
        let name = self
            .attributes
            .summary_strategy_from(element.as_ref())
            .unwrap_or_else(|| self.default_strategy.clone());
        let Some(strategy) = self.strategies.get_strategy_named(&name) else {
            tracing::debug!(strategy = %name, "validation-summary: unknown summary strategy");
            return BindOutcome::UnknownStrategy(name);
        };

        let options = self.attributes.summary_options_from(element.as_ref());
        strategy.setup_container(element.as_ref(), &options);

        let controller = Rc::new(SummaryController {
            element: Rc::clone(element),
            strategy,
            options,
            names: DisplayNames {
                groups: groups.iter().map(Rc::downgrade).collect(),
            },
        });

        let handles: Vec<_> = groups
            .iter()
            .map(|group| {
                let controller = Rc::clone(&controller);
                group
                    .property_state_changed()
                    .subscribe(move |event| controller.handle(event))
            })
            .collect();
        let subscriptions = handles.len();
        owner.with_metadata(|metadata| {
            for handle in handles {
                metadata.summary_subscriptions.push(handle);
            }
        });
        tracing::debug!(strategy = %name, subscriptions, "validation-summary bound");
        BindOutcome::Bound { subscriptions }
    }

    fn unbind(
        &self,
        _element: &ElementRef,
        _value: &BindingValue,
        owner: &ValidationContext,
    ) -> usize {
        let cancelled =
            owner.with_metadata(|metadata| metadata.summary_subscriptions.cancel_all());
        tracing::debug!(cancelled, "validation-summary unbound");
        cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::BoundElement;
    use crate::reactive::EventStream;
    use std::any::Any;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct NamedGroup {
        names: HashMap<&'static str, &'static str>,
        stream: EventStream<PropertyStateChangedEvent>,
    }

    impl ValidationGroup for NamedGroup {
        fn property_state_changed(&self) -> &EventStream<PropertyStateChangedEvent> {
            &self.stream
        }
        fn property_display_name(&self, route: &PropertyRoute) -> String {
            self.names
                .get(route.as_str())
                .map_or_else(|| route.to_string(), |name| (*name).to_owned())
        }
        fn release(&self) {
            self.stream.close();
        }
        fn is_released(&self) -> bool {
            self.stream.is_closed()
        }
    }

    struct Container;

    impl BoundElement for Container {
        fn attribute(&self, _: &str) -> Option<String> {
            None
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[derive(Default)]
    struct Lines(RefCell<Vec<String>>);

    impl SummaryStrategy for Lines {
        fn setup_container(&self, _: &dyn BoundElement, _: &ViewOptions) {
            self.0.borrow_mut().push("setup".into());
        }
        fn property_become_valid(&self, _: &dyn BoundElement, name: &str, _: &ViewOptions) {
            self.0.borrow_mut().push(format!("ok {name}"));
        }
        fn property_become_invalid(
            &self,
            _: &dyn BoundElement,
            error: &str,
            name: &str,
            _: &ViewOptions,
        ) {
            self.0.borrow_mut().push(format!("{name}: {error}"));
        }
    }

    fn directive(lines: &Rc<Lines>) -> ValidationSummaryDirective {
        let registry = SummaryStrategyRegistry::new()
            .with("default", Rc::clone(lines) as Rc<dyn SummaryStrategy>);
        ValidationSummaryDirective::new(Rc::new(registry))
    }

    #[test]
    fn owner_group_is_default_target() {
        let group = Rc::new(NamedGroup::default());
        let ctx = ValidationContext::with_group(group.clone());
        let lines = Rc::new(Lines::default());
        let el: ElementRef = Rc::new(Container);

        let outcome = directive(&lines).bind(&el, &BindingValue::None, &ctx);
        assert_eq!(outcome, BindOutcome::Bound { subscriptions: 1 });

        group.stream.publish(&PropertyStateChangedEvent::invalid("name", "required"));
        group.stream.publish(&PropertyStateChangedEvent::valid("age"));
        assert_eq!(*lines.0.borrow(), vec!["setup", "name: required", "ok age"]);
    }

    #[test]
    fn explicit_groups_share_display_names() {
        let plain = Rc::new(NamedGroup::default());
        let named = Rc::new(NamedGroup {
            names: HashMap::from([("age", "Age (years)")]),
            ..NamedGroup::default()
        });
        let ctx = ValidationContext::detached();
        let lines = Rc::new(Lines::default());
        let el: ElementRef = Rc::new(Container);
        let value =
            BindingValue::Groups(vec![plain.clone() as SharedGroup, named.clone() as SharedGroup]);

        directive(&lines).bind(&el, &value, &ctx);
        plain.stream.publish(&PropertyStateChangedEvent::invalid("age", "required"));
        assert_eq!(lines.0.borrow().last().map(String::as_str), Some("Age (years): required"));
    }

    #[test]
    fn unbind_cancels_one_handle_per_group() {
        let groups: Vec<Rc<NamedGroup>> = (0..3).map(|_| Rc::new(NamedGroup::default())).collect();
        let shared: Vec<SharedGroup> = groups.iter().map(|g| g.clone() as SharedGroup).collect();
        let ctx = ValidationContext::detached();
        let lines = Rc::new(Lines::default());
        let el: ElementRef = Rc::new(Container);
        let value = BindingValue::Groups(shared);
        let directive = directive(&lines);

        directive.bind(&el, &value, &ctx);
        assert_eq!(directive.unbind(&el, &value, &ctx), 3);
        assert_eq!(directive.unbind(&el, &value, &ctx), 0);
        assert!(groups.iter().all(|g| g.stream.subscriber_count() == 0));
    }

    #[test]
    fn no_group_anywhere_is_noop() {
        let ctx = ValidationContext::detached();
        let lines = Rc::new(Lines::default());
        let el: ElementRef = Rc::new(Container);
        assert_eq!(
            directive(&lines).bind(&el, &BindingValue::None, &ctx),
            BindOutcome::NoValidationGroup
        );
        assert!(lines.0.borrow().is_empty());
    }

    #[test]
    fn unknown_strategy_skips_setup() {
        let ctx = ValidationContext::with_group(Rc::new(NamedGroup::default()));
        let lines = Rc::new(Lines::default());
        let el: ElementRef = Rc::new(Container);
        let directive = directive(&lines).with_default_strategy("fancy");
        assert_eq!(
            directive.bind(&el, &BindingValue::None, &ctx),
            BindOutcome::UnknownStrategy("fancy".into())
        );
        assert!(lines.0.borrow().is_empty());
    }
}

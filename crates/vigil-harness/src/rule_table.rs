#![forbid(unsafe_code)]

//! Rule-table validation engine.
//!
//! A [`RuleTable`] maps property routes to ordered rule closures. Each group
//! it builds evaluates those rules against its model source and publishes a
//! [`PropertyStateChangedEvent`] whenever a property's outcome changes. The
//! first failing rule supplies the error.
//!
//! Reactive groups re-evaluate on every model change notification; groups
//! built with validate-on-start evaluate every property once at build time.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use vigil_core::{PropertyRoute, PropertyStateChangedEvent, Value};
use vigil_runtime::{
    CancelHandle, EventStream, GroupSettings, ModelSource, Ruleset, SharedGroup, ValidationGroup,
    read_route,
};

/// One rule: `None` when the value passes, else the error message.
pub type Rule = Rc<dyn Fn(Option<&Value>) -> Option<String>>;

#[derive(Clone)]
struct PropertyRules {
    route: PropertyRoute,
    rules: Vec<Rule>,
}

/// Ruleset backed by per-property rule closures.
#[derive(Default)]
pub struct RuleTable {
    properties: Vec<PropertyRules>,
    display_names: BTreeMap<PropertyRoute, String>,
    built: RefCell<Vec<Weak<HarnessGroup>>>,
}

impl fmt::Debug for RuleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleTable")
            .field("routes", &self.routes().collect::<Vec<_>>())
            .field("display_names", &self.display_names)
            .field("live_groups", &self.built_groups().len())
            .finish()
    }
}

impl RuleTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `rule` to the rules for `route`.
    #[must_use]
    pub fn rule(
        mut self,
        route: impl Into<PropertyRoute>,
        rule: impl Fn(Option<&Value>) -> Option<String> + 'static,
    ) -> Self {
        let route = route.into();
        let rule: Rule = Rc::new(rule);
        match self.properties.iter_mut().find(|p| p.route == route) {
            Some(existing) => existing.rules.push(rule),
            None => self.properties.push(PropertyRules {
                route,
                rules: vec![rule],
            }),
        }
        self
    }

    #[must_use]
    pub fn display_name(
        mut self,
        route: impl Into<PropertyRoute>,
        name: impl Into<String>,
    ) -> Self {
        self.display_names.insert(route.into(), name.into());
        self
    }

    pub fn routes(&self) -> impl Iterator<Item = &PropertyRoute> {
        self.properties.iter().map(|p| &p.route)
    }

    /// Groups built by this table that are still alive, oldest first.
    ///
    /// The table only observes its groups; whoever built them owns them.
    #[must_use]
    pub fn built_groups(&self) -> Vec<Rc<HarnessGroup>> {
        self.built.borrow().iter().filter_map(Weak::upgrade).collect()
    }

    /// Most recently built group that is still alive.
    #[must_use]
    pub fn last_group(&self) -> Option<Rc<HarnessGroup>> {
        self.built.borrow().iter().rev().find_map(Weak::upgrade)
    }

    /// Build a group directly, without going through the runtime.
    pub fn group(&self, model: Rc<dyn ModelSource>, settings: GroupSettings) -> Rc<HarnessGroup> {
        let group = HarnessGroup::build(
            model,
            Rc::new(self.properties.clone()),
            self.display_names.clone(),
            settings,
        );
        let mut built = self.built.borrow_mut();
        built.retain(|weak| weak.strong_count() > 0);
        built.push(Rc::downgrade(&group));
        drop(built);
        group
    }
}

impl Ruleset for RuleTable {
    fn build_group(&self, model: Rc<dyn ModelSource>, settings: GroupSettings) -> SharedGroup {
        self.group(model, settings)
    }
}

/// Group built by a [`RuleTable`].
pub struct HarnessGroup {
    model: Rc<dyn ModelSource>,
    properties: Rc<Vec<PropertyRules>>,
    display_names: BTreeMap<PropertyRoute, String>,
    settings: GroupSettings,
    stream: EventStream<PropertyStateChangedEvent>,
    outcomes: RefCell<BTreeMap<PropertyRoute, Option<String>>>,
    watch: RefCell<Option<CancelHandle>>,
    release_calls: Cell<u32>,
}

impl fmt::Debug for HarnessGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HarnessGroup")
            .field("settings", &self.settings)
            .field("outcomes", &self.outcomes.borrow())
            .field("release_calls", &self.release_calls.get())
            .finish_non_exhaustive()
    }
}

impl HarnessGroup {
    fn build(
        model: Rc<dyn ModelSource>,
        properties: Rc<Vec<PropertyRules>>,
        display_names: BTreeMap<PropertyRoute, String>,
        settings: GroupSettings,
    ) -> Rc<Self> {
        let group = Rc::new_cyclic(|this: &Weak<Self>| {
            let watch = if settings.reactive {
                let this = this.clone();
                model.watch(Rc::new(move || {
                    if let Some(group) = this.upgrade() {
                        group.validate();
                    }
                }))
            } else {
                None
            };
            Self {
                model,
                properties,
                display_names,
                settings,
                stream: EventStream::new(),
                outcomes: RefCell::default(),
                watch: RefCell::new(watch),
                release_calls: Cell::new(0),
            }
        });
        tracing::debug!(
            reactive = settings.reactive,
            validate_on_start = settings.validate_on_start,
            watching = group.watch.borrow().is_some(),
            "harness group built"
        );
        if settings.validate_on_start {
            group.validate();
        }
        group
    }

    #[must_use]
    pub fn settings(&self) -> GroupSettings {
        self.settings
    }

    /// Evaluate every property. Returns how many events were published.
    pub fn validate(&self) -> usize {
        self.properties
            .iter()
            .filter(|p| self.evaluate(p))
            .count()
    }

    /// Evaluate one property. Returns whether an event was published.
    pub fn validate_property(&self, route: &PropertyRoute) -> bool {
        self.properties
            .iter()
            .find(|p| p.route == *route)
            .is_some_and(|p| self.evaluate(p))
    }

    /// Publish `event` as-is, bypassing the rules. Returns deliveries.
    pub fn emit(&self, event: &PropertyStateChangedEvent) -> usize {
        self.stream.publish(event)
    }

    /// Last outcome for `route`: `Some(None)` valid, `Some(Some(e))` invalid.
    #[must_use]
    pub fn outcome(&self, route: &PropertyRoute) -> Option<Option<String>> {
        self.outcomes.borrow().get(route).cloned()
    }

    /// How many times `release` was called, including no-op repeats.
    #[must_use]
    pub fn release_calls(&self) -> u32 {
        self.release_calls.get()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.stream.subscriber_count()
    }

    fn evaluate(&self, property: &PropertyRules) -> bool {
        if self.is_released() {
            return false;
        }
        let value = read_route(self.model.as_ref(), &property.route);
        let error = property.rules.iter().find_map(|rule| rule(value.as_ref()));

        {
            let mut outcomes = self.outcomes.borrow_mut();
            if outcomes.get(&property.route) == Some(&error) {
                return false;
            }
            outcomes.insert(property.route.clone(), error.clone());
        }

        tracing::trace!(route = %property.route, error = ?error, "property evaluated");
        let event = match error {
            None => PropertyStateChangedEvent::valid(property.route.clone()),
            Some(error) => PropertyStateChangedEvent::invalid(property.route.clone(), error),
        };
        self.stream.publish(&event);
        true
    }
}

impl ValidationGroup for HarnessGroup {
    fn property_state_changed(&self) -> &EventStream<PropertyStateChangedEvent> {
        &self.stream
    }

    fn property_display_name(&self, route: &PropertyRoute) -> String {
        self.display_names
            .get(route)
            .cloned()
            .unwrap_or_else(|| route.to_string())
    }

    fn release(&self) {
        let calls = self.release_calls.get() + 1;
        self.release_calls.set(calls);
        if calls > 1 {
            return;
        }
        let watch = self.watch.borrow_mut().take();
        if let Some(watch) = watch {
            watch.cancel();
        }
        let dropped = self.stream.close();
        tracing::debug!(dropped, "harness group released");
    }

    fn is_released(&self) -> bool {
        self.release_calls.get() > 0
    }
}

/// Common rules.
pub mod rules {
    use vigil_core::Value;

    fn is_blank(value: Option<&Value>) -> bool {
        match value {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(Value::Array(items)) => items.is_empty(),
            Some(_) => false,
        }
    }

    fn char_len(value: Option<&Value>) -> Option<usize> {
        match value {
            Some(Value::String(s)) => Some(s.chars().count()),
            Some(Value::Array(items)) => Some(items.len()),
            _ => None,
        }
    }

    /// Fails on absent, null, blank strings and empty arrays.
    pub fn required(message: &str) -> impl Fn(Option<&Value>) -> Option<String> + 'static {
        let message = message.to_owned();
        move |value: Option<&Value>| is_blank(value).then(|| message.clone())
    }

    /// Fails when a string or array is shorter than `min`. Blank passes.
    pub fn min_length(
        min: usize,
        message: &str,
    ) -> impl Fn(Option<&Value>) -> Option<String> + 'static {
        let message = message.to_owned();
        move |value: Option<&Value>| {
            let short = !is_blank(value) && char_len(value).is_some_and(|len| len < min);
            short.then(|| message.clone())
        }
    }

    /// Fails when a string or array is longer than `max`.
    pub fn max_length(
        max: usize,
        message: &str,
    ) -> impl Fn(Option<&Value>) -> Option<String> + 'static {
        let message = message.to_owned();
        move |value: Option<&Value>| {
            char_len(value)
                .is_some_and(|len| len > max)
                .then(|| message.clone())
        }
    }

    /// Fails when a present value is neither a number nor a numeric string.
    pub fn number(message: &str) -> impl Fn(Option<&Value>) -> Option<String> + 'static {
        let message = message.to_owned();
        move |value: Option<&Value>| {
            let ok = match value {
                None | Some(Value::Null) | Some(Value::Number(_)) => true,
                Some(Value::String(s)) => s.trim().is_empty() || s.trim().parse::<f64>().is_ok(),
                Some(_) => false,
            };
            (!ok).then(|| message.clone())
        }
    }
}

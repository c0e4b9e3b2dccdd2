#![forbid(unsafe_code)]

//! View and summary strategies, and the registries that name them.
//!
//! Strategies are the rendering side: they turn a field's valid/invalid
//! transition (or a summary entry) into changes on the bound element. vigil
//! never renders anything itself; it only decides *when* a strategy is called
//! and with which prior state.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use vigil_core::{PropertyRoute, ValidationState, Value};

use crate::element::BoundElement;

/// Per-element option bag, read from the element's declarative attributes.
pub type ViewOptions = serde_json::Map<String, Value>;

/// Renders one field's validity.
pub trait ViewStrategy {
    fn property_become_valid(
        &self,
        element: &dyn BoundElement,
        route: &PropertyRoute,
        prior: ValidationState,
        options: &ViewOptions,
    );

    fn property_become_invalid(
        &self,
        element: &dyn BoundElement,
        error: &str,
        route: &PropertyRoute,
        prior: ValidationState,
        options: &ViewOptions,
    );
}

/// Renders an aggregate list of property errors.
pub trait SummaryStrategy {
    /// Prepare the container element. Called once per bind.
    fn setup_container(&self, element: &dyn BoundElement, options: &ViewOptions);

    fn property_become_valid(
        &self,
        element: &dyn BoundElement,
        display_name: &str,
        options: &ViewOptions,
    );

    fn property_become_invalid(
        &self,
        element: &dyn BoundElement,
        error: &str,
        display_name: &str,
        options: &ViewOptions,
    );
}

/// Name → strategy lookup.
pub struct StrategyRegistry<S: ?Sized> {
    entries: BTreeMap<String, Rc<S>>,
}

pub type ViewStrategyRegistry = StrategyRegistry<dyn ViewStrategy>;
pub type SummaryStrategyRegistry = StrategyRegistry<dyn SummaryStrategy>;

impl<S: ?Sized> Default for StrategyRegistry<S> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<S: ?Sized> fmt::Debug for StrategyRegistry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("names", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<S: ?Sized> StrategyRegistry<S> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `strategy` under `name`, returning any strategy it replaced.
    pub fn register(&mut self, name: impl Into<String>, strategy: Rc<S>) -> Option<Rc<S>> {
        self.entries.insert(name.into(), strategy)
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, strategy: Rc<S>) -> Self {
        self.register(name, strategy);
        self
    }

    #[must_use]
    pub fn get_strategy_named(&self, name: &str) -> Option<Rc<S>> {
        self.entries.get(name).cloned()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

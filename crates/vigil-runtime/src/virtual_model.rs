#![forbid(unsafe_code)]

//! Read-through view over a component's state for validation engines.
//!
//! A [`VirtualModel`] answers `get(name)` from up to three ordered sources and
//! stops at the first hit:
//!
//! 1. the component's own state,
//! 2. its input parameters (only when `validate_props` is on),
//! 3. its computed values (only when `validate_computed` is on).
//!
//! A name found nowhere reads as `None`; engines must treat that as an absent
//! value, never as a failure of the read itself. The model is read-only: no
//! write path exists.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use vigil_core::{PropertyRoute, Value};

use crate::config::GroupOptions;
use crate::reactive::{CancelHandle, Tracked};

/// Component state keyed by top-level property name.
pub type StateMap = BTreeMap<String, Value>;

/// Capability to read named values, plus an optional change signal.
pub trait ModelSource {
    /// Value stored under `name`. `Some(Value::Null)` means present-but-null.
    fn get(&self, name: &str) -> Option<Value>;

    /// Invoke `on_change` whenever the source changes. Sources without a
    /// change signal return `None`.
    fn watch(&self, on_change: Rc<dyn Fn()>) -> Option<CancelHandle> {
        let _ = on_change;
        None
    }
}

impl ModelSource for StateMap {
    fn get(&self, name: &str) -> Option<Value> {
        BTreeMap::get(self, name).cloned()
    }
}

impl ModelSource for Tracked<StateMap> {
    fn get(&self, name: &str) -> Option<Value> {
        self.with(|state| state.get(name).cloned())
    }

    fn watch(&self, on_change: Rc<dyn Fn()>) -> Option<CancelHandle> {
        Some(self.subscribe(move |_| on_change()))
    }
}

/// Computed values: named getters evaluated on every read.
#[derive(Default)]
pub struct ComputedValues {
    getters: BTreeMap<String, Box<dyn Fn() -> Value>>,
}

impl ComputedValues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, getter: impl Fn() -> Value + 'static) -> Self {
        self.insert(name, getter);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, getter: impl Fn() -> Value + 'static) {
        self.getters.insert(name.into(), Box::new(getter));
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.getters.keys().map(String::as_str)
    }
}

impl fmt::Debug for ComputedValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.getters.keys()).finish()
    }
}

impl ModelSource for ComputedValues {
    fn get(&self, name: &str) -> Option<Value> {
        self.getters.get(name).map(|getter| getter())
    }
}

/// Ordered composition of own state, input parameters and computed values.
#[derive(Clone)]
pub struct VirtualModel {
    own: Rc<dyn ModelSource>,
    props: Option<Rc<dyn ModelSource>>,
    computed: Option<Rc<dyn ModelSource>>,
}

impl VirtualModel {
    /// A model reading only the component's own state.
    pub fn new(own: Rc<dyn ModelSource>) -> Self {
        Self {
            own,
            props: None,
            computed: None,
        }
    }

    /// Fall through to input parameters after own state.
    #[must_use]
    pub fn with_props(mut self, props: Rc<dyn ModelSource>) -> Self {
        self.props = Some(props);
        self
    }

    /// Fall through to computed values after own state and parameters.
    #[must_use]
    pub fn with_computed(mut self, computed: Rc<dyn ModelSource>) -> Self {
        self.computed = Some(computed);
        self
    }

    /// Build the model for `host`, enabling the fallbacks `options` ask for.
    pub fn for_host(host: &dyn ComponentHost, options: &GroupOptions) -> Self {
        let mut model = Self::new(host.own_state());
        if options.validate_props
            && let Some(props) = host.props()
        {
            model = model.with_props(props);
        }
        if options.validate_computed
            && let Some(computed) = host.computed()
        {
            model = model.with_computed(computed);
        }
        model
    }

    #[must_use]
    pub fn reads_props(&self) -> bool {
        self.props.is_some()
    }

    #[must_use]
    pub fn reads_computed(&self) -> bool {
        self.computed.is_some()
    }
}

impl fmt::Debug for VirtualModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualModel")
            .field("reads_props", &self.reads_props())
            .field("reads_computed", &self.reads_computed())
            .finish_non_exhaustive()
    }
}

impl ModelSource for VirtualModel {
    fn get(&self, name: &str) -> Option<Value> {
        self.own
            .get(name)
            .or_else(|| self.props.as_ref().and_then(|props| props.get(name)))
            .or_else(|| self.computed.as_ref().and_then(|computed| computed.get(name)))
    }

    fn watch(&self, on_change: Rc<dyn Fn()>) -> Option<CancelHandle> {
        let sources = [Some(&self.own), self.props.as_ref(), self.computed.as_ref()];
        let handles: Vec<CancelHandle> = sources
            .into_iter()
            .flatten()
            .filter_map(|source| source.watch(Rc::clone(&on_change)))
            .collect();
        if handles.is_empty() {
            None
        } else {
            Some(CancelHandle::join(handles))
        }
    }
}

/// Read a possibly nested route: the root through `source`, the rest by
/// walking object keys and array indices.
pub fn read_route(source: &dyn ModelSource, route: &PropertyRoute) -> Option<Value> {
    let mut segments = route.segments();
    let mut current = source.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Value::Object(mut map) => map.remove(segment)?,
            Value::Array(mut items) => {
                let index: usize = segment.parse().ok()?;
                if index >= items.len() {
                    return None;
                }
                items.swap_remove(index)
            }
            _ => return None,
        };
    }
    Some(current)
}

/// The hooks a host component exposes to the validation mixin.
pub trait ComponentHost {
    fn own_state(&self) -> Rc<dyn ModelSource>;

    fn props(&self) -> Option<Rc<dyn ModelSource>> {
        None
    }

    fn computed(&self) -> Option<Rc<dyn ModelSource>> {
        None
    }
}

/// Ready-made host: reactive own state, reactive parameters, computed getters.
#[derive(Debug, Clone)]
pub struct ComponentState {
    pub data: Tracked<StateMap>,
    pub props: Tracked<StateMap>,
    pub computed: Rc<ComputedValues>,
}

impl Default for ComponentState {
    fn default() -> Self {
        Self::new(StateMap::new())
    }
}

impl ComponentState {
    #[must_use]
    pub fn new(data: StateMap) -> Self {
        Self {
            data: Tracked::new(data),
            props: Tracked::new(StateMap::new()),
            computed: Rc::new(ComputedValues::new()),
        }
    }

    #[must_use]
    pub fn with_props(mut self, props: StateMap) -> Self {
        self.props = Tracked::new(props);
        self
    }

    #[must_use]
    pub fn with_computed(mut self, computed: ComputedValues) -> Self {
        self.computed = Rc::new(computed);
        self
    }

    /// Set one own-state property, notifying watchers if it changed.
    pub fn set(&self, name: impl Into<String>, value: Value) -> bool {
        let name = name.into();
        self.data.update(|state| {
            state.insert(name, value);
        })
    }
}

impl ComponentHost for ComponentState {
    fn own_state(&self) -> Rc<dyn ModelSource> {
        Rc::new(self.data.clone())
    }

    fn props(&self) -> Option<Rc<dyn ModelSource>> {
        Some(Rc::new(self.props.clone()))
    }

    fn computed(&self) -> Option<Rc<dyn ModelSource>> {
        let computed: Rc<dyn ModelSource> = self.computed.clone();
        Some(computed)
    }
}

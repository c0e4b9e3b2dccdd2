#![forbid(unsafe_code)]

//! Runtime: binds validation groups to component fields and summaries.
//!
//! # Role in vigil
//! `vigil-runtime` sits between a validation engine and a component UI. It
//! attaches a validation group to a component's state, routes the group's
//! per-property events to the right field renderer, aggregates events from
//! one or more groups into a summary, and tracks every subscription so that
//! teardown is deterministic.
//!
//! # Primary responsibilities
//! - **Reactive primitives**: [`EventStream`], [`CancelHandle`], [`Tracked`].
//! - **Subscription registry**: [`OwnerMetadata`] per component instance.
//! - **Virtual model**: [`VirtualModel`] read-through over state, params and
//!   computed values.
//! - **Group lifecycle**: [`ValidateWith`] and [`ValidationContext`].
//! - **Directives**: [`ShowErrorDirective`] and [`ValidationSummaryDirective`],
//!   installed by [`ValidationPlugin`].
//!
//! # Threading
//! Everything is single-threaded (`Rc`/`RefCell`). Lifecycle calls and event
//! deliveries are expected to come from one dispatch loop, in order.

pub mod component;
pub mod config;
pub mod directives;
pub mod element;
pub mod engine;
pub mod plugin;
pub mod reactive;
pub mod registry;
pub mod strategy;
pub mod virtual_model;

pub use component::{ValidateWith, ValidationContext};
pub use config::{BindingDefaults, GroupOptions, PluginConfig};
pub use directives::{
    BindOutcome, BindingValue, Directive, ShowErrorDirective, ValidationSummaryDirective,
};
pub use element::{BoundElement, ElementAttributes, ElementRef};
pub use engine::{
    GroupBuilder, GroupSettings, Ruleset, SharedGroup, ValidationGroup, create_group,
    resolve_display_name,
};
pub use plugin::{DirectiveTable, SHOW_ERROR, VALIDATION_SUMMARY, ValidationPlugin};
pub use reactive::{CancelHandle, EventStream, Tracked};
pub use registry::{OwnerMetadata, SubscriptionList, SubscriptionRegistry};
pub use strategy::{
    StrategyRegistry, SummaryStrategy, SummaryStrategyRegistry, ViewOptions, ViewStrategy,
    ViewStrategyRegistry,
};
pub use virtual_model::{
    ComponentHost, ComponentState, ComputedValues, ModelSource, StateMap, VirtualModel,
    read_route,
};

#[cfg(feature = "options-config")]
pub use config::ConfigError;

pub use vigil_core::{
    ModelErrors, ModelStateChanged, PropertyRoute, PropertyStateChangedEvent, ValidationState,
    Value,
};

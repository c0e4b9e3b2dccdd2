#![forbid(unsafe_code)]

//! Core: the data model shared by every vigil crate.
//!
//! # Role in vigil
//! `vigil-core` owns the plain values that flow between a validation engine
//! and the UI bindings: the [`PropertyRoute`] naming a field, the per-field
//! [`ValidationState`], and the [`PropertyStateChangedEvent`] an engine emits
//! whenever a property's validity is re-evaluated.
//!
//! # How it fits in the system
//! The runtime (`vigil-runtime`) subscribes to streams of these events and
//! routes them to view strategies. Nothing in this crate holds shared or
//! mutable state; everything is cheap to clone and compare.

pub mod event;
pub mod logging;
pub mod route;
pub mod state;

pub use event::{ModelErrors, ModelStateChanged, PropertyStateChangedEvent};
pub use route::PropertyRoute;
pub use state::ValidationState;

/// Dynamic model value read by validation engines.
pub use serde_json::Value;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};

#![forbid(unsafe_code)]

//! Test harness and reference fixtures for vigil.
//!
//! - [`RuleTable`]: a minimal validation engine. Per-property rule closures
//!   evaluated against the group's model source.
//! - [`RecordingViewStrategy`] / [`RecordingSummaryStrategy`]: strategies
//!   that record every call for assertions.
//! - [`FakeElement`]: an attribute bag standing in for a UI element.

pub mod element;
pub mod recording;
pub mod rule_table;

use std::rc::Rc;
use std::sync::Once;

use vigil_runtime::{
    SummaryStrategy, SummaryStrategyRegistry, ViewStrategy, ViewStrategyRegistry,
};

pub use element::{FakeElement, element_id};
pub use recording::{RecordingSummaryStrategy, RecordingViewStrategy, SummaryCall, ViewCall};
pub use rule_table::{HarnessGroup, Rule, RuleTable, rules};

/// Install a test-writer subscriber once per process. Honors `RUST_LOG`.
pub fn init_test_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// View registry with `strategy` under the default name `inline`.
pub fn view_registry(strategy: &Rc<RecordingViewStrategy>) -> Rc<ViewStrategyRegistry> {
    Rc::new(ViewStrategyRegistry::new().with(
        vigil_runtime::config::DEFAULT_VIEW_STRATEGY,
        Rc::clone(strategy) as Rc<dyn ViewStrategy>,
    ))
}

/// Summary registry with `strategy` under the default name `default`.
pub fn summary_registry(strategy: &Rc<RecordingSummaryStrategy>) -> Rc<SummaryStrategyRegistry> {
    Rc::new(SummaryStrategyRegistry::new().with(
        vigil_runtime::config::DEFAULT_SUMMARY_STRATEGY,
        Rc::clone(strategy) as Rc<dyn SummaryStrategy>,
    ))
}

#![forbid(unsafe_code)]

//! Strategies that record every call they receive.

use std::cell::RefCell;

use vigil_core::{PropertyRoute, ValidationState};
use vigil_runtime::{BoundElement, SummaryStrategy, ViewOptions, ViewStrategy};

use crate::element::element_id;

/// One call into a [`RecordingViewStrategy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCall {
    Valid {
        element: String,
        route: String,
        prior: ValidationState,
    },
    Invalid {
        element: String,
        route: String,
        error: String,
        prior: ValidationState,
    },
}

impl ViewCall {
    #[must_use]
    pub fn prior(&self) -> ValidationState {
        match self {
            Self::Valid { prior, .. } | Self::Invalid { prior, .. } => *prior,
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }
}

#[derive(Debug, Default)]
pub struct RecordingViewStrategy {
    calls: RefCell<Vec<ViewCall>>,
    options: RefCell<Vec<ViewOptions>>,
}

impl RecordingViewStrategy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn calls(&self) -> Vec<ViewCall> {
        self.calls.borrow().clone()
    }

    /// Drain recorded calls.
    pub fn take(&self) -> Vec<ViewCall> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.borrow().is_empty()
    }

    /// Options seen with each call, in call order.
    #[must_use]
    pub fn options_seen(&self) -> Vec<ViewOptions> {
        self.options.borrow().clone()
    }

    fn record(&self, call: ViewCall, options: &ViewOptions) {
        self.calls.borrow_mut().push(call);
        self.options.borrow_mut().push(options.clone());
    }
}

impl ViewStrategy for RecordingViewStrategy {
    fn property_become_valid(
        &self,
        element: &dyn BoundElement,
        route: &PropertyRoute,
        prior: ValidationState,
        options: &ViewOptions,
    ) {
        let call = ViewCall::Valid {
            element: element_id(element),
            route: route.to_string(),
            prior,
        };
        self.record(call, options);
    }

    fn property_become_invalid(
        &self,
        element: &dyn BoundElement,
        error: &str,
        route: &PropertyRoute,
        prior: ValidationState,
        options: &ViewOptions,
    ) {
        let call = ViewCall::Invalid {
            element: element_id(element),
            route: route.to_string(),
            error: error.to_owned(),
            prior,
        };
        self.record(call, options);
    }
}

/// One call into a [`RecordingSummaryStrategy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryCall {
    Setup { element: String },
    Valid { display_name: String },
    Invalid { display_name: String, error: String },
}

#[derive(Debug, Default)]
pub struct RecordingSummaryStrategy {
    calls: RefCell<Vec<SummaryCall>>,
}

impl RecordingSummaryStrategy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn calls(&self) -> Vec<SummaryCall> {
        self.calls.borrow().clone()
    }

    pub fn take(&self) -> Vec<SummaryCall> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.borrow().is_empty()
    }
}

impl SummaryStrategy for RecordingSummaryStrategy {
    fn setup_container(&self, element: &dyn BoundElement, _options: &ViewOptions) {
        self.calls.borrow_mut().push(SummaryCall::Setup {
            element: element_id(element),
        });
    }

    fn property_become_valid(
        &self,
        _element: &dyn BoundElement,
        display_name: &str,
        _options: &ViewOptions,
    ) {
        self.calls.borrow_mut().push(SummaryCall::Valid {
            display_name: display_name.to_owned(),
        });
    }

    fn property_become_invalid(
        &self,
        _element: &dyn BoundElement,
        error: &str,
        display_name: &str,
        _options: &ViewOptions,
    ) {
        self.calls.borrow_mut().push(SummaryCall::Invalid {
            display_name: display_name.to_owned(),
            error: error.to_owned(),
        });
    }
}

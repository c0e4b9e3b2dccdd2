#![forbid(unsafe_code)]

//! Group lifecycle for validated components.
//!
//! [`ValidateWith`] is the mixin a component opts into: on creation it
//! builds a [`VirtualModel`] over the host, asks the ruleset for a validation
//! group configured from [`GroupOptions`], and returns the per-instance
//! [`ValidationContext`]. The context carries what the directives need:
//! the group, the `model_errors` map, and the owner's subscription metadata.
//!
//! # Invariants
//!
//! 1. `is_valid()` is true iff `model_errors` is empty.
//! 2. `model_errors` is only written by field bindings on this owner.
//! 3. Teardown cancels every tracked subscription, then releases the group,
//!    exactly once. Nothing is delivered to any binding afterwards.
//! 4. `model_state_changed` fires only when `is_valid()` flips.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use vigil_core::{ModelErrors, ModelStateChanged};

use crate::config::GroupOptions;
use crate::engine::{Ruleset, SharedGroup, create_group};
use crate::reactive::{CancelHandle, EventStream, Tracked};
use crate::registry::OwnerMetadata;
use crate::virtual_model::{ComponentHost, VirtualModel};

/// Mixin definition: a ruleset plus the options to apply it with.
#[derive(Clone)]
pub struct ValidateWith {
    ruleset: Rc<dyn Ruleset>,
    options: GroupOptions,
}

impl fmt::Debug for ValidateWith {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidateWith")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ValidateWith {
    pub fn new(ruleset: Rc<dyn Ruleset>) -> Self {
        Self {
            ruleset,
            options: GroupOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: GroupOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn options(&self) -> &GroupOptions {
        &self.options
    }

    /// Creation hook: build the group for `host` and the owner's context.
    pub fn created(&self, host: &dyn ComponentHost) -> ValidationContext {
        let model = Rc::new(VirtualModel::for_host(host, &self.options));
        let mut builder = create_group();
        if self.options.with_reactive_validation {
            builder = builder.as_reactive_group();
        }
        if self.options.validate_on_start {
            builder = builder.and_validate_on_start();
        }
        let group = builder.build(model, self.ruleset.as_ref());
        ValidationContext::with_group(group)
    }
}

/// Per-instance validation state of one owner.
pub struct ValidationContext {
    group: Option<SharedGroup>,
    model_errors: Tracked<ModelErrors>,
    model_state_changed: EventStream<ModelStateChanged>,
    metadata: RefCell<OwnerMetadata>,
    validity_watch: RefCell<Option<CancelHandle>>,
    destroyed: Cell<bool>,
}

impl fmt::Debug for ValidationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationContext")
            .field("has_group", &self.group.is_some())
            .field("model_errors", &self.model_errors)
            .field("metadata", &self.metadata.borrow())
            .field("destroyed", &self.destroyed.get())
            .finish()
    }
}

impl ValidationContext {
    /// Context for an owner validated by `group`.
    pub fn with_group(group: SharedGroup) -> Self {
        Self::build(Some(group))
    }

    /// Context for an owner without the mixin. Directives still get
    /// metadata to park subscriptions in, but `show-error` binds are no-ops.
    #[must_use]
    pub fn detached() -> Self {
        Self::build(None)
    }

    fn build(group: Option<SharedGroup>) -> Self {
        let model_errors = Tracked::new(ModelErrors::new());
        let model_state_changed = EventStream::new();

        let was_valid = Cell::new(true);
        let notify = model_state_changed.clone();
        let watch = model_errors.subscribe(move |errors: &ModelErrors| {
            let is_valid = errors.is_empty();
            if was_valid.replace(is_valid) != is_valid {
                tracing::debug!(is_valid, errors = errors.len(), "model state changed");
                notify.publish(&ModelStateChanged {
                    is_valid,
                    errors: errors.clone(),
                });
            }
        });

        Self {
            group,
            model_errors,
            model_state_changed,
            metadata: RefCell::new(OwnerMetadata::new()),
            validity_watch: RefCell::new(Some(watch)),
            destroyed: Cell::new(false),
        }
    }

    #[must_use]
    pub fn validation_group(&self) -> Option<&SharedGroup> {
        self.group.as_ref()
    }

    /// Snapshot of the current error per property.
    #[must_use]
    pub fn model_errors(&self) -> ModelErrors {
        self.model_errors.get()
    }

    /// Read the current errors without cloning.
    pub fn with_model_errors<R>(&self, f: impl FnOnce(&ModelErrors) -> R) -> R {
        self.model_errors.with(f)
    }

    /// Writable errors map. Only field bindings on this owner write to it.
    pub(crate) fn model_errors_tracked(&self) -> &Tracked<ModelErrors> {
        &self.model_errors
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.model_errors.with(ModelErrors::is_empty)
    }

    /// Published whenever [`is_valid`](Self::is_valid) flips.
    #[must_use]
    pub fn model_state_changed(&self) -> &EventStream<ModelStateChanged> {
        &self.model_state_changed
    }

    /// Run `f` with exclusive access to the owner's subscription metadata.
    pub fn with_metadata<R>(&self, f: impl FnOnce(&mut OwnerMetadata) -> R) -> R {
        f(&mut *self.metadata.borrow_mut())
    }

    /// Live subscriptions still tracked for this owner.
    #[must_use]
    pub fn outstanding_subscriptions(&self) -> usize {
        self.metadata.borrow().outstanding()
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    /// Teardown hook. Cancels every tracked subscription, then releases the
    /// group as the final step. Returns `false` if already torn down.
    pub fn destroy(&self) -> bool {
        if self.destroyed.replace(true) {
            return false;
        }
        let _span = tracing::debug_span!("validation_context.destroy").entered();

        // Take the handles out first so cancellation runs without the borrow.
        let mut metadata = std::mem::take(&mut *self.metadata.borrow_mut());
        let cancelled = metadata.cancel_all();

        let watch = self.validity_watch.borrow_mut().take();
        if let Some(watch) = watch {
            watch.cancel();
        }
        self.model_state_changed.close();

        if let Some(group) = &self.group {
            group.release();
        }
        tracing::debug!(cancelled, "validated owner torn down");
        true
    }
}

impl Drop for ValidationContext {
    fn drop(&mut self) {
        self.destroy();
    }
}

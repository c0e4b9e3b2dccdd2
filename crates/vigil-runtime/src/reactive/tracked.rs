#![forbid(unsafe_code)]

//! Version-tracked shared value.
//!
//! [`Tracked<T>`] backs the reactive parts of a validated owner: its own
//! state map, its input parameters, and its `model_errors`. Change
//! notification is delegated to an [`EventStream<T>`], so subscribers get the
//! same cancel semantics as every other subscription in vigil.
//!
//! # Invariants
//!
//! 1. `version` increments by exactly 1 on each value-changing mutation.
//! 2. A mutation that leaves the value equal (by `PartialEq`) notifies nobody.
//! 3. Subscribers receive a snapshot of the new value; no borrow of the value
//!    is held while they run, so they may read or mutate it again.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use super::event_stream::{CancelHandle, EventStream};

struct TrackedInner<T> {
    value: RefCell<T>,
    version: Cell<u64>,
    changes: EventStream<T>,
}

/// A shared, version-tracked value with change notification.
///
/// Cloning a `Tracked` creates a new handle to the **same** value.
pub struct Tracked<T> {
    inner: Rc<TrackedInner<T>>,
}

impl<T> Clone for Tracked<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Tracked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracked")
            .field("value", &self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .finish()
    }
}

impl<T: Default + Clone + PartialEq + 'static> Default for Tracked<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + PartialEq + 'static> Tracked<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(TrackedInner {
                value: RefCell::new(value),
                version: Cell::new(0),
                changes: EventStream::new(),
            }),
        }
    }

    #[must_use]
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Read the value by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&*self.inner.value.borrow())
    }

    /// Replace the value. Returns whether it changed.
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return false;
            }
            *current = value;
        }
        self.changed();
        true
    }

    /// Mutate the value in place. Returns whether it changed.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        let changed = {
            let mut current = self.inner.value.borrow_mut();
            let before = current.clone();
            f(&mut *current);
            *current != before
        };
        if changed {
            self.changed();
        }
        changed
    }

    /// Subscribe to changes. The callback receives the new value.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> CancelHandle {
        self.inner.changes.subscribe(callback)
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.changes.subscriber_count()
    }

    fn changed(&self) {
        self.inner.version.set(self.inner.version.get() + 1);
        let snapshot = self.get();
        self.inner.changes.publish(&snapshot);
    }
}

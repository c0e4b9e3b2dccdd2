#![forbid(unsafe_code)]

//! Per-owner subscription bookkeeping.
//!
//! Every subscription a directive opens is parked here so the owner can tear
//! it down deterministically. Field subscriptions are keyed by property
//! route (one per route); summary subscriptions are a flat list.
//!
//! # Invariants
//!
//! 1. At most one handle per key. Registering over an existing key cancels
//!    the old handle before storing the new one.
//! 2. A handle leaves the registry only by being cancelled.
//! 3. `cancel_all` on an empty registry is a no-op.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use vigil_core::PropertyRoute;

use crate::reactive::CancelHandle;

/// Keyed map of cancelable subscriptions.
pub struct SubscriptionRegistry<K> {
    handles: HashMap<K, CancelHandle>,
}

impl<K> Default for SubscriptionRegistry<K> {
    fn default() -> Self {
        Self {
            handles: HashMap::new(),
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for SubscriptionRegistry<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.handles.iter()).finish()
    }
}

impl<K: Eq + Hash> SubscriptionRegistry<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `handle` under `key`, cancelling any handle already there.
    /// Returns whether a previous handle was replaced.
    pub fn register(&mut self, key: K, handle: CancelHandle) -> bool {
        match self.handles.insert(key, handle) {
            Some(previous) => {
                previous.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel and forget the handle under `key`. Returns whether a live
    /// handle was cancelled.
    pub fn cancel<Q>(&mut self, key: &Q) -> bool
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.handles
            .remove(key)
            .is_some_and(|handle| handle.cancel())
    }

    /// Cancel and forget every handle. Returns how many were still live.
    pub fn cancel_all(&mut self) -> usize {
        self.handles
            .drain()
            .filter(|(_, handle)| handle.cancel())
            .count()
    }

    #[must_use]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.handles.contains_key(key)
    }

    /// Number of handles that can still deliver events.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.handles.values().filter(|h| h.is_active()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// Ordered list of cancelable subscriptions.
#[derive(Debug, Default)]
pub struct SubscriptionList {
    handles: Vec<CancelHandle>,
}

impl SubscriptionList {
    pub fn push(&mut self, handle: CancelHandle) {
        self.handles.push(handle);
    }

    /// Cancel every handle and drain the list. Returns how many were live.
    pub fn cancel_all(&mut self) -> usize {
        self.handles
            .drain(..)
            .filter(|handle| handle.cancel())
            .count()
    }

    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.handles.iter().filter(|h| h.is_active()).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// Subscriptions owned by one component instance.
#[derive(Debug, Default)]
pub struct OwnerMetadata {
    /// `show-error` bindings, one per property route.
    pub validation_subscriptions: SubscriptionRegistry<PropertyRoute>,
    /// `validation-summary` bindings, one per summarised group.
    pub summary_subscriptions: SubscriptionList,
}

impl OwnerMetadata {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel everything the owner still holds.
    pub fn cancel_all(&mut self) -> usize {
        self.validation_subscriptions.cancel_all() + self.summary_subscriptions.cancel_all()
    }

    /// Live handles across both collections. Zero after teardown.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.validation_subscriptions.outstanding() + self.summary_subscriptions.outstanding()
    }
}

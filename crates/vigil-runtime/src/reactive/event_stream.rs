#![forbid(unsafe_code)]

//! Multicast event stream with subscribe-time filtering and cancel handles.
//!
//! # Design
//!
//! [`EventStream<E>`] keeps its subscribers in shared, reference-counted
//! storage (`Rc<RefCell<..>>`). Each subscriber is a slot holding the
//! handler, an optional predicate, and a liveness flag. The same flag is
//! shared with the [`CancelHandle`] handed back to the caller.
//!
//! Publishing snapshots the live slots, releases the borrow, then walks the
//! snapshot. Before each invocation the slot's flag is re-checked, which is
//! what makes cancellation immediate: a handler cancelled by an earlier
//! handler in the same dispatch is skipped.
//!
//! # Failure Modes
//!
//! - **Cancel during a stream borrow**: cannot happen from user code, because
//!   no borrow is held across callbacks. If it ever did, the slot is already
//!   dead (flag cleared) and is pruned on the next publish.
//! - **Handle leak**: a [`CancelHandle`] cancels itself on drop, so losing the
//!   handle detaches the subscriber. Holding handles forever keeps handlers
//!   (and whatever they capture) alive.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Handler<E> = Rc<dyn Fn(&E)>;
type Predicate<E> = Rc<dyn Fn(&E) -> bool>;

struct Slot<E> {
    id: u64,
    handler: Handler<E>,
    predicate: Option<Predicate<E>>,
    live: Rc<Cell<bool>>,
}

// Manual Clone: `E` itself need not be Clone.
impl<E> Clone for Slot<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            handler: Rc::clone(&self.handler),
            predicate: self.predicate.clone(),
            live: Rc::clone(&self.live),
        }
    }
}

struct StreamInner<E> {
    next_id: u64,
    slots: Vec<Slot<E>>,
    closed: bool,
}

/// A shared, single-threaded stream of events of type `E`.
///
/// Cloning an `EventStream` creates a new handle to the **same** stream.
pub struct EventStream<E> {
    inner: Rc<RefCell<StreamInner<E>>>,
}

impl<E> Clone for EventStream<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E: 'static> Default for EventStream<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventStream<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("EventStream")
            .field("subscribers", &inner.slots.len())
            .field("closed", &inner.closed)
            .finish()
    }
}

impl<E: 'static> EventStream<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(StreamInner {
                next_id: 0,
                slots: Vec::new(),
                closed: false,
            })),
        }
    }

    /// Subscribe to every event on the stream.
    pub fn subscribe(&self, handler: impl Fn(&E) + 'static) -> CancelHandle {
        self.attach(Rc::new(handler), None)
    }

    /// Subscribe to the events accepted by `predicate`.
    ///
    /// The predicate runs at the stream boundary: rejected events never reach
    /// `handler`.
    pub fn subscribe_filtered(
        &self,
        handler: impl Fn(&E) + 'static,
        predicate: impl Fn(&E) -> bool + 'static,
    ) -> CancelHandle {
        self.attach(Rc::new(handler), Some(Rc::new(predicate)))
    }

    fn attach(&self, handler: Handler<E>, predicate: Option<Predicate<E>>) -> CancelHandle {
        let live = Rc::new(Cell::new(true));
        let id = {
            let mut inner = self.inner.borrow_mut();
            if inner.closed {
                return CancelHandle::cancelled();
            }
            let id = inner.next_id;
            inner.next_id += 1;
            inner.slots.push(Slot {
                id,
                handler,
                predicate,
                live: Rc::clone(&live),
            });
            id
        };
        let stream = Rc::downgrade(&self.inner);
        CancelHandle {
            live,
            detach: RefCell::new(Some(Box::new(move || detach_slot(&stream, id)))),
        }
    }

    /// Deliver `event` to every live, matching subscriber in registration
    /// order. Returns the number of handlers invoked.
    pub fn publish(&self, event: &E) -> usize {
        let _span = tracing::trace_span!("event_stream.publish").entered();
        let slots: Vec<Slot<E>> = {
            let mut inner = self.inner.borrow_mut();
            if inner.closed {
                return 0;
            }
            inner.slots.retain(|slot| slot.live.get());
            inner.slots.clone()
        };

        let mut delivered = 0;
        for slot in &slots {
            if !slot.live.get() {
                continue;
            }
            if let Some(predicate) = &slot.predicate
                && !predicate(event)
            {
                continue;
            }
            (slot.handler)(event);
            delivered += 1;
        }
        delivered
    }

    /// Terminate the stream. Every subscriber is detached, later publishes
    /// deliver nothing, and later subscriptions are born cancelled.
    ///
    /// Returns the number of subscribers that were still live.
    pub fn close(&self) -> usize {
        let slots = {
            let mut inner = self.inner.borrow_mut();
            inner.closed = true;
            std::mem::take(&mut inner.slots)
        };
        // Handlers are dropped here, outside the borrow.
        slots.iter().filter(|slot| slot.live.replace(false)).count()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.borrow().closed
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .borrow()
            .slots
            .iter()
            .filter(|slot| slot.live.get())
            .count()
    }
}

fn detach_slot<E>(stream: &Weak<RefCell<StreamInner<E>>>, id: u64) {
    let Some(inner) = stream.upgrade() else {
        return;
    };
    let Ok(mut guard) = inner.try_borrow_mut() else {
        return;
    };
    guard.slots.retain(|slot| slot.id != id);
}

/// Opaque cancel token for one subscription.
///
/// Cancelling is idempotent and takes effect before [`cancel`](Self::cancel)
/// returns. Dropping the handle cancels it.
pub struct CancelHandle {
    live: Rc<Cell<bool>>,
    detach: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl CancelHandle {
    /// A handle that runs `on_cancel` the first time it is cancelled.
    pub fn new(on_cancel: impl FnOnce() + 'static) -> Self {
        Self {
            live: Rc::new(Cell::new(true)),
            detach: RefCell::new(Some(Box::new(on_cancel))),
        }
    }

    /// A handle that is already cancelled.
    #[must_use]
    pub fn cancelled() -> Self {
        Self {
            live: Rc::new(Cell::new(false)),
            detach: RefCell::new(None),
        }
    }

    /// Combine several handles into one that cancels them all.
    pub fn join(handles: impl IntoIterator<Item = CancelHandle>) -> Self {
        let handles: Vec<CancelHandle> = handles.into_iter().collect();
        Self::new(move || {
            for handle in &handles {
                handle.cancel();
            }
        })
    }

    /// Cancel the subscription. Returns `true` only for the call that
    /// actually cancelled it.
    pub fn cancel(&self) -> bool {
        let was_live = self.live.replace(false);
        let detach = self.detach.borrow_mut().take();
        if !was_live {
            return false;
        }
        if let Some(detach) = detach {
            detach();
        }
        true
    }

    /// Whether the subscription can still receive events.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.live.get()
    }
}

impl Drop for CancelHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle")
            .field("active", &self.is_active())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> (Rc<Cell<u32>>, impl Fn(&u32) + 'static) {
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        (count, move |_: &u32| count_clone.set(count_clone.get() + 1))
    }

    #[test]
    fn publish_reaches_subscriber() {
        let stream = EventStream::new();
        let (count, handler) = counter();
        let _sub = stream.subscribe(handler);

        assert_eq!(stream.publish(&1), 1);
        assert_eq!(stream.publish(&2), 1);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn predicate_filters_before_handler() {
        let stream = EventStream::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let _sub = stream.subscribe_filtered(
            move |v: &u32| seen_clone.borrow_mut().push(*v),
            |v| v % 2 == 0,
        );

        for v in 1..=6 {
            stream.publish(&v);
        }
        assert_eq!(*seen.borrow(), vec![2, 4, 6]);
    }

    #[test]
    fn rejected_event_is_not_counted() {
        let stream = EventStream::new();
        let _sub = stream.subscribe_filtered(|_: &u32| {}, |_| false);
        assert_eq!(stream.publish(&1), 0);
    }

    #[test]
    fn cancel_is_idempotent() {
        let stream = EventStream::new();
        let (count, handler) = counter();
        let sub = stream.subscribe(handler);

        assert!(sub.cancel());
        assert!(!sub.cancel());
        assert!(!sub.is_active());

        stream.publish(&1);
        assert_eq!(count.get(), 0);
        assert_eq!(stream.subscriber_count(), 0);
    }

    #[test]
    fn drop_cancels() {
        let stream = EventStream::new();
        let (count, handler) = counter();
        let sub = stream.subscribe(handler);
        drop(sub);

        stream.publish(&1);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn cancel_during_dispatch_skips_later_handler() {
        let stream = EventStream::new();
        let victim: Rc<RefCell<Option<CancelHandle>>> = Rc::new(RefCell::new(None));

        let victim_clone = Rc::clone(&victim);
        let _first = stream.subscribe(move |_: &u32| {
            if let Some(handle) = victim_clone.borrow().as_ref() {
                handle.cancel();
            }
        });
        let (count, handler) = counter();
        *victim.borrow_mut() = Some(stream.subscribe(handler));

        assert_eq!(stream.publish(&1), 1);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn registration_order() {
        let stream = EventStream::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let subs: Vec<CancelHandle> = ['A', 'B', 'C']
            .into_iter()
            .map(|tag| {
                let log = Rc::clone(&log);
                stream.subscribe(move |_: &u32| log.borrow_mut().push(tag))
            })
            .collect();

        stream.publish(&0);
        assert_eq!(*log.borrow(), vec!['A', 'B', 'C']);
        drop(subs);
    }

    #[test]
    fn close_detaches_everything() {
        let stream = EventStream::new();
        let (count, handler) = counter();
        let sub = stream.subscribe(handler);

        assert_eq!(stream.close(), 1);
        assert!(stream.is_closed());
        assert!(!sub.is_active());
        assert_eq!(stream.publish(&1), 0);
        assert_eq!(count.get(), 0);
        // Already detached by close.
        assert!(!sub.cancel());
    }

    #[test]
    fn subscribe_after_close_is_born_cancelled() {
        let stream: EventStream<u32> = EventStream::new();
        stream.close();
        let sub = stream.subscribe(|_| {});
        assert!(!sub.is_active());
        assert_eq!(stream.subscriber_count(), 0);
    }

    #[test]
    fn reentrant_publish_from_handler() {
        let stream = EventStream::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let inner_stream = stream.clone();
        let log_clone = Rc::clone(&log);
        let _sub = stream.subscribe(move |v: &u32| {
            log_clone.borrow_mut().push(*v);
            if *v == 1 {
                inner_stream.publish(&2);
            }
        });

        stream.publish(&1);
        assert_eq!(*log.borrow(), vec![1, 2]);
    }

    #[test]
    fn subscriber_added_during_dispatch_misses_current_event() {
        let stream = EventStream::new();
        let late: Rc<RefCell<Option<CancelHandle>>> = Rc::new(RefCell::new(None));
        let (count, handler) = counter();
        let handler = Rc::new(handler);

        let stream_clone = stream.clone();
        let late_clone = Rc::clone(&late);
        let _sub = stream.subscribe(move |_: &u32| {
            if late_clone.borrow().is_none() {
                let handler = Rc::clone(&handler);
                *late_clone.borrow_mut() = Some(stream_clone.subscribe(move |v| (*handler)(v)));
            }
        });

        stream.publish(&1);
        assert_eq!(count.get(), 0);
        stream.publish(&2);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn join_cancels_all_parts() {
        let a: EventStream<u32> = EventStream::new();
        let b: EventStream<u32> = EventStream::new();
        let joined = CancelHandle::join([a.subscribe(|_| {}), b.subscribe(|_| {})]);
        assert_eq!(a.subscriber_count() + b.subscriber_count(), 2);

        assert!(joined.cancel());
        assert_eq!(a.subscriber_count() + b.subscriber_count(), 0);
    }

    #[test]
    fn custom_handle_runs_once() {
        let runs = Rc::new(Cell::new(0));
        let runs_clone = Rc::clone(&runs);
        let handle = CancelHandle::new(move || runs_clone.set(runs_clone.get() + 1));
        handle.cancel();
        handle.cancel();
        drop(handle);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn debug_format() {
        let stream: EventStream<u32> = EventStream::new();
        let dbg = format!("{stream:?}");
        assert!(dbg.contains("EventStream"));
        assert!(dbg.contains("closed"));
    }
}

#![forbid(unsafe_code)]

//! Reactive primitives for vigil.
//!
//! - [`EventStream`]: a single-threaded multicast stream with optional
//!   subscribe-time filtering.
//! - [`CancelHandle`]: opaque cancel token returned by every subscription.
//! - [`Tracked`]: a shared, version-tracked value that publishes changes on an
//!   internal [`EventStream`].
//!
//! # Architecture
//!
//! Streams use `Rc<RefCell<..>>` for single-threaded shared ownership. Each
//! subscriber owns a liveness flag shared with its [`CancelHandle`]; dispatch
//! checks the flag immediately before each delivery, so cancellation takes
//! effect before `cancel()` returns, even for a dispatch already in flight.
//!
//! # Invariants
//!
//! 1. Subscribers are invoked in registration order.
//! 2. A filtered subscriber's handler is never invoked for an event its
//!    predicate rejects.
//! 3. Cancelling a handle more than once is a no-op.
//! 4. After [`EventStream::close`] no handler is invoked again and new
//!    subscriptions are born cancelled.
//! 5. No stream borrow is held while user callbacks run; handlers may publish,
//!    subscribe or cancel re-entrantly.

pub mod event_stream;
pub mod tracked;

pub use event_stream::{CancelHandle, EventStream};
pub use tracked::Tracked;

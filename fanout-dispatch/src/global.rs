//! Process-wide dispatcher singleton for programs with exactly one
//! dispatcher.
//!
//! The constructor-based [`Dispatcher`](crate::Dispatcher) form is the
//! primary API; this façade is a thin convenience layered on top of it. The
//! payload type is fixed to the type-erased [`AnyPayload`] carrier.

use std::any::Any;
use std::sync::Arc;

use lazy_static::lazy_static;

use crate::dispatcher::Dispatcher;
use crate::error::DispatchError;

/// Type-erased payload moved through the process-wide dispatcher.
pub type AnyPayload = Arc<dyn Any + Send + Sync>;

lazy_static! {
    static ref GLOBAL_DISPATCHER: Dispatcher<AnyPayload> = Dispatcher::new();
}

/// Starts the process-wide dispatcher. Mirrors
/// [`Dispatcher::start`](crate::Dispatcher::start).
pub async fn start(workers: usize, jobs_per_worker: usize) -> Result<(), DispatchError> {
    GLOBAL_DISPATCHER.start(workers, jobs_per_worker).await
}

/// Stops the process-wide dispatcher. Mirrors
/// [`Dispatcher::stop`](crate::Dispatcher::stop).
pub async fn stop() -> Result<(), DispatchError> {
    GLOBAL_DISPATCHER.stop().await
}

/// Non-blocking snapshot of the process-wide dispatcher's lifecycle state.
pub fn is_running() -> bool {
    GLOBAL_DISPATCHER.is_running()
}

/// Borrows the underlying dispatcher for route registration and pub/sub.
pub fn instance() -> &'static Dispatcher<AnyPayload> {
    &GLOBAL_DISPATCHER
}

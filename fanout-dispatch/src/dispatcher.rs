/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::sync::RwLock as StdRwLock;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::config::DispatchConfig;
use crate::control_plane::lifecycle::WorkerLifecycle;
use crate::control_plane::route_table::{RouteId, RouteTable};
use crate::data_plane::channel_pool::ChannelPool;
use crate::data_plane::delivery_channel::{DeliveryChannel, DELIVERY_BUFFER};
use crate::data_plane::fanout_worker::Job;
use crate::error::DispatchError;
use crate::observability::events;

const COMPONENT: &str = "dispatcher";

/// Error type injected id generators may fail with; it propagates wrapped as
/// [`DispatchError::IdGenerator`].
pub type IdGenError = Box<dyn std::error::Error + Send + Sync>;

/// A [`Dispatcher`] fans type-erased messages out from many publishers to
/// many subscribers, keyed by opaque 128-bit route identifiers.
///
/// [`publish`](Dispatcher::publish) is a non-blocking enqueue onto a bounded
/// job queue; a pool of workers drains the queue and delivers each payload to
/// every channel subscribed to its route with non-blocking sends, so a slow
/// or absent subscriber never blocks publishers or other subscribers.
///
/// Construction is total: a fresh dispatcher is a valid, stopped handle.
/// Publishing to or unsubscribing from a stopped dispatcher is an intentional
/// no-op so that shutdown races at the caller do not spuriously error.
///
/// # Examples
///
/// ```
/// use fanout_dispatch::Dispatcher;
/// use uuid::Uuid;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let dispatcher = Dispatcher::<&'static str>::new();
/// dispatcher.start(2, 10).await.unwrap();
///
/// let id = dispatcher.get_new_id(|| Ok(Uuid::new_v4())).await.unwrap();
/// let channel = dispatcher.subscribe(id).await.unwrap();
///
/// dispatcher.publish(id, "update").unwrap();
/// assert_eq!(channel.recv().await, Some("update"));
///
/// dispatcher.unsubscribe(id, &channel).await.unwrap();
/// dispatcher.stop().await.unwrap();
///
/// // Dropped silently once stopped.
/// assert!(dispatcher.publish(id, "late").is_ok());
/// # });
/// ```
pub struct Dispatcher<T: Clone + Send + 'static> {
    routes: Arc<RouteTable<T>>,
    outbound: ChannelPool,
    running: AtomicBool,
    lifecycle: Mutex<WorkerLifecycle<T>>,
    // Publisher-side queue endpoint. Read-locked only, never held across an
    // await, so `publish` stays synchronous.
    job_tx: StdRwLock<Option<mpsc::Sender<Job<T>>>>,
}

impl<T: Clone + Send + 'static> Dispatcher<T> {
    /// Creates a stopped dispatcher.
    pub fn new() -> Self {
        Self {
            routes: Arc::new(RouteTable::new()),
            outbound: ChannelPool::new(Box::new(|| {
                Box::new(DeliveryChannel::<T>::new(DELIVERY_BUFFER))
            })),
            running: AtomicBool::new(false),
            lifecycle: Mutex::new(WorkerLifecycle::new()),
            job_tx: StdRwLock::new(None),
        }
    }

    /// Starts the worker pool.
    ///
    /// Zero arguments fall back to the defaults (10 workers, 10 jobs per
    /// worker); the job queue is allocated with capacity
    /// `workers * jobs_per_worker`. Must be called within a tokio runtime.
    ///
    /// # Errors
    ///
    /// [`DispatchError::AlreadyRunning`] when the dispatcher is running.
    pub async fn start(&self, workers: usize, jobs_per_worker: usize) -> Result<(), DispatchError> {
        let mut lifecycle = self.lifecycle.lock().await;
        if self.running.load(Ordering::Relaxed) {
            return Err(DispatchError::AlreadyRunning);
        }

        let config = DispatchConfig::new(workers, jobs_per_worker);
        let job_tx = lifecycle.start(&config, self.routes.clone());
        if let Ok(mut slot) = self.job_tx.write() {
            *slot = Some(job_tx);
        }
        self.running.store(true, Ordering::Relaxed);
        Ok(())
    }

    /// Stops the worker pool: fires the shutdown signal, waits for every
    /// worker to exit, discards undelivered jobs, and clears the route
    /// table. Routes do not survive a restart.
    ///
    /// # Errors
    ///
    /// [`DispatchError::NotRunning`] when the dispatcher is stopped.
    pub async fn stop(&self) -> Result<(), DispatchError> {
        let mut lifecycle = self.lifecycle.lock().await;
        if !self.running.load(Ordering::Relaxed) {
            return Err(DispatchError::NotRunning);
        }

        self.running.store(false, Ordering::Relaxed);
        if let Ok(mut slot) = self.job_tx.write() {
            *slot = None;
        }
        lifecycle.stop().await;
        self.routes.clear().await;
        Ok(())
    }

    /// Non-blocking snapshot of the lifecycle state.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Mints a fresh route id through the injected generator and registers
    /// an empty route for it.
    ///
    /// # Errors
    ///
    /// [`DispatchError::NotRunning`] when stopped;
    /// [`DispatchError::IdGenerator`] wrapping a generator failure;
    /// [`DispatchError::IdCollision`] when the generator yields an id that is
    /// already registered. A collision is a generator bug, not a transient
    /// condition, so it is surfaced rather than retried.
    pub async fn get_new_id<F>(&self, generator: F) -> Result<RouteId, DispatchError>
    where
        F: FnOnce() -> Result<Uuid, IdGenError>,
    {
        if !self.is_running() {
            return Err(DispatchError::NotRunning);
        }

        let id = generator().map_err(DispatchError::IdGenerator)?;
        self.routes.register(id).await?;
        Ok(id)
    }

    /// Attaches a fresh delivery channel to the route and returns it.
    ///
    /// Subscribing to the same id repeatedly yields distinct channels; each
    /// must be unsubscribed independently.
    ///
    /// # Errors
    ///
    /// [`DispatchError::IdNotSet`] for the nil id;
    /// [`DispatchError::NotRunning`] when stopped;
    /// [`DispatchError::RouteNotFound`] for an unregistered id;
    /// [`DispatchError::PoolTypeMismatch`] when the channel pool's factory
    /// yields the wrong element shape.
    pub async fn subscribe(&self, id: RouteId) -> Result<DeliveryChannel<T>, DispatchError> {
        if id.is_nil() {
            return Err(DispatchError::IdNotSet);
        }
        if !self.is_running() {
            return Err(DispatchError::NotRunning);
        }
        if !self.routes.contains(&id).await {
            return Err(DispatchError::RouteNotFound(id));
        }

        let channel = self.outbound.acquire::<DeliveryChannel<T>>()?;
        match self.routes.attach_subscriber(id, channel.clone()).await {
            Ok(()) => Ok(channel),
            Err(err) => {
                // The route vanished between the check and the attach (a
                // concurrent stop); hand the channel back.
                self.outbound.release(channel);
                Err(err)
            }
        }
    }

    /// Detaches a channel from the route, drains whatever it still buffers,
    /// and returns it to the channel pool.
    ///
    /// Unsubscribing from a stopped dispatcher is benign and returns
    /// success.
    ///
    /// # Errors
    ///
    /// [`DispatchError::IdNotSet`] for the nil id;
    /// [`DispatchError::RouteNotFound`] for an unregistered id;
    /// [`DispatchError::ChannelNotFound`] when the channel is not among the
    /// route's subscribers.
    pub async fn unsubscribe(
        &self,
        id: RouteId,
        channel: &DeliveryChannel<T>,
    ) -> Result<(), DispatchError> {
        if id.is_nil() {
            return Err(DispatchError::IdNotSet);
        }
        if !self.is_running() {
            return Ok(());
        }

        let removed = self.routes.detach_subscriber(id, channel).await?;
        match removed.drain_pending() {
            Some(_) => self.outbound.release(removed),
            None => {
                // A reader still holds the receiver; dropping the channel is
                // cheaper than pooling one with live traffic on it.
                debug!(
                    event = events::POOL_SKIP_CONTENDED,
                    component = COMPONENT,
                    route_id = %id,
                    channel_id = removed.id(),
                    "skipping pool return for contended channel"
                );
            }
        }
        Ok(())
    }

    /// Enqueues a payload for fan-out to the route's subscribers and returns
    /// immediately. Never suspends.
    ///
    /// Publishing to a stopped dispatcher silently drops the payload.
    ///
    /// # Errors
    ///
    /// [`DispatchError::IdNotSet`] for the nil id;
    /// [`DispatchError::JobsAtLimit`] when the bounded job queue is full;
    /// this is the sole back-pressure signal, and the only retryable error.
    pub fn publish(&self, id: RouteId, payload: T) -> Result<(), DispatchError> {
        if !self.is_running() {
            return Ok(());
        }
        if id.is_nil() {
            return Err(DispatchError::IdNotSet);
        }

        let slot = match self.job_tx.read() {
            Ok(slot) => slot,
            Err(_) => return Ok(()),
        };
        let Some(job_tx) = slot.as_ref() else {
            return Ok(());
        };

        match job_tx.try_send(Job::new(id, payload)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(DispatchError::JobsAtLimit),
            // Raced a concurrent stop; dead-dispatcher publishes are dropped.
            Err(TrySendError::Closed(_)) => Ok(()),
        }
    }

    /// Reports whether a route is registered under `id`.
    pub async fn has_route(&self, id: RouteId) -> bool {
        self.routes.contains(&id).await
    }

    /// Number of channels currently subscribed to a route, or `None` when
    /// the route is not registered.
    pub async fn subscriber_count(&self, id: RouteId) -> Option<usize> {
        self.routes.subscriber_count(&id).await
    }

    #[cfg(test)]
    pub(crate) fn outbound(&self) -> &ChannelPool {
        &self.outbound
    }
}

impl<T: Clone + Send + 'static> Default for Dispatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

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

//! Multiplexer façade that deduplicates subscriptions per route id and hands
//! out reference-counted pipes over one shared delivery channel.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::control_plane::route_table::RouteId;
use crate::data_plane::delivery_channel::DeliveryChannel;
use crate::dispatcher::Dispatcher;
use crate::error::DispatchError;
use crate::observability::events;

const COMPONENT: &str = "mux";

/// Per-route refcounted binding state.
struct MuxRecord<T> {
    channel: DeliveryChannel<T>,
    ref_count: usize,
}

/// State shared between a [`Mux`] and every [`Pipe`] it has handed out.
struct MuxShared<T: Clone + Send + 'static> {
    dispatcher: Arc<Dispatcher<T>>,
    records: Mutex<HashMap<RouteId, MuxRecord<T>>>,
}

/// A [`Mux`] wraps a [`Dispatcher`] to offer deduplicated subscriptions.
///
/// The dispatcher allocates one channel per `subscribe` call, but many
/// subscriber surfaces should share one underlying channel. The mux
/// concentrates that sharing: the first subscription to an id creates the
/// channel, later ones increment a refcount and wrap the same channel, and
/// [`Pipe::release`] tears the binding down deterministically once the last
/// pipe is gone.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use fanout_dispatch::{Dispatcher, Mux};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let dispatcher = Arc::new(Dispatcher::<&'static str>::new());
/// dispatcher.start(0, 0).await.unwrap();
///
/// let mux = Mux::new(dispatcher.clone());
/// let id = mux.get_id().await.unwrap();
///
/// let first = mux.subscribe(id).await.unwrap();
/// let second = mux.subscribe(id).await.unwrap();
/// // Both pipes share one underlying channel.
/// assert_eq!(dispatcher.subscriber_count(id).await, Some(1));
///
/// first.release().await.unwrap();
/// second.release().await.unwrap();
/// assert_eq!(dispatcher.subscriber_count(id).await, Some(0));
/// # });
/// ```
pub struct Mux<T: Clone + Send + 'static> {
    shared: Arc<MuxShared<T>>,
    minted: Mutex<HashSet<RouteId>>,
}

impl<T: Clone + Send + 'static> Mux<T> {
    /// Creates a mux over the given dispatcher.
    pub fn new(dispatcher: Arc<Dispatcher<T>>) -> Self {
        Self {
            shared: Arc::new(MuxShared {
                dispatcher,
                records: Mutex::new(HashMap::new()),
            }),
            minted: Mutex::new(HashSet::new()),
        }
    }

    /// Mints a fresh route id through the dispatcher's default v4 generator
    /// and records it in the mux.
    pub async fn get_id(&self) -> Result<RouteId, DispatchError> {
        let id = self
            .shared
            .dispatcher
            .get_new_id(|| Ok(Uuid::new_v4()))
            .await?;
        self.minted.lock().await.insert(id);
        Ok(id)
    }

    /// Route ids this mux has minted.
    pub async fn minted_ids(&self) -> Vec<RouteId> {
        self.minted.lock().await.iter().copied().collect()
    }

    /// Returns a pipe over the route's shared delivery channel, subscribing
    /// through the dispatcher only for the first pipe on each id.
    pub async fn subscribe(&self, id: RouteId) -> Result<Pipe<T>, DispatchError> {
        if id.is_nil() {
            return Err(DispatchError::IdNotSet);
        }

        let mut records = self.shared.records.lock().await;
        if let Some(record) = records.get_mut(&id) {
            record.ref_count += 1;
            debug!(
                event = events::MUX_PIPE_REUSE,
                component = COMPONENT,
                route_id = %id,
                ref_count = record.ref_count,
                "reusing shared delivery channel"
            );
            return Ok(Pipe {
                route_id: id,
                channel: record.channel.clone(),
                shared: self.shared.clone(),
            });
        }

        let channel = self.shared.dispatcher.subscribe(id).await?;
        records.insert(
            id,
            MuxRecord {
                channel: channel.clone(),
                ref_count: 1,
            },
        );
        debug!(
            event = events::MUX_PIPE_CREATE,
            component = COMPONENT,
            route_id = %id,
            channel_id = channel.id(),
            "created shared delivery channel"
        );
        Ok(Pipe {
            route_id: id,
            channel,
            shared: self.shared.clone(),
        })
    }

    /// Detaches a channel from the dispatcher's route. Straight delegation;
    /// the mux's own records are managed through [`Pipe::release`].
    pub async fn unsubscribe(
        &self,
        id: RouteId,
        channel: &DeliveryChannel<T>,
    ) -> Result<(), DispatchError> {
        self.shared.dispatcher.unsubscribe(id, channel).await
    }

    /// Publishes a payload to every given route id in order.
    ///
    /// Returns the first error while still attempting the remaining ids;
    /// subsequent failures are traced at `warn`.
    ///
    /// # Errors
    ///
    /// [`DispatchError::NoIds`] when no target ids are supplied, otherwise
    /// whatever [`Dispatcher::publish`] first fails with.
    pub fn publish(&self, payload: &T, ids: &[RouteId]) -> Result<(), DispatchError> {
        if ids.is_empty() {
            return Err(DispatchError::NoIds);
        }

        let mut first_error = None;
        for id in ids {
            if let Err(err) = self.shared.dispatcher.publish(*id, payload.clone()) {
                if first_error.is_none() {
                    first_error = Some(err);
                } else {
                    warn!(
                        event = events::MUX_PUBLISH_FAILED,
                        component = COMPONENT,
                        route_id = %id,
                        err = err.as_label(),
                        "publish failed for additional route"
                    );
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    #[cfg(test)]
    async fn drop_record(&self, id: &RouteId) {
        self.shared.records.lock().await.remove(id);
    }
}

/// A reference-counted handle to a route's shared delivery channel.
///
/// Dropping a pipe without [`release`](Pipe::release) leaks its reference;
/// release consumes the pipe so a double release is a compile error.
pub struct Pipe<T: Clone + Send + 'static> {
    route_id: RouteId,
    channel: DeliveryChannel<T>,
    shared: Arc<MuxShared<T>>,
}

impl<T: Clone + Send + 'static> Pipe<T> {
    /// The route id this pipe reads from.
    pub fn route_id(&self) -> RouteId {
        self.route_id
    }

    /// The shared delivery channel backing this pipe.
    pub fn channel(&self) -> &DeliveryChannel<T> {
        &self.channel
    }

    /// Receives the next message delivered to the shared channel. Pipes on
    /// the same record compete; each message reaches one of them.
    pub async fn recv(&self) -> Option<T> {
        self.channel.recv().await
    }

    /// Releases this pipe's reference. When the count reaches zero, the
    /// underlying channel is unsubscribed from the dispatcher and the mux
    /// record is removed.
    ///
    /// # Errors
    ///
    /// [`DispatchError::PipeAlreadyReleased`] when the record is already
    /// gone.
    pub async fn release(self) -> Result<(), DispatchError> {
        let mut records = self.shared.records.lock().await;
        let Some(record) = records.get_mut(&self.route_id) else {
            return Err(DispatchError::PipeAlreadyReleased);
        };

        record.ref_count -= 1;
        let remaining = record.ref_count;
        debug!(
            event = events::MUX_PIPE_RELEASE,
            component = COMPONENT,
            route_id = %self.route_id,
            ref_count = remaining,
            "released pipe"
        );
        if remaining > 0 {
            return Ok(());
        }

        let Some(record) = records.remove(&self.route_id) else {
            return Err(DispatchError::PipeAlreadyReleased);
        };
        drop(records);

        self.shared
            .dispatcher
            .unsubscribe(self.route_id, &record.channel)
            .await?;
        debug!(
            event = events::MUX_RECORD_REMOVE,
            component = COMPONENT,
            route_id = %self.route_id,
            channel_id = record.channel.id(),
            "removed shared channel record"
        );
        Ok(())
    }
}

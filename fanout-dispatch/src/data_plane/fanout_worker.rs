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

//! Fan-out worker that drains the job queue and delivers to route subscribers.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, Level};

use crate::control_plane::route_table::{RouteId, RouteTable};
use crate::observability::events;
use crate::observability::fields::WorkerContext;

const COMPONENT: &str = "fanout_worker";

/// One queued publish awaiting fan-out.
pub(crate) struct Job<T> {
    pub(crate) route_id: RouteId,
    pub(crate) payload: T,
    pub(crate) enqueued_at: Instant,
}

impl<T> Job<T> {
    pub(crate) fn new(route_id: RouteId, payload: T) -> Self {
        Self {
            route_id,
            payload,
            enqueued_at: Instant::now(),
        }
    }
}

/// Long-lived worker loop.
///
/// Waits on the shutdown signal or the next job; on a job, snapshots the
/// route's subscriber list under the table's read lock, releases the lock,
/// then delivers with non-blocking sends. Cancellation is only observed
/// between jobs, so an in-flight fan-out completes before the worker exits.
pub(crate) async fn run<T: Clone + Send + 'static>(
    worker_id: usize,
    routes: Arc<RouteTable<T>>,
    jobs: Arc<Mutex<mpsc::Receiver<Job<T>>>>,
    shutdown: CancellationToken,
) {
    let context = WorkerContext::with_current_thread(worker_id);
    debug!(
        event = events::WORKER_SPAWN,
        component = COMPONENT,
        worker_id = context.worker_id,
        worker_thread = context.worker_thread.as_str(),
        "fan-out worker started"
    );

    loop {
        let job = tokio::select! {
            _ = shutdown.cancelled() => break,
            job = next_job(&jobs) => match job {
                Some(job) => job,
                // Queue closed: the dispatcher is shutting down.
                None => break,
            },
        };

        fan_out(&context, &routes, job).await;
    }

    debug!(
        event = events::WORKER_EXIT,
        component = COMPONENT,
        worker_id = context.worker_id,
        worker_thread = context.worker_thread.as_str(),
        "fan-out worker exiting"
    );
}

async fn next_job<T>(jobs: &Mutex<mpsc::Receiver<Job<T>>>) -> Option<Job<T>> {
    jobs.lock().await.recv().await
}

async fn fan_out<T: Clone>(context: &WorkerContext, routes: &RouteTable<T>, job: Job<T>) {
    let Some(subscribers) = routes.snapshot(&job.route_id).await else {
        debug!(
            event = events::FANOUT_ROUTE_MISSING,
            component = COMPONENT,
            worker_id = context.worker_id,
            route_id = %job.route_id,
            "discarding job for unregistered route"
        );
        return;
    };

    let mut delivered = 0usize;
    let mut dropped = 0usize;
    for channel in &subscribers {
        // A subscriber whose buffer is full misses this message; its
        // siblings are unaffected.
        match channel.try_send(job.payload.clone()) {
            Ok(()) => delivered += 1,
            Err(_) => dropped += 1,
        }
    }

    if tracing::enabled!(Level::DEBUG) {
        let queued_for_us = job.enqueued_at.elapsed().as_micros() as u64;
        debug!(
            event = events::FANOUT_COMPLETE,
            component = COMPONENT,
            worker_id = context.worker_id,
            route_id = %job.route_id,
            delivered,
            dropped,
            queued_for_us,
            "fan-out complete"
        );
        if dropped > 0 {
            debug!(
                event = events::FANOUT_SEND_DROPPED,
                component = COMPONENT,
                worker_id = context.worker_id,
                route_id = %job.route_id,
                dropped,
                "dropped deliveries to subscribers that were not ready"
            );
        }
    }
}

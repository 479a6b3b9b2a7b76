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

//! Typed errors for dispatcher, pool, and mux operations.

use thiserror::Error;

use crate::control_plane::route_table::RouteId;

/// Failures surfaced by [`Dispatcher`](crate::Dispatcher),
/// [`Mux`](crate::Mux), and [`Pipe`](crate::Pipe) operations.
///
/// Every kind is returned synchronously. [`DispatchError::JobsAtLimit`] is
/// the only transient condition; the rest indicate caller mistakes or
/// permanent state.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Operation requires a running dispatcher.
    #[error("dispatcher is not running")]
    NotRunning,

    /// `start` called while the dispatcher is already running.
    #[error("dispatcher is already running")]
    AlreadyRunning,

    /// The nil route id was supplied where a registered id is required.
    #[error("route id is unset")]
    IdNotSet,

    /// No route is registered under the supplied id.
    #[error("route '{0}' not found in route table")]
    RouteNotFound(RouteId),

    /// The route exists but the channel is not among its subscribers.
    #[error("channel is not subscribed to route '{0}'")]
    ChannelNotFound(RouteId),

    /// The injected generator produced an id that is already registered.
    ///
    /// A collision is a bug in the generator, not a transient condition, so
    /// it is surfaced instead of retried.
    #[error("id generator produced already-registered id '{0}'")]
    IdCollision(RouteId),

    /// The injected generator itself failed.
    #[error("id generator failed")]
    IdGenerator(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The bounded job queue is full. Callers may back off and retry.
    #[error("job queue is at capacity")]
    JobsAtLimit,

    /// The channel pool's factory yielded an element of the wrong shape.
    /// Diagnostic guard for pluggable pool implementations.
    #[error("channel pool factory returned an unexpected element type")]
    PoolTypeMismatch,

    /// Mux publish was called without any target route ids.
    #[error("publish requires at least one route id")]
    NoIds,

    /// A pipe was released after its mux record was already gone.
    #[error("pipe already released")]
    PipeAlreadyReleased,
}

impl DispatchError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::NotRunning => "not_running",
            DispatchError::AlreadyRunning => "already_running",
            DispatchError::IdNotSet => "id_not_set",
            DispatchError::RouteNotFound(_) => "route_not_found",
            DispatchError::ChannelNotFound(_) => "channel_not_found",
            DispatchError::IdCollision(_) => "id_collision",
            DispatchError::IdGenerator(_) => "id_generator",
            DispatchError::JobsAtLimit => "jobs_at_limit",
            DispatchError::PoolTypeMismatch => "pool_type_mismatch",
            DispatchError::NoIds => "no_ids",
            DispatchError::PipeAlreadyReleased => "pipe_already_released",
        }
    }

    /// Indicates whether the error is safe to retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DispatchError::JobsAtLimit)
    }
}

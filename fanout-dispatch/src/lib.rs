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

//! # fanout-dispatch
//!
//! `fanout-dispatch` is an in-process publish/subscribe dispatcher. Publishers
//! enqueue messages keyed by opaque 128-bit route identifiers; a bounded job
//! queue feeds a pool of fan-out workers that deliver each message to every
//! channel subscribed to its route with non-blocking sends, so a slow or
//! absent subscriber never blocks publishers or its siblings.
//!
//! Typical usage is API-first and remains centered on [`Dispatcher`] and
//! [`Mux`]. Internal modules are organized by domain layer to keep behavior
//! ownership explicit.
//!
//! ## Quick start
//!
//! ```
//! use std::sync::Arc;
//! use fanout_dispatch::{Dispatcher, Mux};
//! use uuid::Uuid;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let dispatcher = Arc::new(Dispatcher::<&'static str>::new());
//! dispatcher.start(0, 0).await.unwrap();
//!
//! let id = dispatcher.get_new_id(|| Ok(Uuid::new_v4())).await.unwrap();
//! let channel = dispatcher.subscribe(id).await.unwrap();
//!
//! dispatcher.publish(id, "tick").unwrap();
//! assert_eq!(channel.recv().await, Some("tick"));
//!
//! let mux = Mux::new(dispatcher.clone());
//! let shared_id = mux.get_id().await.unwrap();
//! let pipe = mux.subscribe(shared_id).await.unwrap();
//! mux.publish(&"tock", &[shared_id]).unwrap();
//! assert_eq!(pipe.recv().await, Some("tock"));
//! pipe.release().await.unwrap();
//!
//! dispatcher.stop().await.unwrap();
//! # });
//! ```
//!
//! ## Delivery contract
//!
//! - `publish` never suspends: it is a non-blocking enqueue that fails with
//!   [`DispatchError::JobsAtLimit`] when the bounded queue is full. This is
//!   the sole back-pressure signal to publishers.
//! - Within one route and one publisher, messages a given subscriber does
//!   receive arrive in publish order. No ordering holds across routes, and
//!   subscribers of the same route may diverge when deliveries drop.
//! - Publishing to or unsubscribing from a stopped dispatcher is a silent
//!   no-op, so shutdown races at the caller never spuriously error.
//!
//! ## Internal architecture map
//!
//! - API facade: outward [`Dispatcher`]/[`Mux`]/[`Pipe`] surface
//! - Control plane: route-table ownership and worker-pool lifecycle
//! - Data plane: delivery channels, the channel pool, and the fan-out worker
//! - Observability: canonical structured event names and field helpers
//!
//! ## Observability model
//!
//! The crate uses `tracing` for logs/events. Library code emits events and
//! does not unconditionally initialize a global subscriber. Binaries and
//! tests are responsible for one-time `tracing_subscriber` initialization at
//! process boundaries.

mod config;
mod control_plane;
mod data_plane;
mod dispatcher;
mod error;
mod mux;
mod observability;

pub mod global;

pub use config::{DispatchConfig, DEFAULT_JOBS_PER_WORKER, DEFAULT_WORKERS};
pub use control_plane::route_table::RouteId;
pub use data_plane::delivery_channel::{DeliveryChannel, DELIVERY_BUFFER};
pub use dispatcher::{Dispatcher, IdGenError};
pub use error::DispatchError;
pub use mux::{Mux, Pipe};

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

//! Canonical structured field helpers for worker correlation.

pub(crate) const DEFAULT_WORKER_THREAD: &str = "unknown-thread";

/// Correlation context carried through every event a worker emits.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct WorkerContext {
    pub(crate) worker_id: usize,
    pub(crate) worker_thread: String,
}

impl WorkerContext {
    pub(crate) fn with_current_thread(worker_id: usize) -> Self {
        Self {
            worker_id,
            worker_thread: current_thread_name_or_default(),
        }
    }
}

pub(crate) fn thread_name_or_default(thread_name: Option<&str>) -> String {
    thread_name.unwrap_or(DEFAULT_WORKER_THREAD).to_string()
}

pub(crate) fn current_thread_name_or_default() -> String {
    thread_name_or_default(std::thread::current().name())
}

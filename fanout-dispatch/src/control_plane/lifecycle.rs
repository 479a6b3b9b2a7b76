//! Worker-pool lifecycle state and the start/stop transitions that own it.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::DispatchConfig;
use crate::control_plane::route_table::RouteTable;
use crate::data_plane::fanout_worker::{self, Job};
use crate::observability::events;

const COMPONENT: &str = "lifecycle";

/// Mutable lifecycle state: the shutdown signal, the worker pool, and the
/// consumer side of the job queue. Guarded by the dispatcher's lifecycle
/// mutex; transitions happen only inside `start`/`stop`.
pub(crate) struct WorkerLifecycle<T> {
    shutdown: CancellationToken,
    workers: JoinSet<()>,
    job_rx: Option<Arc<Mutex<mpsc::Receiver<Job<T>>>>>,
}

impl<T: Clone + Send + 'static> WorkerLifecycle<T> {
    pub(crate) fn new() -> Self {
        Self {
            shutdown: CancellationToken::new(),
            workers: JoinSet::new(),
            job_rx: None,
        }
    }

    /// Allocates the bounded job queue, arms a fresh shutdown signal, and
    /// spawns the worker pool. Returns the publisher-side job sender.
    pub(crate) fn start(
        &mut self,
        config: &DispatchConfig,
        routes: Arc<RouteTable<T>>,
    ) -> mpsc::Sender<Job<T>> {
        let (job_tx, job_rx) = mpsc::channel(config.queue_capacity());
        let job_rx = Arc::new(Mutex::new(job_rx));

        self.shutdown = CancellationToken::new();
        for worker_id in 0..config.workers {
            self.workers.spawn(fanout_worker::run(
                worker_id,
                routes.clone(),
                job_rx.clone(),
                self.shutdown.clone(),
            ));
        }
        self.job_rx = Some(job_rx);

        debug!(
            event = events::LIFECYCLE_START_OK,
            component = COMPONENT,
            workers = config.workers,
            queue_capacity = config.queue_capacity(),
            "worker pool started"
        );
        job_tx
    }

    /// Fires the shutdown signal, waits for every worker to observe it and
    /// exit, then discards whatever jobs remain in the queue.
    pub(crate) async fn stop(&mut self) {
        self.shutdown.cancel();
        while self.workers.join_next().await.is_some() {}

        let discarded = match self.job_rx.take() {
            Some(job_rx) => {
                let mut job_rx = job_rx.lock().await;
                let mut discarded = 0usize;
                while job_rx.try_recv().is_ok() {
                    discarded += 1;
                }
                discarded
            }
            None => 0,
        };
        if discarded > 0 {
            debug!(
                event = events::QUEUE_DRAIN_DISCARDED,
                component = COMPONENT,
                discarded,
                "discarded undelivered jobs on shutdown"
            );
        }

        debug!(
            event = events::LIFECYCLE_STOP_OK,
            component = COMPONENT,
            "worker pool stopped"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::WorkerLifecycle;
    use crate::config::DispatchConfig;
    use crate::control_plane::route_table::RouteTable;
    use crate::data_plane::fanout_worker::Job;
    use std::sync::Arc;
    use std::time::Duration;
    use uuid::Uuid;

    #[tokio::test]
    async fn stop_closes_the_job_queue() {
        let mut lifecycle = WorkerLifecycle::<u32>::new();
        let routes = Arc::new(RouteTable::new());
        let job_tx = lifecycle.start(&DispatchConfig::new(1, 4), routes);

        lifecycle.stop().await;

        assert!(job_tx.try_send(Job::new(Uuid::new_v4(), 1)).is_err());
    }

    #[tokio::test]
    async fn stop_waits_for_every_worker_to_exit() {
        let mut lifecycle = WorkerLifecycle::<u32>::new();
        let routes = Arc::new(RouteTable::new());
        let _job_tx = lifecycle.start(&DispatchConfig::new(4, 4), routes);

        tokio::time::timeout(Duration::from_secs(1), lifecycle.stop())
            .await
            .expect("workers should observe the shutdown signal");
    }
}

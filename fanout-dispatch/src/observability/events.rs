//! Canonical structured event names used across `fanout-dispatch`.

// Lifecycle events.
pub(crate) const LIFECYCLE_START_OK: &str = "lifecycle_start_ok";
pub(crate) const LIFECYCLE_STOP_OK: &str = "lifecycle_stop_ok";
pub(crate) const QUEUE_DRAIN_DISCARDED: &str = "queue_drain_discarded";

// Control-plane route events.
pub(crate) const ROUTE_ID_MINTED: &str = "route_id_minted";
pub(crate) const ROUTE_ID_COLLISION: &str = "route_id_collision";
pub(crate) const SUBSCRIBER_ATTACHED: &str = "subscriber_attached";
pub(crate) const SUBSCRIBER_DETACHED: &str = "subscriber_detached";

// Fan-out worker events.
pub(crate) const WORKER_SPAWN: &str = "worker_spawn";
pub(crate) const WORKER_EXIT: &str = "worker_exit";
pub(crate) const FANOUT_COMPLETE: &str = "fanout_complete";
pub(crate) const FANOUT_SEND_DROPPED: &str = "fanout_send_dropped";
pub(crate) const FANOUT_ROUTE_MISSING: &str = "fanout_route_missing";

// Channel-pool events.
pub(crate) const POOL_ELEMENT_CREATE: &str = "pool_element_create";
pub(crate) const POOL_ELEMENT_REUSE: &str = "pool_element_reuse";
pub(crate) const POOL_ELEMENT_RETURN: &str = "pool_element_return";
pub(crate) const POOL_SKIP_CONTENDED: &str = "pool_skip_contended";
pub(crate) const POOL_TYPE_MISMATCH: &str = "pool_type_mismatch";

// Mux and pipe events.
pub(crate) const MUX_PIPE_CREATE: &str = "mux_pipe_create";
pub(crate) const MUX_PIPE_REUSE: &str = "mux_pipe_reuse";
pub(crate) const MUX_PIPE_RELEASE: &str = "mux_pipe_release";
pub(crate) const MUX_RECORD_REMOVE: &str = "mux_record_remove";
pub(crate) const MUX_PUBLISH_FAILED: &str = "mux_publish_failed";

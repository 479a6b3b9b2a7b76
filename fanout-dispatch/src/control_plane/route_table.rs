//! Route-table data model and storage owner for route identity and
//! subscriber membership.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::data_plane::delivery_channel::DeliveryChannel;
use crate::error::DispatchError;
use crate::observability::events;

const COMPONENT: &str = "route_table";

/// Opaque 128-bit route identifier. The nil value is reserved as "unset" and
/// is never a valid route id.
pub type RouteId = Uuid;

/// Storage owner mapping each registered route id to its subscriber
/// channels, in subscription order.
///
/// One read-write lock serializes the whole table: registration and
/// subscriber membership write, fan-out snapshots read. Publishers never
/// touch it.
pub(crate) struct RouteTable<T> {
    routes: RwLock<HashMap<RouteId, Vec<DeliveryChannel<T>>>>,
}

impl<T> RouteTable<T> {
    /// Creates an empty route table.
    pub(crate) fn new() -> Self {
        Self {
            routes: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a fresh, empty route. An already-registered id fails with
    /// `IdCollision`.
    pub(crate) async fn register(&self, id: RouteId) -> Result<(), DispatchError> {
        let mut routes = self.routes.write().await;
        if routes.contains_key(&id) {
            warn!(
                event = events::ROUTE_ID_COLLISION,
                component = COMPONENT,
                route_id = %id,
                "generator produced an already-registered id"
            );
            return Err(DispatchError::IdCollision(id));
        }

        routes.insert(id, Vec::new());
        debug!(
            event = events::ROUTE_ID_MINTED,
            component = COMPONENT,
            route_id = %id,
            "registered route"
        );
        Ok(())
    }

    /// Reports whether a route is registered under `id`.
    pub(crate) async fn contains(&self, id: &RouteId) -> bool {
        self.routes.read().await.contains_key(id)
    }

    /// Appends a subscriber channel to a route's delivery sequence.
    pub(crate) async fn attach_subscriber(
        &self,
        id: RouteId,
        channel: DeliveryChannel<T>,
    ) -> Result<(), DispatchError> {
        let mut routes = self.routes.write().await;
        let Some(subscribers) = routes.get_mut(&id) else {
            return Err(DispatchError::RouteNotFound(id));
        };

        debug!(
            event = events::SUBSCRIBER_ATTACHED,
            component = COMPONENT,
            route_id = %id,
            channel_id = channel.id(),
            subscribers = subscribers.len() + 1,
            "attached subscriber channel"
        );
        subscribers.push(channel);
        Ok(())
    }

    /// Removes a subscriber channel by identity, preserving the relative
    /// order of the remaining channels, and hands the removed entry back.
    pub(crate) async fn detach_subscriber(
        &self,
        id: RouteId,
        channel: &DeliveryChannel<T>,
    ) -> Result<DeliveryChannel<T>, DispatchError> {
        let mut routes = self.routes.write().await;
        let Some(subscribers) = routes.get_mut(&id) else {
            return Err(DispatchError::RouteNotFound(id));
        };

        let Some(position) = subscribers
            .iter()
            .position(|subscriber| subscriber.same_channel(channel))
        else {
            return Err(DispatchError::ChannelNotFound(id));
        };

        let removed = subscribers.remove(position);
        debug!(
            event = events::SUBSCRIBER_DETACHED,
            component = COMPONENT,
            route_id = %id,
            channel_id = removed.id(),
            subscribers = subscribers.len(),
            "detached subscriber channel"
        );
        Ok(removed)
    }

    /// Snapshot of a route's subscriber sequence for lock-free fan-out, or
    /// `None` when the route is not registered.
    pub(crate) async fn snapshot(&self, id: &RouteId) -> Option<Vec<DeliveryChannel<T>>> {
        self.routes.read().await.get(id).cloned()
    }

    /// Number of subscribers on a route, or `None` when it is not
    /// registered.
    pub(crate) async fn subscriber_count(&self, id: &RouteId) -> Option<usize> {
        self.routes.read().await.get(id).map(Vec::len)
    }

    /// Drops every route. Stop-time transition; routes do not survive a
    /// dispatcher restart.
    pub(crate) async fn clear(&self) {
        self.routes.write().await.clear();
    }
}

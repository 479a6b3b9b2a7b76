//! Free-list channel pool that amortizes allocation across subscriber churn.

use std::any::Any;
use std::sync::{Mutex, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::error::DispatchError;
use crate::observability::events;

const COMPONENT: &str = "channel_pool";

pub(crate) type PoolElement = Box<dyn Any + Send>;
pub(crate) type PoolFactory = Box<dyn Fn() -> PoolElement + Send + Sync>;

/// Internally synchronized free-list with a pluggable element factory.
///
/// Elements are type-erased so the factory can be swapped by pool
/// implementations; an element that fails to downcast to the caller's channel
/// type surfaces [`DispatchError::PoolTypeMismatch`].
pub(crate) struct ChannelPool {
    factory: RwLock<PoolFactory>,
    idle: Mutex<Vec<PoolElement>>,
}

impl ChannelPool {
    /// Creates an empty pool over the given element factory.
    pub(crate) fn new(factory: PoolFactory) -> Self {
        Self {
            factory: RwLock::new(factory),
            idle: Mutex::new(Vec::new()),
        }
    }

    /// Hands out an idle element, building a fresh one when the free-list is
    /// empty.
    pub(crate) fn acquire<C: Any + Send>(&self) -> Result<C, DispatchError> {
        let (element, reused) = match self.pop_idle() {
            Some(element) => (element, true),
            None => (self.build(), false),
        };

        match element.downcast::<C>() {
            Ok(channel) => {
                let event = if reused {
                    events::POOL_ELEMENT_REUSE
                } else {
                    events::POOL_ELEMENT_CREATE
                };
                debug!(event, component = COMPONENT, "acquired pool element");
                Ok(*channel)
            }
            Err(_) => {
                warn!(
                    event = events::POOL_TYPE_MISMATCH,
                    component = COMPONENT,
                    "pool factory yielded an unexpected element type"
                );
                Err(DispatchError::PoolTypeMismatch)
            }
        }
    }

    /// Returns an element to the free-list.
    pub(crate) fn release<C: Any + Send>(&self, channel: C) {
        if let Ok(mut idle) = self.idle.lock() {
            idle.push(Box::new(channel));
            debug!(
                event = events::POOL_ELEMENT_RETURN,
                component = COMPONENT,
                idle = idle.len(),
                "returned pool element"
            );
        }
    }

    #[cfg(test)]
    pub(crate) fn set_factory(&self, factory: PoolFactory) {
        if let Ok(mut slot) = self.factory.write() {
            *slot = factory;
        }
    }

    #[cfg(test)]
    pub(crate) fn idle_len(&self) -> usize {
        self.idle.lock().map(|idle| idle.len()).unwrap_or(0)
    }

    fn pop_idle(&self) -> Option<PoolElement> {
        match self.idle.lock() {
            Ok(mut idle) => idle.pop(),
            Err(_) => None,
        }
    }

    fn build(&self) -> PoolElement {
        let factory = self
            .factory
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        factory()
    }
}

#[cfg(test)]
mod tests {
    use super::ChannelPool;
    use crate::data_plane::delivery_channel::{DeliveryChannel, DELIVERY_BUFFER};
    use crate::error::DispatchError;

    fn channel_pool() -> ChannelPool {
        ChannelPool::new(Box::new(|| {
            Box::new(DeliveryChannel::<u32>::new(DELIVERY_BUFFER))
        }))
    }

    #[test]
    fn acquire_builds_when_free_list_is_empty() {
        let pool = channel_pool();

        let channel = pool
            .acquire::<DeliveryChannel<u32>>()
            .expect("factory element should downcast");

        assert_eq!(pool.idle_len(), 0);
        assert!(channel.try_send(1).is_ok());
    }

    #[test]
    fn release_then_acquire_reuses_the_same_element() {
        let pool = channel_pool();
        let channel = pool
            .acquire::<DeliveryChannel<u32>>()
            .expect("factory element should downcast");
        let id = channel.id();

        pool.release(channel);
        assert_eq!(pool.idle_len(), 1);

        let reused = pool
            .acquire::<DeliveryChannel<u32>>()
            .expect("idle element should downcast");
        assert_eq!(reused.id(), id);
        assert_eq!(pool.idle_len(), 0);
    }

    #[test]
    fn mismatched_factory_reports_pool_type_mismatch() {
        let pool = channel_pool();
        pool.set_factory(Box::new(|| Box::new("omg")));

        let result = pool.acquire::<DeliveryChannel<u32>>();

        assert!(matches!(result, Err(DispatchError::PoolTypeMismatch)));
    }
}

//! Data-plane building blocks: delivery channels, the channel pool, and the
//! fan-out worker.

pub(crate) mod channel_pool;
pub(crate) mod delivery_channel;
pub(crate) mod fanout_worker;

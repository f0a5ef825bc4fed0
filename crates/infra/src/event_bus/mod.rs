//! Broker-backed event buses.
//!
//! The bus abstraction and the in-process bus live in `eshop-events`; this
//! module adds implementations that talk to external brokers.

#[cfg(feature = "redis")]
pub mod redis_pubsub;

#[cfg(feature = "redis")]
pub use redis_pubsub::{RedisBusError, RedisPubSubEventBus};

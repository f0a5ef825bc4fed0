//! Domain & integration events.
//!
//! Mechanics only: the `Event` trait, the envelope that travels on a bus, and
//! the bus abstraction with an in-process implementation. Transport-backed
//! buses (e.g. Redis) live in `eshop-infra`.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};

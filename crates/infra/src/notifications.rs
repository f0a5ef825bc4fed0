//! Restock notifications.
//!
//! When an item's stock lands exactly on its restock threshold a
//! `catalog.item.restock_threshold_reached` envelope goes out on whatever bus
//! the notifier was built with. Delivery is at-most-once: a failed publish is
//! logged and dropped, never surfaced to the caller.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value as JsonValue;
use tracing::{info, warn};

use eshop_catalog::{CatalogItem, RestockThresholdReached};
use eshop_events::{EventBus, EventEnvelope};

type PublishFn = dyn Fn(EventEnvelope<JsonValue>) -> Result<(), String> + Send + Sync;

/// Publishes restock notifications to a type-erased bus.
#[derive(Clone)]
pub struct RestockNotifier {
    publish: Arc<PublishFn>,
}

impl core::fmt::Debug for RestockNotifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RestockNotifier").finish_non_exhaustive()
    }
}

impl RestockNotifier {
    pub fn new<B>(bus: B) -> Self
    where
        B: EventBus<EventEnvelope<JsonValue>> + 'static,
    {
        Self {
            publish: Arc::new(move |envelope| bus.publish(envelope).map_err(|e| format!("{e:?}"))),
        }
    }

    /// A notifier that drops everything.
    pub fn disabled() -> Self {
        Self {
            publish: Arc::new(|_| Ok(())),
        }
    }

    /// Publish a notification if `item` sits on its restock threshold.
    ///
    /// Returns whether a notification was handed to the bus.
    pub fn notify_if_needed(&self, item: &CatalogItem) -> bool {
        let Some(event) = item.restock_notification(Utc::now()) else {
            return false;
        };

        let envelope = match EventEnvelope::from_event(
            event.item_id.as_i64(),
            RestockThresholdReached::AGGREGATE_TYPE,
            &event,
        ) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(item_id = %event.item_id, "restock notification serialization failed: {e}");
                return false;
            }
        };

        match (self.publish)(envelope) {
            Ok(()) => {
                info!(
                    item_id = %event.item_id,
                    available_stock = event.available_stock,
                    "restock threshold reached"
                );
                true
            }
            Err(e) => {
                warn!(item_id = %event.item_id, "restock notification publish failed: {e}");
                false
            }
        }
    }
}

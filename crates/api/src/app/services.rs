use std::sync::Arc;

use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, info, warn};

use eshop_catalog::{CatalogBrand, CatalogType};
use eshop_events::{EventBus, EventEnvelope, InMemoryEventBus};
use eshop_infra::db;
use eshop_infra::repository::{
    CatalogItemRepository, InMemoryCatalogStore, PostgresCatalogStore, ReferenceRepository,
};
use eshop_infra::{CatalogItemService, ReferenceService, RestockNotifier};

use crate::config::{AppConfig, ConfigError};

/// Everything the handlers need, shared behind an `Arc` extension.
#[derive(Clone)]
pub struct AppServices {
    pub items: CatalogItemService,
    pub brands: ReferenceService<CatalogBrand>,
    pub types: ReferenceService<CatalogType>,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migrations failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[cfg(feature = "redis")]
    #[error("redis bus: {0}")]
    Redis(#[from] eshop_infra::event_bus::RedisBusError),
}

pub async fn build_services(config: &AppConfig) -> Result<AppServices, StartupError> {
    let notifier = build_notifier(config)?;

    if config.use_persistent_stores {
        let url = config
            .database_url
            .as_deref()
            .ok_or(ConfigError::MissingDatabaseUrl)?;
        let pool = db::connect(url, config.database_max_connections).await?;
        db::run_migrations(&pool).await?;

        info!("using postgres catalog store");
        return Ok(wire(Arc::new(PostgresCatalogStore::new(pool)), notifier, config));
    }

    info!("using in-memory catalog store");
    Ok(wire(Arc::new(InMemoryCatalogStore::new()), notifier, config))
}

/// Plug one store into all three services.
fn wire<S>(store: Arc<S>, notifier: RestockNotifier, config: &AppConfig) -> AppServices
where
    S: CatalogItemRepository
        + ReferenceRepository<CatalogBrand>
        + ReferenceRepository<CatalogType>
        + 'static,
{
    AppServices {
        items: CatalogItemService::new(store.clone(), store.clone(), store.clone(), notifier)
            .with_stock_update_attempts(config.stock_update_attempts),
        brands: ReferenceService::<CatalogBrand>::new(store.clone()),
        types: ReferenceService::<CatalogType>::new(store),
    }
}

fn build_notifier(config: &AppConfig) -> Result<RestockNotifier, StartupError> {
    #[cfg(feature = "redis")]
    if let Some(url) = config.redis_url.as_deref() {
        let bus = eshop_infra::event_bus::RedisPubSubEventBus::new(url, config.restock_channel.clone())?;
        info!(channel = %config.restock_channel, "restock notifications go to redis");
        return Ok(RestockNotifier::new(bus));
    }

    #[cfg(not(feature = "redis"))]
    if config.redis_url.is_some() {
        warn!("REDIS_URL set but the redis feature is not enabled; using the in-process bus");
    }

    Ok(RestockNotifier::new(in_process_bus(&config.restock_channel)))
}

/// In-process bus with a background subscriber that logs each notification.
fn in_process_bus(channel: &str) -> Arc<InMemoryEventBus<EventEnvelope<JsonValue>>> {
    let bus = Arc::new(InMemoryEventBus::<EventEnvelope<JsonValue>>::new());
    let sub = bus.subscribe();
    let channel = channel.to_string();

    // Exits once the bus (and with it every sender) is dropped.
    tokio::task::spawn_blocking(move || {
        while let Ok(envelope) = sub.recv() {
            let payload = envelope.payload();
            info!(
                %channel,
                item_id = envelope.aggregate_id(),
                event_id = %envelope.event_id(),
                available_stock = %payload["availableStock"],
                restock_threshold = %payload["restockThreshold"],
                "{}",
                envelope.event_type()
            );
        }
        debug!(%channel, "restock subscriber stopped");
    });

    bus
}

use anyhow::Context;

use eshop_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    eshop_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let app = eshop_api::app::build_app(&config)
        .await
        .context("failed to wire services")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        persistent = config.use_persistent_stores,
        "catalog service listening on {}",
        listener.local_addr()?
    );

    axum::serve(listener, app).await?;
    Ok(())
}

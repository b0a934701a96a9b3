//! hostel-bookings server entry point.
//!
//! Starts the Axum HTTP server backed by PostgreSQL (or the in-memory store
//! when persistence is disabled) and the monthly insights refresh.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use hostel_bookings::api;
use hostel_bookings::app_state::AppState;
use hostel_bookings::config::{AppConfig, LogFormat};
use hostel_bookings::domain::Hostel;
use hostel_bookings::persistence::memory::MemoryStore;
use hostel_bookings::persistence::postgres::PostgresStore;
use hostel_bookings::service::schedule;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

async fn seeded_memory_store(config: &AppConfig) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    for seed in &config.memory_seed_hostels {
        store
            .insert_hostel(Hostel {
                id: seed.id,
                name: seed.name.clone(),
                available: true,
                created_at: Utc::now(),
            })
            .await;
        tracing::info!(hostel_id = %seed.id, name = %seed.name, "seeded hostel");
    }
    if config.memory_seed_hostels.is_empty() {
        tracing::warn!("no MEMORY_SEED_HOSTELS given, bookings will fail with 404");
    }
    store
}

async fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let Some(url) = config.database_url.as_deref().filter(|_| config.persistence_enabled) else {
        tracing::warn!("persistence disabled, using in-memory store");
        return Ok(AppState::new(
            seeded_memory_store(config).await,
            config.expose_error_details,
        ));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(config.database_min_connections)
        .acquire_timeout(config.database_connect_timeout())
        .connect(url)
        .await
        .context("connecting to PostgreSQL")?;

    let store = PostgresStore::new(pool);
    store.migrate().await.context("running migrations")?;
    tracing::info!("database ready");

    Ok(AppState::new(Arc::new(store), config.expose_error_details))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = AppConfig::from_env()?;
    init_tracing(config.log_format);
    tracing::info!(addr = %config.listen_addr, "starting hostel-bookings");

    // Build service layer
    let state = build_state(&config).await?;

    // Populate the insights row, then refresh monthly
    if let Err(e) = state.insights.recompute_snapshot().await {
        tracing::error!(error = %e, "initial insights run failed");
    }
    if config.insights_schedule_enabled {
        let _scheduler = schedule::spawn_monthly_refresh(Arc::clone(&state.insights));
    }

    // Build router
    let app = api::build_app(state, config.request_timeout());

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

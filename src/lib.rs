pub mod api;
pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod seed;
pub mod store;

#[cfg(test)]
mod test_support;

use axum::Router;
use std::sync::Arc;

// Export API types
pub use api::handlers;
pub use api::routes;

pub use error::{CatalogError, CatalogResult};

// Export logic types
pub use logic::{
    Catalog, ConnectionProber, CreatePayload, ProbeOutcome, Resolver, SqlxProber, WorkflowRunner,
};

// Export all model types
pub use model::*;

pub use seed::load_seed_data;

// Export store types
pub use store::{EntityStore, MemoryStore, PostgresStore, Store};

use crate::api::handlers::CatalogState;
use crate::config::AppConfig;

/// Router with all `/api/v1` routes bound to `store`.
pub fn build_app<S: Store>(
    store: S,
    prober: Arc<dyn ConnectionProber>,
    version: CatalogVersion,
) -> Router {
    routes::create_router::<S>().with_state(Arc::new(CatalogState::new(store, prober, version)))
}

/// Open the configured store, seed it and serve until the process stops.
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let prober: Arc<dyn ConnectionProber> = Arc::new(SqlxProber::new(config.probe_timeout()));

    if config.database.in_memory {
        log::info!("Using the in-memory store; nothing survives a restart");
        let store = MemoryStore::new();
        seed::load_seed_data(&store).await?;
        serve(build_app(store, prober, config.version()), &config).await
    } else {
        log::info!("Connecting to PostgreSQL...");
        let store = PostgresStore::new(&config.database_url(), config.max_connections()).await?;

        log::info!("Running database migrations...");
        store.migrate().await?;

        let seeded = seed::load_seed_data(&store).await?;
        log::info!("Database ready ({} test connection definitions seeded)", seeded);

        serve(build_app(store, prober, config.version()), &config).await
    }
}

async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let bind_address = config.server_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    log::info!(
        "Metadata catalog listening on http://{}{}",
        bind_address,
        routes::API_PREFIX
    );

    axum::serve(listener, app).await?;

    Ok(())
}

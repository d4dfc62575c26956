use std::sync::Arc;

use config::CONFIG;
use ingest::IngestPipeline;
use models::PgStore;
use tracing::info;

mod config;
mod error;
mod ingest;
mod logging;
mod models;
mod rest;

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    logging::init_tracing(CONFIG.otel_stdout());
    info!(core = agro_core::CORE_VERSION, "Starting agro ingestion service");

    let db_conn =
        models::establish_db_connection(CONFIG.database_url(), CONFIG.db_max_connections())
            .await?;
    models::run_migrations(&db_conn).await?;

    let pipeline =
        IngestPipeline::from_store(PgStore::new(db_conn), Arc::new(mockable::DefaultClock));
    let served =
        rest::dispatch_server(pipeline, CONFIG.bind_addr(), CONFIG.body_limit_bytes()).await;

    logging::shutdown_tracing();
    Ok(served?)
}

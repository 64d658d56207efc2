pub mod backend;
pub mod instrumented;
pub mod postgres;

use anyhow::Result;
use std::sync::Arc;

pub use backend::DatabaseBackend;
pub use instrumented::InstrumentedDatabase;
pub use postgres::PostgresBackend;

/// Shared handle to the data store
pub type Database = Arc<dyn DatabaseBackend>;

/// Connect to PostgreSQL and wrap the backend with query metrics
pub async fn init_database(config: &crate::config::DatabaseConfig) -> Result<Database> {
    tracing::info!("Initializing PostgreSQL backend");
    let pool = postgres::connection::create_pool(config).await?;
    postgres::connection::test_connection(&pool).await?;
    let backend = PostgresBackend::new(pool);
    Ok(Arc::new(InstrumentedDatabase::new(Arc::new(backend))) as Database)
}

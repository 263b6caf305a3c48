//! PostgreSQL pool provider backed by deadpool.

use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use std::sync::Arc;
use tokio_postgres::{Config as PgConfig, NoTls};
use tracing::info;

use crate::datasource::{DataSourceHandle, PooledDataSource, PoolProvider};
use crate::descriptor::{Dialect, PlainDescriptor};
use crate::error::{DataSourceError, Result};

/// Default pool size. Pool tuning is deliberately not configurable at this
/// layer; sizing policy belongs to the configuration loader upstream.
const DEFAULT_POOL_SIZE: usize = 8;

/// Builds deadpool-backed PostgreSQL pools from plain descriptors.
#[derive(Default)]
pub struct PgPoolProvider;

impl PgPoolProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PoolProvider for PgPoolProvider {
    async fn create_pool(&self, descriptor: &PlainDescriptor) -> Result<DataSourceHandle> {
        // This provider serves PostgreSQL endpoints only.
        match descriptor.endpoint_metadata().map(|m| m.dialect) {
            Some(Dialect::Postgres) => {}
            Some(other) => {
                return Err(DataSourceError::Unsupported(format!(
                    "PgPoolProvider cannot serve {} endpoint {}",
                    other.name(),
                    descriptor.display_name()
                )));
            }
            None => {
                return Err(DataSourceError::Unsupported(format!(
                    "unrecognized connection URL: {}",
                    descriptor.display_name()
                )));
            }
        }

        let mut pg_config: PgConfig = descriptor.url.parse().map_err(|e| {
            DataSourceError::pool_creation(descriptor.display_name(), e)
        })?;
        // The descriptor's credential fields are authoritative over anything
        // embedded in the URL.
        pg_config.user(&descriptor.username);
        pg_config.password(&descriptor.password);

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let mgr = Manager::from_config(pg_config, NoTls, mgr_config);
        let pool = Pool::builder(mgr)
            .max_size(DEFAULT_POOL_SIZE)
            .build()
            .map_err(|e| DataSourceError::pool_creation(descriptor.display_name(), e))?;

        // Warm up one connection so bad endpoints fail at build time, not at
        // first statement.
        let client = pool
            .get()
            .await
            .map_err(|e| DataSourceError::pool_creation(descriptor.display_name(), e))?;
        client
            .simple_query("SELECT 1")
            .await
            .map_err(|e| DataSourceError::pool_creation(descriptor.display_name(), e))?;
        drop(client);

        info!(endpoint = %descriptor.display_name(), "connected to PostgreSQL");
        Ok(Arc::new(PgDataSource { pool }))
    }
}

/// Simple handle wrapping one deadpool PostgreSQL pool.
struct PgDataSource {
    pool: Pool,
}

#[async_trait]
impl PooledDataSource for PgDataSource {
    async fn execute(&self, statement: &str) -> Result<u64> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| DataSourceError::execution(e))?;
        Ok(client.execute(statement, &[]).await?)
    }

    fn db_type(&self) -> &str {
        "postgres"
    }

    async fn close(&self) -> Result<()> {
        self.pool.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_non_postgres_dialect_is_unsupported() {
        let provider = PgPoolProvider::new();
        let descriptor = PlainDescriptor::new("mysql://db0/orders", "scaling", "pw");
        let err = provider.create_pool(&descriptor).await.unwrap_err();
        assert!(matches!(err, DataSourceError::Unsupported(_)));
    }

    #[tokio::test]
    async fn test_unparseable_url_is_unsupported() {
        let provider = PgPoolProvider::new();
        let descriptor = PlainDescriptor::new("not a url", "scaling", "pw");
        let err = provider.create_pool(&descriptor).await.unwrap_err();
        assert!(matches!(err, DataSourceError::Unsupported(_)));
    }

    #[tokio::test]
    async fn test_warm_up_failure_is_pool_creation_with_descriptor() {
        // Reserve a port, then release it so the connection is refused
        // during warm-up.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let url = format!("postgres://127.0.0.1:{port}/orders");
        let descriptor = PlainDescriptor::new(&url, "scaling", "pw");
        let provider = PgPoolProvider::new();
        let err = provider.create_pool(&descriptor).await.unwrap_err();

        match err {
            DataSourceError::PoolCreation { descriptor: d, .. } => {
                assert!(d.contains(&url));
            }
            other => panic!("expected PoolCreation, got {other}"),
        }
    }
}

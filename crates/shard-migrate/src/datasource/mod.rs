//! Data-source handles, factory, and registry.
//!
//! This module is the resource-ownership core of the migration engine:
//!
//! - [`PooledDataSource`]: the uniform handle capability (execute + close)
//! - [`PoolFactory`]: descriptor → live handle, pure construction
//! - [`DataSourceRegistry`]: descriptor-keyed cache with single-flight
//!   construction and full-lifecycle ownership
//! - [`RoutedTarget`]: composite handle spanning shard pools behind a
//!   routing rule
//!
//! Pooling itself is delegated to an injected [`PoolProvider`]; the stock
//! PostgreSQL provider lives in [`crate::drivers::postgres`].

pub mod factory;
pub mod registry;
pub mod routed;

pub use factory::{PoolFactory, PoolProvider, RoutingEngine};
pub use registry::DataSourceRegistry;
pub use routed::{RoutedTarget, RoutedTargetEngine, StatementRouter};

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;

/// A live, closeable pooled data-source handle.
///
/// Handles published by the registry are shared-read and internally
/// synchronized; this crate coordinates only their construction and
/// teardown, never individual statement executions.
#[async_trait]
pub trait PooledDataSource: Send + Sync {
    /// Execute a statement, returning the number of affected rows.
    async fn execute(&self, statement: &str) -> Result<u64>;

    /// Number of physical pools behind this handle (1 for simple handles,
    /// the shard count for composite handles).
    fn shard_count(&self) -> usize {
        1
    }

    /// Database type identifier (e.g. "postgres", "sharded").
    fn db_type(&self) -> &str;

    /// Close the underlying pool(s). Composite handles close every
    /// constituent and aggregate failures instead of stopping at the first.
    async fn close(&self) -> Result<()>;
}

impl std::fmt::Debug for dyn PooledDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledDataSource")
            .field("db_type", &self.db_type())
            .field("shard_count", &self.shard_count())
            .finish()
    }
}

/// Shared handle to a pooled data source.
pub type DataSourceHandle = Arc<dyn PooledDataSource>;

//! # shard-migrate
//!
//! Data-source registry for a sharded-database migration engine.
//!
//! The migration pipeline reads from one or more source databases and writes
//! into a (possibly sharded) target. This crate owns the resource side of
//! that job:
//!
//! - **Connection descriptors** with value semantics, usable as cache keys
//! - **Pool factory** turning descriptors into live pooled handles, with
//!   atomic construction of sharded composites
//! - **Registry** caching handles per descriptor with single-flight
//!   construction under concurrency and exactly-once recursive teardown
//!
//! Pooling and routing are injected capabilities; a stock deadpool-backed
//! PostgreSQL provider ships in [`drivers::postgres`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use shard_migrate::{
//!     ConnectionDescriptor, DataSourceRegistry, PgPoolProvider, PoolFactory,
//!     RoutedTargetEngine, RoutingRule, StatementRouter,
//! };
//!
//! fn compile_rule(_rule: &RoutingRule) -> shard_migrate::Result<Arc<dyn StatementRouter>> {
//!     unimplemented!("inject the routing engine's rule compiler")
//! }
//!
//! #[tokio::main]
//! async fn main() -> shard_migrate::Result<()> {
//!     let factory = PoolFactory::new(
//!         Arc::new(PgPoolProvider::new()),
//!         Arc::new(RoutedTargetEngine::new(compile_rule)),
//!     );
//!     let sources = vec![ConnectionDescriptor::plain(
//!         "postgres://src0.internal/orders",
//!         "scaling",
//!         "secret",
//!     )];
//!     let target = ConnectionDescriptor::plain(
//!         "postgres://dst.internal/orders",
//!         "scaling",
//!         "secret",
//!     );
//!     let registry = DataSourceRegistry::new(sources, target.clone(), factory).await?;
//!     let handle = registry.get(&target).await?;
//!     handle.execute("TRUNCATE staging").await?;
//!     registry.close().await
//! }
//! ```

pub mod datasource;
pub mod descriptor;
pub mod drivers;
pub mod error;

// Re-exports for convenient access
pub use datasource::{
    DataSourceHandle, DataSourceRegistry, PoolFactory, PoolProvider, PooledDataSource,
    RoutedTarget, RoutedTargetEngine, RoutingEngine, StatementRouter,
};
pub use descriptor::{
    ConnectionDescriptor, Dialect, EndpointMetadata, PlainDescriptor, RoutingRule,
    ShardedTargetDescriptor,
};
pub use drivers::PgPoolProvider;
pub use error::{DataSourceError, Result};

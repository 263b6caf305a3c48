//! Composite handle for sharded targets.
//!
//! [`RoutedTarget`] presents a single logical query surface over N physical
//! shard pools. Each statement is routed to one shard by a
//! [`StatementRouter`], the opaque evaluation side of the routing rule.
//! Closing a routed target closes every constituent pool and aggregates
//! failures into one error.

use async_trait::async_trait;
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::debug;

use crate::descriptor::RoutingRule;
use crate::error::{DataSourceError, Result};

use super::factory::RoutingEngine;
use super::{DataSourceHandle, PooledDataSource};

/// Routes a statement to the name of the shard that must execute it.
///
/// Implementations interpret the routing rule; this core never does.
pub trait StatementRouter: Send + Sync {
    /// Return the shard name for a statement.
    fn route(&self, statement: &str) -> Result<String>;
}

impl<F> StatementRouter for F
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    fn route(&self, statement: &str) -> Result<String> {
        self(statement)
    }
}

/// Composite data-source handle spanning multiple shard pools.
pub struct RoutedTarget {
    shards: IndexMap<String, DataSourceHandle>,
    router: Arc<dyn StatementRouter>,
}

impl RoutedTarget {
    /// Create a routed target over shard pools and a router.
    pub fn new(shards: IndexMap<String, DataSourceHandle>, router: Arc<dyn StatementRouter>) -> Self {
        Self { shards, router }
    }

    /// Names of the constituent shards, in insertion order.
    pub fn shard_names(&self) -> impl Iterator<Item = &str> {
        self.shards.keys().map(String::as_str)
    }
}

#[async_trait]
impl PooledDataSource for RoutedTarget {
    async fn execute(&self, statement: &str) -> Result<u64> {
        let shard = self.router.route(statement)?;
        let pool = self.shards.get(&shard).ok_or_else(|| {
            DataSourceError::Routing(format!("routing rule selected unknown shard '{shard}'"))
        })?;
        debug!(shard = %shard, "routing statement");
        pool.execute(statement).await
    }

    fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn db_type(&self) -> &str {
        "sharded"
    }

    async fn close(&self) -> Result<()> {
        // Attempt every shard before reporting; one failing close must not
        // leave siblings open.
        let mut failures = Vec::new();
        for (name, pool) in &self.shards {
            if let Err(e) = pool.close().await {
                failures.push(format!("{name}: {e}"));
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(DataSourceError::Teardown { failures })
        }
    }
}

/// Stock [`RoutingEngine`] that composes [`RoutedTarget`] handles.
///
/// The rule-to-router compilation step is injected, keeping the routing
/// algorithm an external collaborator's concern.
pub struct RoutedTargetEngine<C> {
    compiler: C,
}

impl<C> RoutedTargetEngine<C>
where
    C: Fn(&RoutingRule) -> Result<Arc<dyn StatementRouter>> + Send + Sync,
{
    /// Create an engine from a rule compiler.
    pub fn new(compiler: C) -> Self {
        Self { compiler }
    }
}

impl<C> RoutingEngine for RoutedTargetEngine<C>
where
    C: Fn(&RoutingRule) -> Result<Arc<dyn StatementRouter>> + Send + Sync,
{
    fn compose(
        &self,
        shards: IndexMap<String, DataSourceHandle>,
        rule: &RoutingRule,
    ) -> Result<DataSourceHandle> {
        let router = (self.compiler)(rule)?;
        Ok(Arc::new(RoutedTarget::new(shards, router)))
    }
}

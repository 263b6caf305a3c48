//! Pool factory - turns descriptors into live handles.
//!
//! Pure construction: no caching, no identity concerns. Caching lives in
//! [`super::registry::DataSourceRegistry`].

use async_trait::async_trait;
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::descriptor::{
    ConnectionDescriptor, PlainDescriptor, RoutingRule, ShardedTargetDescriptor,
};
use crate::error::Result;

use super::DataSourceHandle;

/// Builds one physical pool for one endpoint.
///
/// The provider owns pool tuning (timeouts, max size) with fixed sensible
/// defaults; this layer passes no knobs through. Failures surface as
/// [`crate::error::DataSourceError::PoolCreation`], or
/// [`crate::error::DataSourceError::Unsupported`] for dialects the provider
/// cannot serve.
#[async_trait]
pub trait PoolProvider: Send + Sync {
    /// Build a live pooled handle for a plain endpoint descriptor.
    async fn create_pool(&self, descriptor: &PlainDescriptor) -> Result<DataSourceHandle>;
}

/// Composes a routed composite handle from shard pools and a rule.
///
/// This is the external routing/execution collaborator's constructor; the
/// factory treats it as opaque. The stock implementation is
/// [`super::routed::RoutedTargetEngine`].
pub trait RoutingEngine: Send + Sync {
    /// Build a composite handle over the shard-name → pool mapping.
    fn compose(
        &self,
        shards: IndexMap<String, DataSourceHandle>,
        rule: &RoutingRule,
    ) -> Result<DataSourceHandle>;
}

/// Factory dispatching on descriptor variant.
pub struct PoolFactory {
    provider: Arc<dyn PoolProvider>,
    routing: Arc<dyn RoutingEngine>,
}

impl PoolFactory {
    /// Create a factory from a pool provider and a routing engine.
    pub fn new(provider: Arc<dyn PoolProvider>, routing: Arc<dyn RoutingEngine>) -> Self {
        Self { provider, routing }
    }

    /// Build a live handle for a descriptor.
    ///
    /// Sharded builds are atomic: if any shard pool fails, already-built
    /// sibling pools are closed before the error propagates.
    pub async fn build(&self, descriptor: &ConnectionDescriptor) -> Result<DataSourceHandle> {
        match descriptor {
            ConnectionDescriptor::Plain(plain) => {
                debug!(endpoint = %plain.display_name(), "building pool");
                self.provider.create_pool(plain).await
            }
            ConnectionDescriptor::ShardedTarget(sharded) => self.build_sharded(sharded).await,
        }
    }

    async fn build_sharded(&self, descriptor: &ShardedTargetDescriptor) -> Result<DataSourceHandle> {
        let mut pools: IndexMap<String, DataSourceHandle> =
            IndexMap::with_capacity(descriptor.shards.len());

        for (name, shard) in &descriptor.shards {
            debug!(shard = %name, endpoint = %shard.display_name(), "building shard pool");
            match self.provider.create_pool(shard).await {
                Ok(pool) => {
                    pools.insert(name.clone(), pool);
                }
                Err(e) => {
                    // Unwind siblings built for this attempt; nothing may
                    // leak on partial failure.
                    for (built_name, built) in &pools {
                        if let Err(close_err) = built.close().await {
                            warn!(
                                shard = %built_name,
                                error = %close_err,
                                "failed to close shard pool while unwinding"
                            );
                        }
                    }
                    return Err(e);
                }
            }
        }

        self.routing.compose(pools, &descriptor.rule)
    }
}

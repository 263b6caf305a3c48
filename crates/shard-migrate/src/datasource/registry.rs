//! Data-source registry - the single source of truth mapping descriptors to
//! live handles.
//!
//! One registry instance exists per migration job. Construction eagerly
//! resolves every source descriptor plus the target descriptor; further
//! descriptors are resolved lazily on first `get` with single-flight
//! semantics (exactly one pool build per key, all callers share the result).
//! Close is terminal and idempotent: every cached handle is closed exactly
//! once, composite handles recursively.

use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::descriptor::ConnectionDescriptor;
use crate::error::{DataSourceError, Result};

use super::factory::PoolFactory;
use super::DataSourceHandle;

struct RegistryState {
    closed: bool,
    /// Every descriptor ever resolved.
    all: HashMap<ConnectionDescriptor, DataSourceHandle>,
    /// Subset supplied as sources at construction.
    sources: HashMap<ConnectionDescriptor, DataSourceHandle>,
}

/// Descriptor-keyed cache of pooled handles with full lifecycle ownership.
pub struct DataSourceRegistry {
    factory: PoolFactory,
    state: RwLock<RegistryState>,
}

impl std::fmt::Debug for DataSourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSourceRegistry").finish_non_exhaustive()
    }
}

impl DataSourceRegistry {
    /// Create a registry, eagerly resolving all source descriptors and the
    /// target descriptor.
    ///
    /// A descriptor appearing more than once (or as both a source and the
    /// target) is built once and shared. If any eager build fails, handles
    /// already built for this registry are closed before the error
    /// propagates.
    pub async fn new(
        sources: Vec<ConnectionDescriptor>,
        target: ConnectionDescriptor,
        factory: PoolFactory,
    ) -> Result<Self> {
        if sources.is_empty() {
            return Err(DataSourceError::Config(
                "at least one source data source is required".into(),
            ));
        }

        let mut all: HashMap<ConnectionDescriptor, DataSourceHandle> = HashMap::new();
        let mut source_handles: HashMap<ConnectionDescriptor, DataSourceHandle> = HashMap::new();

        for descriptor in &sources {
            let handle = match all.get(descriptor).cloned() {
                Some(existing) => existing,
                None => match factory.build(descriptor).await {
                    Ok(handle) => {
                        all.insert(descriptor.clone(), handle.clone());
                        handle
                    }
                    Err(e) => {
                        Self::close_all(all).await;
                        return Err(e);
                    }
                },
            };
            source_handles.insert(descriptor.clone(), handle);
        }

        if !all.contains_key(&target) {
            match factory.build(&target).await {
                Ok(handle) => {
                    all.insert(target.clone(), handle);
                }
                Err(e) => {
                    Self::close_all(all).await;
                    return Err(e);
                }
            }
        }

        info!(
            sources = source_handles.len(),
            total = all.len(),
            "data source registry initialized"
        );

        Ok(Self {
            factory,
            state: RwLock::new(RegistryState {
                closed: false,
                all,
                sources: source_handles,
            }),
        })
    }

    /// Get the handle for a descriptor, building and caching it on first use.
    ///
    /// Cache hits take only a shared read lock. On a miss the exclusive
    /// section re-checks the key, so N concurrent first-time callers perform
    /// exactly one build and all receive the same handle. A failed build
    /// inserts nothing; the next `get` for that descriptor retries.
    pub async fn get(&self, descriptor: &ConnectionDescriptor) -> Result<DataSourceHandle> {
        {
            let state = self.state.read().await;
            if state.closed {
                return Err(DataSourceError::Closed);
            }
            if let Some(handle) = state.all.get(descriptor) {
                return Ok(handle.clone());
            }
        }

        let mut state = self.state.write().await;
        if state.closed {
            return Err(DataSourceError::Closed);
        }
        if let Some(handle) = state.all.get(descriptor) {
            return Ok(handle.clone());
        }

        debug!(descriptor = %descriptor.display_name(), "cache miss, building handle");
        let handle = self.factory.build(descriptor).await?;
        state.all.insert(descriptor.clone(), handle.clone());
        Ok(handle)
    }

    /// Snapshot of the source handles (read side).
    pub async fn source_handles(&self) -> HashMap<ConnectionDescriptor, DataSourceHandle> {
        self.state.read().await.sources.clone()
    }

    /// Snapshot of every cached handle, including the target.
    pub async fn all_handles(&self) -> HashMap<ConnectionDescriptor, DataSourceHandle> {
        self.state.read().await.all.clone()
    }

    /// Whether the registry has been closed.
    pub async fn is_closed(&self) -> bool {
        self.state.read().await.closed
    }

    /// Close every cached handle and clear the registry.
    ///
    /// Terminal and idempotent: the first call transitions to closed and
    /// tears everything down; later calls are no-ops. Failures are collected
    /// per handle after attempting every close, then reported as one
    /// [`DataSourceError::Teardown`].
    pub async fn close(&self) -> Result<()> {
        let drained = {
            let mut state = self.state.write().await;
            if state.closed {
                return Ok(());
            }
            state.closed = true;
            state.sources.clear();
            std::mem::take(&mut state.all)
        };

        info!(handles = drained.len(), "closing data source registry");
        let mut failures = Vec::new();
        for (descriptor, handle) in drained {
            if let Err(e) = handle.close().await {
                failures.push(format!("{}: {}", descriptor.display_name(), e));
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(DataSourceError::Teardown { failures })
        }
    }

    /// Best-effort close of handles built during a failed construction.
    async fn close_all(handles: HashMap<ConnectionDescriptor, DataSourceHandle>) {
        for (descriptor, handle) in handles {
            if let Err(e) = handle.close().await {
                warn!(
                    descriptor = %descriptor.display_name(),
                    error = %e,
                    "failed to close handle while unwinding registry construction"
                );
            }
        }
    }
}

//! Connection descriptors - immutable identities for database endpoints.
//!
//! A [`ConnectionDescriptor`] says where and how to connect, with value
//! semantics suitable for use as a cache key:
//!
//! - [`PlainDescriptor`]: a single physical endpoint (url, username, password)
//! - [`ShardedTargetDescriptor`]: a logical database made of named shards
//!   plus a routing rule
//!
//! Descriptors never attempt a connection. Identity covers only structural
//! fields; metadata derived at construction time is excluded, so descriptors
//! with identical shards and rule compare equal whether or not metadata was
//! ever inferred.

mod types;

pub use types::{ConnectionDescriptor, PlainDescriptor, RoutingRule, ShardedTargetDescriptor};

pub mod metadata;
pub use metadata::{Dialect, EndpointMetadata};

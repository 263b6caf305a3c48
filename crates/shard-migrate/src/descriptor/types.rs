//! Descriptor type definitions.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::metadata::EndpointMetadata;

/// Descriptor for a single physical database endpoint.
///
/// Identity is the (url, username, password) triple. Construction never
/// attempts a connection.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlainDescriptor {
    /// Connection URL (e.g. `postgres://host:5432/db`).
    pub url: String,
    /// Username.
    pub username: String,
    /// Password.
    pub password: String,
}

impl PlainDescriptor {
    /// Create a plain descriptor. Always valid; validation of reachability
    /// happens at pool construction time.
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Derive advisory endpoint metadata from the URL and username.
    ///
    /// Returns `None` when the URL cannot be interpreted; callers must not
    /// treat that as an error.
    pub fn endpoint_metadata(&self) -> Option<EndpointMetadata> {
        EndpointMetadata::from_url(&self.url, &self.username)
    }

    /// Password-free label for logs and error messages.
    pub fn display_name(&self) -> String {
        format!("{} (user={})", self.url, self.username)
    }
}

impl fmt::Debug for PlainDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlainDescriptor")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Routing rule for a sharded target.
///
/// This core treats the rule as an opaque value: it participates in
/// descriptor identity and is handed to the routing collaborator unchanged,
/// but its fields are never interpreted here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoutingRule {
    /// Column whose value selects the shard.
    pub sharding_column: String,
    /// Shard selection expression, evaluated by the routing engine.
    pub algorithm_expression: String,
}

impl RoutingRule {
    /// Create a routing rule.
    pub fn new(
        sharding_column: impl Into<String>,
        algorithm_expression: impl Into<String>,
    ) -> Self {
        Self {
            sharding_column: sharding_column.into(),
            algorithm_expression: algorithm_expression.into(),
        }
    }
}

/// Descriptor for a logical sharded target database.
///
/// `shards` maps shard names to physical endpoint descriptors; iteration
/// order is insertion order. `metadata` is inferred once at construction
/// from the first shard and is excluded from identity, so two descriptors
/// with identical shards and rule compare equal even when one was built
/// without metadata (e.g. deserialized before shards were known).
#[derive(Debug, Clone, Serialize)]
pub struct ShardedTargetDescriptor {
    /// Shard name to endpoint mapping, in insertion order.
    pub shards: IndexMap<String, PlainDescriptor>,
    /// Routing rule, opaque to this core.
    pub rule: RoutingRule,
    /// Advisory dialect/connection metadata from the first shard.
    /// Absent when `shards` is empty or inference failed.
    #[serde(skip)]
    pub metadata: Option<EndpointMetadata>,
}

impl ShardedTargetDescriptor {
    /// Create a sharded target descriptor, inferring metadata from the first
    /// shard in insertion order. Inference failure leaves metadata absent
    /// rather than failing construction.
    pub fn new(shards: IndexMap<String, PlainDescriptor>, rule: RoutingRule) -> Self {
        let metadata = shards.values().next().and_then(|s| s.endpoint_metadata());
        Self {
            shards,
            rule,
            metadata,
        }
    }

    /// Password-free label for logs and error messages.
    pub fn display_name(&self) -> String {
        format!(
            "sharded target ({} shard(s), column={})",
            self.shards.len(),
            self.rule.sharding_column
        )
    }
}

impl PartialEq for ShardedTargetDescriptor {
    fn eq(&self, other: &Self) -> bool {
        // metadata is derived, never part of identity
        self.shards == other.shards && self.rule == other.rule
    }
}

impl Eq for ShardedTargetDescriptor {}

impl Hash for ShardedTargetDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // IndexMap equality ignores insertion order, so entry hashes are
        // combined order-independently to keep Hash consistent with Eq.
        let mut combined: u64 = 0;
        for (name, shard) in &self.shards {
            let mut entry = DefaultHasher::new();
            name.hash(&mut entry);
            shard.hash(&mut entry);
            combined = combined.wrapping_add(entry.finish());
        }
        combined.hash(state);
        self.shards.len().hash(state);
        self.rule.hash(state);
    }
}

// Deserialization goes through `new` so the constructed-once metadata
// invariant holds for descriptors parsed from external configuration.
impl<'de> Deserialize<'de> for ShardedTargetDescriptor {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            shards: IndexMap<String, PlainDescriptor>,
            rule: RoutingRule,
        }
        let raw = Raw::deserialize(deserializer)?;
        Ok(ShardedTargetDescriptor::new(raw.shards, raw.rule))
    }
}

/// Polymorphic connection descriptor.
///
/// A closed set of variants: adding a new one is a compile-time exhaustiveness
/// failure everywhere descriptors are matched, not a silent fallthrough.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConnectionDescriptor {
    /// Single physical endpoint.
    Plain(PlainDescriptor),
    /// Logical sharded database with a routing rule.
    ShardedTarget(ShardedTargetDescriptor),
}

impl ConnectionDescriptor {
    /// Create a plain descriptor.
    pub fn plain(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        ConnectionDescriptor::Plain(PlainDescriptor::new(url, username, password))
    }

    /// Create a sharded target descriptor.
    pub fn sharded_target(shards: IndexMap<String, PlainDescriptor>, rule: RoutingRule) -> Self {
        ConnectionDescriptor::ShardedTarget(ShardedTargetDescriptor::new(shards, rule))
    }

    /// Password-free label for logs and error messages.
    pub fn display_name(&self) -> String {
        match self {
            ConnectionDescriptor::Plain(d) => d.display_name(),
            ConnectionDescriptor::ShardedTarget(d) => d.display_name(),
        }
    }

    /// Advisory endpoint metadata, if it could be inferred.
    pub fn endpoint_metadata(&self) -> Option<EndpointMetadata> {
        match self {
            ConnectionDescriptor::Plain(d) => d.endpoint_metadata(),
            ConnectionDescriptor::ShardedTarget(d) => d.metadata.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Dialect;
    use std::collections::HashMap;

    fn shard(n: u16) -> PlainDescriptor {
        PlainDescriptor::new(
            format!("postgres://db{n}.internal:5432/orders"),
            "scaling",
            "secret",
        )
    }

    fn rule() -> RoutingRule {
        RoutingRule::new("order_id", "ds${order_id % 2}")
    }

    #[test]
    fn test_plain_identity_is_the_triple() {
        let a = PlainDescriptor::new("postgres://h/db", "u", "p");
        let b = PlainDescriptor::new("postgres://h/db", "u", "p");
        let c = PlainDescriptor::new("postgres://h/db", "u", "other");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_plain_debug_redacts_password() {
        let d = PlainDescriptor::new("postgres://h/db", "u", "super_secret_pw");
        let out = format!("{:?}", d);
        assert!(out.contains("[REDACTED]"));
        assert!(!out.contains("super_secret_pw"));
    }

    #[test]
    fn test_identity_excludes_derived_metadata() {
        let mut shards = IndexMap::new();
        shards.insert("ds0".to_string(), shard(0));
        shards.insert("ds1".to_string(), shard(1));

        let with_metadata = ShardedTargetDescriptor::new(shards.clone(), rule());
        assert!(with_metadata.metadata.is_some());

        // Built without going through `new`, metadata absent.
        let without_metadata = ShardedTargetDescriptor {
            shards,
            rule: rule(),
            metadata: None,
        };

        assert_eq!(with_metadata, without_metadata);

        let mut map = HashMap::new();
        map.insert(with_metadata.clone(), 1);
        assert!(map.contains_key(&without_metadata));
    }

    #[test]
    fn test_empty_shards_leave_metadata_absent() {
        let d = ShardedTargetDescriptor::new(IndexMap::new(), rule());
        assert!(d.metadata.is_none());
    }

    #[test]
    fn test_first_shard_inference_follows_insertion_order() {
        let mut shards = IndexMap::new();
        shards.insert("ds0".to_string(), shard(0));
        shards.insert("ds1".to_string(), shard(1));
        let d = ShardedTargetDescriptor::new(shards, rule());
        let meta = d.metadata.expect("metadata");
        assert_eq!(meta.host, "db0.internal");

        // Reversed insertion order infers from the other shard.
        let mut reversed = IndexMap::new();
        reversed.insert("ds1".to_string(), shard(1));
        reversed.insert("ds0".to_string(), shard(0));
        let d2 = ShardedTargetDescriptor::new(reversed, rule());
        assert_eq!(d2.metadata.expect("metadata").host, "db1.internal");
    }

    #[test]
    fn test_uninferable_first_shard_does_not_fail_construction() {
        let mut shards = IndexMap::new();
        shards.insert(
            "ds0".to_string(),
            PlainDescriptor::new("not-a-url", "u", "p"),
        );
        let d = ShardedTargetDescriptor::new(shards, rule());
        assert!(d.metadata.is_none());
    }

    #[test]
    fn test_equal_maps_hash_alike_regardless_of_insertion_order() {
        let mut forward = IndexMap::new();
        forward.insert("ds0".to_string(), shard(0));
        forward.insert("ds1".to_string(), shard(1));
        let mut backward = IndexMap::new();
        backward.insert("ds1".to_string(), shard(1));
        backward.insert("ds0".to_string(), shard(0));

        let a = ShardedTargetDescriptor::new(forward, rule());
        let b = ShardedTargetDescriptor::new(backward, rule());
        // Metadata differs (inferred from different first shards) but
        // identity does not.
        assert_eq!(a, b);

        let mut map = HashMap::new();
        map.insert(a, "hit");
        assert_eq!(map.get(&b), Some(&"hit"));
    }

    #[test]
    fn test_different_variants_never_equal() {
        let plain = ConnectionDescriptor::plain("postgres://h/db", "u", "p");
        let sharded = ConnectionDescriptor::sharded_target(IndexMap::new(), rule());
        assert_ne!(plain, sharded);
    }

    #[test]
    fn test_descriptor_deserialization_recomputes_metadata() {
        let yaml = r#"
kind: sharded_target
shards:
  ds0:
    url: postgres://db0.internal:5432/orders
    username: scaling
    password: secret
rule:
  sharding_column: order_id
  algorithm_expression: "ds${order_id % 2}"
"#;
        let parsed: ConnectionDescriptor = serde_yaml::from_str(yaml).expect("parse");
        match &parsed {
            ConnectionDescriptor::ShardedTarget(d) => {
                let meta = d.metadata.as_ref().expect("metadata inferred on parse");
                assert_eq!(meta.dialect, Dialect::Postgres);
                assert_eq!(meta.host, "db0.internal");
            }
            other => panic!("expected sharded target, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_descriptor_yaml_round_trip() {
        let d = ConnectionDescriptor::plain("postgres://h:5432/db", "u", "p");
        let yaml = serde_yaml::to_string(&d).expect("serialize");
        let back: ConnectionDescriptor = serde_yaml::from_str(&yaml).expect("parse");
        assert_eq!(d, back);
    }
}

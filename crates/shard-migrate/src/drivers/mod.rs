//! Stock pool-provider implementations.
//!
//! The registry core is provider-agnostic; this module supplies the built-in
//! [`postgres`] provider used when no custom [`crate::datasource::PoolProvider`]
//! is injected.

pub mod postgres;

pub use postgres::PgPoolProvider;

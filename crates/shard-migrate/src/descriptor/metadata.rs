//! Advisory endpoint metadata derived from connection URLs.
//!
//! Metadata inference is best-effort: it feeds display and compatibility
//! checks, never identity or routing decisions, so a URL the parser does not
//! understand yields `None` instead of an error.

use serde::{Deserialize, Serialize};

/// Database dialect inferred from a connection URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    Postgres,
    Mysql,
    Mssql,
}

impl Dialect {
    /// Infer the dialect from a URL scheme.
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Some(Dialect::Postgres),
            "mysql" => Some(Dialect::Mysql),
            "mssql" | "sqlserver" => Some(Dialect::Mssql),
            _ => None,
        }
    }

    /// Dialect identifier string (e.g. "postgres").
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::Mysql => "mysql",
            Dialect::Mssql => "mssql",
        }
    }

    /// Default port for the dialect.
    pub fn default_port(&self) -> u16 {
        match self {
            Dialect::Postgres => 5432,
            Dialect::Mysql => 3306,
            Dialect::Mssql => 1433,
        }
    }
}

/// Connection metadata derived from a descriptor's URL and username.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointMetadata {
    /// Inferred database dialect.
    pub dialect: Dialect,
    /// Endpoint host.
    pub host: String,
    /// Endpoint port (dialect default when the URL omits it).
    pub port: u16,
    /// Database name from the URL path, if present.
    pub database: Option<String>,
    /// Username the endpoint is reached as.
    pub username: String,
}

impl EndpointMetadata {
    /// Derive metadata from a connection URL and username.
    ///
    /// Accepts URLs of the form `scheme://[user[:pass]@]host[:port][/database]`.
    /// Returns `None` when the scheme is unknown or the URL is malformed.
    pub fn from_url(url: &str, username: &str) -> Option<Self> {
        let (scheme, rest) = url.split_once("://")?;
        let dialect = Dialect::from_scheme(scheme)?;

        // Strip any userinfo embedded in the URL; the descriptor's own
        // username field is authoritative.
        let authority_and_path = rest.rsplit_once('@').map_or(rest, |(_, tail)| tail);
        let (authority, path) = match authority_and_path.split_once('/') {
            Some((auth, path)) => (auth, Some(path)),
            None => (authority_and_path, None),
        };

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port_str)) => (host, port_str.parse::<u16>().ok()?),
            None => (authority, dialect.default_port()),
        };
        if host.is_empty() {
            return None;
        }

        let database = path
            .map(|p| p.split(['?', '#']).next().unwrap_or(p))
            .filter(|db| !db.is_empty())
            .map(str::to_string);

        Some(Self {
            dialect,
            host: host.to_string(),
            port,
            database,
            username: username.to_string(),
        })
    }
}

//! Runner configuration.
//!
//! Only the connection string comes from the environment; the database and
//! collection names are fixed but kept as fields so tests can redirect them.

use std::env;

/// Environment variable holding the MongoDB connection string.
pub const URI_VAR: &str = "MONGODB_URI";
pub const DEFAULT_URI: &str = "mongodb://localhost:27017";
pub const DEFAULT_DATABASE: &str = "plp_bookstore";
pub const DEFAULT_COLLECTION: &str = "books";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }
}

impl RunnerConfig {
    /// Reads `MONGODB_URI` from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup. A missing or
    /// empty URI falls back to [`DEFAULT_URI`]; any other value is used as is.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let uri = lookup(URI_VAR)
            .filter(|uri| !uri.is_empty())
            .unwrap_or_else(|| DEFAULT_URI.to_string());

        Self { uri, ..Self::default() }
    }

    /// The connection string with any `user:password@` credentials masked.
    ///
    /// Everything up to the last `@` after the scheme counts as credentials, so
    /// a password containing `/` or `@` is masked whole.
    pub fn redacted_uri(&self) -> String {
        let Some(scheme_end) = self.uri.find("://") else {
            return self.uri.clone();
        };
        let rest = &self.uri[scheme_end + 3..];

        match rest.rfind('@') {
            Some(at) => format!("{}://***:***@{}", &self.uri[..scheme_end], &rest[at + 1..]),
            None => self.uri.clone(),
        }
    }
}

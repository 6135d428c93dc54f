use crate::catalog::QuerySpec;
use crate::models::{Destination, RawRow};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Connection error: {0}")]
    ConnectionError(String),
    #[error("Query execution error: {0}")]
    ExecutionError(String),
    #[error("Fixture error: {0}")]
    FixtureError(String),
    #[error("Incomplete credentials: username and password are required")]
    IncompleteCredentials,
}

/// A live data-source handle. Warehouse implementations open a fresh
/// server-side session per fetch with result caching disabled; the sample
/// implementation re-reads fixture files per fetch.
#[async_trait]
pub trait ReportQuerier: Send + Sync {
    /// Run the query (or read the fixture) and return raw rows.
    async fn fetch(&self, spec: &QuerySpec) -> Result<Vec<RawRow>, QueryError>;

    fn destination(&self) -> Destination;
}

impl std::fmt::Debug for dyn ReportQuerier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportQuerier")
            .field("destination", &self.destination())
            .finish()
    }
}

use crate::executors::base::ReportQuerier;
use crate::models::{AccountingBook, Credentials, Destination, ReportTarget};
use log::{debug, info};
use std::env;

/// Result of a credential save attempt.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CredentialStatus {
    Saved,
    /// Username or password was empty; prior committed credentials are kept.
    Incomplete,
}

/// Per-session mutable state: committed credentials, report selections, and
/// the cached connection handle. Created when a session starts and owned by
/// the shell; nothing here is shared across sessions.
pub struct SessionContext {
    credentials: Option<Credentials>,
    connection: Option<Box<dyn ReportQuerier>>,
    pub destination: Destination,
    pub accounting_book: AccountingBook,
    pub target: ReportTarget,
}

impl SessionContext {
    /// Start a session. The report target defaults to the
    /// `SNOWFLAKE_DATABASE`/`SNOWFLAKE_SCHEMA` environment variables, falling
    /// back to the Fivetran demo namespace.
    pub fn start() -> Self {
        let database = env::var("SNOWFLAKE_DATABASE")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "PC_FIVETRAN_DB".to_string());
        let schema = env::var("SNOWFLAKE_SCHEMA")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "DBT_FIVETRAN_NETSUITE".to_string());

        Self {
            credentials: None,
            connection: None,
            destination: Destination::Snowflake,
            accounting_book: AccountingBook::default(),
            target: ReportTarget::new(database, schema),
        }
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Commit a credential set. Empty username or password leaves the prior
    /// committed credentials untouched and reports `Incomplete`. A successful
    /// save drops any cached connection handle so the factory runs again on
    /// the next query.
    pub fn set_credentials(&mut self, candidate: Credentials) -> CredentialStatus {
        if !candidate.is_complete() {
            debug!("rejected credential save: username or password empty");
            return CredentialStatus::Incomplete;
        }

        info!("credentials saved for user {}", candidate.username);
        self.credentials = Some(candidate);
        self.invalidate_connection();
        CredentialStatus::Saved
    }

    /// Drop the cached connection handle. Called on every credential resave.
    pub fn invalidate_connection(&mut self) {
        if self.connection.take().is_some() {
            debug!("cached connection handle invalidated");
        }
    }

    pub fn cache_connection(&mut self, handle: Box<dyn ReportQuerier>) {
        self.connection = Some(handle);
    }

    pub fn cached_connection(&self) -> Option<&dyn ReportQuerier> {
        self.connection.as_deref()
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::start()
    }
}

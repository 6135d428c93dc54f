use crate::catalog::{build_query, CatalogError};
use crate::config::Secrets;
use crate::executors::base::QueryError;
use crate::executors::create_connection;
use crate::models::{Credentials, ReportModel, ResultRow};
use crate::normalize::{normalize, NormalizeError};
use crate::session::{CredentialStatus, SessionContext};
use log::{info, warn};
use thiserror::Error;

/// Shell state, derived from session values on every interaction.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ShellState {
    LoggedOut,
    AwaitingCredentials,
    Ready,
}

#[derive(Error, Debug)]
pub enum ShellError {
    #[error("Please enter the password to access the NetSuite dashboard.")]
    NotAuthenticated,
    #[error("Please enter your Snowflake username and password to view reports.")]
    IncompleteCredentials,
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("Error connecting to {destination}: {source}")]
    Connection {
        destination: String,
        source: QueryError,
    },
    #[error("Query failed: {0}")]
    Query(QueryError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

/// Orchestrates the login gate, credential capture, destination/report
/// selection, query, and normalization. All failures are session-local:
/// a failed query never corrupts committed credentials or selections.
pub struct DashboardShell {
    secrets: Secrets,
    session: SessionContext,
    authenticated: bool,
}

impl DashboardShell {
    pub fn new(secrets: Secrets) -> Self {
        Self {
            secrets,
            session: SessionContext::start(),
            authenticated: false,
        }
    }

    pub fn state(&self) -> ShellState {
        if !self.authenticated {
            ShellState::LoggedOut
        } else if self.session.credentials().is_none() {
            ShellState::AwaitingCredentials
        } else {
            ShellState::Ready
        }
    }

    /// Compare against the shared dashboard password. Wrong password keeps
    /// the shell logged out.
    pub fn login(&mut self, password: &str) -> bool {
        if password == self.secrets.auth_password() {
            info!("login successful");
            self.authenticated = true;
        } else {
            warn!("incorrect login password");
        }
        self.authenticated
    }

    /// Commit a credential set. An empty role falls back to the
    /// operator-configured default role when one is available.
    pub fn save_credentials(&mut self, mut candidate: Credentials) -> CredentialStatus {
        if candidate.role.is_empty() {
            if let Some(role) = self.secrets.snowflake_role() {
                candidate.role = role;
            }
        }
        self.session.set_credentials(candidate)
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionContext {
        &mut self.session
    }

    /// Run one report end to end: catalog lookup, connection creation,
    /// fetch, normalization, and ordering by the sort helper.
    pub async fn run_report(&mut self, model: ReportModel) -> Result<Vec<ResultRow>, ShellError> {
        match self.state() {
            ShellState::LoggedOut => return Err(ShellError::NotAuthenticated),
            ShellState::AwaitingCredentials => return Err(ShellError::IncompleteCredentials),
            ShellState::Ready => {}
        }

        let destination = self.session.destination;
        let spec = build_query(
            destination,
            model,
            &self.session.target,
            self.session.accounting_book,
        )?;

        // Connections are recreated per query; the cached handle only exists
        // so a credential resave has something to invalidate.
        let handle = create_connection(
            destination,
            self.session.credentials(),
            &self.secrets,
            &self.session.target,
        )
        .map_err(|source| ShellError::Connection {
            destination: destination.to_string(),
            source,
        })?;

        let raw = handle.fetch(&spec).await.map_err(ShellError::Query)?;
        self.session.cache_connection(handle);

        let mut rows = normalize(&raw, model)?;
        rows.sort_by_key(|row| row.sort_helper);

        info!(
            "{} {} report returned {} rows",
            destination,
            model,
            rows.len()
        );
        Ok(rows)
    }
}

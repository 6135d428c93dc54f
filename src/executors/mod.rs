pub mod base;
pub mod bigquery;
pub mod sample;
pub mod snowflake;

use crate::config::Secrets;
use crate::executors::base::{QueryError, ReportQuerier};
use crate::executors::bigquery::BigQueryExecutor;
use crate::executors::sample::SampleDataExecutor;
use crate::executors::snowflake::SnowflakeExecutor;
use crate::models::{Credentials, Destination, ReportTarget};

/// Create the data-source handle for a destination.
///
/// Snowflake takes user/password/role from the session credentials and
/// account/warehouse from the trusted configuration (with env fallback).
/// BigQuery uses the operator-managed service-account key only; user
/// credentials never reach that path. Sample data needs no connection.
pub fn create_connection(
    destination: Destination,
    credentials: Option<&Credentials>,
    secrets: &Secrets,
    target: &ReportTarget,
) -> Result<Box<dyn ReportQuerier>, QueryError> {
    match destination {
        Destination::Snowflake => {
            let credentials = credentials.ok_or(QueryError::IncompleteCredentials)?;
            let account = secrets.snowflake_account().ok_or_else(|| {
                QueryError::ConnectionError(
                    "Snowflake account is not configured (secrets or SNOWFLAKE_ACCOUNT)"
                        .to_string(),
                )
            })?;
            let warehouse = secrets.snowflake_warehouse().ok_or_else(|| {
                QueryError::ConnectionError(
                    "Snowflake warehouse is not configured (secrets or SNOWFLAKE_WAREHOUSE)"
                        .to_string(),
                )
            })?;
            let executor = SnowflakeExecutor::new(&account, &warehouse, credentials, target)?;
            Ok(Box::new(executor))
        }
        Destination::BigQuery => {
            let key = secrets.service_account().ok_or_else(|| {
                QueryError::ConnectionError(
                    "BigQuery service account is not configured".to_string(),
                )
            })?;
            Ok(Box::new(BigQueryExecutor::new(key.clone())))
        }
        Destination::SampleData => Ok(Box::new(SampleDataExecutor::new())),
    }
}

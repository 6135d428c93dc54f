use super::base::{QueryError, ReportQuerier};
use crate::catalog::QuerySpec;
use crate::models::{Credentials, Destination, RawRow, ReportTarget};
use async_trait::async_trait;
use chrono::{NaiveDate, TimeDelta};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

/// Executor for the Snowflake REST interface.
///
/// Each fetch opens a fresh server-side session with `USE_CACHED_RESULT`
/// disabled and tears the session down afterwards, so no cached result ever
/// survives between queries.
pub struct SnowflakeExecutor {
    base_url: String,
    account: String,
    username: String,
    password: String,
    role: String,
    warehouse: String,
    database: String,
    schema: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct LoginResponse {
    success: bool,
    message: Option<String>,
    data: Option<LoginData>,
}

#[derive(Deserialize)]
struct LoginData {
    token: String,
}

#[derive(Deserialize)]
struct QueryResponse {
    success: bool,
    message: Option<String>,
    data: Option<QueryData>,
}

#[derive(Deserialize)]
struct QueryData {
    rowtype: Vec<ColumnType>,
    rowset: Vec<Vec<Value>>,
}

#[derive(Deserialize)]
struct ColumnType {
    name: String,
    #[serde(rename = "type")]
    column_type: String,
}

impl SnowflakeExecutor {
    pub fn new(
        account: &str,
        warehouse: &str,
        credentials: &Credentials,
        target: &ReportTarget,
    ) -> Result<Self, QueryError> {
        let base_url = format!("https://{}.snowflakecomputing.com", account);
        Self::with_base_url(&base_url, account, warehouse, credentials, target)
    }

    /// Construct against an explicit base URL. Used by tests to point the
    /// executor at a local server.
    pub fn with_base_url(
        base_url: &str,
        account: &str,
        warehouse: &str,
        credentials: &Credentials,
        target: &ReportTarget,
    ) -> Result<Self, QueryError> {
        if !credentials.is_complete() {
            return Err(QueryError::IncompleteCredentials);
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            account: account.to_string(),
            username: credentials.username.clone(),
            password: credentials.password.clone(),
            role: credentials.role.clone(),
            warehouse: warehouse.to_string(),
            database: target.database.clone().unwrap_or_default(),
            schema: target.schema.clone().unwrap_or_default(),
            client: reqwest::Client::new(),
        })
    }

    /// Open a session. `USE_CACHED_RESULT` is disabled so every query reads
    /// fresh data.
    async fn login(&self) -> Result<String, QueryError> {
        let url = format!(
            "{}/session/v1/login-request?warehouse={}&databaseName={}&schemaName={}&roleName={}",
            self.base_url, self.warehouse, self.database, self.schema, self.role
        );

        let body = json!({
            "data": {
                "LOGIN_NAME": self.username,
                "PASSWORD": self.password,
                "ACCOUNT_NAME": self.account,
                "CLIENT_APP_ID": "netsuite_dashboard",
                "SESSION_PARAMETERS": { "USE_CACHED_RESULT": false },
            }
        });

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| QueryError::ConnectionError(e.to_string()))?
            .error_for_status()
            .map_err(|e| QueryError::ConnectionError(e.to_string()))?;

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| QueryError::ConnectionError(e.to_string()))?;

        if !login.success {
            return Err(QueryError::ConnectionError(
                login
                    .message
                    .unwrap_or_else(|| "Snowflake login rejected".to_string()),
            ));
        }

        login
            .data
            .map(|d| d.token)
            .ok_or_else(|| QueryError::ConnectionError("login response missing token".to_string()))
    }

    async fn run_query(&self, token: &str, sql: &str) -> Result<Vec<RawRow>, QueryError> {
        let url = format!(
            "{}/queries/v1/query-request?requestId={}",
            self.base_url,
            Uuid::new_v4()
        );

        log::debug!("Executing Snowflake query: {}", sql);

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Snowflake Token=\"{}\"", token))
            .json(&json!({ "sqlText": sql }))
            .send()
            .await
            .map_err(|e| QueryError::ExecutionError(e.to_string()))?
            .error_for_status()
            .map_err(|e| QueryError::ExecutionError(e.to_string()))?;

        let result: QueryResponse = response
            .json()
            .await
            .map_err(|e| QueryError::ExecutionError(e.to_string()))?;

        if !result.success {
            return Err(QueryError::ExecutionError(
                result
                    .message
                    .unwrap_or_else(|| "Snowflake query failed".to_string()),
            ));
        }

        let data = result
            .data
            .ok_or_else(|| QueryError::ExecutionError("query response missing data".to_string()))?;

        let rows = data
            .rowset
            .into_iter()
            .map(|cells| {
                data.rowtype
                    .iter()
                    .zip(cells)
                    .map(|(column, value)| {
                        (column.name.clone(), decode_cell(&column.column_type, value))
                    })
                    .collect::<RawRow>()
            })
            .collect::<Vec<_>>();

        log::debug!("Snowflake query returned {} rows", rows.len());
        Ok(rows)
    }

    /// Discard the server-side session so nothing stale is carried over.
    async fn close_session(&self, token: &str) {
        let url = format!("{}/session?delete=true", self.base_url);
        let result = self
            .client
            .post(url)
            .header("Authorization", format!("Snowflake Token=\"{}\"", token))
            .send()
            .await;
        if let Err(e) = result {
            log::warn!("Failed to close Snowflake session: {}", e);
        }
    }
}

/// The REST rowset encodes DATE cells as epoch-day strings; decode them to
/// ISO dates so the normalizer sees `YYYY-MM-DD`.
fn decode_cell(column_type: &str, value: Value) -> Value {
    if column_type != "date" {
        return value;
    }
    let Value::String(text) = &value else {
        return value;
    };
    let decoded = text
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|days| {
            NaiveDate::from_ymd_opt(1970, 1, 1)?.checked_add_signed(TimeDelta::try_days(days)?)
        })
        .map(|date| date.format("%Y-%m-%d").to_string());
    match decoded {
        Some(iso) => Value::String(iso),
        None => value,
    }
}

#[async_trait]
impl ReportQuerier for SnowflakeExecutor {
    async fn fetch(&self, spec: &QuerySpec) -> Result<Vec<RawRow>, QueryError> {
        let QuerySpec::Sql(sql) = spec else {
            return Err(QueryError::ExecutionError(
                "fixture specs are not served by the Snowflake connection".to_string(),
            ));
        };

        let token = self.login().await?;
        let result = self.run_query(&token, sql).await;
        self.close_session(&token).await;
        result
    }

    fn destination(&self) -> Destination {
        Destination::Snowflake
    }
}

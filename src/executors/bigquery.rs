use super::base::{QueryError, ReportQuerier};
use crate::catalog::QuerySpec;
use crate::config::ServiceAccountKey;
use crate::models::{Destination, RawRow};
use async_trait::async_trait;
use jwt_simple::prelude::*;
use serde::Deserialize;
use serde_json::{json, Value};

const BIGQUERY_API_BASE: &str = "https://bigquery.googleapis.com/bigquery/v2";
const BIGQUERY_SCOPE: &str = "https://www.googleapis.com/auth/bigquery.readonly";

/// Executor for the BigQuery REST interface.
///
/// Authenticates with an operator-managed service-account key (never with
/// user-entered credentials) via the RS256 JWT bearer grant. Queries run
/// with the query cache disabled.
pub struct BigQueryExecutor {
    key: ServiceAccountKey,
    api_base: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct QueryResponse {
    schema: Option<QuerySchema>,
    rows: Option<Vec<QueryRow>>,
    #[serde(rename = "jobComplete")]
    job_complete: Option<bool>,
}

#[derive(Deserialize)]
struct QuerySchema {
    fields: Vec<SchemaField>,
}

#[derive(Deserialize)]
struct SchemaField {
    name: String,
}

#[derive(Deserialize)]
struct QueryRow {
    f: Vec<QueryCell>,
}

#[derive(Deserialize)]
struct QueryCell {
    v: Value,
}

#[derive(Serialize, Deserialize)]
struct ScopeClaims {
    scope: String,
}

impl BigQueryExecutor {
    pub fn new(key: ServiceAccountKey) -> Self {
        Self::with_api_base(key, BIGQUERY_API_BASE)
    }

    /// Construct against an explicit API base URL. Used by tests to point
    /// the executor at a local server.
    pub fn with_api_base(key: ServiceAccountKey, api_base: &str) -> Self {
        Self {
            key,
            api_base: api_base.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Exchange a signed JWT assertion for a short-lived access token.
    async fn access_token(&self) -> Result<String, QueryError> {
        let key_pair = RS256KeyPair::from_pem(&self.key.private_key)
            .map_err(|e| QueryError::ConnectionError(format!("bad service account key: {}", e)))?;

        let claims = Claims::with_custom_claims(
            ScopeClaims {
                scope: BIGQUERY_SCOPE.to_string(),
            },
            Duration::from_mins(10),
        )
        .with_issuer(&self.key.client_email)
        .with_audience(&self.key.token_uri);

        let assertion = key_pair
            .sign(claims)
            .map_err(|e| QueryError::ConnectionError(format!("failed to sign JWT: {}", e)))?;

        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|e| QueryError::ConnectionError(e.to_string()))?
            .error_for_status()
            .map_err(|e| QueryError::ConnectionError(e.to_string()))?;

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| QueryError::ConnectionError(e.to_string()))?;

        Ok(token.access_token)
    }
}

#[async_trait]
impl ReportQuerier for BigQueryExecutor {
    async fn fetch(&self, spec: &QuerySpec) -> Result<Vec<RawRow>, QueryError> {
        let QuerySpec::Sql(sql) = spec else {
            return Err(QueryError::ExecutionError(
                "fixture specs are not served by the BigQuery connection".to_string(),
            ));
        };

        let token = self.access_token().await?;

        log::debug!("Executing BigQuery query: {}", sql);

        let url = format!("{}/projects/{}/queries", self.api_base, self.key.project_id);
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&json!({
                "query": sql,
                "useLegacySql": false,
                "useQueryCache": false,
            }))
            .send()
            .await
            .map_err(|e| QueryError::ExecutionError(e.to_string()))?
            .error_for_status()
            .map_err(|e| QueryError::ExecutionError(e.to_string()))?;

        let result: QueryResponse = response
            .json()
            .await
            .map_err(|e| QueryError::ExecutionError(e.to_string()))?;

        if result.job_complete == Some(false) {
            return Err(QueryError::ExecutionError(
                "BigQuery job did not complete".to_string(),
            ));
        }

        let schema = result.schema.ok_or_else(|| {
            QueryError::ExecutionError("query response missing schema".to_string())
        })?;

        let rows = result
            .rows
            .unwrap_or_default()
            .into_iter()
            .map(|row| {
                schema
                    .fields
                    .iter()
                    .zip(row.f)
                    .map(|(field, cell)| (field.name.clone(), cell.v))
                    .collect::<RawRow>()
            })
            .collect::<Vec<_>>();

        log::debug!("BigQuery query returned {} rows", rows.len());
        Ok(rows)
    }

    fn destination(&self) -> Destination {
        Destination::BigQuery
    }
}

use super::base::{QueryError, ReportQuerier};
use crate::catalog::QuerySpec;
use crate::models::{Destination, RawRow};
use async_trait::async_trait;
use csv::ReaderBuilder;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Executor for the bundled Dunder Mifflin sample data. No connection is
/// involved; fixture files are re-read on every fetch.
pub struct SampleDataExecutor {
    data_dir: PathBuf,
}

impl SampleDataExecutor {
    pub fn new() -> Self {
        Self {
            data_dir: PathBuf::new(),
        }
    }

    /// Resolve fixture paths relative to an explicit directory instead of
    /// the working directory.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn read_fixture(&self, path: &Path) -> Result<Vec<RawRow>, QueryError> {
        let resolved = self.data_dir.join(path);
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_path(&resolved)
            .map_err(|e| {
                QueryError::FixtureError(format!("{}: {}", resolved.display(), e))
            })?;

        let mut rows = Vec::new();
        for record in reader.deserialize::<HashMap<String, String>>() {
            let record = record.map_err(|e| {
                QueryError::FixtureError(format!("{}: {}", resolved.display(), e))
            })?;
            rows.push(
                record
                    .into_iter()
                    .map(|(column, value)| (column, Value::String(value)))
                    .collect::<RawRow>(),
            );
        }
        Ok(rows)
    }
}

impl Default for SampleDataExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReportQuerier for SampleDataExecutor {
    async fn fetch(&self, spec: &QuerySpec) -> Result<Vec<RawRow>, QueryError> {
        let QuerySpec::Fixture(path) = spec else {
            return Err(QueryError::FixtureError(
                "SQL specs are not served by the sample-data source".to_string(),
            ));
        };
        self.read_fixture(path)
    }

    fn destination(&self) -> Destination {
        Destination::SampleData
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_fixture_is_a_fixture_error() {
        let executor = SampleDataExecutor::new();
        let spec = QuerySpec::Fixture(PathBuf::from("data/no_such_file.csv"));
        let err = executor.fetch(&spec).await.unwrap_err();
        assert!(matches!(err, QueryError::FixtureError(_)));
    }

    #[tokio::test]
    async fn sql_spec_is_rejected() {
        let executor = SampleDataExecutor::new();
        let spec = QuerySpec::Sql("select 1".to_string());
        let err = executor.fetch(&spec).await.unwrap_err();
        assert!(matches!(err, QueryError::FixtureError(_)));
    }
}

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
pub enum Destination {
    Snowflake,
    BigQuery,
    SampleData,
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Destination::Snowflake => write!(f, "Snowflake"),
            Destination::BigQuery => write!(f, "BigQuery"),
            Destination::SampleData => write!(f, "Dunder Mifflin Sample Data"),
        }
    }
}

impl<'de> Deserialize<'de> for Destination {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.to_lowercase().as_str() {
            "snowflake" => Ok(Destination::Snowflake),
            "bigquery" => Ok(Destination::BigQuery),
            "sampledata" | "sample_data" | "dunder mifflin sample data" => {
                Ok(Destination::SampleData)
            }
            _ => Err(serde::de::Error::custom(format!(
                "unknown destination: {}",
                s
            ))),
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
pub enum ReportModel {
    BalanceSheet,
    IncomeStatement,
}

impl ReportModel {
    /// Column the report is ordered by, and the only projected column that
    /// differs between the two statements.
    pub fn sort_helper_column(&self) -> &'static str {
        match self {
            ReportModel::BalanceSheet => "balance_sheet_sort_helper",
            ReportModel::IncomeStatement => "income_statement_sort_helper",
        }
    }

    /// Table name within the target database/schema.
    pub fn source_table(&self) -> &'static str {
        match self {
            ReportModel::BalanceSheet => "netsuite2__balance_sheet",
            ReportModel::IncomeStatement => "netsuite2__income_statement",
        }
    }

    pub fn fixture_file(&self) -> &'static str {
        match self {
            ReportModel::BalanceSheet => "dunder_mifflin_balance_sheet.csv",
            ReportModel::IncomeStatement => "dunder_mifflin_income_statement.csv",
        }
    }
}

impl std::fmt::Display for ReportModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportModel::BalanceSheet => write!(f, "Balance Sheet"),
            ReportModel::IncomeStatement => write!(f, "Income Statement"),
        }
    }
}

impl<'de> Deserialize<'de> for ReportModel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.to_lowercase().as_str() {
            "bs" | "balance_sheet" | "balance sheet" => Ok(ReportModel::BalanceSheet),
            "is" | "income_statement" | "income statement" => Ok(ReportModel::IncomeStatement),
            _ => Err(serde::de::Error::custom(format!(
                "unknown report model: {}",
                s
            ))),
        }
    }
}

/// Bookkeeping framework identifier. Book 1 is the primary (IFRS) book.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub struct AccountingBook(pub i32);

impl AccountingBook {
    pub const PRIMARY: AccountingBook = AccountingBook(1);

    pub fn is_primary(&self) -> bool {
        self.0 == 1
    }
}

impl Default for AccountingBook {
    fn default() -> Self {
        AccountingBook::PRIMARY
    }
}

impl std::fmt::Display for AccountingBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User-entered warehouse credentials. Account and warehouse name are
/// operator-managed and never part of this struct.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub role: String,
}

impl Credentials {
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

/// Database and schema the report tables live in. Either may be unset, which
/// blocks warehouse queries until provided.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ReportTarget {
    pub database: Option<String>,
    pub schema: Option<String>,
}

impl ReportTarget {
    pub fn new(database: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            database: Some(database.into()),
            schema: Some(schema.into()),
        }
    }
}

/// A dynamic result row as returned by a destination: a map from column
/// name to value, column case and value encoding unspecified.
pub type RawRow = HashMap<String, Value>;

/// Normalized report row, produced uniformly regardless of destination.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResultRow {
    pub sort_helper: i64,
    pub period_name: String,
    pub period_ending: NaiveDate,
    pub category: String,
    pub account_name: String,
    pub account_type: String,
    pub balance: Decimal,
}

impl ResultRow {
    /// Raw-map view of the row, keyed by the warehouse column names. Used to
    /// show that normalization is idempotent and by the table renderer.
    pub fn to_raw(&self, model: ReportModel) -> RawRow {
        let mut row = RawRow::new();
        row.insert(
            model.sort_helper_column().to_string(),
            Value::from(self.sort_helper),
        );
        row.insert(
            "accounting_period_name".to_string(),
            Value::from(self.period_name.clone()),
        );
        row.insert(
            "accounting_period_ending".to_string(),
            Value::from(self.period_ending.format("%Y-%m-%d").to_string()),
        );
        row.insert(
            "account_category".to_string(),
            Value::from(self.category.clone()),
        );
        row.insert(
            "account_name".to_string(),
            Value::from(self.account_name.clone()),
        );
        row.insert(
            "account_type_name".to_string(),
            Value::from(self.account_type.clone()),
        );
        row.insert("balance".to_string(), Value::from(self.balance.to_string()));
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_deserializes_case_insensitively() {
        let d: Destination = serde_json::from_str("\"snowflake\"").unwrap();
        assert_eq!(d, Destination::Snowflake);
        let d: Destination = serde_json::from_str("\"BigQuery\"").unwrap();
        assert_eq!(d, Destination::BigQuery);
        assert!(serde_json::from_str::<Destination>("\"redshift\"").is_err());
    }

    #[test]
    fn report_model_accepts_short_tags() {
        let m: ReportModel = serde_json::from_str("\"bs\"").unwrap();
        assert_eq!(m, ReportModel::BalanceSheet);
        let m: ReportModel = serde_json::from_str("\"is\"").unwrap();
        assert_eq!(m, ReportModel::IncomeStatement);
    }

    #[test]
    fn credentials_completeness() {
        let c = Credentials {
            username: "jhalpert".into(),
            password: "".into(),
            role: "ANALYST".into(),
        };
        assert!(!c.is_complete());
        let c = Credentials {
            username: "jhalpert".into(),
            password: "beesly".into(),
            role: "".into(),
        };
        assert!(c.is_complete());
    }
}

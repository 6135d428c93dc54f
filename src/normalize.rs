use crate::models::{RawRow, ReportModel, ResultRow};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Unparseable period ending date: {0:?}")]
    UnparseableDate(String),
    #[error("Missing column: {0}")]
    MissingColumn(&'static str),
    #[error("Bad value in column {column}: {value:?}")]
    BadValue { column: &'static str, value: String },
}

/// Normalize raw destination rows into `ResultRow`s: column names are
/// lowercased, the period ending becomes a pure calendar date, and numeric
/// fields accept both JSON numbers and the numeric strings the warehouse
/// REST APIs return. Normalizing an already-normalized row set yields an
/// identical set.
pub fn normalize(rows: &[RawRow], model: ReportModel) -> Result<Vec<ResultRow>, NormalizeError> {
    rows.iter().map(|row| normalize_row(row, model)).collect()
}

fn normalize_row(row: &RawRow, model: ReportModel) -> Result<ResultRow, NormalizeError> {
    let lowered: RawRow = row
        .iter()
        .map(|(k, v)| (k.to_lowercase(), v.clone()))
        .collect();

    Ok(ResultRow {
        sort_helper: int_field(&lowered, model.sort_helper_column())?,
        period_name: string_field(&lowered, "accounting_period_name")?,
        period_ending: date_field(&lowered, "accounting_period_ending")?,
        category: string_field(&lowered, "account_category")?,
        account_name: string_field(&lowered, "account_name")?,
        account_type: string_field(&lowered, "account_type_name")?,
        balance: decimal_field(&lowered, "balance")?,
    })
}

fn get<'a>(row: &'a RawRow, column: &'static str) -> Result<&'a Value, NormalizeError> {
    row.get(column).ok_or(NormalizeError::MissingColumn(column))
}

fn string_field(row: &RawRow, column: &'static str) -> Result<String, NormalizeError> {
    match get(row, column)? {
        Value::String(s) => Ok(s.clone()),
        Value::Null => Ok(String::new()),
        other => Ok(other.to_string()),
    }
}

fn int_field(row: &RawRow, column: &'static str) -> Result<i64, NormalizeError> {
    let value = get(row, column)?;
    match value {
        Value::Number(n) => n.as_i64().ok_or_else(|| NormalizeError::BadValue {
            column,
            value: n.to_string(),
        }),
        Value::String(s) => s.trim().parse().map_err(|_| NormalizeError::BadValue {
            column,
            value: s.clone(),
        }),
        other => Err(NormalizeError::BadValue {
            column,
            value: other.to_string(),
        }),
    }
}

fn decimal_field(row: &RawRow, column: &'static str) -> Result<Decimal, NormalizeError> {
    let value = get(row, column)?;
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    Decimal::from_str(&text).map_err(|_| NormalizeError::BadValue {
        column,
        value: text,
    })
}

/// Coerce the period ending to a calendar date. Date-only and
/// date-with-midnight strings are both accepted; anything else is a
/// data-quality error, never silently dropped.
fn date_field(row: &RawRow, column: &'static str) -> Result<NaiveDate, NormalizeError> {
    match get(row, column)? {
        Value::String(s) => parse_period_ending(s),
        other => Err(NormalizeError::UnparseableDate(other.to_string())),
    }
}

pub fn parse_period_ending(text: &str) -> Result<NaiveDate, NormalizeError> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(date);
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.date())
        .map_err(|_| NormalizeError::UnparseableDate(text.to_string()))
}

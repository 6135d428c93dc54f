use crate::models::{AccountingBook, Destination, ReportModel, ReportTarget};
use log::warn;
use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Results will be displayed once your database and schema are provided.")]
    MissingTarget,
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
}

/// What a (destination, report model) pair resolves to: a SQL statement for
/// a warehouse, or a fixture file for the sample-data destination.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum QuerySpec {
    Sql(String),
    Fixture(PathBuf),
}

/// Columns shared by both report models, after the sort helper.
const COMMON_COLUMNS: &str = "accounting_period_name, \
     accounting_period_ending, \
     account_category, \
     account_name, \
     account_type_name, \
     round(sum(converted_amount),2) as balance";

/// Database and schema names are interpolated into SQL text directly
/// (warehouse dialects do not allow identifier bind parameters), so they are
/// restricted to the unquoted-identifier charset first.
fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").unwrap())
}

fn validate_identifier(name: &str) -> Result<(), CatalogError> {
    if identifier_pattern().is_match(name) {
        Ok(())
    } else {
        Err(CatalogError::InvalidIdentifier(name.to_string()))
    }
}

fn resolved_target(target: &ReportTarget) -> Result<(String, String), CatalogError> {
    let database = target.database.clone().ok_or(CatalogError::MissingTarget)?;
    let schema = target.schema.clone().ok_or(CatalogError::MissingTarget)?;
    validate_identifier(&database)?;
    validate_identifier(&schema)?;
    Ok((database, schema))
}

/// Resolve a (destination, report model) pair to a `QuerySpec`.
///
/// Projection, grouping, and ordering are identical across both report
/// models except for the sort-helper column and the source table. The
/// accounting-book predicate is applied only on the Snowflake balance-sheet
/// branch; that asymmetry is inherited from the upstream report definitions
/// and is surfaced with a warning everywhere else.
pub fn build_query(
    destination: Destination,
    model: ReportModel,
    target: &ReportTarget,
    accounting_book: AccountingBook,
) -> Result<QuerySpec, CatalogError> {
    if !accounting_book.is_primary()
        && !(destination == Destination::Snowflake && model == ReportModel::BalanceSheet)
    {
        warn!(
            "accounting book {} selected but the {} {} report does not filter by book",
            accounting_book, destination, model
        );
    }

    match destination {
        Destination::SampleData => Ok(QuerySpec::Fixture(
            PathBuf::from("data").join(model.fixture_file()),
        )),
        Destination::Snowflake => {
            let (database, schema) = resolved_target(target)?;
            let sort_helper = model.sort_helper_column();
            let book_filter = if model == ReportModel::BalanceSheet {
                format!("where accounting_book_id = {} ", accounting_book.0)
            } else {
                String::new()
            };
            Ok(QuerySpec::Sql(format!(
                "select {sort_helper}, {COMMON_COLUMNS} \
                 from {database}.{schema}.{table} \
                 {book_filter}group by 1,2,3,4,5,6 order by {sort_helper}",
                table = model.source_table(),
            )))
        }
        Destination::BigQuery => {
            let (database, schema) = resolved_target(target)?;
            let sort_helper = model.sort_helper_column();
            Ok(QuerySpec::Sql(format!(
                "select {sort_helper}, {COMMON_COLUMNS} \
                 from `{database}.{schema}.{table}` \
                 group by 1,2,3,4,5,6 order by {sort_helper}",
                table = model.source_table(),
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> ReportTarget {
        ReportTarget::new("PC_FIVETRAN_DB", "DBT_FIVETRAN_NETSUITE")
    }

    #[test]
    fn snowflake_balance_sheet_carries_book_filter() {
        let spec = build_query(
            Destination::Snowflake,
            ReportModel::BalanceSheet,
            &target(),
            AccountingBook(2),
        )
        .unwrap();
        let QuerySpec::Sql(sql) = spec else {
            panic!("expected SQL spec");
        };
        assert!(sql.contains("where accounting_book_id = 2"));
        assert!(sql.contains("from PC_FIVETRAN_DB.DBT_FIVETRAN_NETSUITE.netsuite2__balance_sheet"));
        assert!(sql.ends_with("order by balance_sheet_sort_helper"));
    }

    #[test]
    fn snowflake_income_statement_has_no_book_filter() {
        let spec = build_query(
            Destination::Snowflake,
            ReportModel::IncomeStatement,
            &target(),
            AccountingBook(2),
        )
        .unwrap();
        let QuerySpec::Sql(sql) = spec else {
            panic!("expected SQL spec");
        };
        assert!(!sql.contains("accounting_book_id"));
        assert!(sql.ends_with("order by income_statement_sort_helper"));
    }

    #[test]
    fn bigquery_table_reference_is_backtick_quoted() {
        let spec = build_query(
            Destination::BigQuery,
            ReportModel::BalanceSheet,
            &target(),
            AccountingBook::PRIMARY,
        )
        .unwrap();
        let QuerySpec::Sql(sql) = spec else {
            panic!("expected SQL spec");
        };
        assert!(sql.contains("`PC_FIVETRAN_DB.DBT_FIVETRAN_NETSUITE.netsuite2__balance_sheet`"));
        assert!(!sql.contains("accounting_book_id"));
    }

    #[test]
    fn sample_data_routes_to_fixture() {
        let spec = build_query(
            Destination::SampleData,
            ReportModel::IncomeStatement,
            &ReportTarget::default(),
            AccountingBook::PRIMARY,
        )
        .unwrap();
        assert_eq!(
            spec,
            QuerySpec::Fixture(PathBuf::from("data/dunder_mifflin_income_statement.csv"))
        );
    }

    #[test]
    fn missing_target_is_reported() {
        let err = build_query(
            Destination::Snowflake,
            ReportModel::BalanceSheet,
            &ReportTarget::default(),
            AccountingBook::PRIMARY,
        )
        .unwrap_err();
        assert_eq!(err, CatalogError::MissingTarget);
    }

    #[test]
    fn hostile_identifier_is_rejected() {
        let target = ReportTarget::new("db;drop table users", "analytics");
        let err = build_query(
            Destination::Snowflake,
            ReportModel::BalanceSheet,
            &target,
            AccountingBook::PRIMARY,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidIdentifier(_)));
    }
}

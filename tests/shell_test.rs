use chrono::NaiveDate;
use netsuite_dashboard::config::{AuthSecrets, ConnectionSecrets, Secrets, SnowflakeSecrets};
use netsuite_dashboard::models::{Credentials, Destination, ReportModel};
use netsuite_dashboard::session::CredentialStatus;
use netsuite_dashboard::shell::{DashboardShell, ShellError, ShellState};

fn shell_with_password(password: &str) -> DashboardShell {
    let secrets = Secrets {
        auth: Some(AuthSecrets {
            password: Some(password.to_string()),
        }),
        ..Default::default()
    };
    DashboardShell::new(secrets)
}

fn analyst() -> Credentials {
    Credentials {
        username: "pbeesly".to_string(),
        password: "dundie".to_string(),
        role: "ANALYST".to_string(),
    }
}

#[test]
fn blank_role_falls_back_to_configured_default() {
    let secrets = Secrets {
        auth: Some(AuthSecrets {
            password: Some("scranton".to_string()),
        }),
        connections: Some(ConnectionSecrets {
            snowflake: Some(SnowflakeSecrets {
                role: Some("REPORTING".to_string()),
                ..Default::default()
            }),
        }),
        ..Default::default()
    };
    let mut shell = DashboardShell::new(secrets);
    shell.login("scranton");

    let status = shell.save_credentials(Credentials {
        username: "pbeesly".to_string(),
        password: "dundie".to_string(),
        role: String::new(),
    });
    assert_eq!(status, CredentialStatus::Saved);

    let committed = shell.session().credentials().unwrap();
    assert_eq!(committed.role, "REPORTING");
}

#[test]
fn entered_role_wins_over_configured_default() {
    let secrets = Secrets {
        auth: Some(AuthSecrets {
            password: Some("scranton".to_string()),
        }),
        connections: Some(ConnectionSecrets {
            snowflake: Some(SnowflakeSecrets {
                role: Some("REPORTING".to_string()),
                ..Default::default()
            }),
        }),
        ..Default::default()
    };
    let mut shell = DashboardShell::new(secrets);
    shell.login("scranton");

    shell.save_credentials(analyst());
    let committed = shell.session().credentials().unwrap();
    assert_eq!(committed.role, "ANALYST");
}

#[test]
fn wrong_password_stays_logged_out() {
    let mut shell = shell_with_password("scranton");
    assert_eq!(shell.state(), ShellState::LoggedOut);

    assert!(!shell.login("stamford"));
    assert_eq!(shell.state(), ShellState::LoggedOut);

    assert!(shell.login("scranton"));
    assert_eq!(shell.state(), ShellState::AwaitingCredentials);
}

#[tokio::test]
async fn report_before_login_is_rejected() {
    let mut shell = shell_with_password("scranton");
    let err = shell.run_report(ReportModel::BalanceSheet).await.unwrap_err();
    assert!(matches!(err, ShellError::NotAuthenticated));
}

#[tokio::test]
async fn incomplete_credentials_block_snowflake_query() {
    let mut shell = shell_with_password("scranton");
    shell.login("scranton");
    shell.session_mut().destination = Destination::Snowflake;

    // Empty password is rejected, so the session stays credential-less.
    let status = shell.save_credentials(Credentials {
        username: "pbeesly".to_string(),
        password: String::new(),
        role: "ANALYST".to_string(),
    });
    assert_eq!(status, CredentialStatus::Incomplete);
    assert_eq!(shell.state(), ShellState::AwaitingCredentials);

    let err = shell.run_report(ReportModel::BalanceSheet).await.unwrap_err();
    assert!(matches!(err, ShellError::IncompleteCredentials));
    assert!(err.to_string().contains("username and password"));
}

#[tokio::test]
async fn sample_income_statement_end_to_end() {
    let mut shell = shell_with_password("scranton");
    shell.login("scranton");
    shell.save_credentials(analyst());
    shell.session_mut().destination = Destination::SampleData;

    let rows = shell.run_report(ReportModel::IncomeStatement).await.unwrap();
    assert!(!rows.is_empty());

    // Sorted by the income-statement sort helper, ascending.
    let helpers: Vec<i64> = rows.iter().map(|r| r.sort_helper).collect();
    let mut sorted = helpers.clone();
    sorted.sort();
    assert_eq!(helpers, sorted);

    // Pure calendar dates, fixture-sourced content.
    assert!(rows
        .iter()
        .any(|r| r.period_ending == NaiveDate::from_ymd_opt(2023, 10, 31).unwrap()));
    assert!(rows.iter().any(|r| r.account_name == "Paper Sales"));
}

#[tokio::test]
async fn sample_balance_sheet_end_to_end() {
    let mut shell = shell_with_password("scranton");
    shell.login("scranton");
    shell.save_credentials(analyst());
    shell.session_mut().destination = Destination::SampleData;

    let rows = shell.run_report(ReportModel::BalanceSheet).await.unwrap();
    assert!(rows.iter().any(|r| r.category == "Liabilities"));
}

#[tokio::test]
async fn failed_query_leaves_session_intact() {
    let mut shell = shell_with_password("scranton");
    shell.login("scranton");
    shell.save_credentials(analyst());
    // No service account configured, so the BigQuery factory fails.
    shell.session_mut().destination = Destination::BigQuery;

    let err = shell.run_report(ReportModel::BalanceSheet).await.unwrap_err();
    assert!(matches!(err, ShellError::Connection { .. }));

    // Credentials survive the failure and sample data still works.
    assert_eq!(shell.state(), ShellState::Ready);
    shell.session_mut().destination = Destination::SampleData;
    assert!(shell.run_report(ReportModel::BalanceSheet).await.is_ok());
}

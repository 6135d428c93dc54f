use netsuite_dashboard::config::Secrets;
use std::path::PathBuf;

#[test]
fn test_secrets_loading() {
    let path: PathBuf = PathBuf::from("tests/test_configs/simple_secrets.toml");
    let secrets: Result<Secrets, _> = Secrets::load(&path);

    assert!(secrets.is_ok(), "Failed to load test secrets");
    let secrets = secrets.unwrap();

    assert_eq!(secrets.auth_password(), "test-password");
    assert_eq!(
        secrets.snowflake_account().as_deref(),
        Some("test_account.us-east-1")
    );
    assert_eq!(secrets.snowflake_warehouse().as_deref(), Some("TEST_WH"));
    assert_eq!(secrets.snowflake_role().as_deref(), Some("TEST_ROLE"));

    let key = secrets.service_account().expect("service account missing");
    assert_eq!(key.project_id, "test-project");
    assert_eq!(
        key.client_email,
        "reports@test-project.iam.gserviceaccount.com"
    );
    // token_uri is optional in the file and defaults to the Google endpoint
    assert_eq!(key.token_uri, "https://oauth2.googleapis.com/token");
}

#[test]
fn test_missing_secrets_file_is_an_error() {
    let path = PathBuf::from("tests/test_configs/does_not_exist.toml");
    assert!(Secrets::load(&path).is_err());
}

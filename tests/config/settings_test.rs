//! Loading settings from disk and compiling with them.

use std::fs;
use std::path::PathBuf;

use tally::compile_query;
use tally::config::{Settings, SettingsError};
use tally::plan::{GroupBy, QueryRequest};
use tally::semantic::SemanticManifest;
use tally::sql::{Dialect, DivisionStyle};

fn write_config(name: &str, content: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("tally-settings-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_and_compile() {
    let path = write_config(
        "postgres.toml",
        r#"
[profile]
dialect = "postgres"
division = "case_guard"
stage_comments = false

[compile]
validate_output = true
"#,
    );
    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings.profile.dialect, Dialect::Postgres);
    assert_eq!(settings.profile.division, Some(DivisionStyle::CaseGuard));

    let manifest =
        SemanticManifest::from_json_str(include_str!("../fixtures/bookings_manifest.json"))
            .unwrap();
    let request = QueryRequest::new()
        .metric("bookings_per_booking")
        .group_by(GroupBy::entity("listing"));
    let output = compile_query(&manifest, &request, &settings.into_options()).unwrap();
    assert!(output.sql.starts_with("SELECT\n"));
    assert!(output.sql.contains("CASE WHEN CAST(subq_1.bookings AS DOUBLE PRECISION) = 0"));
}

#[test]
fn test_load_rejects_unsupported_profile() {
    let path = write_config(
        "snowflake.toml",
        "[profile]\ndialect = \"snowflake\"\ndivision = \"native\"\n",
    );
    let err = Settings::load(&path).unwrap_err();
    assert!(matches!(err, SettingsError::InvalidConfig(_)));
    assert_eq!(
        err.to_string(),
        "Invalid configuration: snowflake: unsupported dialect feature: native safe division"
    );
}

#[test]
fn test_load_reports_parse_errors() {
    let path = write_config("broken.toml", "[profile\ndialect = ");
    let err = Settings::load(&path).unwrap_err();
    assert!(matches!(err, SettingsError::ParseError(_)));
}

#[test]
fn test_load_missing_file() {
    let path = std::env::temp_dir().join("tally-settings-does-not-exist.toml");
    let err = Settings::load(&path).unwrap_err();
    assert!(matches!(err, SettingsError::FileNotFound(ref p) if *p == path));
}

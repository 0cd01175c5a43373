#![allow(deprecated)]
//! Contract tests for the formflow binary: output and exit codes.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn schema_json() -> Value {
    json!({
        "form": {
            "sections": [
                {
                    "title": "Personal",
                    "fields": [
                        { "fieldId": "firstName", "type": "text", "required": true },
                        { "fieldId": "dateOfBirth", "type": "date", "required": true,
                          "validation": { "role": "date-of-birth" } }
                    ]
                },
                {
                    "title": "Contact",
                    "fields": [
                        { "fieldId": "email", "type": "email", "required": true },
                        { "fieldId": "country", "type": "radio", "required": true,
                          "options": [
                              { "value": "nl", "label": "Netherlands" },
                              { "value": "be", "label": "Belgium", "dataTestId": "pick-belgium" }
                          ] }
                    ]
                }
            ]
        }
    })
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn fixtures(answers: &str) -> (TempDir, PathBuf, PathBuf) {
    let dir = tempdir().unwrap();
    let schema = write(dir.path(), "schema.json", &schema_json().to_string());
    let answers = write(dir.path(), "answers.yaml", answers);
    (dir, schema, answers)
}

const GOOD_ANSWERS: &str = "firstName: Ada\ndateOfBirth: '2008-10-18'\nemail: ada@example.com\ncountry: nl\n";

fn formflow() -> Command {
    let mut cmd = Command::cargo_bin("formflow").unwrap();
    cmd.env_remove("FORMFLOW_BASE_URL")
        .env_remove("FORMFLOW_CONFIG")
        .env("FORMFLOW_MAX_RETRIES", "0")
        .env("RUST_LOG", "warn");
    cmd
}

#[test]
fn test_validate_ok() {
    let (_dir, schema, answers) = fixtures(GOOD_ANSWERS);

    formflow()
        .args(["validate", "--today", "2026-10-18", "--schema"])
        .arg(&schema)
        .arg("--answers")
        .arg(&answers)
        .assert()
        .code(0)
        .stdout(predicate::str::contains("valid: 4 fields checked"));
}

#[test]
fn test_validate_reports_every_section() {
    let (_dir, schema, answers) = fixtures("dateOfBirth: '2012-01-01'\nemail: nope\n");

    formflow()
        .args(["validate", "--today", "2026-10-18", "--schema"])
        .arg(&schema)
        .arg("--answers")
        .arg(&answers)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("1. Personal › firstName: This field is required"))
        .stdout(predicate::str::contains(
            "dateOfBirth: You must be at least 16 years old",
        ))
        .stdout(predicate::str::contains("2. Contact › email: Invalid format"))
        .stdout(predicate::str::contains("country: This field is required"));
}

#[test]
fn test_validate_json_report() {
    let (_dir, schema, answers) = fixtures("firstName: Ada\n");

    let output = formflow()
        .args(["validate", "--format", "json", "--schema"])
        .arg(&schema)
        .arg("--answers")
        .arg(&answers)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let report: Value = serde_json::from_slice(&output.stdout).expect("stdout must be JSON");
    assert_eq!(report["valid"], false);
    let errors = report["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 3);
    assert_eq!(errors[0]["field_id"], "dateOfBirth");
    assert_eq!(errors[0]["kind"], "required");
}

#[test]
fn test_validate_bad_schema_is_config_error() {
    let dir = tempdir().unwrap();
    let schema = write(
        dir.path(),
        "schema.json",
        r#"{"sections":[{"title":"A","fields":[{"fieldId":"x","type":"radio","required":true}]}]}"#,
    );
    let answers = write(dir.path(), "answers.yaml", "x: a\n");

    formflow()
        .args(["validate", "--schema"])
        .arg(&schema)
        .arg("--answers")
        .arg(&answers)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid schema"));
}

#[test]
fn test_bindings() {
    let (_dir, schema, _answers) = fixtures("");

    formflow()
        .args(["bindings", "--schema"])
        .arg(&schema)
        .assert()
        .code(0)
        .stdout(predicate::str::contains("firstName"))
        .stdout(predicate::str::contains("country-nl"))
        .stdout(predicate::str::contains("pick-belgium"))
        .stdout(predicate::str::contains("country = be"));
}

#[test]
fn test_fetch_unreachable_server() {
    formflow()
        .args(["fetch", "--base-url", "http://127.0.0.1:9"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("failed to load schema"));
}

#[test]
fn test_bad_base_url_is_config_error() {
    formflow()
        .args(["fetch", "--base-url", "ftp://forms.local"])
        .assert()
        .code(2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_outline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/form"))
        .and(query_param("sectionCount", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(schema_json()))
        .expect(1)
        .mount(&server)
        .await;

    formflow()
        .args(["fetch", "--section-count", "2", "--base-url", &server.uri()])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("2 sections, 4 fields"))
        .stdout(predicate::str::contains("2. Contact"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fill_dry_run_does_not_submit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/form"))
        .respond_with(ResponseTemplate::new(200).set_body_json(schema_json()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (_dir, _schema, answers) = fixtures(GOOD_ANSWERS);
    formflow()
        .args(["fill", "--dry-run", "--today", "2026-10-18", "--base-url", &server.uri()])
        .arg("--answers")
        .arg(&answers)
        .assert()
        .code(0)
        .stdout(predicate::str::contains("\"country\": \"nl\""))
        .stdout(predicate::str::contains("dry run: not submitted"))
        .stdout(predicate::str::contains("schema fetches: 1"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fill_submits() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/form"))
        .respond_with(ResponseTemplate::new(200).set_body_json(schema_json()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/form/submit"))
        .and(body_json(json!({
            "values": {
                "country": "nl",
                "dateOfBirth": "2008-10-18",
                "email": "ada@example.com",
                "firstName": "Ada"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "f-123" })))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, _schema, answers) = fixtures(GOOD_ANSWERS);
    formflow()
        .args(["fill", "--today", "2026-10-18", "--base-url", &server.uri()])
        .arg("--answers")
        .arg(&answers)
        .assert()
        .code(0)
        .stdout(predicate::str::contains("submitted (id f-123)"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fill_stops_on_invalid_section() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/form"))
        .respond_with(ResponseTemplate::new(200).set_body_json(schema_json()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (_dir, _schema, answers) = fixtures("firstName: Ada\ndateOfBirth: '2015-05-05'\n");
    formflow()
        .args(["fill", "--today", "2026-10-18", "--base-url", &server.uri()])
        .arg("--answers")
        .arg(&answers)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("You must be at least 16 years old"));
}

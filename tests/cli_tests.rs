//! Integration tests for the CLI interface
//!
//! Tests argument parsing, configuration validation and dry runs against a
//! local stand-in for the Buildkite API.

mod common;

use assert_cmd::Command;
use mockito::{Matcher, Server};
use predicates::prelude::*;

const CONFIG_VARS: [&str; 6] = [
    "BUILDKITE_ORG_SLUG",
    "BUILDKITE_API_ACCESS_TOKEN",
    "BUILDKITE_QUEUE",
    "BUILDKITE_METRICS_NAMESPACE",
    "BUILDKITE_API_URL",
    "AWS_REGION",
];

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("buildkite-metrics").unwrap();
    for var in CONFIG_VARS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_cli_help_flag() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("collect"));
}

#[test]
fn test_collect_help() {
    cli()
        .args(["collect", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--queue"));
}

#[test]
fn test_missing_token_fails_without_network() {
    cli()
        .args(["--org-slug", "acme", "--queue", "ci", "--api-url", "http://127.0.0.1:9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No BuildkiteApiAccessToken provided"));
}

#[test]
fn test_missing_queue_from_event_file() {
    let event = common::write_event(
        r#"{"BuildkiteOrgSlug":"acme","BuildkiteApiAccessToken":"secret-token"}"#,
    )
    .unwrap();

    cli()
        .arg("collect")
        .arg("--event")
        .arg(event.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No Queue provided"))
        .stderr(predicate::str::contains("secret-token").not());
}

#[test]
fn test_malformed_event_is_rejected() {
    let event = common::write_event("{not json").unwrap();

    cli()
        .arg("--event")
        .arg(event.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration event"));
}

#[test]
fn test_dry_run_prints_result() {
    let mut server = Server::new();
    let running = server
        .mock("GET", "/v2/organizations/acme/builds")
        .match_query(Matcher::UrlEncoded("state".into(), "running".into()))
        .match_header("authorization", "Bearer test-token")
        .with_status(200)
        .with_body(r#"[{"state":"running","jobs":[{"state":"running","agent_query_rules":["queue=ci"]}]}]"#)
        .create();
    let scheduled = server
        .mock("GET", "/v2/organizations/acme/builds")
        .match_query(Matcher::UrlEncoded("state".into(), "scheduled".into()))
        .with_status(200)
        .with_body("[]")
        .create();

    let event = common::write_event(r#"{"BuildkiteOrgSlug":"acme","Queue":"ci"}"#).unwrap();

    let output = cli()
        .arg("collect")
        .arg("--event")
        .arg(event.path())
        .args(["--api-access-token", "test-token", "--api-url"])
        .arg(server.url())
        .arg("--dry-run")
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    running.assert();
    scheduled.assert();

    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["RunningBuilds"], 1);
    assert_eq!(result["RunningJobs"], 1);
    assert_eq!(result["Queues"]["ci"]["RunningBuilds"], 1);
    assert_eq!(result["Queues"]["default"]["RunningBuilds"], 0);
    assert!(!String::from_utf8_lossy(&output.stderr).contains("test-token"));
}

#[test]
fn test_non_200_from_buildkite_fails() {
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/v2/organizations/acme/builds")
        .match_query(Matcher::Any)
        .with_status(500)
        .create();

    cli()
        .args(["--org-slug", "acme", "--queue", "ci", "--api-access-token", "test-token"])
        .arg("--api-url")
        .arg(server.url())
        .arg("--dry-run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("HTTP 500"));
}

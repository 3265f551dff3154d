//! End-to-end tests for the `plb` binary
//!
//! Every command runs inside a fresh temporary directory with the
//! configuration environment cleared, so neither a developer `.env` nor
//! exported variables leak into the run.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CONFIG_VARS: [&str; 16] = [
    "TARGET",
    "TARGET_URL",
    "DATABASE_URL",
    "LOOKUP_KEY",
    "LOOKUP_QUERY",
    "LOOP",
    "CONCURRENCY",
    "DUMP_INTERVAL_MS",
    "DEADLINE_SECONDS",
    "REQUEST_TIMEOUT_SECONDS",
    "DB_POOL_SIZE",
    "CHART_PATH",
    "CSV_PATH",
    "DUMP_DIR",
    "ENABLE_COLOR",
    "LOG_FORMAT",
];

/// Command running in `dir` with a clean configuration environment
fn plb(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("plb").unwrap();
    cmd.current_dir(dir);
    for var in CONFIG_VARS {
        cmd.env_remove(var);
    }
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Mock server kept alive by the returned runtime
fn start_server(status: u16, expected: u64) -> (tokio::runtime::Runtime, MockServer) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let server = runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(status).set_body_string("ok"))
            .expect(expected)
            .mount(&server)
            .await;
        server
    });
    (runtime, server)
}

fn sqlite_url(dir: &TempDir) -> String {
    format!("sqlite://{}", dir.path().join("bench.db").display())
}

#[test]
fn test_http_run_prints_summary_and_writes_chart() {
    let dir = TempDir::new().unwrap();
    let (_runtime, server) = start_server(200, 20);

    plb(dir.path())
        .args(["--url", &format!("{}/health", server.uri())])
        .args(["--loop", "20", "-c", "4", "--no-color"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Concurrency:  4"))
        .stdout(predicate::str::contains("Completed:    20 / 20"))
        .stdout(predicate::str::contains("p99"))
        .stdout(predicate::str::is_match(r"finished in \d+ms").unwrap());

    let svg = fs::read_to_string(dir.path().join("latency.svg")).unwrap();
    assert!(svg.contains("concurrency=4"));
    assert!(svg.contains("loop=20"));
}

#[test]
fn test_db_run_with_snapshots_and_csv() {
    let dir = TempDir::new().unwrap();
    let dumps = dir.path().join("dumps");
    fs::create_dir(&dumps).unwrap();

    plb(dir.path())
        .args(["--target", "db", "--database-url", &sqlite_url(&dir), "--db-init"])
        .args(["--loop", "30", "-c", "3", "--no-color"])
        .args(["--dump-interval", "5", "--dump-dir", dumps.to_str().unwrap()])
        .args(["--chart", "lookup.svg", "--csv", "samples.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Latency run: lookup 1234"))
        .stdout(predicate::str::contains("Samples CSV:  samples.csv"));

    let snapshots: Vec<_> = fs::read_dir(&dumps)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert!(!snapshots.is_empty());
    assert!(snapshots.iter().all(|name| name.starts_with("thread") && name.ends_with(".txt")));

    let csv = fs::read_to_string(dir.path().join("samples.csv")).unwrap();
    assert_eq!(csv.lines().count(), 31);
    assert!(dir.path().join("lookup.svg").exists());
}

#[test]
fn test_every_invocation_failing_exits_with_execution_code() {
    let dir = TempDir::new().unwrap();
    let (_runtime, server) = start_server(500, 5);

    plb(dir.path())
        .args(["--url", &format!("{}/health", server.uri())])
        .args(["--loop", "5", "-c", "2", "--no-color"])
        .assert()
        .code(6)
        .stdout(predicate::str::contains("every recorded invocation failed"))
        .stderr(predicate::str::contains("EXECUTION"));

    // The chart is still written for a fully failed run
    assert!(dir.path().join("latency.svg").exists());
}

#[test]
fn test_json_log_format_with_verbose() {
    let dir = TempDir::new().unwrap();
    let (_runtime, server) = start_server(200, 3);

    plb(dir.path())
        .args(["--url", &format!("{}/health", server.uri())])
        .args(["--loop", "3", "-c", "1", "--no-color", "--verbose", "--log-format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""logger":"SAMPLER""#))
        .stdout(predicate::str::contains(r#""target":"http""#));
}

#[test]
fn test_missing_url_is_config_error() {
    let dir = TempDir::new().unwrap();

    plb(dir.path())
        .arg("--no-color")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_unsupported_database_url() {
    let dir = TempDir::new().unwrap();

    plb(dir.path())
        .args(["--target", "db", "--database-url", "postgres://localhost/bench", "--no-color"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("only sqlite"));
}

#[test]
fn test_zero_loop_and_concurrency_rejected() {
    let dir = TempDir::new().unwrap();

    plb(dir.path())
        .args(["--url", "http://127.0.0.1:9/", "--loop", "0"])
        .assert()
        .failure();

    plb(dir.path())
        .args(["--url", "http://127.0.0.1:9/", "--concurrency", "0"])
        .assert()
        .failure();
}

#[test]
fn test_conflicting_color_flags() {
    let dir = TempDir::new().unwrap();

    plb(dir.path())
        .args(["--color", "--no-color"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Cannot specify both --color and --no-color"));
}

#[test]
fn test_help_topics() {
    let dir = TempDir::new().unwrap();

    plb(dir.path())
        .args(["--help-topic", "targets"])
        .assert()
        .success()
        .stdout(predicate::str::contains("TARGETS:"));

    plb(dir.path())
        .args(["--help-topic", "nonsense"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Unknown help topic"));
}

#[test]
fn test_env_example_and_env_file() {
    let dir = TempDir::new().unwrap();

    plb(dir.path())
        .args(["--env-example", ".env.example"])
        .assert()
        .success();
    let example = fs::read_to_string(dir.path().join(".env.example")).unwrap();
    assert!(example.contains("# CONCURRENCY="));

    fs::write(
        dir.path().join(".env"),
        format!("TARGET=db\nDATABASE_URL={}\nLOOP=5\nCONCURRENCY=1\n", sqlite_url(&dir)),
    )
    .unwrap();

    plb(dir.path())
        .args(["--db-init", "--no-color"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Loop:         5"))
        .stdout(predicate::str::contains("Concurrency:  1"));
}

#[test]
fn test_version_flag() {
    let dir = TempDir::new().unwrap();

    plb(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("plb"));
}

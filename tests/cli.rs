use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BINARY: &str = "porter";
const SAMPLE_FASTA: &str = "tests/data/query.fasta";
const RESULT_PAGE: &str = "complete\nQuery_length: 5\n\nMKVLA\nCCHHH\nBBbee\n\n\n";

type TestResult = Result<(), Box<dyn std::error::Error>>;

/// A mock server that accepts any query and completes on the first poll.
async fn mock_service() -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<a href=\"/result/1\">results</a>"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/result/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RESULT_PAGE))
        .mount(&mock_server)
        .await;

    mock_server
}

fn porter(mock_server: &MockServer) -> Result<Command, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin(BINARY)?;
    cmd.args(["--endpoint", &format!("{}/predict", mock_server.uri())])
        .args(["--wait", "0.01"]);
    Ok(cmd)
}

#[test]
fn no_sequence_prints_usage() -> TestResult {
    Command::cargo_bin(BINARY)?
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));

    Ok(())
}

#[test]
fn fasta_file_doesnt_exist() -> TestResult {
    Command::cargo_bin(BINARY)?
        .args(["--fasta", "file_which_does_not_exist.fasta"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unable to open file"));

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn prints_three_line_prediction() -> TestResult {
    let mock_server = mock_service().await;

    porter(&mock_server)?
        .arg("MKVLA")
        .assert()
        .success()
        .stdout("MKVLA\nCCHHH\nBBbee\n");

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn json_output_to_file() -> TestResult {
    let mock_server = mock_service().await;
    let temp = assert_fs::NamedTempFile::new("prediction.json")?;

    porter(&mock_server)?
        .args(["--format", "json", "-o", temp.path().to_str().unwrap()])
        .arg("MKVLA")
        .assert()
        .success()
        .stdout("");

    let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(temp.path())?)?;
    assert_eq!(written["secondary_structure"], "CCHHH");
    assert_eq!(written["composition"]["helix"], 3);

    temp.close()?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn reads_first_fasta_record() -> TestResult {
    let mock_server = MockServer::start().await;

    // only the first record, with its lines joined, is submitted
    Mock::given(method("POST"))
        .and(path("/predict"))
        .and(body_string_contains("input_text=%3ESequence%0AMKVLA"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<a href=\"/result/1\">results</a>"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/result/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RESULT_PAGE))
        .mount(&mock_server)
        .await;

    porter(&mock_server)?
        .args(["--fasta", SAMPLE_FASTA])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("MKVLA\n"))
        .stderr(predicate::str::contains("Ignoring 1 further record"));

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn table_output() -> TestResult {
    let mock_server = mock_service().await;
    let dir = assert_fs::TempDir::new()?;
    let out = dir.child("prediction.tsv");

    porter(&mock_server)?
        .args(["--format", "table", "-o", out.path().to_str().unwrap()])
        .arg("MKVLA")
        .assert()
        .success();

    let table = std::fs::read_to_string(out.path())?;
    assert_eq!(table.lines().count(), 6);
    assert!(table.contains("3\tV\tH\tb\thelix\tsomewhat_buried"));

    dir.close()?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn submission_failure_exit_code() -> TestResult {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(ResponseTemplate::new(500).set_body_string("CGI crashed"))
        .mount(&mock_server)
        .await;

    porter(&mock_server)?
        .arg("MKVLA")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("HTTP 500"))
        .stderr(predicate::str::contains("CGI crashed"));

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn gives_up_after_max_attempts() -> TestResult {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<a href=\"/result/1\">results</a>"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/result/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("queued"))
        .expect(2)
        .mount(&mock_server)
        .await;

    porter(&mock_server)?
        .args(["--max-attempts", "2", "MKVLA"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("did not complete after 2 attempts"));

    Ok(())
}

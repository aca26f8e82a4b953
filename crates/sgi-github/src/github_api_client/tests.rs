//! Tests for the GitHub issue client against a stub server.

use httpmock::prelude::*;
use serde_json::json;
use sgi_middleware::{IssueMetadata, IssueTracker};

use super::GithubApiClient;

fn test_client(server: &MockServer) -> GithubApiClient {
    GithubApiClient::new(
        server.base_url(),
        "ghp-test".to_string(),
        "org".to_string(),
        2_000,
    )
    .expect("client")
}

fn metadata() -> IssueMetadata {
    IssueMetadata {
        channel_name: "handbook".to_string(),
        timestamp_seconds: 100,
        permalink_url: "https://x/y".to_string(),
        title: "Update from #handbook at Thu, 01 Jan 1970 00:01:40 GMT".to_string(),
        body: "https://x/y".to_string(),
    }
}

#[tokio::test]
async fn integration_file_issue_posts_title_and_permalink_body() {
    let server = MockServer::start();
    let create = server.mock(|when, then| {
        when.method(POST)
            .path("/repos/org/repo/issues")
            .header("authorization", "Bearer ghp-test")
            .header("accept", "application/vnd.github+json")
            .header("x-github-api-version", "2022-11-28")
            .json_body(json!({
                "title": "Update from #handbook at Thu, 01 Jan 1970 00:01:40 GMT",
                "body": "https://x/y"
            }));
        then.status(201).json_body(json!({
            "number": 9,
            "html_url": "https://github.com/org/repo/issues/9"
        }));
    });

    let client = test_client(&server);
    let issue_url = client
        .file_issue(&metadata(), "repo")
        .await
        .expect("file issue");

    create.assert();
    assert_eq!(issue_url, "https://github.com/org/repo/issues/9");
    assert_eq!(IssueTracker::owner(&client), "org");
}

#[tokio::test]
async fn regression_file_issue_reports_status_and_body() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/repos/org/missing/issues");
        then.status(404).body("{\"message\":\"Not Found\"}");
    });

    let error = test_client(&server)
        .file_issue(&metadata(), "missing")
        .await
        .expect_err("not found");
    assert_eq!(
        error.to_string(),
        "github api create issue failed with status 404: {\"message\":\"Not Found\"}"
    );
}

#[tokio::test]
async fn regression_file_issue_requires_html_url() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/repos/org/repo/issues");
        then.status(201).json_body(json!({ "number": 9 }));
    });

    let error = test_client(&server)
        .file_issue(&metadata(), "repo")
        .await
        .expect_err("missing url");
    assert_eq!(
        error.to_string(),
        "github issue #9 response missing html_url"
    );
}

#[tokio::test]
async fn regression_file_issue_reports_unreachable_server() {
    let client = GithubApiClient::new(
        "http://127.0.0.1:1".to_string(),
        "ghp-test".to_string(),
        "org".to_string(),
        500,
    )
    .expect("client");

    let error = client
        .file_issue(&metadata(), "repo")
        .await
        .expect_err("connection refused");
    assert!(error
        .to_string()
        .contains("github api create issue request failed"));
}

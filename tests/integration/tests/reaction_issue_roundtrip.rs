use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use httpmock::prelude::*;
use serde_json::{json, Value};
use sgi_config::parse_bot_config;
use sgi_github::GithubApiClient;
use sgi_middleware::{Middleware, Outcome, ReactionEvent, Responder};
use sgi_slack::SlackApiClient;

const TIMESTAMP: &str = "1360782804.083113";
const PERMALINK: &str = "https://18f.slack.com/archives/handbook/p1360782804083113";
const ISSUE_URL: &str = "https://github.com/18F/handbook/issues/1";

#[derive(Default)]
struct CollectingResponder {
    replies: Mutex<Vec<String>>,
}

impl CollectingResponder {
    fn replies(&self) -> Vec<String> {
        self.replies.lock().expect("replies lock").clone()
    }
}

#[async_trait]
impl Responder for CollectingResponder {
    async fn reply(&self, text: &str) -> Result<()> {
        self.replies
            .lock()
            .expect("replies lock")
            .push(text.to_string());
        Ok(())
    }
}

struct Harness {
    slack: MockServer,
    github: MockServer,
    middleware: Middleware,
}

fn harness() -> Harness {
    let slack = MockServer::start();
    let github = MockServer::start();
    let config = parse_bot_config(
        &json!({
            "githubUser": "18F",
            "githubTimeout": 2000,
            "slackTimeout": 2000,
            "successReaction": "heavy_check_mark",
            "rules": [
                { "reactionName": "evergreen_tree", "githubRepository": "hub" },
                {
                    "reactionName": "evergreen_tree",
                    "githubRepository": "handbook",
                    "channelNames": ["handbook"]
                }
            ]
        })
        .to_string(),
    )
    .expect("config");

    let slack_client =
        SlackApiClient::new(slack.base_url(), "xoxb-test".to_string(), config.slack_timeout_ms)
            .expect("slack client");
    slack_client.directory().replace(
        "18f".to_string(),
        HashMap::from([
            ("C1".to_string(), "handbook".to_string()),
            ("C2".to_string(), "general".to_string()),
        ]),
    );
    let github_client = GithubApiClient::new(
        github.base_url(),
        "ghp-test".to_string(),
        config.github_user.clone(),
        config.github_timeout_ms,
    )
    .expect("github client");

    let middleware =
        Middleware::from_config(&config, Arc::new(slack_client), Arc::new(github_client));
    Harness {
        slack,
        github,
        middleware,
    }
}

fn reaction_event(channel: &str, reaction: &str) -> ReactionEvent {
    serde_json::from_value(json!({
        "type": "reaction_added",
        "user": "U1",
        "item": { "type": "message", "channel": channel, "ts": TIMESTAMP },
        "reaction": reaction
    }))
    .expect("event")
}

fn reactions_body(permalink: &str, names: &[&str]) -> Value {
    let reactions = names
        .iter()
        .map(|name| json!({ "name": name, "count": 1, "users": ["U1"] }))
        .collect::<Vec<_>>();
    json!({
        "ok": true,
        "message": { "ts": TIMESTAMP, "permalink": permalink, "reactions": reactions }
    })
}

#[tokio::test]
async fn integration_reaction_in_restricted_channel_files_issue_and_marks_message() {
    let harness = harness();
    let reactions = harness.slack.mock(|when, then| {
        when.method(GET)
            .path("/reactions.get")
            .query_param("channel", "C1")
            .query_param("timestamp", TIMESTAMP);
        then.status(200)
            .json_body(reactions_body(PERMALINK, &["evergreen_tree"]));
    });
    let create = harness.github.mock(|when, then| {
        when.method(POST)
            .path("/repos/18F/handbook/issues")
            .json_body(json!({
                "title": "Update from #handbook at Wed, 13 Feb 2013 19:13:24 GMT",
                "body": PERMALINK
            }));
        then.status(201)
            .json_body(json!({ "number": 1, "html_url": ISSUE_URL }));
    });
    let add = harness.slack.mock(|when, then| {
        when.method(POST)
            .path("/reactions.add")
            .body_includes("\"channel\":\"C1\"")
            .body_includes("\"name\":\"heavy_check_mark\"");
        then.status(200).json_body(json!({ "ok": true }));
    });
    let responder = CollectingResponder::default();

    let outcome = harness
        .middleware
        .execute(&reaction_event("C1", "evergreen_tree"), &responder)
        .await;

    assert_eq!(outcome, Outcome::Created(ISSUE_URL.to_string()));
    reactions.assert();
    create.assert();
    add.assert();
    assert_eq!(responder.replies(), vec![format!("created: {ISSUE_URL}")]);
    assert!(harness.middleware.in_flight().is_empty());
}

#[tokio::test]
async fn integration_unrestricted_rule_routes_other_channels() {
    let harness = harness();
    harness.slack.mock(|when, then| {
        when.method(GET).path("/reactions.get");
        then.status(200).json_body(reactions_body(
            "https://18f.slack.com/archives/general/p1360782804083113",
            &["evergreen_tree"],
        ));
    });
    let create = harness.github.mock(|when, then| {
        when.method(POST)
            .path("/repos/18F/hub/issues")
            .body_includes("Update from #general");
        then.status(201).json_body(json!({
            "number": 2,
            "html_url": "https://github.com/18F/hub/issues/2"
        }));
    });
    harness.slack.mock(|when, then| {
        when.method(POST).path("/reactions.add");
        then.status(200).json_body(json!({ "ok": true }));
    });

    let outcome = harness
        .middleware
        .execute(
            &reaction_event("C2", "evergreen_tree"),
            &CollectingResponder::default(),
        )
        .await;

    assert_eq!(
        outcome,
        Outcome::Created("https://github.com/18F/hub/issues/2".to_string())
    );
    create.assert();
}

#[tokio::test]
async fn integration_message_with_success_reaction_is_not_filed_again() {
    let harness = harness();
    harness.slack.mock(|when, then| {
        when.method(GET).path("/reactions.get");
        then.status(200).json_body(reactions_body(
            PERMALINK,
            &["evergreen_tree", "heavy_check_mark"],
        ));
    });
    let create = harness.github.mock(|when, then| {
        when.method(POST).path("/repos/18F/handbook/issues");
        then.status(201)
            .json_body(json!({ "number": 1, "html_url": ISSUE_URL }));
    });
    let responder = CollectingResponder::default();

    let outcome = harness
        .middleware
        .execute(&reaction_event("C1", "evergreen_tree"), &responder)
        .await;

    assert_eq!(outcome, Outcome::AlreadyProcessed(PERMALINK.to_string()));
    create.assert_calls(0);
    assert!(responder.replies().is_empty());
}

#[tokio::test]
async fn regression_github_failure_is_reported_without_marking_message() {
    let harness = harness();
    harness.slack.mock(|when, then| {
        when.method(GET).path("/reactions.get");
        then.status(200)
            .json_body(reactions_body(PERMALINK, &["evergreen_tree"]));
    });
    harness.github.mock(|when, then| {
        when.method(POST).path("/repos/18F/handbook/issues");
        then.status(500).body("boom");
    });
    let add = harness.slack.mock(|when, then| {
        when.method(POST).path("/reactions.add");
        then.status(200).json_body(json!({ "ok": true }));
    });
    let responder = CollectingResponder::default();

    let outcome = harness
        .middleware
        .execute(&reaction_event("C1", "evergreen_tree"), &responder)
        .await;

    let expected = "failed to create a GitHub issue in 18F/handbook: \
                    github api create issue failed with status 500: boom";
    assert_eq!(outcome, Outcome::Failed(expected.to_string()));
    add.assert_calls(0);
    assert_eq!(responder.replies(), vec![expected.to_string()]);
}

#[tokio::test]
async fn regression_slack_failures_are_decorated_per_step() {
    let harness = harness();
    let mut reactions = harness.slack.mock(|when, then| {
        when.method(GET).path("/reactions.get");
        then.status(200)
            .json_body(json!({ "ok": false, "error": "message_not_found" }));
    });
    let responder = CollectingResponder::default();

    let outcome = harness
        .middleware
        .execute(&reaction_event("C1", "evergreen_tree"), &responder)
        .await;
    assert_eq!(
        outcome,
        Outcome::Failed(format!(
            "failed to get reactions for {PERMALINK}: \
             slack reactions.get failed: message_not_found"
        ))
    );

    reactions.delete();
    harness.slack.mock(|when, then| {
        when.method(GET).path("/reactions.get");
        then.status(200)
            .json_body(reactions_body(PERMALINK, &["evergreen_tree"]));
    });
    harness.github.mock(|when, then| {
        when.method(POST).path("/repos/18F/handbook/issues");
        then.status(201)
            .json_body(json!({ "number": 1, "html_url": ISSUE_URL }));
    });
    harness.slack.mock(|when, then| {
        when.method(POST).path("/reactions.add");
        then.status(200)
            .json_body(json!({ "ok": false, "error": "already_reacted" }));
    });

    let outcome = harness
        .middleware
        .execute(&reaction_event("C1", "evergreen_tree"), &responder)
        .await;
    assert_eq!(
        outcome,
        Outcome::Failed(format!(
            "created {ISSUE_URL} but failed to add heavy_check_mark: \
             slack reactions.add failed: already_reacted"
        ))
    );
    assert_eq!(responder.replies().len(), 2);
}

#[tokio::test]
async fn functional_unmatched_reaction_makes_no_requests() {
    let harness = harness();
    let reactions = harness.slack.mock(|when, then| {
        when.method(GET).path("/reactions.get");
        then.status(200)
            .json_body(reactions_body(PERMALINK, &["smiley"]));
    });
    let responder = CollectingResponder::default();

    let outcome = harness
        .middleware
        .execute(&reaction_event("C1", "smiley"), &responder)
        .await;

    assert_eq!(outcome, Outcome::NoMatch);
    reactions.assert_calls(0);
    assert!(responder.replies().is_empty());
}

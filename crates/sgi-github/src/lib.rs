//! GitHub REST client that files the issues created from Slack reactions.

pub mod github_api_client;

pub use github_api_client::{GithubApiClient, GithubCreatedIssue, DEFAULT_GITHUB_API_BASE};

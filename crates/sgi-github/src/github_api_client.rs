use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use sgi_core::truncate_for_error;
use sgi_middleware::{IssueMetadata, IssueTracker};

pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";

#[derive(Debug, Clone, Deserialize)]
pub struct GithubCreatedIssue {
    pub number: u64,
    pub html_url: Option<String>,
}

#[derive(Clone)]
pub struct GithubApiClient {
    http: reqwest::Client,
    api_base: String,
    owner: String,
}

impl GithubApiClient {
    pub fn new(
        api_base: String,
        token: String,
        owner: String,
        request_timeout_ms: u64,
    ) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("slack-github-issues"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            reqwest::header::HeaderValue::from_static("2022-11-28"),
        );
        let auth_header = format!("Bearer {}", token.trim());
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&auth_header)
                .context("invalid github authorization header")?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()
            .context("failed to create github api client")?;
        Ok(Self {
            http: client,
            api_base: api_base.trim_end_matches('/').to_string(),
            owner: owner.trim().to_string(),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub async fn create_issue(
        &self,
        repository: &str,
        title: &str,
        body: &str,
    ) -> Result<GithubCreatedIssue> {
        let payload = json!({ "title": title, "body": body });
        self.request_json(
            "create issue",
            self.http
                .post(format!(
                    "{}/repos/{}/{}/issues",
                    self.api_base, self.owner, repository
                ))
                .json(&payload),
        )
        .await
    }

    async fn request_json<T>(&self, operation: &str, request: reqwest::RequestBuilder) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = request
            .send()
            .await
            .with_context(|| format!("github api {operation} request failed"))?;
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .with_context(|| format!("failed to decode github {operation}"));
        }

        let body = response.text().await.unwrap_or_default();
        bail!(
            "github api {operation} failed with status {}: {}",
            status.as_u16(),
            truncate_for_error(&body, 800)
        );
    }
}

#[async_trait]
impl IssueTracker for GithubApiClient {
    async fn file_issue(&self, metadata: &IssueMetadata, repository: &str) -> Result<String> {
        let created = self
            .create_issue(repository, &metadata.title, &metadata.body)
            .await?;
        created
            .html_url
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| anyhow!("github issue #{} response missing html_url", created.number))
    }

    fn owner(&self) -> &str {
        &self.owner
    }
}

#[cfg(test)]
mod tests;

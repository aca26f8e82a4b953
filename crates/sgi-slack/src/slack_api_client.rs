//! Slack Web API client used by the reaction pipeline and the events gateway.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use sgi_core::truncate_for_error;
use sgi_middleware::{Reaction, ReactionPayload, SlackGateway};

use crate::slack_directory::SlackDirectory;

pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";
const CONVERSATIONS_PAGE_LIMIT: &str = "200";
const CONVERSATION_TYPES: &str = "public_channel,private_channel,mpim,im";

#[derive(Debug, Clone, Deserialize)]
struct SlackOkResponse {
    ok: bool,
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackReactionsGetResponse {
    ok: bool,
    error: Option<String>,
    message: Option<SlackReactionsMessage>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackReactionsMessage {
    ts: Option<String>,
    permalink: Option<String>,
    #[serde(default)]
    reactions: Vec<Reaction>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackChatMessageResponse {
    ok: bool,
    ts: Option<String>,
    channel: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackTeamInfoResponse {
    ok: bool,
    error: Option<String>,
    team: Option<SlackTeam>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackTeam {
    domain: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackConversationsListResponse {
    ok: bool,
    error: Option<String>,
    #[serde(default)]
    channels: Vec<SlackConversation>,
    response_metadata: Option<SlackResponseMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackConversationInfoResponse {
    ok: bool,
    error: Option<String>,
    channel: Option<SlackConversation>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackConversation {
    id: String,
    name: Option<String>,
}

impl SlackConversation {
    /// Direct messages have no name; their permalinks use the conversation id.
    fn into_directory_entry(self) -> (String, String) {
        let name = self
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.id.clone());
        (self.id, name)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct SlackResponseMetadata {
    next_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackPostedMessage {
    pub channel: String,
    pub ts: String,
}

#[derive(Clone)]
pub struct SlackApiClient {
    http: reqwest::Client,
    api_base: String,
    bot_token: String,
    directory: Arc<SlackDirectory>,
}

impl SlackApiClient {
    pub fn new(api_base: String, bot_token: String, request_timeout_ms: u64) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("slack-github-issues"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()
            .context("failed to create slack api client")?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token: bot_token.trim().to_string(),
            directory: Arc::new(SlackDirectory::new()),
        })
    }

    pub fn directory(&self) -> &SlackDirectory {
        &self.directory
    }

    pub async fn get_reactions(&self, channel: &str, timestamp: &str) -> Result<ReactionPayload> {
        let response: SlackReactionsGetResponse = self
            .request_json(
                "reactions.get",
                self.http
                    .get(format!("{}/reactions.get", self.api_base))
                    .bearer_auth(&self.bot_token)
                    .query(&[("channel", channel), ("timestamp", timestamp), ("full", "true")]),
            )
            .await?;
        if !response.ok {
            bail!(
                "slack reactions.get failed: {}",
                response
                    .error
                    .unwrap_or_else(|| "unknown error".to_string())
            );
        }

        let message = response
            .message
            .ok_or_else(|| anyhow!("slack reactions.get response missing message"))?;
        Ok(ReactionPayload {
            permalink: message
                .permalink
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| anyhow!("slack reactions.get response missing permalink"))?,
            timestamp: message.ts.unwrap_or_else(|| timestamp.to_string()),
            reactions: message.reactions,
        })
    }

    pub async fn add_reaction(&self, channel: &str, timestamp: &str, name: &str) -> Result<()> {
        let payload = json!({
            "channel": channel,
            "timestamp": timestamp,
            "name": name,
        });
        let response: SlackOkResponse = self
            .request_json(
                "reactions.add",
                self.http
                    .post(format!("{}/reactions.add", self.api_base))
                    .bearer_auth(&self.bot_token)
                    .json(&payload),
            )
            .await?;
        if !response.ok {
            bail!(
                "slack reactions.add failed: {}",
                response
                    .error
                    .unwrap_or_else(|| "unknown error".to_string())
            );
        }
        Ok(())
    }

    pub async fn post_message(&self, channel: &str, text: &str) -> Result<SlackPostedMessage> {
        let payload = json!({
            "channel": channel,
            "text": text,
            "unfurl_links": false,
            "unfurl_media": false,
        });
        let response: SlackChatMessageResponse = self
            .request_json(
                "chat.postMessage",
                self.http
                    .post(format!("{}/chat.postMessage", self.api_base))
                    .bearer_auth(&self.bot_token)
                    .json(&payload),
            )
            .await?;
        if !response.ok {
            bail!(
                "slack chat.postMessage failed: {}",
                response
                    .error
                    .unwrap_or_else(|| "unknown error".to_string())
            );
        }

        Ok(SlackPostedMessage {
            channel: response.channel.unwrap_or_else(|| channel.to_string()),
            ts: response
                .ts
                .ok_or_else(|| anyhow!("slack chat.postMessage response missing ts"))?,
        })
    }

    /// Reloads the team domain and every visible channel into the directory.
    pub async fn refresh_directory(&self) -> Result<()> {
        let team_domain = self.fetch_team_domain().await?;
        let channel_names = self.fetch_channel_names().await?;
        tracing::debug!(
            team_domain = %team_domain,
            channels = channel_names.len(),
            "slack directory refreshed"
        );
        self.directory.replace(team_domain, channel_names);
        Ok(())
    }

    /// Fetches one conversation missing from the directory and caches its name.
    pub async fn load_channel(&self, channel_id: &str) -> Result<String> {
        let response: SlackConversationInfoResponse = self
            .request_json(
                "conversations.info",
                self.http
                    .get(format!("{}/conversations.info", self.api_base))
                    .bearer_auth(&self.bot_token)
                    .query(&[("channel", channel_id)]),
            )
            .await?;
        if !response.ok {
            bail!(
                "slack conversations.info failed: {}",
                response
                    .error
                    .unwrap_or_else(|| "unknown error".to_string())
            );
        }
        let (id, name) = response
            .channel
            .ok_or_else(|| anyhow!("slack conversations.info response missing channel"))?
            .into_directory_entry();
        self.directory.insert_channel(&id, &name);
        Ok(name)
    }

    async fn fetch_team_domain(&self) -> Result<String> {
        let response: SlackTeamInfoResponse = self
            .request_json(
                "team.info",
                self.http
                    .get(format!("{}/team.info", self.api_base))
                    .bearer_auth(&self.bot_token),
            )
            .await?;
        if !response.ok {
            bail!(
                "slack team.info failed: {}",
                response
                    .error
                    .unwrap_or_else(|| "unknown error".to_string())
            );
        }
        response
            .team
            .and_then(|team| team.domain)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| anyhow!("slack team.info did not return a domain"))
    }

    async fn fetch_channel_names(&self) -> Result<HashMap<String, String>> {
        let mut channel_names = HashMap::new();
        let mut cursor = String::new();
        loop {
            let response: SlackConversationsListResponse = self
                .request_json(
                    "conversations.list",
                    self.http
                        .get(format!("{}/conversations.list", self.api_base))
                        .bearer_auth(&self.bot_token)
                        .query(&[
                            ("types", CONVERSATION_TYPES),
                            ("exclude_archived", "true"),
                            ("limit", CONVERSATIONS_PAGE_LIMIT),
                            ("cursor", cursor.as_str()),
                        ]),
                )
                .await?;
            if !response.ok {
                bail!(
                    "slack conversations.list failed: {}",
                    response
                        .error
                        .unwrap_or_else(|| "unknown error".to_string())
                );
            }
            channel_names.extend(
                response
                    .channels
                    .into_iter()
                    .map(SlackConversation::into_directory_entry),
            );
            match response
                .response_metadata
                .and_then(|metadata| metadata.next_cursor)
                .filter(|value| !value.trim().is_empty())
            {
                Some(next_cursor) => cursor = next_cursor,
                None => break,
            }
        }
        Ok(channel_names)
    }

    async fn request_json<T>(&self, operation: &str, request: reqwest::RequestBuilder) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = request
            .send()
            .await
            .with_context(|| format!("slack api {operation} request failed"))?;
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .with_context(|| format!("failed to decode slack {operation}"));
        }

        let body = response.text().await.unwrap_or_default();
        bail!(
            "slack api {operation} failed with status {}: {}",
            status.as_u16(),
            truncate_for_error(&body, 800)
        );
    }
}

#[async_trait]
impl SlackGateway for SlackApiClient {
    async fn get_reactions(&self, channel_id: &str, timestamp: &str) -> Result<ReactionPayload> {
        SlackApiClient::get_reactions(self, channel_id, timestamp).await
    }

    async fn add_reaction(
        &self,
        channel_id: &str,
        timestamp: &str,
        reaction_name: &str,
    ) -> Result<()> {
        SlackApiClient::add_reaction(self, channel_id, timestamp, reaction_name).await
    }

    fn resolve_channel_name(&self, channel_id: &str) -> Result<String> {
        self.directory.channel_name(channel_id)
    }

    fn resolve_team_domain(&self) -> Result<String> {
        self.directory.team_domain()
    }
}

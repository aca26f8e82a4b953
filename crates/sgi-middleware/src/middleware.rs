//! Orchestrates one reaction event from rule match to in-channel reply.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use anyhow::Result;
use futures_util::FutureExt;
use sgi_config::{BotConfig, MatchRule, RuleSet};

use crate::collaborators::{IssueTracker, MessageLog, Responder, SlackGateway, TracingMessageLog};
use crate::in_flight::InFlightSet;
use crate::issue_metadata::build_issue_metadata;
use crate::reaction_event::{ReactionEvent, ReactionPayload};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Terminal result of one [`Middleware::execute`] call.
pub enum Outcome {
    /// Malformed event, or no rule matched.
    NoMatch,
    /// Another pass for the same message is still running.
    InProgress,
    /// The success reaction was already present; carries the message permalink.
    AlreadyProcessed(String),
    /// Issue filed and success reaction added; carries the issue URL.
    Created(String),
    /// An upstream step failed; carries the decorated reason.
    Failed(String),
    /// Unexpected error or panic; carries the text sent to the user.
    Unhandled(String),
}

impl Outcome {
    /// Text sent back to the channel, if any.
    pub fn reply_text(&self) -> Option<String> {
        match self {
            Self::Created(issue_url) => Some(format!("created: {issue_url}")),
            Self::Failed(reason) | Self::Unhandled(reason) => Some(reason.clone()),
            Self::NoMatch | Self::InProgress | Self::AlreadyProcessed(_) => None,
        }
    }
}

enum PassError {
    Failed(String),
    Unexpected(anyhow::Error),
}

impl From<anyhow::Error> for PassError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unexpected(error)
    }
}

struct PassContext<'a> {
    event: &'a ReactionEvent,
    rule: &'a MatchRule,
    msg_id: String,
    permalink: String,
}

/// Turns matching Slack reactions into GitHub issues.
pub struct Middleware {
    rules: RuleSet,
    success_reaction: String,
    slack: Arc<dyn SlackGateway>,
    issues: Arc<dyn IssueTracker>,
    log: Arc<dyn MessageLog>,
    in_flight: InFlightSet,
}

impl Middleware {
    pub fn new(
        rules: RuleSet,
        success_reaction: impl Into<String>,
        slack: Arc<dyn SlackGateway>,
        issues: Arc<dyn IssueTracker>,
    ) -> Self {
        Self {
            rules,
            success_reaction: success_reaction.into(),
            slack,
            issues,
            log: Arc::new(TracingMessageLog),
            in_flight: InFlightSet::new(),
        }
    }

    pub fn from_config(
        config: &BotConfig,
        slack: Arc<dyn SlackGateway>,
        issues: Arc<dyn IssueTracker>,
    ) -> Self {
        Self::new(
            config.rules.clone(),
            config.success_reaction.clone(),
            slack,
            issues,
        )
    }

    pub fn with_message_log(mut self, log: Arc<dyn MessageLog>) -> Self {
        self.log = log;
        self
    }

    pub fn in_flight(&self) -> &InFlightSet {
        &self.in_flight
    }

    /// True when some rule listens for `reaction_name`, whatever the channel.
    pub fn watches_reaction(&self, reaction_name: &str) -> bool {
        self.rules
            .iter()
            .any(|rule| rule.reaction_name == reaction_name)
    }

    /// First rule matching a `reaction_added` event on a message, if any.
    pub fn find_matching_rule(&self, event: &ReactionEvent) -> Result<Option<&MatchRule>> {
        if !event.is_message_reaction() {
            return Ok(None);
        }
        self.rules.find_match(&event.reaction_name, || {
            self.slack.resolve_channel_name(event.channel_id())
        })
    }

    /// Processes one event. Never fails and never panics outward: every
    /// error is logged, replied to `responder` where appropriate, and
    /// reported through the returned [`Outcome`].
    pub async fn execute(&self, event: &ReactionEvent, responder: &dyn Responder) -> Outcome {
        let reason = match AssertUnwindSafe(self.run(event, responder))
            .catch_unwind()
            .await
        {
            Ok(Ok(outcome)) => return outcome,
            Ok(Err(error)) => format!("{error:#}"),
            Err(panic) => panic_message(panic.as_ref()),
        };

        let message = format!(
            "unhandled error: {reason}\nmessage: {}",
            serde_json::to_string_pretty(event).unwrap_or_else(|_| format!("{event:?}"))
        );
        self.log.error(None, &message);
        self.send_reply(None, responder, &message).await;
        Outcome::Unhandled(message)
    }

    async fn run(&self, event: &ReactionEvent, responder: &dyn Responder) -> Result<Outcome> {
        let Some(rule) = self.find_matching_rule(event)? else {
            return Ok(Outcome::NoMatch);
        };

        let msg_id = event.processing_key();
        let Some(claim) = self.in_flight.try_claim(&msg_id) else {
            self.log.info(Some(&msg_id), "already in progress");
            return Ok(Outcome::InProgress);
        };
        self.log.info(Some(&msg_id), &format!("matches rule: {rule}"));

        let context = PassContext {
            event,
            rule,
            permalink: self.message_permalink(event)?,
            msg_id,
        };
        let outcome = match self.process(&context).await {
            Ok(outcome) => outcome,
            Err(PassError::Failed(reason)) => Outcome::Failed(reason),
            Err(PassError::Unexpected(error)) => return Err(error),
        };

        drop(claim);
        self.finish(&context.msg_id, &outcome, responder).await;
        Ok(outcome)
    }

    async fn process(&self, context: &PassContext<'_>) -> Result<Outcome, PassError> {
        let payload = self.fetch_reactions(context).await?;
        if payload.has_reaction(&self.success_reaction) {
            return Ok(Outcome::AlreadyProcessed(payload.permalink));
        }
        let issue_url = self.file_issue(context, &payload).await?;
        self.add_success_reaction(context, &issue_url).await?;
        Ok(Outcome::Created(issue_url))
    }

    async fn fetch_reactions(
        &self,
        context: &PassContext<'_>,
    ) -> Result<ReactionPayload, PassError> {
        self.log.info(
            Some(&context.msg_id),
            &format!("getting reactions for {}", context.permalink),
        );
        self.slack
            .get_reactions(context.event.channel_id(), context.event.timestamp())
            .await
            .map_err(|error| {
                PassError::Failed(format!(
                    "failed to get reactions for {}: {error:#}",
                    context.permalink
                ))
            })
    }

    async fn file_issue(
        &self,
        context: &PassContext<'_>,
        payload: &ReactionPayload,
    ) -> Result<String, PassError> {
        let channel_name = self.slack.resolve_channel_name(context.event.channel_id())?;
        let metadata = build_issue_metadata(payload, &channel_name)?;
        self.log.info(
            Some(&context.msg_id),
            &format!("making GitHub request for {}", payload.permalink),
        );
        let repository = &context.rule.github_repository;
        self.issues
            .file_issue(&metadata, repository)
            .await
            .map_err(|error| {
                PassError::Failed(format!(
                    "failed to create a GitHub issue in {}/{}: {error:#}",
                    self.issues.owner(),
                    repository
                ))
            })
    }

    async fn add_success_reaction(
        &self,
        context: &PassContext<'_>,
        issue_url: &str,
    ) -> Result<(), PassError> {
        self.log.info(
            Some(&context.msg_id),
            &format!("adding {}", self.success_reaction),
        );
        self.slack
            .add_reaction(
                context.event.channel_id(),
                context.event.timestamp(),
                &self.success_reaction,
            )
            .await
            .map_err(|error| {
                PassError::Failed(format!(
                    "created {issue_url} but failed to add {}: {error:#}",
                    self.success_reaction
                ))
            })
    }

    async fn finish(&self, msg_id: &str, outcome: &Outcome, responder: &dyn Responder) {
        match outcome {
            Outcome::Created(_) => {
                if let Some(text) = outcome.reply_text() {
                    self.log.info(Some(msg_id), &text);
                }
            }
            Outcome::AlreadyProcessed(permalink) => {
                self.log
                    .info(Some(msg_id), &format!("already processed {permalink}"));
            }
            Outcome::Failed(reason) | Outcome::Unhandled(reason) => {
                self.log.error(Some(msg_id), reason);
            }
            Outcome::NoMatch | Outcome::InProgress => {}
        }
        if let Some(text) = outcome.reply_text() {
            self.send_reply(Some(msg_id), responder, &text).await;
        }
    }

    async fn send_reply(&self, msg_id: Option<&str>, responder: &dyn Responder, text: &str) {
        if let Err(error) = responder.reply(text).await {
            self.log
                .error(msg_id, &format!("failed to send reply: {error:#}"));
        }
    }

    /// `https://{domain}.slack.com/archives/{channel}/p{ts without '.'}`
    fn message_permalink(&self, event: &ReactionEvent) -> Result<String> {
        let team_domain = self.slack.resolve_team_domain()?;
        let channel_name = self.slack.resolve_channel_name(event.channel_id())?;
        Ok(format!(
            "https://{team_domain}.slack.com/archives/{channel_name}/p{}",
            event.timestamp().replace('.', "")
        ))
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

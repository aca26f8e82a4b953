use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use sgi_core::current_unix_timestamp;
use sgi_middleware::{Middleware, ReactionEvent};
use sgi_slack::SlackApiClient;
use tokio::net::TcpListener;
use tokio::task::{JoinHandle, JoinSet};

use crate::channel_responder::SlackChannelResponder;
use crate::slack_signature::{verify_slack_signature, SLACK_SIGNATURE_MAX_SKEW_SECONDS};

pub const SLACK_EVENTS_ENDPOINT: &str = "/slack/events";
pub const HEALTHZ_ENDPOINT: &str = "/healthz";

const REACTION_ADDED_EVENT: &str = "reaction_added";

#[derive(Debug, Clone)]
pub struct EventsServerConfig {
    pub bind: String,
    /// `None` disables the periodic channel directory refresh.
    pub directory_refresh_interval: Option<Duration>,
}

/// Shared state behind the events router.
pub struct EventsServerState {
    middleware: Arc<Middleware>,
    slack: SlackApiClient,
    signing_secret: Option<String>,
    max_skew_seconds: u64,
    passes: Mutex<JoinSet<()>>,
}

impl EventsServerState {
    pub fn new(
        middleware: Arc<Middleware>,
        slack: SlackApiClient,
        signing_secret: Option<String>,
    ) -> Self {
        Self {
            middleware,
            slack,
            signing_secret: signing_secret
                .map(|secret| secret.trim().to_string())
                .filter(|secret| !secret.is_empty()),
            max_skew_seconds: SLACK_SIGNATURE_MAX_SKEW_SECONDS,
            passes: Mutex::new(JoinSet::new()),
        }
    }

    pub fn verifies_signatures(&self) -> bool {
        self.signing_secret.is_some()
    }

    /// Number of reaction passes spawned and not yet reaped.
    pub fn pending_passes(&self) -> usize {
        self.passes().len()
    }

    /// Waits for every spawned reaction pass to finish.
    pub async fn drain_passes(&self) {
        let mut passes = std::mem::take(&mut *self.passes());
        if passes.is_empty() {
            return;
        }
        tracing::info!(passes = passes.len(), "waiting for reaction passes to finish");
        while let Some(result) = passes.join_next().await {
            if let Err(error) = result {
                tracing::warn!(%error, "reaction pass did not complete");
            }
        }
    }

    fn spawn_pass<F>(&self, pass: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut passes = self.passes();
        while passes.try_join_next().is_some() {}
        passes.spawn(pass);
    }

    fn passes(&self) -> MutexGuard<'_, JoinSet<()>> {
        match self.passes.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SlackEventEnvelope {
    UrlVerification {
        challenge: String,
    },
    EventCallback {
        event: Value,
        #[serde(default)]
        event_id: Option<String>,
    },
    #[serde(other)]
    Other,
}

pub fn build_events_router(state: Arc<EventsServerState>) -> Router {
    Router::new()
        .route(SLACK_EVENTS_ENDPOINT, post(handle_slack_events))
        .route(HEALTHZ_ENDPOINT, get(handle_healthz))
        .with_state(state)
}

pub async fn run_events_server(
    config: EventsServerConfig,
    state: Arc<EventsServerState>,
) -> Result<()> {
    let bind_addr = config
        .bind
        .parse::<SocketAddr>()
        .with_context(|| format!("invalid --bind '{}'", config.bind))?;
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind slack events server on {bind_addr}"))?;
    serve_events(
        listener,
        config.directory_refresh_interval,
        state,
        async {
            let _ = tokio::signal::ctrl_c().await;
        },
    )
    .await
}

/// Serves Slack events on `listener` until `shutdown` resolves, then lets
/// in-flight reaction passes finish before returning.
pub async fn serve_events<S>(
    listener: TcpListener,
    directory_refresh_interval: Option<Duration>,
    state: Arc<EventsServerState>,
    shutdown: S,
) -> Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    let local_addr = listener
        .local_addr()
        .context("failed to resolve bound slack events server address")?;

    let refresh_handle = directory_refresh_interval
        .map(|interval| spawn_directory_refresh(state.slack.clone(), interval));

    tracing::info!(
        endpoint = SLACK_EVENTS_ENDPOINT,
        addr = %local_addr,
        verifies_signatures = state.verifies_signatures(),
        "slack events server listening"
    );

    let app = build_events_router(Arc::clone(&state));
    let serve_result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await;
    if let Some(handle) = refresh_handle {
        handle.abort();
    }
    state.drain_passes().await;
    serve_result.context("slack events server exited unexpectedly")?;
    tracing::info!("slack events server stopped");
    Ok(())
}

/// Reloads the team domain and channel names every `interval`.
pub fn spawn_directory_refresh(slack: SlackApiClient, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // First tick completes immediately; startup already loaded the directory.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match slack.refresh_directory().await {
                Ok(()) => tracing::debug!(
                    channels = slack.directory().channel_count(),
                    "refreshed slack directory"
                ),
                Err(error) => {
                    tracing::warn!(error = %format!("{error:#}"), "slack directory refresh failed")
                }
            }
        }
    })
}

async fn handle_healthz() -> &'static str {
    "ok"
}

async fn handle_slack_events(
    State(state): State<Arc<EventsServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(secret) = state.signing_secret.as_deref() {
        if let Err(error) = verify_slack_signature(
            secret,
            header_value(&headers, "x-slack-request-timestamp"),
            header_value(&headers, "x-slack-signature"),
            &body,
            current_unix_timestamp(),
            state.max_skew_seconds,
        ) {
            tracing::warn!(%error, "rejected slack events request");
            return (StatusCode::UNAUTHORIZED, error.to_string()).into_response();
        }
    }

    let envelope = match serde_json::from_slice::<SlackEventEnvelope>(&body) {
        Ok(envelope) => envelope,
        Err(error) => {
            tracing::warn!(%error, "invalid slack events payload");
            return (
                StatusCode::BAD_REQUEST,
                format!("invalid slack events payload: {error}"),
            )
                .into_response();
        }
    };

    match envelope {
        SlackEventEnvelope::UrlVerification { challenge } => {
            Json(json!({ "challenge": challenge })).into_response()
        }
        SlackEventEnvelope::EventCallback { event, event_id } => {
            dispatch_event(&state, event, event_id.as_deref());
            StatusCode::OK.into_response()
        }
        SlackEventEnvelope::Other => StatusCode::OK.into_response(),
    }
}

fn dispatch_event(state: &EventsServerState, event: Value, event_id: Option<&str>) {
    let event_type = event.get("type").and_then(Value::as_str).unwrap_or_default();
    if event_type != REACTION_ADDED_EVENT {
        tracing::debug!(event_type, event_id, "ignoring slack event");
        return;
    }
    let event = match serde_json::from_value::<ReactionEvent>(event) {
        Ok(event) => event,
        Err(error) => {
            tracing::warn!(%error, event_id, "undecodable reaction_added event");
            return;
        }
    };

    let middleware = Arc::clone(&state.middleware);
    let slack = state.slack.clone();
    let responder =
        SlackChannelResponder::new(state.slack.clone(), event.channel_id(), &event.user_id);
    let event_id = event_id.map(str::to_string);
    state.spawn_pass(async move {
        if middleware.watches_reaction(&event.reaction_name) {
            ensure_channel_known(&slack, event.channel_id()).await;
        }
        let outcome = middleware.execute(&event, &responder).await;
        tracing::debug!(
            event_id = event_id.as_deref(),
            key = %event.processing_key(),
            ?outcome,
            "reaction event finished"
        );
    });
}

/// Channels created after startup, and direct messages, are fetched on demand.
async fn ensure_channel_known(slack: &SlackApiClient, channel_id: &str) {
    if slack.directory().channel_name(channel_id).is_ok() {
        return;
    }
    match slack.load_channel(channel_id).await {
        Ok(name) => tracing::debug!(channel_id, channel = %name, "loaded slack channel"),
        Err(error) => tracing::warn!(
            channel_id,
            error = %format!("{error:#}"),
            "slack channel lookup failed"
        ),
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

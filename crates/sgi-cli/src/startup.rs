use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use sgi_config::{load_bot_config, BotConfig};
use sgi_gateway::{run_events_server, EventsServerConfig, EventsServerState};
use sgi_github::GithubApiClient;
use sgi_middleware::Middleware;
use sgi_slack::SlackApiClient;

use crate::cli_args::{Cli, CliCommand};

pub(crate) async fn run_cli(cli: Cli) -> Result<()> {
    match cli.command.clone().unwrap_or(CliCommand::Serve) {
        CliCommand::Serve => run_serve(cli).await,
        CliCommand::CheckConfig => run_check_config(&cli.config),
    }
}

fn run_check_config(path: &Path) -> Result<()> {
    let config = load_bot_config(path)?;
    println!("{}", render_config_summary(path, &config));
    Ok(())
}

async fn run_serve(cli: Cli) -> Result<()> {
    let config = load_bot_config(&cli.config)?;
    let slack_token = require_secret(cli.slack_bot_token, "--slack-bot-token", "SLACK_BOT_TOKEN")?;
    let github_token = require_secret(cli.github_token, "--github-token", "GITHUB_TOKEN")?;

    let slack = SlackApiClient::new(cli.slack_api_base, slack_token, config.slack_timeout_ms)?;
    slack
        .refresh_directory()
        .await
        .context("failed to load slack team and channel directory")?;
    tracing::info!(
        channels = slack.directory().channel_count(),
        rules = config.rules.len(),
        "loaded slack directory"
    );

    let github = GithubApiClient::new(
        cli.github_api_base,
        github_token,
        config.github_user.clone(),
        config.github_timeout_ms,
    )?;
    let middleware = Middleware::from_config(&config, Arc::new(slack.clone()), Arc::new(github));
    let state = Arc::new(EventsServerState::new(
        Arc::new(middleware),
        slack,
        cli.slack_signing_secret,
    ));
    if !state.verifies_signatures() {
        tracing::warn!("no slack signing secret configured; event signatures are not verified");
    }

    run_events_server(
        EventsServerConfig {
            bind: cli.bind,
            directory_refresh_interval: refresh_interval(cli.directory_refresh_seconds),
        },
        state,
    )
    .await
}

pub(crate) fn require_secret(value: Option<String>, flag: &str, env: &str) -> Result<String> {
    match value.map(|value| value.trim().to_string()) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => bail!("{flag} (or {env}) is required to serve"),
    }
}

pub(crate) fn refresh_interval(seconds: u64) -> Option<Duration> {
    (seconds > 0).then(|| Duration::from_secs(seconds))
}

pub(crate) fn render_config_summary(path: &Path, config: &BotConfig) -> String {
    let mut lines = vec![
        format!("config: {}", path.display()),
        format!("github user: {}", config.github_user),
        format!("success reaction: {}", config.success_reaction),
        format!(
            "timeouts: github={}ms slack={}ms",
            config.github_timeout_ms, config.slack_timeout_ms
        ),
        format!("rules: {}", config.rules.len()),
    ];
    lines.extend(
        config
            .rules
            .iter()
            .enumerate()
            .map(|(index, rule)| format!("  {}. {}", index + 1, rule)),
    );
    lines.join("\n")
}

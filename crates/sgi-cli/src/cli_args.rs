use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sgi_config::DEFAULT_CONFIG_PATH;
use sgi_github::DEFAULT_GITHUB_API_BASE;
use sgi_slack::DEFAULT_SLACK_API_BASE;

#[derive(Debug, Parser)]
#[command(
    name = "slack-github-issues",
    about = "Files GitHub issues for Slack messages that receive a configured reaction",
    version
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Option<CliCommand>,

    #[arg(
        long = "config",
        env = "SLACK_GITHUB_ISSUES_CONFIG_PATH",
        default_value = DEFAULT_CONFIG_PATH,
        global = true,
        help = "Path to the JSON rule configuration"
    )]
    pub(crate) config: PathBuf,

    #[arg(
        long = "bind",
        env = "SLACK_GITHUB_ISSUES_BIND",
        default_value = "127.0.0.1:8080",
        global = true,
        help = "Socket address for the Slack events endpoint"
    )]
    pub(crate) bind: String,

    #[arg(
        long = "slack-api-base",
        env = "SLACK_GITHUB_ISSUES_SLACK_API_BASE",
        default_value = DEFAULT_SLACK_API_BASE,
        global = true,
        help = "Slack Web API base URL"
    )]
    pub(crate) slack_api_base: String,

    #[arg(
        long = "github-api-base",
        env = "SLACK_GITHUB_ISSUES_GITHUB_API_BASE",
        default_value = DEFAULT_GITHUB_API_BASE,
        global = true,
        help = "GitHub REST API base URL"
    )]
    pub(crate) github_api_base: String,

    #[arg(
        long = "slack-bot-token",
        env = "SLACK_BOT_TOKEN",
        hide_env_values = true,
        global = true,
        help = "Slack bot token for Web API (xoxb-...)"
    )]
    pub(crate) slack_bot_token: Option<String>,

    #[arg(
        long = "slack-signing-secret",
        env = "SLACK_SIGNING_SECRET",
        hide_env_values = true,
        global = true,
        help = "Slack signing secret; event signatures are not verified when omitted"
    )]
    pub(crate) slack_signing_secret: Option<String>,

    #[arg(
        long = "github-token",
        env = "GITHUB_TOKEN",
        hide_env_values = true,
        global = true,
        help = "GitHub token allowed to create issues in the configured repositories"
    )]
    pub(crate) github_token: Option<String>,

    #[arg(
        long = "directory-refresh-seconds",
        env = "SLACK_GITHUB_ISSUES_DIRECTORY_REFRESH_SECONDS",
        default_value_t = 300,
        global = true,
        help = "Interval for reloading Slack channel names (0 disables the refresh)"
    )]
    pub(crate) directory_refresh_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub(crate) enum CliCommand {
    /// Serve the Slack events endpoint (default).
    Serve,
    /// Load and validate the configuration, then print the rules.
    CheckConfig,
}

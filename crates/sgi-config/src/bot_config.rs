use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::match_rule::{MatchRule, RuleSet};

pub const DEFAULT_CONFIG_PATH: &str = "config/slack-github-issues.json";
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct BotConfigFile {
    github_user: String,
    #[serde(default = "default_timeout_ms")]
    github_timeout: u64,
    #[serde(default = "default_timeout_ms")]
    slack_timeout: u64,
    success_reaction: String,
    rules: Vec<MatchRule>,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Validated bot configuration.
pub struct BotConfig {
    /// Owner of every repository named by the rules.
    pub github_user: String,
    pub github_timeout_ms: u64,
    pub slack_timeout_ms: u64,
    /// Reaction whose presence marks a message as already filed.
    pub success_reaction: String,
    pub rules: RuleSet,
}

pub fn load_bot_config(path: &Path) -> Result<BotConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read bot config {}", path.display()))?;
    parse_bot_config_with_source(&raw, &path.display().to_string())
}

pub fn parse_bot_config(raw: &str) -> Result<BotConfig> {
    parse_bot_config_with_source(raw, "<inline-config>")
}

fn parse_bot_config_with_source(raw: &str, source_label: &str) -> Result<BotConfig> {
    let parsed = serde_json::from_str::<BotConfigFile>(raw)
        .with_context(|| format!("failed to parse bot config {}", source_label))?;
    normalize_and_validate_config(source_label, parsed)
}

fn normalize_and_validate_config(source_label: &str, file: BotConfigFile) -> Result<BotConfig> {
    let github_user = require_non_empty(source_label, "githubUser", &file.github_user)?;
    let success_reaction =
        require_non_empty(source_label, "successReaction", &file.success_reaction)?;
    if file.github_timeout == 0 {
        bail!("'githubTimeout' must be greater than 0 in {}", source_label);
    }
    if file.slack_timeout == 0 {
        bail!("'slackTimeout' must be greater than 0 in {}", source_label);
    }
    if file.rules.is_empty() {
        bail!("'rules' must contain at least one rule in {}", source_label);
    }

    let mut seen: HashSet<(String, Option<BTreeSet<String>>)> = HashSet::new();
    let mut rules = Vec::with_capacity(file.rules.len());
    for (index, rule) in file.rules.into_iter().enumerate() {
        let rule = normalize_rule(source_label, index, rule)?;
        if !seen.insert((rule.reaction_name.clone(), rule.channel_names.clone())) {
            bail!(
                "rule {} in {} duplicates an earlier rule ({})",
                index,
                source_label,
                rule
            );
        }
        rules.push(rule);
    }
    // Channel-specific rules take precedence over catch-alls; stable within each group.
    rules.sort_by_key(|rule| !rule.is_channel_restricted());

    Ok(BotConfig {
        github_user,
        github_timeout_ms: file.github_timeout,
        slack_timeout_ms: file.slack_timeout,
        success_reaction,
        rules: RuleSet::new(rules),
    })
}

fn normalize_rule(source_label: &str, index: usize, rule: MatchRule) -> Result<MatchRule> {
    let field_label = |field: &str| format!("rules[{index}].{field}");
    let reaction_name =
        require_non_empty(source_label, &field_label("reactionName"), &rule.reaction_name)?;
    let github_repository = require_non_empty(
        source_label,
        &field_label("githubRepository"),
        &rule.github_repository,
    )?;
    if github_repository.contains('/') {
        bail!(
            "'{}' must be a bare repository name without an owner in {}",
            field_label("githubRepository"),
            source_label
        );
    }

    let channel_names = match rule.channel_names {
        None => None,
        Some(names) => {
            if names.is_empty() {
                bail!(
                    "'{}' must not be empty when present in {}",
                    field_label("channelNames"),
                    source_label
                );
            }
            let mut normalized = BTreeSet::new();
            for name in names {
                normalized.insert(require_non_empty(
                    source_label,
                    &field_label("channelNames"),
                    &name,
                )?);
            }
            Some(normalized)
        }
    };

    Ok(MatchRule {
        reaction_name,
        github_repository,
        channel_names,
    })
}

fn require_non_empty(source_label: &str, field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        bail!("'{}' must not be empty in {}", field, source_label);
    }
    Ok(trimmed.to_string())
}

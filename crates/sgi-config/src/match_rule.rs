use std::collections::BTreeSet;
use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
/// Maps a reaction name, optionally restricted to some channels, to a repository.
pub struct MatchRule {
    pub reaction_name: String,
    pub github_repository: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_names: Option<BTreeSet<String>>,
}

impl MatchRule {
    pub fn is_channel_restricted(&self) -> bool {
        self.channel_names.is_some()
    }

    /// Returns true when `channel_name` may trigger this rule.
    pub fn allows_channel(&self, channel_name: &str) -> bool {
        self.channel_names
            .as_ref()
            .is_none_or(|names| names.contains(channel_name))
    }
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "reaction={} repository={}",
            self.reaction_name, self.github_repository
        )?;
        if let Some(channel_names) = &self.channel_names {
            let joined = channel_names
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(",");
            write!(f, " channels={joined}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Ordered rule list; the first matching rule wins.
pub struct RuleSet {
    rules: Vec<MatchRule>,
}

impl RuleSet {
    /// Builds a rule set that is scanned in exactly the given order.
    pub fn new(rules: Vec<MatchRule>) -> Self {
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MatchRule> {
        self.rules.iter()
    }

    /// Returns the first rule for `reaction_name` whose channel restriction
    /// admits the message's channel.
    ///
    /// `resolve_channel_name` is only invoked when a candidate rule is
    /// channel-restricted, and at most once per call.
    pub fn find_match<F>(
        &self,
        reaction_name: &str,
        mut resolve_channel_name: F,
    ) -> Result<Option<&MatchRule>>
    where
        F: FnMut() -> Result<String>,
    {
        let mut channel_name: Option<String> = None;
        for rule in &self.rules {
            if rule.reaction_name != reaction_name {
                continue;
            }
            if !rule.is_channel_restricted() {
                return Ok(Some(rule));
            }
            if channel_name.is_none() {
                channel_name = Some(resolve_channel_name()?);
            }
            if rule.allows_channel(channel_name.as_deref().unwrap_or_default()) {
                return Ok(Some(rule));
            }
        }
        Ok(None)
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a MatchRule;
    type IntoIter = std::slice::Iter<'a, MatchRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

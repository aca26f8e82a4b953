use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, Result};

#[derive(Debug, Default)]
struct DirectoryState {
    team_domain: Option<String>,
    channel_names: HashMap<String, String>,
}

#[derive(Debug, Default)]
/// In-memory channel and team lookups answered without network I/O.
pub struct SlackDirectory {
    state: RwLock<DirectoryState>,
}

impl SlackDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole directory with a fresh snapshot.
    pub fn replace(&self, team_domain: String, channel_names: HashMap<String, String>) {
        let mut state = self.write();
        state.team_domain = Some(team_domain);
        state.channel_names = channel_names;
    }

    pub fn insert_channel(&self, channel_id: &str, channel_name: &str) {
        self.write()
            .channel_names
            .insert(channel_id.to_string(), channel_name.to_string());
    }

    pub fn channel_name(&self, channel_id: &str) -> Result<String> {
        self.read()
            .channel_names
            .get(channel_id)
            .cloned()
            .ok_or_else(|| anyhow!("unknown slack channel id '{}'", channel_id))
    }

    pub fn team_domain(&self) -> Result<String> {
        self.read()
            .team_domain
            .clone()
            .ok_or_else(|| anyhow!("slack team domain has not been loaded"))
    }

    pub fn channel_count(&self) -> usize {
        self.read().channel_names.len()
    }

    fn read(&self) -> RwLockReadGuard<'_, DirectoryState> {
        match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, DirectoryState> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

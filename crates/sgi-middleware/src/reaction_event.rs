use serde::{Deserialize, Serialize};

pub const REACTION_ADDED_EVENT_TYPE: &str = "reaction_added";
pub const MESSAGE_ITEM_TYPE: &str = "message";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Slack `reaction_added` event as delivered by the Events API.
///
/// Every field defaults to empty so a malformed event still decodes and is
/// then simply left unmatched.
pub struct ReactionEvent {
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(rename = "user", default)]
    pub user_id: String,
    #[serde(default)]
    pub item: ReactionItem,
    #[serde(rename = "reaction", default)]
    pub reaction_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionItem {
    #[serde(rename = "type", default)]
    pub item_type: String,
    #[serde(rename = "channel", default)]
    pub channel_id: String,
    #[serde(rename = "ts", default)]
    pub timestamp: String,
}

impl ReactionEvent {
    /// True for a `reaction_added` event on a message item.
    pub fn is_message_reaction(&self) -> bool {
        self.event_type == REACTION_ADDED_EVENT_TYPE && self.item.item_type == MESSAGE_ITEM_TYPE
    }

    pub fn channel_id(&self) -> &str {
        &self.item.channel_id
    }

    pub fn timestamp(&self) -> &str {
        &self.item.timestamp
    }

    /// `channel:ts`, unique per Slack message.
    pub fn processing_key(&self) -> String {
        format!("{}:{}", self.item.channel_id, self.item.timestamp)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Current state of a message as returned by `reactions.get`.
pub struct ReactionPayload {
    pub permalink: String,
    #[serde(rename = "ts")]
    pub timestamp: String,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
}

impl ReactionPayload {
    pub fn has_reaction(&self, name: &str) -> bool {
        self.reactions.iter().any(|reaction| reaction.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub name: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub users: Vec<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ReactionEvent, ReactionPayload};

    #[test]
    fn unit_reaction_event_decodes_slack_shape() {
        let event: ReactionEvent = serde_json::from_value(json!({
            "type": "reaction_added",
            "user": "U024BE7LH",
            "item": { "type": "message", "channel": "C2147483705", "ts": "1360782804.083113" },
            "reaction": "evergreen_tree",
            "item_user": "U0G9QF9C6",
            "event_ts": "1360782804.083113"
        }))
        .expect("decode event");
        assert!(event.is_message_reaction());
        assert_eq!(event.user_id, "U024BE7LH");
        assert_eq!(event.reaction_name, "evergreen_tree");
        assert_eq!(event.processing_key(), "C2147483705:1360782804.083113");
    }

    #[test]
    fn regression_reaction_event_tolerates_missing_fields() {
        let event: ReactionEvent =
            serde_json::from_value(json!({ "reaction": "smiley" })).expect("decode event");
        assert!(!event.is_message_reaction());
        assert_eq!(event.processing_key(), ":");

        let file_reaction: ReactionEvent = serde_json::from_value(json!({
            "type": "reaction_added",
            "item": { "type": "file", "file": "F1" },
            "reaction": "smiley"
        }))
        .expect("decode event");
        assert!(!file_reaction.is_message_reaction());
    }

    #[test]
    fn unit_reaction_payload_detects_named_reaction() {
        let payload: ReactionPayload = serde_json::from_value(json!({
            "permalink": "https://x/y",
            "ts": "100.1",
            "reactions": [{ "name": "smiley", "count": 2, "users": ["U1", "U2"] }]
        }))
        .expect("decode payload");
        assert!(payload.has_reaction("smiley"));
        assert!(!payload.has_reaction("heavy_check_mark"));
    }
}

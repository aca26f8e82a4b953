//! Reaction-to-issue orchestration for slack-github-issues.
//!
//! [`Middleware::execute`] takes one Slack `reaction_added` event through
//! rule matching, the in-flight and already-filed guards, and the
//! fetch-reactions / file-issue / add-reaction sequence, then reports the
//! [`Outcome`] to the logger and the originating channel.

pub mod collaborators;
pub mod in_flight;
pub mod issue_metadata;
pub mod middleware;
pub mod reaction_event;

pub use collaborators::{IssueTracker, MessageLog, Responder, SlackGateway, TracingMessageLog};
pub use in_flight::{InFlightGuard, InFlightSet};
pub use issue_metadata::{build_issue_metadata, IssueMetadata};
pub use middleware::{Middleware, Outcome};
pub use reaction_event::{Reaction, ReactionEvent, ReactionItem, ReactionPayload};

//! Message — the immutable unit of communication between roles.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::action::ActionKind;
use crate::schema::StructuredPayload;

// ── Role identity ──

/// Addressable identity of a role (its profile label, e.g. "Architect").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(pub String);

impl RoleId {
    pub fn new(profile: impl Into<String>) -> Self {
        Self(profile.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RoleId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ── Message ──

/// One immutable record of an action's output. Shared between memories as
/// `Arc<Message>` — no memory ever holds a private mutable copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub content: String,
    /// Structured sections parsed from the action's output, if the action
    /// declares an output schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<StructuredPayload>,
    /// Identity of the action that created this message.
    pub produced_by: ActionKind,
    /// Identity of the role that ran the action.
    pub author: RoleId,
    /// Explicit recipients. Empty = broadcast to all subscribers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recipients: Vec<RoleId>,
    pub sent_at: chrono::DateTime<chrono::Utc>,
}

impl Message {
    pub fn new(
        content: impl Into<String>,
        produced_by: ActionKind,
        author: RoleId,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            content: content.into(),
            payload: None,
            produced_by,
            author,
            recipients: Vec::new(),
            sent_at: chrono::Utc::now(),
        })
    }

    /// Like [`Message::new`] with a structured payload and explicit recipients.
    pub fn with_parts(
        content: impl Into<String>,
        payload: Option<StructuredPayload>,
        produced_by: ActionKind,
        author: RoleId,
        recipients: Vec<RoleId>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            content: content.into(),
            payload,
            produced_by,
            author,
            recipients,
            sent_at: chrono::Utc::now(),
        })
    }

    pub fn is_broadcast(&self) -> bool {
        self.recipients.is_empty()
    }

    pub fn addressed_to(&self, role: &RoleId) -> bool {
        self.recipients.contains(role)
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let preview: String = self.content.chars().take(60).collect();
        write!(f, "{}[{}]: {}", self.author, self.produced_by, preview)
    }
}

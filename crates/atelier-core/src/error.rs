//! Error taxonomy: generator failures retry inside the role, exhausted
//! roles abort the session, scheduler stalls surface to the caller.

use thiserror::Error;

use crate::action::ActionKind;
use crate::message::RoleId;

// ── Provider boundary ──

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("provider returned no content")]
    Empty,
}

impl GenerateError {
    /// Whether a retry could plausibly succeed. Rate limits, server errors
    /// and transport hiccups are transient; 4xx rejections are not.
    pub fn is_transient(&self) -> bool {
        match self {
            GenerateError::Transport(_) => true,
            GenerateError::Api { status, .. } => *status == 429 || *status >= 500,
            GenerateError::Empty => true,
        }
    }
}

// ── Structured-output boundary ──

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("output missing required sections: {}", missing.join(", "))]
    MissingFields { missing: Vec<String> },
}

// ── Action invocation ──

#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Generate(#[from] GenerateError),

    /// Structured output failed validation — eligible for retry with the
    /// same context, never silently coerced.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("action aborted: {0}")]
    Aborted(String),
}

impl ActionError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ActionError::Generate(e) => e.is_transient(),
            ActionError::Schema(_) => true,
            ActionError::Aborted(_) => false,
        }
    }
}

// ── Session ──

#[derive(Debug, Error)]
pub enum SessionError {
    /// A role exhausted its retry budget; the round was cancelled and the
    /// session aborted.
    #[error("role {role} failed running {action}: {source}")]
    RoleFailed {
        role: RoleId,
        action: ActionKind,
        source: ActionError,
    },

    /// The round budget ran out with roles still runnable — almost always a
    /// subscription cycle.
    #[error("scheduling stalled after {rounds} rounds; still runnable: {}", roles.iter().map(|r| r.as_str()).collect::<Vec<_>>().join(", "))]
    Stalled { roles: Vec<RoleId>, rounds: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_status_transience() {
        assert!(GenerateError::Api { status: 500, body: String::new() }.is_transient());
        assert!(GenerateError::Api { status: 429, body: String::new() }.is_transient());
        assert!(!GenerateError::Api { status: 401, body: String::new() }.is_transient());
    }

    #[test]
    fn test_schema_failures_retry() {
        let err = ActionError::Schema(SchemaError::MissingFields {
            missing: vec!["Task list".into()],
        });
        assert!(err.is_retryable());
        assert!(!ActionError::Aborted("gave up".into()).is_retryable());
    }

    #[test]
    fn test_stalled_display_names_roles() {
        let err = SessionError::Stalled {
            roles: vec![RoleId::new("Role1"), RoleId::new("Role2")],
            rounds: 8,
        };
        let text = err.to_string();
        assert!(text.contains("Role1"));
        assert!(text.contains("Role2"));
        assert!(text.contains('8'));
    }
}

//! Actions — the named units of work a role can run, and the closed
//! registry of their identities.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ActionError;
use crate::message::{Message, RoleId};
use crate::provider::TextGenerator;
use crate::schema::{OutputSchema, StructuredPayload};

// ── Action identity ──

/// Every action the system knows, as a closed tagged registry. Routing and
/// todo selection dispatch on these variants — there is no string-keyed
/// action lookup anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// The unsolicited top-level requirement that bootstraps a session.
    Requirement,
    WritePrd,
    WriteDesign,
    WriteTasks,
    WriteCode,
    WriteTest,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Requirement => "requirement",
            ActionKind::WritePrd => "write_prd",
            ActionKind::WriteDesign => "write_design",
            ActionKind::WriteTasks => "write_tasks",
            ActionKind::WriteCode => "write_code",
            ActionKind::WriteTest => "write_test",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Invocation contract ──

/// Result of one action invocation. The return value is the sole artifact —
/// no side channel reports partial progress.
#[derive(Debug, Clone)]
pub struct ActionOutput {
    pub content: String,
    pub payload: Option<StructuredPayload>,
}

impl ActionOutput {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            payload: None,
        }
    }
}

/// A unit of work. Handlers are stateless with respect to scheduling: any
/// state they need arrives in `context`, selected by the calling role.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn invoke(&self, context: &[Arc<Message>]) -> Result<ActionOutput, ActionError>;
}

// ── Repertoire entries ──

/// Where a finished message goes.
#[derive(Debug, Clone, Default)]
pub enum Addressing {
    /// Deliver to every role subscribed to this action kind.
    #[default]
    Broadcast,
    /// Point-to-point delivery to the named roles only.
    Direct(Vec<RoleId>),
}

/// One entry in a role's repertoire: the action identity, the watched kinds
/// that select it, the declared context dependencies, and the handler.
pub struct ActionSpec {
    pub kind: ActionKind,
    /// Watched action kinds whose arrival selects this action as the todo.
    pub triggers: Vec<ActionKind>,
    /// Action kinds whose messages form this action's invocation context.
    /// Declared up front — context never falls back to full history.
    pub reads: Vec<ActionKind>,
    pub addressing: Addressing,
    pub handler: Box<dyn ActionHandler>,
}

impl ActionSpec {
    pub fn new(
        kind: ActionKind,
        triggers: Vec<ActionKind>,
        reads: Vec<ActionKind>,
        handler: Box<dyn ActionHandler>,
    ) -> Self {
        Self {
            kind,
            triggers,
            reads,
            addressing: Addressing::Broadcast,
            handler,
        }
    }

    pub fn with_addressing(mut self, addressing: Addressing) -> Self {
        self.addressing = addressing;
        self
    }
}

impl std::fmt::Debug for ActionSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionSpec")
            .field("kind", &self.kind)
            .field("triggers", &self.triggers)
            .field("reads", &self.reads)
            .finish_non_exhaustive()
    }
}

// ── Standard generator-backed handler ──

/// The handler the role catalogue uses: renders its context into a single
/// input, asks the text generator, and validates structured output when a
/// schema is declared.
pub struct LlmAction {
    generator: Arc<dyn TextGenerator>,
    system_prompt: String,
    schema: Option<OutputSchema>,
}

impl LlmAction {
    pub fn new(generator: Arc<dyn TextGenerator>, system_prompt: impl Into<String>) -> Self {
        Self {
            generator,
            system_prompt: system_prompt.into(),
            schema: None,
        }
    }

    pub fn with_schema(mut self, schema: OutputSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    fn render_context(context: &[Arc<Message>]) -> String {
        context
            .iter()
            .map(|m| format!("[{}] {}", m.author, m.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[async_trait]
impl ActionHandler for LlmAction {
    async fn invoke(&self, context: &[Arc<Message>]) -> Result<ActionOutput, ActionError> {
        let input = Self::render_context(context);
        let raw = self.generator.generate(&self.system_prompt, &input).await?;

        let payload = match &self.schema {
            Some(schema) => Some(schema.parse(&raw)?),
            None => None,
        };

        Ok(ActionOutput {
            content: raw,
            payload,
        })
    }
}

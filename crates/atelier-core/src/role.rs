//! Role — an addressable participant owning a memory, a repertoire of
//! actions, and the subscription set that decides when it runs.

use std::sync::Arc;

use tracing::{info, warn};

use crate::action::{ActionKind, ActionSpec, Addressing};
use crate::error::ActionError;
use crate::memory::Memory;
use crate::message::{Message, RoleId};

/// Where a role is within its turn. Mostly useful for logs and assertions;
/// the transitions themselves are driven by [`Role::take_turn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolePhase {
    Idle,
    Selecting,
    Running,
    Publishing,
}

/// A turn that exhausted its retry budget. The environment folds this into
/// its session-level failure report.
#[derive(Debug)]
pub struct TurnFailure {
    pub action: ActionKind,
    pub error: ActionError,
}

pub struct Role {
    pub name: String,
    pub id: RoleId,
    repertoire: Vec<ActionSpec>,
    watches: Vec<ActionKind>,
    memory: Memory,
    /// New qualifying messages since the last turn, in arrival order.
    pending: Vec<Arc<Message>>,
    phase: RolePhase,
    entry_point: bool,
    kicked: bool,
    max_context: usize,
}

impl Role {
    pub fn new(name: impl Into<String>, profile: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: RoleId::new(profile),
            repertoire: Vec::new(),
            watches: Vec::new(),
            memory: Memory::new(),
            pending: Vec::new(),
            phase: RolePhase::Idle,
            entry_point: false,
            kicked: false,
            max_context: 30,
        }
    }

    /// Add an action to the repertoire. Declaration order matters: earlier
    /// actions win selection ties. The action's triggers join the
    /// subscription set.
    pub fn with_action(mut self, spec: ActionSpec) -> Self {
        for kind in &spec.triggers {
            if !self.watches.contains(kind) {
                self.watches.push(*kind);
            }
        }
        self.repertoire.push(spec);
        self
    }

    /// Watch an action kind beyond those implied by the repertoire.
    pub fn with_watch(mut self, kind: ActionKind) -> Self {
        if !self.watches.contains(&kind) {
            self.watches.push(kind);
        }
        self
    }

    /// Mark this role as a session entry point: it gets one turn at session
    /// start without waiting for a trigger.
    pub fn as_entry_point(mut self) -> Self {
        self.entry_point = true;
        self
    }

    pub fn with_max_context(mut self, max: usize) -> Self {
        self.max_context = max;
        self
    }

    /// "Alice(Product Manager)" — used in logs.
    pub fn setting(&self) -> String {
        format!("{}({})", self.name, self.id)
    }

    pub fn subscribes_to(&self, kind: ActionKind) -> bool {
        self.watches.contains(&kind)
    }

    pub fn phase(&self) -> RolePhase {
        self.phase
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Ingest a delivered message. Idempotent by message identity: a
    /// duplicate (including the role's own publications echoed back by the
    /// router) changes nothing and never re-triggers a turn.
    pub fn deliver(&mut self, msg: &Arc<Message>) {
        if !self.memory.add(msg.clone()) {
            return;
        }
        self.pending.push(msg.clone());
    }

    /// Runnable iff a qualifying message arrived since the last turn, or
    /// this is an entry point that has not had its initial kick.
    pub fn is_runnable(&self) -> bool {
        !self.pending.is_empty() || (self.entry_point && !self.kicked)
    }

    /// Pick the repertoire action for this turn: the newest pending trigger
    /// decides; a message triggering several actions resolves to the
    /// earliest-declared one; a pending message that triggers nothing (a
    /// direct-addressed note) falls back to the first-declared action.
    fn select_todo(&self) -> Option<usize> {
        for msg in self.pending.iter().rev() {
            if let Some(idx) = self
                .repertoire
                .iter()
                .position(|spec| spec.triggers.contains(&msg.produced_by))
            {
                return Some(idx);
            }
        }
        if self.repertoire.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    /// Run one full turn: select the todo, assemble declared context,
    /// invoke with a bounded retry budget, publish exactly one message on
    /// success. The role is back to Idle afterwards either way and will not
    /// run again until new qualifying triggers arrive.
    pub async fn take_turn(
        &mut self,
        retry_budget: u32,
    ) -> Result<Arc<Message>, TurnFailure> {
        self.phase = RolePhase::Selecting;
        let todo = self.select_todo();
        self.pending.clear();
        self.kicked = true;

        let Some(todo) = todo else {
            // A role with an empty repertoire observes but never acts.
            self.phase = RolePhase::Idle;
            return Err(TurnFailure {
                action: ActionKind::Requirement,
                error: ActionError::Aborted(format!("{} has no actions", self.setting())),
            });
        };

        let spec = &self.repertoire[todo];
        info!("{}: ready to {}", self.setting(), spec.kind);

        self.phase = RolePhase::Running;
        let mut context = self.memory.get_by_action(&spec.reads);
        if context.len() > self.max_context {
            context.drain(..context.len() - self.max_context);
        }

        let mut attempt = 0u32;
        let output = loop {
            match spec.handler.invoke(&context).await {
                Ok(output) => break output,
                Err(err) if err.is_retryable() && attempt < retry_budget => {
                    attempt += 1;
                    warn!(
                        "{}: {} failed (attempt {}/{}), retrying: {}",
                        self.setting(),
                        spec.kind,
                        attempt,
                        retry_budget + 1,
                        err
                    );
                }
                Err(err) => {
                    self.phase = RolePhase::Idle;
                    return Err(TurnFailure {
                        action: spec.kind,
                        error: err,
                    });
                }
            }
        };

        self.phase = RolePhase::Publishing;
        let recipients = match &spec.addressing {
            Addressing::Broadcast => Vec::new(),
            Addressing::Direct(ids) => ids.clone(),
        };
        let msg = Message::with_parts(
            output.content,
            output.payload,
            spec.kind,
            self.id.clone(),
            recipients,
        );
        self.memory.add(msg.clone());

        self.phase = RolePhase::Idle;
        Ok(msg)
    }
}

impl std::fmt::Debug for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Role")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("watches", &self.watches)
            .field("pending", &self.pending.len())
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

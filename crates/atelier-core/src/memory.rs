//! Append-only message memory, owned by a single role (or by the
//! environment for the global log). Insertion order equals delivery order.

use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::action::ActionKind;
use crate::message::Message;

/// Ordered, idempotent store of shared messages. No I/O happens here.
#[derive(Debug, Default)]
pub struct Memory {
    messages: Vec<Arc<Message>>,
    seen: HashSet<Uuid>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message unless one with the same identity is already stored.
    /// Duplicate delivery is a silent no-op. Returns whether the message
    /// was new.
    pub fn add(&mut self, msg: Arc<Message>) -> bool {
        if !self.seen.insert(msg.id) {
            return false;
        }
        self.messages.push(msg);
        true
    }

    /// All stored messages produced by one of the given action kinds, in
    /// storage order. Roles use this to build minimal per-action context
    /// instead of replaying full history.
    pub fn get_by_action(&self, kinds: &[ActionKind]) -> Vec<Arc<Message>> {
        self.messages
            .iter()
            .filter(|m| kinds.contains(&m.produced_by))
            .cloned()
            .collect()
    }

    /// The most recently appended message, if any.
    pub fn latest(&self) -> Option<Arc<Message>> {
        self.messages.last().cloned()
    }

    pub fn all(&self) -> &[Arc<Message>] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::RoleId;

    fn msg(kind: ActionKind, text: &str) -> Arc<Message> {
        Message::new(text, kind, RoleId::new("Tester"))
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut mem = Memory::new();
        let m = msg(ActionKind::Requirement, "build a calculator");

        assert!(mem.add(m.clone()));
        assert_eq!(mem.len(), 1);

        // Same identity again — length unchanged after the first add.
        assert!(!mem.add(m));
        assert_eq!(mem.len(), 1);
    }

    #[test]
    fn test_identical_text_distinct_identity() {
        let mut mem = Memory::new();
        // Two messages with the same content are still two messages —
        // identity, not content-equality, keys the dedupe.
        mem.add(msg(ActionKind::WriteCode, "same text"));
        mem.add(msg(ActionKind::WriteCode, "same text"));
        assert_eq!(mem.len(), 2);
    }

    #[test]
    fn test_get_by_action_preserves_order() {
        let mut mem = Memory::new();
        let a = msg(ActionKind::WritePrd, "prd v1");
        let b = msg(ActionKind::WriteDesign, "design");
        let c = msg(ActionKind::WritePrd, "prd v2");
        mem.add(a.clone());
        mem.add(b);
        mem.add(c.clone());

        let prds = mem.get_by_action(&[ActionKind::WritePrd]);
        assert_eq!(prds.len(), 2);
        assert_eq!(prds[0].id, a.id);
        assert_eq!(prds[1].id, c.id);
    }

    #[test]
    fn test_get_by_action_multiple_kinds() {
        let mut mem = Memory::new();
        mem.add(msg(ActionKind::WritePrd, "prd"));
        mem.add(msg(ActionKind::WriteDesign, "design"));
        mem.add(msg(ActionKind::WriteTasks, "tasks"));

        let ctx = mem.get_by_action(&[ActionKind::WriteDesign, ActionKind::WriteTasks]);
        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx[0].produced_by, ActionKind::WriteDesign);
        assert_eq!(ctx[1].produced_by, ActionKind::WriteTasks);
    }

    #[test]
    fn test_latest() {
        let mut mem = Memory::new();
        assert!(mem.latest().is_none());

        mem.add(msg(ActionKind::Requirement, "first"));
        let last = msg(ActionKind::WritePrd, "second");
        mem.add(last.clone());
        assert_eq!(mem.latest().unwrap().id, last.id);
    }
}

//! Persistence boundary — pass-through recording of published messages.
//! The core never depends on durability; a session without a recorder
//! behaves identically.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::message::Message;
use crate::schema::payload_to_markdown;

const LOG_FILENAME: &str = "messages.jsonl";

/// Hook the environment calls for every published message.
pub trait Recorder: Send + Sync {
    fn record(&self, msg: &Message) -> Result<()>;
}

/// Records a session to disk: every message appended to `messages.jsonl`,
/// and each structured payload rendered to `docs/<action>.md` so the
/// latest PRD/design/task list is always readable as a document.
pub struct SessionLog {
    dir: PathBuf,
    log_path: PathBuf,
}

impl SessionLog {
    pub fn create(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir.join("docs"))
            .with_context(|| format!("Failed to create session dir: {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            log_path: dir.join(LOG_FILENAME),
        })
    }

    /// Load the messages of a previously recorded session, in publish
    /// order. Re-ingesting them is safe: memories dedupe by identity.
    pub fn replay(dir: &Path) -> Result<Vec<Message>> {
        let path = dir.join(LOG_FILENAME);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read session log: {}", path.display()))?;

        let mut messages = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let msg: Message =
                serde_json::from_str(line).context("Failed to parse session log line")?;
            messages.push(msg);
        }
        info!("Replayed {} messages from {}", messages.len(), path.display());
        Ok(messages)
    }
}

impl Recorder for SessionLog {
    fn record(&self, msg: &Message) -> Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        let line = serde_json::to_string(msg)?;
        writeln!(file, "{}", line)?;

        if let Some(ref payload) = msg.payload {
            let doc_path = self.dir.join("docs").join(format!("{}.md", msg.produced_by));
            std::fs::write(&doc_path, payload_to_markdown(payload))?;
            info!("Saved {} document to {}", msg.produced_by, doc_path.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionKind;
    use crate::message::RoleId;
    use crate::schema::{FieldKind, OutputSchema};

    #[test]
    fn test_record_and_replay() {
        let tmp = tempfile::tempdir().unwrap();
        let log = SessionLog::create(tmp.path()).unwrap();

        let a = Message::new("requirement", ActionKind::Requirement, RoleId::new("Boss"));
        let b = Message::new("prd", ActionKind::WritePrd, RoleId::new("Product Manager"));
        log.record(&a).unwrap();
        log.record(&b).unwrap();

        let replayed = SessionLog::replay(tmp.path()).unwrap();
        assert_eq!(replayed.len(), 2);
        assert_eq!(replayed[0].id, a.id);
        assert_eq!(replayed[1].id, b.id);
    }

    #[test]
    fn test_payload_written_as_document() {
        let tmp = tempfile::tempdir().unwrap();
        let log = SessionLog::create(tmp.path()).unwrap();

        let schema = OutputSchema::new(&[("Task list", FieldKind::List)]);
        let payload = schema.parse("## Task list\n\n- src/main.rs\n").unwrap();
        let msg = Message::with_parts(
            "raw tasks",
            Some(payload),
            ActionKind::WriteTasks,
            RoleId::new("Project Manager"),
            Vec::new(),
        );
        log.record(&msg).unwrap();

        let doc = std::fs::read_to_string(tmp.path().join("docs/write_tasks.md")).unwrap();
        assert!(doc.contains("## Task list"));
        assert!(doc.contains("- src/main.rs"));
    }
}

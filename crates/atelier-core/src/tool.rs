//! Named external tool collaborators — subprocess side effects a handler
//! may perform synchronously during its turn. Tool failures have their own
//! taxonomy, distinct from action invocation failures: a broken tool is
//! not a transient generator hiccup and is never retried by the role.

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::info;

/// Command prefixes a tool refuses outright (checked after trimming).
const BLOCKED_PREFIXES: &[&str] = &[
    "sudo", "su ", "rm -rf /", "chmod", "chown", "kill", "pkill", "curl", "wget", "ssh",
    "mount", "umount", "dd ", "mkfs",
];

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("blocked: {0}")]
    Blocked(String),

    #[error("failed to spawn: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("exited with {status}: {stderr}")]
    Failed { status: i32, stderr: String },
}

#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// A synchronous collaborator a role may call while RUNNING. Implementations
/// are named (a shell, a scaffolder, a build runner) so a handler composes
/// exactly the side effects it declares — nothing happens implicitly.
pub trait ToolRunner: Send + Sync {
    fn run(&self, command: &str) -> Result<ToolOutput, ToolError>;
}

/// Runs shell commands confined to one working directory.
pub struct ShellTool {
    workdir: PathBuf,
}

impl ShellTool {
    pub fn new(workdir: &Path) -> Self {
        Self {
            workdir: workdir.to_path_buf(),
        }
    }
}

/// Check if a command is safe. Returns Some(reason) if not.
fn is_safe_command(command: &str) -> Option<String> {
    let stripped = command.trim();

    if stripped.is_empty() {
        return Some("empty command".into());
    }
    for prefix in BLOCKED_PREFIXES {
        if stripped.starts_with(prefix) {
            return Some(format!("'{}' commands are not allowed", prefix));
        }
    }
    // Everything stays under the workdir — no parent traversal.
    for token in stripped.split_whitespace() {
        let clean = token.trim_start_matches(|c: char| "><=|;&(".contains(c));
        if clean == ".." || clean.starts_with("../") || clean.contains("/..") {
            return Some("'..' path traversal is not allowed".into());
        }
    }
    None
}

impl ToolRunner for ShellTool {
    fn run(&self, command: &str) -> Result<ToolOutput, ToolError> {
        if let Some(reason) = is_safe_command(command) {
            return Err(ToolError::Blocked(reason));
        }

        info!("shell: {}", command.chars().take(80).collect::<String>());
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&self.workdir)
            .output()?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if output.status.success() {
            Ok(ToolOutput { stdout, stderr })
        } else {
            Err(ToolError::Failed {
                status: output.status.code().unwrap_or(-1),
                stderr,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_commands() {
        assert!(is_safe_command("sudo rm -rf /").is_some());
        assert!(is_safe_command("curl http://evil.com").is_some());
        assert!(is_safe_command("").is_some());
        assert!(is_safe_command("cat ../../../etc/passwd").is_some());
    }

    #[test]
    fn test_allowed_commands() {
        assert!(is_safe_command("ls").is_none());
        assert!(is_safe_command("echo hello > file.txt").is_none());
        assert!(is_safe_command("mkdir notes").is_none());
    }

    #[test]
    fn test_shell_runs_in_workdir() {
        let tmp = tempfile::tempdir().unwrap();
        let shell = ShellTool::new(tmp.path());

        shell.run("echo scaffolded > marker.txt").unwrap();
        let out = shell.run("cat marker.txt").unwrap();
        assert_eq!(out.stdout.trim(), "scaffolded");
    }

    #[test]
    fn test_failure_carries_status_and_stderr() {
        let tmp = tempfile::tempdir().unwrap();
        let shell = ShellTool::new(tmp.path());

        match shell.run("cat does_not_exist.txt") {
            Err(ToolError::Failed { status, stderr }) => {
                assert_ne!(status, 0);
                assert!(!stderr.is_empty());
            }
            other => panic!("expected failure, got {:?}", other.map(|o| o.stdout)),
        }
    }

    // A handler composing a tool: the side effect is an explicit, named
    // collaborator the role calls mid-turn, and its failure surfaces as a
    // permanent action error rather than being retried as transient.
    mod composed {
        use super::*;
        use crate::action::{ActionHandler, ActionKind, ActionOutput, ActionSpec};
        use crate::error::ActionError;
        use crate::message::Message;
        use crate::role::Role;
        use async_trait::async_trait;
        use std::sync::Arc;

        struct Scaffold {
            shell: ShellTool,
        }

        #[async_trait]
        impl ActionHandler for Scaffold {
            async fn invoke(
                &self,
                _ctx: &[Arc<Message>],
            ) -> Result<ActionOutput, ActionError> {
                let out = self
                    .shell
                    .run("mkdir -p src && echo 'fn main() {}' > src/main.rs && ls src")
                    .map_err(|e| ActionError::Aborted(e.to_string()))?;
                Ok(ActionOutput::text(out.stdout))
            }
        }

        #[tokio::test]
        async fn test_handler_calls_tool_during_turn() {
            let tmp = tempfile::tempdir().unwrap();
            let mut role = Role::new("Alex", "Engineer")
                .with_action(ActionSpec::new(
                    ActionKind::WriteCode,
                    vec![],
                    vec![],
                    Box::new(Scaffold {
                        shell: ShellTool::new(tmp.path()),
                    }),
                ))
                .as_entry_point();

            let msg = role.take_turn(0).await.unwrap();
            assert!(msg.content.contains("main.rs"));
            assert!(tmp.path().join("src/main.rs").is_file());
        }
    }
}

//! Environment — the shared delivery substrate and round scheduler. Owns
//! every role and the global message log; nothing here is ambient or
//! process-global.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::SessionError;
use crate::memory::Memory;
use crate::message::{Message, RoleId};
use crate::persist::Recorder;
use crate::role::Role;

/// Author identity for the bootstrap requirement.
const BOSS: &str = "Boss";

pub struct Environment {
    /// Slots, not bare roles: a role moves into its turn task and back.
    roles: Vec<Option<Role>>,
    history: Memory,
    config: Config,
    recorder: Option<Box<dyn Recorder>>,
}

impl Environment {
    pub fn new(config: Config) -> Self {
        Self {
            roles: Vec::new(),
            history: Memory::new(),
            config,
            recorder: None,
        }
    }

    pub fn with_recorder(mut self, recorder: Box<dyn Recorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn add_role(&mut self, role: Role) {
        info!("{} joins the session", role.setting());
        self.roles.push(Some(role));
    }

    pub fn add_roles(&mut self, roles: impl IntoIterator<Item = Role>) {
        for role in roles {
            self.add_role(role);
        }
    }

    /// The global log: every published message in publish order.
    pub fn history(&self) -> &Memory {
        &self.history
    }

    pub fn role(&self, id: &RoleId) -> Option<&Role> {
        self.roles
            .iter()
            .filter_map(|slot| slot.as_ref())
            .find(|r| &r.id == id)
    }

    pub fn role_ids(&self) -> Vec<RoleId> {
        self.roles
            .iter()
            .filter_map(|slot| slot.as_ref().map(|r| r.id.clone()))
            .collect()
    }

    /// Session bootstrap: inject the unsolicited top-level requirement.
    pub fn post_requirement(&mut self, text: impl Into<String>) {
        let msg = Message::new(
            text.into(),
            crate::action::ActionKind::Requirement,
            RoleId::new(BOSS),
        );
        self.publish(msg);
    }

    /// Append to the global log (the single total order of arrival), hand
    /// the message to the recorder, then deliver to every subscribed or
    /// explicitly addressed role.
    pub fn publish(&mut self, msg: Arc<Message>) {
        if !self.history.add(msg.clone()) {
            debug!("duplicate publish ignored: {}", msg.id);
            return;
        }

        if let Some(ref recorder) = self.recorder {
            // Persistence is a pass-through side effect; the session
            // continues if the disk does not cooperate.
            if let Err(e) = recorder.record(&msg) {
                error!("Failed to record message {}: {}", msg.id, e);
            }
        }

        let mut delivered = 0usize;
        for slot in &mut self.roles {
            // A slot can stay empty after a failed round's cancellation.
            let Some(role) = slot.as_mut() else { continue };
            let matches = if msg.is_broadcast() {
                role.subscribes_to(msg.produced_by)
            } else {
                msg.addressed_to(&role.id)
            };
            if matches {
                role.deliver(&msg);
                delivered += 1;
            }
        }

        // A broadcast nobody wants is legitimate, but worth seeing in logs.
        if delivered == 0 {
            info!("{} matched no subscribers", msg);
        } else {
            debug!("{} delivered to {} role(s)", msg, delivered);
        }
    }

    fn runnable_indices(&self) -> Vec<usize> {
        self.roles
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().filter(|r| r.is_runnable()).map(|_| i))
            .collect()
    }

    /// Drive rounds to a fixed point. Within a round every runnable role
    /// takes its turn concurrently; publication of the round's output is
    /// deferred until all turns finish, so a role never observes a
    /// sibling's same-round output. Returns the number of rounds executed.
    ///
    /// Fails fast: the first role to exhaust its retry budget cancels the
    /// round's remaining turns and aborts the session. Exceeding the round
    /// budget with roles still runnable reports a stall with the stalled
    /// role set.
    pub async fn run(&mut self) -> Result<u32, SessionError> {
        let mut rounds = 0u32;

        loop {
            let runnable = self.runnable_indices();
            if runnable.is_empty() {
                info!("session settled after {} round(s)", rounds);
                return Ok(rounds);
            }
            if rounds >= self.config.max_rounds {
                let mut roles: Vec<RoleId> = runnable
                    .iter()
                    .filter_map(|&i| self.roles[i].as_ref().map(|r| r.id.clone()))
                    .collect();
                roles.sort();
                warn!(
                    "round budget ({}) exhausted with {} role(s) still runnable",
                    self.config.max_rounds,
                    roles.len()
                );
                return Err(SessionError::Stalled { roles, rounds });
            }

            rounds += 1;
            debug!("round {}: {} runnable role(s)", rounds, runnable.len());

            let retry_budget = self.config.retry_budget;
            let mut turns = JoinSet::new();
            for idx in runnable {
                let mut role = self.roles[idx].take().expect("runnable role vanished");
                turns.spawn(async move {
                    let result = role.take_turn(retry_budget).await;
                    (idx, role, result)
                });
            }

            let mut produced: Vec<(usize, Arc<Message>)> = Vec::new();
            let mut failure: Option<SessionError> = None;

            while let Some(joined) = turns.join_next().await {
                match joined {
                    Ok((idx, role, result)) => {
                        match result {
                            Ok(msg) => produced.push((idx, msg)),
                            Err(turn) if failure.is_none() => {
                                error!(
                                    "{}: {} failed for good: {}",
                                    role.setting(),
                                    turn.action,
                                    turn.error
                                );
                                failure = Some(SessionError::RoleFailed {
                                    role: role.id.clone(),
                                    action: turn.action,
                                    source: turn.error,
                                });
                                // Downstream roles must not consume a
                                // half-written round.
                                turns.abort_all();
                            }
                            Err(_) => {}
                        }
                        self.roles[idx] = Some(role);
                    }
                    Err(err) if err.is_cancelled() => {}
                    Err(err) => std::panic::resume_unwind(err.into_panic()),
                }
            }

            if let Some(err) = failure {
                return Err(err);
            }

            // The serialization point: every turn of the round is done, now
            // the outputs enter the log in stable role order.
            produced.sort_by_key(|(idx, _)| *idx);
            for (_, msg) in produced {
                self.publish(msg);
            }
        }
    }
}

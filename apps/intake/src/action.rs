//! Per-action lifecycle: `Idle -> Pending -> {Succeeded, Failed}`, re-armed on the next run.
//!
//! Each user-triggered action on a view owns one machine. Machines never look at each
//! other, so a failure in one action cannot touch another action's message.

use std::fmt;
use std::future::Future;

use tracing::debug;

use crate::errors::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionPhase {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed,
}

impl fmt::Display for ActionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            ActionPhase::Idle => "idle",
            ActionPhase::Pending => "pending",
            ActionPhase::Succeeded => "succeeded",
            ActionPhase::Failed => "failed",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActionState {
    pub phase: ActionPhase,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ActionStateMachine {
    name: &'static str,
    state: ActionState,
}

impl ActionStateMachine {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: ActionState::default(),
        }
    }

    pub fn state(&self) -> &ActionState {
        &self.state
    }

    pub fn phase(&self) -> ActionPhase {
        self.state.phase
    }

    pub fn message(&self) -> &str {
        &self.state.message
    }

    /// Starts a cycle from any phase. Calling this while `Pending` simply restarts.
    pub fn begin(&mut self, message: impl Into<String>) {
        if self.state.phase == ActionPhase::Pending {
            debug!("{}: restarted while pending", self.name);
        }
        self.transition(ActionPhase::Pending, message.into());
    }

    pub fn succeed(&mut self, message: impl Into<String>) {
        self.transition(ActionPhase::Succeeded, message.into());
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.transition(ActionPhase::Failed, message.into());
    }

    /// Drives one full cycle around `work`. Errors end in `Failed` with the error's
    /// display message and are not returned; the value is handed back on success.
    pub async fn run<T, Fut>(
        &mut self,
        pending: impl Into<String>,
        work: Fut,
        describe: impl FnOnce(&T) -> String,
    ) -> Option<T>
    where
        Fut: Future<Output = Result<T, ClientError>>,
    {
        self.begin(pending);
        match work.await {
            Ok(value) => {
                self.succeed(describe(&value));
                Some(value)
            }
            Err(e) => {
                self.fail(e.user_message());
                None
            }
        }
    }

    fn transition(&mut self, phase: ActionPhase, message: String) {
        debug!("{}: {} -> {} ({message})", self.name, self.state.phase, phase);
        self.state = ActionState { phase, message };
    }
}

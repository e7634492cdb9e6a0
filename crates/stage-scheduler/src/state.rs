//! Scheduler state machine
//!
//! `Idle -> Loading(stage) -> StageComplete(stage) -> Loading(next) | Idle`,
//! with `Cancelled` as a terminal state.

use crate::{Result, SchedulerError};
use lod_shared::LodStage;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "state", content = "stage")]
pub enum SchedulerState {
    Idle,
    Loading(LodStage),
    StageComplete(LodStage),
    Cancelled,
}

impl SchedulerState {
    pub fn is_terminal(self) -> bool {
        self == SchedulerState::Cancelled
    }

    fn can_transition_to(self, to: SchedulerState) -> bool {
        use SchedulerState::*;

        match (self, to) {
            (Idle, Loading(_)) => true,
            (Loading(a), StageComplete(b)) => a == b,
            // a failed build ends the walk
            (Loading(_), Idle) => true,
            (StageComplete(done), Loading(next)) => next > done,
            (StageComplete(_), Idle) => true,
            (Idle | Loading(_) | StageComplete(_), Cancelled) => true,
            _ => false,
        }
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerState::Idle => write!(f, "Idle"),
            SchedulerState::Loading(stage) => write!(f, "Loading({stage})"),
            SchedulerState::StageComplete(stage) => write!(f, "StageComplete({stage})"),
            SchedulerState::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[derive(Debug)]
struct StateInner {
    current: SchedulerState,
    history: Vec<SchedulerState>,
}

/// Shared, validated view of one walk's state
#[derive(Debug, Clone)]
pub struct StateHandle {
    inner: Arc<RwLock<StateInner>>,
}

impl StateHandle {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(StateInner {
                current: SchedulerState::Idle,
                history: vec![SchedulerState::Idle],
            })),
        }
    }

    pub fn get(&self) -> SchedulerState {
        self.inner.read().current
    }

    /// Every state entered so far, starting with `Idle`
    pub fn history(&self) -> Vec<SchedulerState> {
        self.inner.read().history.clone()
    }

    pub fn transition_to(&self, to: SchedulerState) -> Result<()> {
        let mut inner = self.inner.write();
        let from = inner.current;
        if !from.can_transition_to(to) {
            return Err(SchedulerError::InvalidTransition { from, to });
        }
        inner.current = to;
        inner.history.push(to);
        log::debug!("Scheduler state {} -> {}", from, to);
        Ok(())
    }
}

impl Default for StateHandle {
    fn default() -> Self {
        Self::new()
    }
}

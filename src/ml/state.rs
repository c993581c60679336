//! Per-cohort training state machine.
//!
//! `Untrained → Training → Trained | FailedTraining`. Both outcomes are
//! terminal for the process lifetime.

use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Training lifecycle of one cohort
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TrainingState {
    /// Nothing attempted yet
    Untrained,
    /// Training in progress
    Training,
    /// Artifacts published and ready for inference
    Trained,
    /// Training failed; the cohort stays unavailable
    FailedTraining { reason: String },
}

impl TrainingState {
    /// Numeric value for the readiness gauge
    pub fn to_metric_value(&self) -> f64 {
        match self {
            TrainingState::Trained => 1.0,
            _ => 0.0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TrainingState::Trained | TrainingState::FailedTraining { .. }
        )
    }

    /// Whether `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: &TrainingState) -> bool {
        matches!(
            (self, next),
            (TrainingState::Untrained, TrainingState::Training)
                | (TrainingState::Training, TrainingState::Trained)
                | (TrainingState::Training, TrainingState::FailedTraining { .. })
        )
    }
}

impl fmt::Display for TrainingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainingState::Untrained => write!(f, "untrained"),
            TrainingState::Training => write!(f, "training"),
            TrainingState::Trained => write!(f, "trained"),
            TrainingState::FailedTraining { reason } => write!(f, "failed: {}", reason),
        }
    }
}

/// A recorded state change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    /// Previous state
    pub from: TrainingState,
    /// New state
    pub to: TrainingState,
    /// When the transition occurred
    pub timestamp: DateTime<Utc>,
}

/// Current state plus the time of the last change
#[derive(Debug, Clone)]
pub struct StateData {
    pub state: TrainingState,
    pub last_state_change: DateTime<Utc>,
}

impl StateData {
    pub fn new() -> Self {
        Self {
            state: TrainingState::Untrained,
            last_state_change: Utc::now(),
        }
    }

    /// Move to `next`, rejecting any transition outside the lifecycle
    pub fn transition_to(&mut self, next: TrainingState) -> Result<StateTransition> {
        if !self.state.can_transition_to(&next) {
            return Err(AppError::InvalidStateTransition(format!(
                "cannot move from {} to {}",
                self.state, next
            )));
        }

        let transition = StateTransition {
            from: std::mem::replace(&mut self.state, next.clone()),
            to: next,
            timestamp: Utc::now(),
        };
        self.last_state_change = transition.timestamp;

        Ok(transition)
    }
}

impl Default for StateData {
    fn default() -> Self {
        Self::new()
    }
}

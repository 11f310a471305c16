//! Post-level evaluation and the advance/retest decision.
//!
//! [`WorkflowGate`] makes exactly one `level-evaluate` call per completed
//! level and maps the answer onto a navigation decision. Its failure
//! policy is part of the contract, not an accident of error handling:
//! the backend can send the child back (RETEST), but it can never stall
//! the session — a transport failure or an unrecognized status counts as
//! a pass and the session moves on.

use std::sync::Arc;

use crate::api::{Backend, EvalStatus, LevelEvaluateRequest};
use crate::assess::level::{LevelId, LevelSubmission};

// ---------------------------------------------------------------------------
// GateDecision
// ---------------------------------------------------------------------------

/// What happens after a level is evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Move on to the next level in fixed order.
    Advance,
    /// Discard the level's progress and restart it from the first item.
    Retest {
        /// Service-provided explanation to show the user, if any.
        message: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// WorkflowGate
// ---------------------------------------------------------------------------

/// Decides whether a completed level advances or restarts.
pub struct WorkflowGate {
    backend: Arc<dyn Backend>,
    user_id: Option<String>,
}

impl WorkflowGate {
    /// `user_id` overrides the session id in evaluate requests when a
    /// caller account is configured.
    pub fn new(backend: Arc<dyn Backend>, user_id: Option<String>) -> Self {
        Self { backend, user_id }
    }

    /// Evaluate one completed level. One network attempt, no retries.
    pub async fn evaluate(
        &self,
        session_id: &str,
        level: LevelId,
        submission: &LevelSubmission,
    ) -> GateDecision {
        let request = LevelEvaluateRequest {
            user_id: Some(
                self.user_id
                    .clone()
                    .unwrap_or_else(|| session_id.to_string()),
            ),
            level: level.number(),
            target_text: submission.target_text.clone(),
            transcribed_text: submission.transcribed_text.clone(),
            word_timestamps: submission.word_timestamps.clone(),
        };

        match self.backend.evaluate_level(&request).await {
            Ok(response) if response.status == EvalStatus::Retest => {
                log::info!("{level}: service requested a retest");
                GateDecision::Retest {
                    message: response.message,
                }
            }
            Ok(response) => {
                log::debug!("{level}: evaluation status {:?} → advancing", response.status);
                GateDecision::Advance
            }
            Err(e) => {
                // Fail-open by contract: the session keeps moving when
                // the evaluation service is unreachable.
                log::warn!("{level}: evaluation unavailable ({e}); assuming pass");
                GateDecision::Advance
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

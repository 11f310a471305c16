//! Final session submission.
//!
//! [`ReportTrigger`] sends every level's result to the full-evaluation
//! capability and hands the structured report onward. Unlike the
//! per-level gate this is fail-closed: the composite report is the
//! product's output, so a failure here is surfaced to the user instead
//! of being papered over with a synthesized report.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::api::{ApiError, Backend, FullEvaluateRequest, LevelPayload};
use crate::assess::session::Session;

// ---------------------------------------------------------------------------
// ReportError
// ---------------------------------------------------------------------------

/// Terminal failures of the final report step.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Submission attempted before all four levels had results.
    #[error("cannot request a report before all levels are complete")]
    Incomplete,

    /// The report service failed; no report exists.
    #[error("report service failed: {0}")]
    Service(#[from] ApiError),
}

// ---------------------------------------------------------------------------
// ReportTrigger
// ---------------------------------------------------------------------------

/// Submits the finished session for its composite report.
pub struct ReportTrigger {
    backend: Arc<dyn Backend>,
    user_id: Option<String>,
}

impl ReportTrigger {
    pub fn new(backend: Arc<dyn Backend>, user_id: Option<String>) -> Self {
        Self { backend, user_id }
    }

    /// Submit all level results and return the report as opaque JSON.
    ///
    /// # Errors
    ///
    /// [`ReportError::Incomplete`] before level 4 has been saved;
    /// [`ReportError::Service`] when the call fails — propagated, never
    /// absorbed.
    pub async fn submit(&self, session: &Session) -> Result<serde_json::Value, ReportError> {
        if !session.has_all_levels() {
            return Err(ReportError::Incomplete);
        }

        let levels: BTreeMap<u8, LevelPayload> = session
            .level_results()
            .iter()
            .map(|(level, result)| {
                (
                    level.number(),
                    LevelPayload {
                        target_text: result.target_text.clone(),
                        transcribed_text: result.transcribed_text.clone(),
                        accuracy: result.accuracy,
                    },
                )
            })
            .collect();

        let request = FullEvaluateRequest {
            user_id: Some(
                self.user_id
                    .clone()
                    .unwrap_or_else(|| session.id().to_string()),
            ),
            levels,
        };

        log::info!("submitting session for the composite report");
        Ok(self.backend.evaluate_full(&request).await?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

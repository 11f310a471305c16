//! The session driver — levels 1→4, then the composite report.
//!
//! [`ScreeningApp`] owns the wiring: it fetches each level's content,
//! walks the items, applies the pass threshold, asks the workflow gate,
//! stores the result, and finally triggers the report. Spoken attempts
//! come through the [`AttemptSource`] seam so the whole loop runs under
//! test with canned outcomes, while the binary plugs in the interactive
//! microphone source.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::api::Backend;
use crate::assess::{
    fetch_level_content, GateDecision, LevelController, LevelId, LevelResult, Session,
    ReportTrigger, WorkflowGate,
};
use crate::cli::{display, input};
use crate::config::AppConfig;
use crate::pipeline::{ItemOutcome, ItemRecorder, ItemRunner};

// ---------------------------------------------------------------------------
// AttemptSource
// ---------------------------------------------------------------------------

/// Produces one [`ItemOutcome`] per spoken attempt.
///
/// Implementations own their re-attempt UX: an error from
/// [`attempt`](Self::attempt) means the item could not be completed at
/// all, which aborts the session (no item may be skipped).
#[async_trait(?Send)]
pub trait AttemptSource {
    async fn attempt(
        &mut self,
        index: usize,
        count: usize,
        target: &str,
    ) -> Result<ItemOutcome>;
}

// ---------------------------------------------------------------------------
// MicAttempts — the interactive source
// ---------------------------------------------------------------------------

/// Records through the microphone, Enter to start and stop, and offers a
/// user-initiated retry of the same item after any failure. Retries are
/// never automatic.
pub struct MicAttempts {
    runner: ItemRunner,
    max_take_secs: f32,
}

impl MicAttempts {
    pub fn new(backend: Arc<dyn Backend>, max_take_secs: f32) -> Self {
        Self {
            runner: ItemRunner::new(backend),
            max_take_secs,
        }
    }

    async fn one_take(&self, target: &str) -> Result<ItemOutcome> {
        let mut recorder = ItemRecorder::new(self.max_take_secs);

        input::wait_for_enter("  Press Enter to start recording… ").await?;
        recorder.start()?;
        input::wait_for_enter("  Recording — press Enter when finished ").await?;

        let wav = recorder.stop()?;
        let outcome = self.runner.run_take(&mut recorder, wav, target).await?;
        Ok(outcome)
    }
}

#[async_trait(?Send)]
impl AttemptSource for MicAttempts {
    async fn attempt(
        &mut self,
        index: usize,
        count: usize,
        target: &str,
    ) -> Result<ItemOutcome> {
        loop {
            display::item_prompt(index, count, target);
            match self.one_take(target).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) => {
                    display::show_item_error(&e);
                    if !input::confirm("  Try this one again?").await? {
                        return Err(e);
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ScreeningApp
// ---------------------------------------------------------------------------

/// Runs one full screening session.
pub struct ScreeningApp {
    backend: Arc<dyn Backend>,
    config: AppConfig,
    session: Session,
}

impl ScreeningApp {
    pub fn new(backend: Arc<dyn Backend>, config: AppConfig, session: Session) -> Self {
        Self {
            backend,
            config,
            session,
        }
    }

    /// Walk all four levels in fixed order, then submit for the report.
    ///
    /// Per-level evaluation failures never abort the run (the gate is
    /// fail-open); a report failure does — it is the only terminal
    /// user-visible error of a completed session.
    pub async fn run(&mut self, attempts: &mut dyn AttemptSource) -> Result<serde_json::Value> {
        display::banner();

        let mut level = Some(LevelId::Reading);
        while let Some(current) = level {
            self.run_level(current, attempts).await?;
            level = current.next();
        }

        let trigger = ReportTrigger::new(
            Arc::clone(&self.backend),
            self.config.backend.user_id.clone(),
        );
        let report = trigger.submit(&self.session).await?;
        display::show_report(&report);
        Ok(report)
    }

    /// Run one level to a stored result, restarting on RETEST or a
    /// missed threshold. Content is fetched fresh for every (re)start.
    async fn run_level(&mut self, level: LevelId, attempts: &mut dyn AttemptSource) -> Result<()> {
        let gate = WorkflowGate::new(
            Arc::clone(&self.backend),
            self.config.backend.user_id.clone(),
        );

        loop {
            let content =
                fetch_level_content(self.backend.as_ref(), level, &self.config.screening).await?;
            let mut ctrl = LevelController::new(level, content.items)?;

            display::level_intro(level, ctrl.item_count());
            if let Some(grid) = &content.grid {
                display::show_grid(grid);
            }

            while !ctrl.is_completed() {
                let token = ctrl.attempt();
                let outcome = attempts
                    .attempt(ctrl.current_index(), ctrl.item_count(), ctrl.current_target())
                    .await?;
                display::show_outcome(&outcome);
                ctrl.on_item_result(token, outcome);
                ctrl.advance();
            }

            if !ctrl.meets_threshold() {
                display::show_threshold_retry(ctrl.average_accuracy());
                continue;
            }

            let submission = ctrl.submission();
            match gate.evaluate(self.session.id(), level, &submission).await {
                GateDecision::Retest { message } => {
                    display::show_retest(message.as_deref());
                    continue;
                }
                GateDecision::Advance => {
                    let accuracy = ctrl.average_accuracy();
                    self.session.save_level_data(
                        level,
                        LevelResult {
                            target_text: submission.target_text,
                            transcribed_text: submission.transcribed_text,
                            accuracy,
                        },
                    );
                    display::show_level_saved(level, accuracy);
                    return Ok(());
                }
            }
        }
    }

    /// The aggregated session (primarily for inspection in tests).
    pub fn session(&self) -> &Session {
        &self.session
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockBackend;
    use crate::score::ItemScore;

    /// Scripted attempt source: hands out pre-built outcomes in order.
    struct Scripted {
        outcomes: std::collections::VecDeque<ItemOutcome>,
        served: usize,
    }

    impl Scripted {
        fn new(outcomes: Vec<ItemOutcome>) -> Self {
            Self {
                outcomes: outcomes.into(),
                served: 0,
            }
        }
    }

    #[async_trait(?Send)]
    impl AttemptSource for Scripted {
        async fn attempt(
            &mut self,
            _index: usize,
            _count: usize,
            target: &str,
        ) -> Result<ItemOutcome> {
            self.served += 1;
            match self.outcomes.pop_front() {
                Some(outcome) => Ok(outcome),
                // Past the script: echo the target back perfectly.
                None => Ok(perfect(target)),
            }
        }
    }

    fn perfect(target: &str) -> ItemOutcome {
        ItemOutcome {
            target_text: target.to_lowercase(),
            transcribed_text: target.to_lowercase(),
            word_timestamps: vec![],
            verdicts: vec![],
            score: ItemScore {
                accuracy_percent: 100,
                error_count: 0,
            },
        }
    }

    fn poor(target: &str) -> ItemOutcome {
        ItemOutcome {
            target_text: target.to_lowercase(),
            transcribed_text: "mumble".into(),
            word_timestamps: vec![],
            verdicts: vec![],
            score: ItemScore {
                accuracy_percent: 10,
                error_count: 3,
            },
        }
    }

    fn app(backend: MockBackend) -> ScreeningApp {
        ScreeningApp::new(
            Arc::new(backend),
            AppConfig::default(),
            Session::with_id("sess-test"),
        )
    }

    #[tokio::test]
    async fn full_session_stores_all_levels_and_returns_the_report() {
        let mut app = app(MockBackend::default());
        let mut attempts = Scripted::new(vec![]);

        let report = app.run(&mut attempts).await.unwrap();
        assert_eq!(report["final_result"], "NORMAL");

        assert!(app.session().has_all_levels());
        for level in LevelId::ALL {
            assert_eq!(app.session().level_result(level).unwrap().accuracy, 100);
        }
        // 3 sentences + 3 rhyme pairs + 1 grid + 2 nonsense words
        assert_eq!(attempts.served, 9);
    }

    #[tokio::test]
    async fn nonsense_level_submits_concatenated_texts() {
        let mut backend = MockBackend::default();
        backend.nonsense = "zog pleet".into();
        let mut app = app(backend);

        // Perfect everywhere except: "pleet" is read as "plate".
        struct ScriptedByTarget;

        #[async_trait(?Send)]
        impl AttemptSource for ScriptedByTarget {
            async fn attempt(
                &mut self,
                _index: usize,
                _count: usize,
                target: &str,
            ) -> Result<ItemOutcome> {
                let mut outcome = perfect(target);
                if target == "pleet" {
                    outcome.transcribed_text = "plate".into();
                    outcome.score = ItemScore {
                        accuracy_percent: 0,
                        error_count: 1,
                    };
                }
                Ok(outcome)
            }
        }

        let mut attempts = ScriptedByTarget;
        let _ = app.run(&mut attempts).await.unwrap();

        let stored = app.session().level_result(LevelId::NonsenseWords).unwrap();
        assert_eq!(stored.target_text, "zog pleet");
        assert_eq!(stored.transcribed_text, "zog plate");
        assert_eq!(stored.accuracy, 50);
    }

    #[tokio::test]
    async fn retest_restarts_the_level_from_the_first_item() {
        let backend = MockBackend::default();
        // The first evaluation (reading) answers RETEST, then PASS.
        backend
            .retest_first
            .store(1, std::sync::atomic::Ordering::SeqCst);
        let backend = Arc::new(backend);

        let mut app = ScreeningApp::new(
            Arc::clone(&backend) as Arc<dyn Backend>,
            AppConfig::default(),
            Session::with_id("sess-test"),
        );
        let mut attempts = Scripted::new(vec![]);

        let _ = app.run(&mut attempts).await.unwrap();

        // Reading was evaluated twice (retest + pass), the rest once.
        assert_eq!(backend.level_requests.lock().unwrap().len(), 5);
        // Reading's 3 items were attempted twice: 9 + 3 extra.
        assert_eq!(attempts.served, 12);
        assert!(app.session().has_all_levels());
    }

    #[tokio::test]
    async fn below_threshold_reading_restarts_before_any_evaluation() {
        let backend = Arc::new(MockBackend::default());
        let mut app = ScreeningApp::new(
            Arc::clone(&backend) as Arc<dyn Backend>,
            AppConfig::default(),
            Session::with_id("sess-test"),
        );

        // First pass over the 3 reading sentences scores 10% each —
        // below the 40 gate — then everything succeeds.
        let mut attempts = Scripted::new(vec![poor("a"), poor("b"), poor("c")]);

        let _ = app.run(&mut attempts).await.unwrap();

        // The failed reading pass must not have been evaluated: still
        // exactly one evaluation per level.
        assert_eq!(backend.level_requests.lock().unwrap().len(), 4);
        // 3 poor + 3 retry + 6 remaining-level attempts
        assert_eq!(attempts.served, 12);
        assert_eq!(
            app.session().level_result(LevelId::Reading).unwrap().accuracy,
            100
        );
    }

    /// Fail-open end to end: a dead evaluation service still completes
    /// the whole session.
    #[tokio::test]
    async fn evaluation_outage_does_not_stall_the_session() {
        let mut backend = MockBackend::default();
        backend.fail_evaluate = true;
        let mut app = app(backend);
        let mut attempts = Scripted::new(vec![]);

        let report = app.run(&mut attempts).await.unwrap();
        assert_eq!(report["final_result"], "NORMAL");
        assert!(app.session().has_all_levels());
    }

    /// Fail-closed end to end: a dead report service is a terminal
    /// error, not a synthesized report.
    #[tokio::test]
    async fn report_outage_is_a_terminal_error() {
        let mut backend = MockBackend::default();
        backend.fail_report = true;
        let mut app = app(backend);
        let mut attempts = Scripted::new(vec![]);

        let err = app.run(&mut attempts).await.unwrap_err();
        assert!(err.to_string().contains("report service"));
        // The levels themselves still completed and were stored.
        assert!(app.session().has_all_levels());
    }
}

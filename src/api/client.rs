//! The `Backend` trait and its HTTP implementation.
//!
//! Every remote capability the engine consumes — content generation,
//! transcription, comparison, evaluation — sits behind [`Backend`] so the
//! orchestration layers can be tested without a running service. The
//! production implementation is [`HttpBackend`]; all connection details
//! come from [`BackendConfig`], nothing is hardcoded.

use async_trait::async_trait;
use thiserror::Error;

use crate::api::types::{
    CompareRequest, CompareResponse, FullEvaluateRequest, LevelEvaluateRequest,
    LevelEvaluateResponse, NonsenseResponse, RanResponse, RhymesResponse, StoryResponse,
    TranscriptionResponse,
};
use crate::config::BackendConfig;

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// Errors from any backend capability.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport or connection error.
    #[error("request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The service answered with a non-success status code.
    #[error("service returned HTTP {0}")]
    Status(u16),

    /// The response body could not be parsed as the expected JSON.
    #[error("failed to parse response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_decode() {
            ApiError::Parse(e.to_string())
        } else {
            ApiError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Backend trait
// ---------------------------------------------------------------------------

/// Async interface to the analysis service.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn Backend>` across the recorder pipeline, the workflow gate,
/// and the report trigger.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Fetch the reading-level story paragraph.
    async fn fetch_story(&self, difficulty: &str, age: u8) -> Result<StoryResponse, ApiError>;

    /// Fetch rhyming pair strings for the rhyme level.
    async fn fetch_rhymes(&self, level: &str) -> Result<RhymesResponse, ApiError>;

    /// Fetch the rapid-naming color grid.
    async fn fetch_ran(&self) -> Result<RanResponse, ApiError>;

    /// Fetch the nonsense-word list.
    async fn fetch_nonsense(&self) -> Result<NonsenseResponse, ApiError>;

    /// Upload one finished take (WAV bytes) for transcription.
    async fn transcribe(
        &self,
        wav: Vec<u8>,
        target_text: &str,
    ) -> Result<TranscriptionResponse, ApiError>;

    /// Ask for the word-by-word verdict list. Inputs must be normalized.
    async fn compare(&self, req: &CompareRequest) -> Result<CompareResponse, ApiError>;

    /// Submit a completed level for the pass/retest verdict.
    async fn evaluate_level(
        &self,
        req: &LevelEvaluateRequest,
    ) -> Result<LevelEvaluateResponse, ApiError>;

    /// Submit the whole session for the composite report.
    async fn evaluate_full(&self, req: &FullEvaluateRequest)
        -> Result<serde_json::Value, ApiError>;
}

// ---------------------------------------------------------------------------
// HttpBackend
// ---------------------------------------------------------------------------

/// Production [`Backend`] speaking HTTP/JSON via `reqwest`.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Build an `HttpBackend` from application config.
    ///
    /// The client carries the per-request timeout from
    /// `config.timeout_secs`; a default client is the last-resort
    /// fallback if the builder fails.
    pub fn from_config(config: &BackendConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let response = self
            .client
            .get(self.url(path))
            .query(query)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn post_json<B: serde::Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn fetch_story(&self, difficulty: &str, age: u8) -> Result<StoryResponse, ApiError> {
        self.get_json(
            "/dyslexia/story",
            &[
                ("difficulty", difficulty.to_string()),
                ("age", age.to_string()),
            ],
        )
        .await
    }

    async fn fetch_rhymes(&self, level: &str) -> Result<RhymesResponse, ApiError> {
        self.get_json("/dyslexia/rhymes", &[("level", level.to_string())])
            .await
    }

    async fn fetch_ran(&self) -> Result<RanResponse, ApiError> {
        self.get_json("/dyslexia/ran", &[]).await
    }

    async fn fetch_nonsense(&self) -> Result<NonsenseResponse, ApiError> {
        self.get_json("/dyslexia/nonsense", &[]).await
    }

    async fn transcribe(
        &self,
        wav: Vec<u8>,
        target_text: &str,
    ) -> Result<TranscriptionResponse, ApiError> {
        let part = reqwest::multipart::Part::bytes(wav)
            .file_name("take.wav")
            .mime_str("audio/wav")
            .map_err(|e| ApiError::Request(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .part("audio_file", part)
            .text("target_text", target_text.to_string());

        let response = self
            .client
            .post(self.url("/analyze-audio"))
            .multipart(form)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn compare(&self, req: &CompareRequest) -> Result<CompareResponse, ApiError> {
        self.post_json("/dyslexia/compare", req).await
    }

    async fn evaluate_level(
        &self,
        req: &LevelEvaluateRequest,
    ) -> Result<LevelEvaluateResponse, ApiError> {
        self.post_json("/dyslexia/level-evaluate", req).await
    }

    async fn evaluate_full(
        &self,
        req: &FullEvaluateRequest,
    ) -> Result<serde_json::Value, ApiError> {
        self.post_json("/dyslexia/full-evaluate", req).await
    }
}

// ---------------------------------------------------------------------------
// MockBackend  (test-only)
// ---------------------------------------------------------------------------

/// A test double serving canned content and naive positional comparison.
///
/// `compare` matches target and transcript word-by-word (equal ⇒ correct,
/// different ⇒ error) unless `verdicts` is set, which overrides the next
/// response wholesale. Every request is recorded so tests can assert what
/// actually went over the wire.
#[cfg(test)]
pub struct MockBackend {
    pub story: String,
    pub rhymes: Vec<String>,
    pub grid: Vec<Vec<String>>,
    pub ran_target: String,
    pub nonsense: String,
    pub transcript: String,
    pub timestamps: Vec<crate::api::WordTimestamp>,
    pub verdicts: Option<Vec<crate::api::WordVerdict>>,
    pub eval_status: crate::api::EvalStatus,
    pub eval_message: Option<String>,
    /// Answer RETEST for this many initial evaluate calls, then fall
    /// back to `eval_status`.
    pub retest_first: std::sync::atomic::AtomicUsize,
    pub report: serde_json::Value,
    pub fail_transcribe: bool,
    pub fail_compare: bool,
    pub fail_evaluate: bool,
    pub fail_report: bool,
    pub compare_requests: std::sync::Mutex<Vec<CompareRequest>>,
    pub level_requests: std::sync::Mutex<Vec<LevelEvaluateRequest>>,
    pub full_requests: std::sync::Mutex<Vec<FullEvaluateRequest>>,
}

#[cfg(test)]
impl Default for MockBackend {
    fn default() -> Self {
        Self {
            story: "The cat sat. The dog ran. The sun set.".into(),
            rhymes: vec!["cat hat".into(), "sun run".into(), "blue shoe".into()],
            grid: vec![vec!["red".into(), "blue".into()]],
            ran_target: "red blue".into(),
            nonsense: "zog pleet".into(),
            transcript: String::new(),
            timestamps: Vec::new(),
            verdicts: None,
            eval_status: crate::api::EvalStatus::Pass,
            eval_message: None,
            retest_first: std::sync::atomic::AtomicUsize::new(0),
            report: serde_json::json!({"final_result": "NORMAL"}),
            fail_transcribe: false,
            fail_compare: false,
            fail_evaluate: false,
            fail_report: false,
            compare_requests: std::sync::Mutex::new(Vec::new()),
            level_requests: std::sync::Mutex::new(Vec::new()),
            full_requests: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[cfg(test)]
impl MockBackend {
    pub fn with_transcript(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
#[async_trait]
impl Backend for MockBackend {
    async fn fetch_story(&self, _difficulty: &str, _age: u8) -> Result<StoryResponse, ApiError> {
        Ok(StoryResponse {
            story: self.story.clone(),
        })
    }

    async fn fetch_rhymes(&self, _level: &str) -> Result<RhymesResponse, ApiError> {
        Ok(RhymesResponse {
            rhymes: self.rhymes.clone(),
        })
    }

    async fn fetch_ran(&self) -> Result<RanResponse, ApiError> {
        Ok(RanResponse {
            grid: self.grid.clone(),
            target_text: self.ran_target.clone(),
        })
    }

    async fn fetch_nonsense(&self) -> Result<NonsenseResponse, ApiError> {
        Ok(NonsenseResponse {
            words: self.nonsense.clone(),
        })
    }

    async fn transcribe(
        &self,
        _wav: Vec<u8>,
        _target_text: &str,
    ) -> Result<TranscriptionResponse, ApiError> {
        if self.fail_transcribe {
            return Err(ApiError::Request("connection refused".into()));
        }
        Ok(TranscriptionResponse {
            transcribed_text: self.transcript.clone(),
            word_timestamps: self.timestamps.clone(),
        })
    }

    async fn compare(&self, req: &CompareRequest) -> Result<CompareResponse, ApiError> {
        self.compare_requests.lock().unwrap().push(req.clone());
        if self.fail_compare {
            return Err(ApiError::Timeout);
        }
        if let Some(verdicts) = &self.verdicts {
            return Ok(CompareResponse {
                word_status: verdicts.clone(),
            });
        }

        use crate::api::{WordLabel, WordVerdict};
        let targets: Vec<&str> = req.target_text.split_whitespace().collect();
        let spokens: Vec<&str> = req.transcribed_text.split_whitespace().collect();
        let word_status = targets
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let spoken = spokens.get(i).copied();
                WordVerdict {
                    target_word: Some(t.to_string()),
                    spoken_word: spoken.map(|s| s.to_string()),
                    label: if spoken == Some(*t) {
                        WordLabel::Correct
                    } else {
                        WordLabel::Error
                    },
                }
            })
            .collect();
        Ok(CompareResponse { word_status })
    }

    async fn evaluate_level(
        &self,
        req: &LevelEvaluateRequest,
    ) -> Result<LevelEvaluateResponse, ApiError> {
        self.level_requests.lock().unwrap().push(req.clone());
        if self.fail_evaluate {
            return Err(ApiError::Request("service unavailable".into()));
        }

        use std::sync::atomic::Ordering;
        let retest = self
            .retest_first
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();

        Ok(LevelEvaluateResponse {
            status: if retest {
                crate::api::EvalStatus::Retest
            } else {
                self.eval_status
            },
            next_level: None,
            message: self.eval_message.clone(),
        })
    }

    async fn evaluate_full(
        &self,
        req: &FullEvaluateRequest,
    ) -> Result<serde_json::Value, ApiError> {
        self.full_requests.lock().unwrap().push(req.clone());
        if self.fail_report {
            return Err(ApiError::Timeout);
        }
        Ok(self.report.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config() -> BackendConfig {
        BackendConfig {
            base_url: "http://localhost:8000".into(),
            timeout_secs: 30,
            user_id: None,
        }
    }

    #[test]
    fn from_config_builds_without_panic() {
        let _backend = HttpBackend::from_config(&make_config());
    }

    #[test]
    fn trailing_slash_in_base_url_is_stripped() {
        let mut config = make_config();
        config.base_url = "http://localhost:8000/".into();
        let backend = HttpBackend::from_config(&config);
        assert_eq!(
            backend.url("/dyslexia/story"),
            "http://localhost:8000/dyslexia/story"
        );
    }

    /// Verify the trait is object-safe (usable as `Arc<dyn Backend>`).
    #[test]
    fn backend_is_object_safe() {
        let backend: Box<dyn Backend> = Box::new(HttpBackend::from_config(&make_config()));
        drop(backend);
    }

    #[tokio::test]
    async fn mock_compare_is_positional() {
        use crate::api::WordLabel;

        let backend = MockBackend::default();
        let resp = backend
            .compare(&CompareRequest {
                target_text: "the cat sat".into(),
                transcribed_text: "the cat sad".into(),
                word_timestamps: vec![],
            })
            .await
            .unwrap();

        let labels: Vec<WordLabel> = resp.word_status.iter().map(|v| v.label).collect();
        assert_eq!(
            labels,
            vec![WordLabel::Correct, WordLabel::Correct, WordLabel::Error]
        );
    }

    #[tokio::test]
    async fn mock_records_requests() {
        let backend = MockBackend::default();
        let _ = backend
            .compare(&CompareRequest {
                target_text: "a".into(),
                transcribed_text: "a".into(),
                word_timestamps: vec![],
            })
            .await;
        assert_eq!(backend.compare_requests.lock().unwrap().len(), 1);
    }
}

//! The lookup pipeline: dictionary first, language model on a definite miss.
//!
//! ```text
//! START ─► DICTIONARY_ATTEMPT ─┬─► DICTIONARY_HIT
//!                              └─► DICTIONARY_MISS ─► MODEL_ATTEMPT ─┬─► MODEL_HIT
//!                                                                    ├─► MODEL_RAW_FALLBACK
//!                                                                    ├─► MODEL_UNAVAILABLE
//!                                                                    └─► MODEL_ERROR
//! ```
//!
//! Every terminal state is a [`LookupOutcome`] variant. The only hard failures
//! are an empty query and model output that contains a JSON span which does
//! not parse.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::dictionary::Word;
use crate::extract::{extract_json, Extraction};
use crate::model::{build_request, ModelError, ModelRequest, ModelSettings};
use crate::normalize::normalize;
use crate::result::{LookupResult, RawFallbackResult};
use crate::DictionaryError;

pub const MODEL_UNAVAILABLE_MESSAGE: &str = "model API key is not configured";
const ERROR_DETAIL_LIMIT: usize = 200;

static SINGLE_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z'-]+$").unwrap());

/// Primary source, queried for one term.
#[async_trait]
pub trait DictionarySource: Send + Sync {
    async fn fetch_entry(&self, word: &str) -> Result<Word, DictionaryError>;
}

/// Fallback source. Returns the model's text answer.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    fn settings(&self) -> &ModelSettings;
    async fn complete(&self, request: &ModelRequest) -> Result<String, ModelError>;
}

#[async_trait]
impl<T: DictionarySource + ?Sized> DictionarySource for Arc<T> {
    async fn fetch_entry(&self, word: &str) -> Result<Word, DictionaryError> {
        (**self).fetch_entry(word).await
    }
}

#[async_trait]
impl<T: ModelBackend + ?Sized> ModelBackend for Arc<T> {
    fn settings(&self) -> &ModelSettings {
        (**self).settings()
    }

    async fn complete(&self, request: &ModelRequest) -> Result<String, ModelError> {
        (**self).complete(request).await
    }
}

#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// Only send queries made of letters, hyphens and apostrophes to the
    /// dictionary; phrases go straight to the model.
    pub single_words_only: bool,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            single_words_only: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    DictionaryHit(LookupResult),
    /// Parsed model JSON, passed through as-is.
    ModelHit(Value),
    ModelRawFallback(RawFallbackResult),
    ModelUnavailable(String),
    ModelError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("query must not be empty")]
    EmptyQuery,
    #[error("model returned malformed JSON: {0}")]
    MalformedModelOutput(#[source] serde_json::Error),
}

pub fn is_single_word(query: &str) -> bool {
    SINGLE_WORD_RE.is_match(query)
}

fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

pub struct Lookup<D, M> {
    dictionary: D,
    model: Option<M>,
    config: LookupConfig,
}

impl<D: DictionarySource, M: ModelBackend> Lookup<D, M> {
    pub fn new(dictionary: D, model: Option<M>, config: LookupConfig) -> Self {
        Self {
            dictionary,
            model,
            config,
        }
    }

    pub fn model_configured(&self) -> bool {
        self.model.is_some()
    }

    pub async fn lookup(&self, query: &str) -> Result<LookupOutcome, LookupError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(LookupError::EmptyQuery);
        }

        if let Some(result) = self.attempt_dictionary(query).await {
            info!(query, "dictionary hit");
            return Ok(LookupOutcome::DictionaryHit(result));
        }
        debug!(query, "dictionary miss, falling back to model");
        self.attempt_model(query).await
    }

    /// `Some` only for a found entry that normalizes; every other outcome is a
    /// miss.
    pub async fn attempt_dictionary(&self, query: &str) -> Option<LookupResult> {
        if self.config.single_words_only && !is_single_word(query) {
            debug!(query, "not a single word, skipping dictionary");
            return None;
        }
        match self.dictionary.fetch_entry(query).await {
            Ok(entry) => {
                let result = normalize(&entry);
                if result.is_none() {
                    debug!(query, "dictionary entry has no headword");
                }
                result
            }
            Err(DictionaryError::NotFound(not_found)) => {
                debug!(query, title = %not_found.title, "dictionary has no entry");
                None
            }
            Err(err) => {
                warn!(query, error = %err, "dictionary lookup failed");
                None
            }
        }
    }

    pub async fn attempt_model(&self, query: &str) -> Result<LookupOutcome, LookupError> {
        let Some(model) = &self.model else {
            info!(query, "model fallback needed but no credential configured");
            return Ok(LookupOutcome::ModelUnavailable(
                MODEL_UNAVAILABLE_MESSAGE.to_string(),
            ));
        };

        let request = build_request(query, model.settings());
        let text = match model.complete(&request).await {
            Ok(text) => text,
            Err(err) => {
                warn!(query, error = %err, "model call failed");
                let detail = truncate_chars(&err.to_string(), ERROR_DETAIL_LIMIT);
                return Ok(LookupOutcome::ModelError(format!(
                    "model API call failed: {detail}"
                )));
            }
        };

        match extract_json(&text) {
            Extraction::Parsed(value) => {
                info!(query, "model hit");
                Ok(LookupOutcome::ModelHit(value))
            }
            Extraction::RawText(raw) => {
                info!(query, "model answered without JSON, returning raw text");
                Ok(LookupOutcome::ModelRawFallback(RawFallbackResult::new(
                    query, raw,
                )))
            }
            Extraction::Malformed(err) => {
                error!(query, error = %err, "model output contains malformed JSON");
                Err(LookupError::MalformedModelOutput(err))
            }
        }
    }
}

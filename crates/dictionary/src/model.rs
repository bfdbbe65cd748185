//! Fallback source: an Anthropic-messages-compatible language model endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::lookup::ModelBackend;

pub const MINIMAX_API_URL: &str = "https://api.minimax.io/anthropic/v1/messages";
pub const DEFAULT_MODEL: &str = "MiniMax-M2.5";
pub const DEFAULT_MAX_TOKENS: u32 = 2000;
pub const DEFAULT_TEMPERATURE: f64 = 1.0;
pub const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_TARGET_LANGUAGE: &str = "Simplified Chinese";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub const SYSTEM_PROMPT: &str = "You are a professional English dictionary and language-learning assistant. You are good at explaining the meaning, usage and example sentences of words, phrases and expressions.";

/// `{language}` and `{term}` are substituted per request.
const USER_PROMPT: &str = r#"You are a professional English dictionary and language-learning assistant. Give detailed information about "{term}", including:
1. The word or phrase with its correct spelling
2. Phonetic transcription (IPA)
3. Part of speech (noun/verb/adjective/adverb/phrase, etc.)
4. Detailed definitions in {language}
5. At least 3 English example sentences, each with a {language} translation
6. Synonyms
7. Notes on when and how it is used

Return the result as JSON in exactly this format:
{
  "word": "the word or phrase",
  "phonetic": "IPA transcription",
  "partOfSpeech": "part of speech",
  "definitions": [
    { "meaning": "definition", "example": "example sentence", "translation": "translation of the example" }
  ],
  "synonyms": ["synonym 1", "synonym 2"],
  "usage": "usage notes"
}"#;

#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub timeout: Duration,
    pub target_language: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            endpoint: MINIMAX_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout: DEFAULT_MODEL_TIMEOUT,
            target_language: DEFAULT_TARGET_LANGUAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelRequest {
    pub model: String,
    pub max_tokens: u32,
    pub system: String,
    pub messages: Vec<Message>,
    pub temperature: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub role: String,
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

pub fn user_prompt(term: &str, target_language: &str) -> String {
    USER_PROMPT
        .replace("{language}", target_language)
        .replace("{term}", term)
}

pub fn build_request(term: &str, settings: &ModelSettings) -> ModelRequest {
    ModelRequest {
        model: settings.model.clone(),
        max_tokens: settings.max_tokens,
        system: SYSTEM_PROMPT.to_string(),
        messages: vec![Message {
            role: "user".to_string(),
            content: vec![ContentBlock {
                kind: "text".to_string(),
                text: Some(user_prompt(term, &settings.target_language)),
            }],
        }],
        temperature: settings.temperature,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("{0}")]
    Transport(reqwest::Error),
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("unreadable model response: {0}")]
    Decode(reqwest::Error),
    #[error("no text content in model response")]
    NoText,
}

/// First block of type `text`, if it carries any text.
fn first_text(content: Vec<ContentBlock>) -> Option<String> {
    content
        .into_iter()
        .find(|block| block.kind == "text")
        .and_then(|block| block.text)
        .filter(|text| !text.is_empty())
}

/// The message of an `{"error": {"message": ...}}` payload, else the body itself.
fn error_detail(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|response| response.error)
        .and_then(|error| error.message)
        .or_else(|| Some(body.trim().to_string()).filter(|body| !body.is_empty()))
        .unwrap_or_else(|| status.to_string())
}

pub struct ModelClient {
    client: reqwest::Client,
    api_key: String,
    settings: ModelSettings,
}

impl ModelClient {
    /// Returns `None` when no (non-blank) credential is configured.
    pub fn from_key(
        api_key: Option<String>,
        settings: ModelSettings,
    ) -> Result<Option<Self>, reqwest::Error> {
        let Some(api_key) = api_key.filter(|key| !key.trim().is_empty()) else {
            return Ok(None);
        };
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        Ok(Some(Self {
            client,
            api_key,
            settings,
        }))
    }
}

#[async_trait]
impl ModelBackend for ModelClient {
    fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    async fn complete(&self, request: &ModelRequest) -> Result<String, ModelError> {
        let res = self
            .client
            .post(&self.settings.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(request)
            .send()
            .await
            .map_err(ModelError::Transport)?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                message: error_detail(status, &body),
            });
        }

        let response = res
            .json::<MessagesResponse>()
            .await
            .map_err(ModelError::Decode)?;
        first_text(response.content).ok_or(ModelError::NoText)
    }
}

use serde::{Deserialize, Serialize};

/// The single shape every successful lookup is reported in, whichever source
/// produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResult {
    pub word: String,
    pub phonetic: String,
    pub part_of_speech: String,
    /// Never empty.
    pub definitions: Vec<Definition>,
    pub synonyms: Vec<String>,
    pub usage: String,
    pub audio_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    pub meaning: String,
    pub example: String,
    pub translation: String,
}

/// The model answered, but nothing resembling a JSON object was in its text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFallbackResult {
    pub word: String,
    pub raw_response: String,
    pub is_raw_format: bool,
}

impl RawFallbackResult {
    pub fn new(word: impl Into<String>, raw_response: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            raw_response: raw_response.into(),
            is_raw_format: true,
        }
    }
}

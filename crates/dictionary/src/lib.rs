mod dictionary;
mod dictionary_api;
mod extract;
mod lookup;
mod model;
mod normalize;
mod result;
#[cfg(test)]
mod test_server;

pub use dictionary::{NotFoundError, PartOfSpeech, Phonetic, Word, WordDefinition, WordMeaning};
pub use dictionary_api::{
    Dictionary, DEFAULT_DICTIONARY_TIMEOUT, FREE_DICTIONARY_API_URL, USER_AGENT,
};
pub use extract::{extract_json, Extraction};
pub use lookup::{
    is_single_word, DictionarySource, Lookup, LookupConfig, LookupError, LookupOutcome,
    ModelBackend, MODEL_UNAVAILABLE_MESSAGE,
};
pub use model::{
    build_request, user_prompt, ContentBlock, Message, ModelClient, ModelError, ModelRequest,
    ModelSettings, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_MODEL_TIMEOUT,
    DEFAULT_TARGET_LANGUAGE, DEFAULT_TEMPERATURE, MINIMAX_API_URL, SYSTEM_PROMPT,
};
pub use normalize::{absolute_audio_url, normalize, DEFAULT_PART_OF_SPEECH, MAX_SYNONYMS};
pub use result::{Definition, LookupResult, RawFallbackResult};

#[derive(Debug, thiserror::Error)]
pub enum DictionaryError {
    #[error("failed to reach the dictionary service: {0}")]
    Fetch(reqwest::Error),
    #[error("unreadable dictionary response: {0}")]
    Deserialize(reqwest::Error),
    #[error("no entry found: {}", .0.message)]
    NotFound(NotFoundError),
    #[error("dictionary service answered with status {0}")]
    Status(u16),
    #[error("failed to build the dictionary client: {0}")]
    Client(reqwest::Error),
    #[error("invalid dictionary endpoint {0:?}")]
    InvalidEndpoint(String),
}

use std::time::Duration;

use clap::Parser;
use dictionary::{
    LookupConfig, ModelSettings, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TARGET_LANGUAGE,
    DEFAULT_TEMPERATURE, FREE_DICTIONARY_API_URL, MINIMAX_API_URL,
};

#[derive(Debug, Parser)]
#[command(name = "vocab-vault", about = "Vocabulary lookup gateway", version)]
pub struct Cli {
    /// Bind address
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,
    /// HTTP port
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,
    /// SQLite URL of the vocabulary store; storage routes are disabled without it
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
    /// Credential for the language model fallback
    #[arg(long, env = "MINIMAX_API_KEY", hide_env_values = true)]
    pub model_api_key: Option<String>,
    #[arg(long, env = "MODEL_API_URL", default_value = MINIMAX_API_URL)]
    pub model_url: String,
    #[arg(long, env = "MODEL_NAME", default_value = DEFAULT_MODEL)]
    pub model_name: String,
    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,
    #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f64,
    #[arg(long, default_value_t = 30)]
    pub model_timeout_secs: u64,
    /// Language of definitions and example translations in model answers
    #[arg(long, env = "TARGET_LANGUAGE", default_value = DEFAULT_TARGET_LANGUAGE)]
    pub target_language: String,
    #[arg(long, env = "DICTIONARY_API_URL", default_value = FREE_DICTIONARY_API_URL)]
    pub dictionary_url: String,
    #[arg(long, default_value_t = 8)]
    pub dictionary_timeout_secs: u64,
    /// Send phrases to the dictionary too instead of straight to the model
    #[arg(long)]
    pub no_word_gate: bool,
    /// Log level, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn model_settings(&self) -> ModelSettings {
        ModelSettings {
            endpoint: self.model_url.clone(),
            model: self.model_name.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout: Duration::from_secs(self.model_timeout_secs),
            target_language: self.target_language.clone(),
        }
    }

    pub fn lookup_config(&self) -> LookupConfig {
        LookupConfig {
            single_words_only: !self.no_word_gate,
        }
    }

    pub fn dictionary_timeout(&self) -> Duration {
        Duration::from_secs(self.dictionary_timeout_secs)
    }
}

use crate::error::{DocChatError, Result};
use std::env;
use std::str::FromStr;

pub const DEFAULT_BASE_URL: &str = "https://models.inference.ai.azure.com";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_TEMPERATURE: f32 = 0.5;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub generation: GenerationConfig,
    pub max_upload_bytes: u64,
    pub bind_addr: String,
}

// Keeps the key out of logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("generation", &self.generation)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("bind_addr", &self.bind_addr)
            .finish()
    }
}

impl Config {
    /// Reads configuration from the process environment.
    ///
    /// Callers are expected to have run `dotenv::dotenv()` first so a local
    /// `.env` file is honoured.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("OPENAI_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| DocChatError::Config("OPENAI_API_KEY environment variable not set".to_string()))?;

        let base_url = lookup("OPENAI_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let generation = GenerationConfig {
            model: lookup("DOCCHAT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: parse_var(&lookup, "DOCCHAT_TEMPERATURE", DEFAULT_TEMPERATURE)?,
            max_tokens: parse_var(&lookup, "DOCCHAT_MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
        };

        if !(0.0..=2.0).contains(&generation.temperature) {
            return Err(DocChatError::Config(format!(
                "DOCCHAT_TEMPERATURE must be between 0.0 and 2.0, got {}",
                generation.temperature
            )));
        }
        if generation.max_tokens == 0 {
            return Err(DocChatError::Config("DOCCHAT_MAX_TOKENS must be greater than 0".to_string()));
        }

        let max_upload_bytes = parse_var(&lookup, "DOCCHAT_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;
        let bind_addr = lookup("DOCCHAT_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        Ok(Self {
            api_key,
            base_url,
            generation,
            max_upload_bytes,
            bind_addr,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| DocChatError::Config(format!("{key} has an invalid value: '{raw}'"))),
    }
}

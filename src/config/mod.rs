// Config loader and validator
//
// Reads the relay's configuration surface (upstream endpoint, credential,
// model defaults, disallow terms, chunking parameters) from a ConfigSource,
// validates numeric values, and compiles the disallow-term pattern once.
// The result is read-only for the life of the process.

mod defaults;
mod error;
mod pattern;
mod source;

pub use defaults::{
    default_block_terms, DEFAULT_CHUNK_DELAY_MS, DEFAULT_CHUNK_SIZE, DEFAULT_ENDPOINT,
    DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_SYSTEM_PROMPT, DEFAULT_TEMPERATURE,
};
pub use error::ConfigError;
pub use pattern::CompiledPattern;
pub use source::{ConfigSource, EnvSource, MapSource};

// ---------------------------------------------------------------------------
// Typed config struct
// ---------------------------------------------------------------------------

/// Parsed and validated relay configuration.
///
/// Loaded once at process start and shared behind an `Arc`; never mutated
/// afterwards. The relay constructor receives it explicitly so tests can
/// build configs without touching the environment.
#[derive(Debug)]
pub struct RelayConfig {
    /// Upstream chat-completions endpoint URL.
    pub endpoint: String,
    /// Bearer credential for the upstream. Absence is not a load error:
    /// each request without a credential is answered with a server error.
    pub api_key: Option<String>,
    /// Model used when the caller does not name one.
    pub default_model: String,
    /// Temperature used when the caller does not supply one.
    pub default_temperature: f32,
    /// System instruction prepended to every relayed prompt.
    pub system_prompt: String,
    /// Pre-compiled case-insensitive disallow-term pattern.
    pub disallow: CompiledPattern,
    /// Completion token budget sent upstream.
    pub max_tokens: u32,
    /// Piece size (characters) for simulated streaming.
    pub chunk_size: usize,
    /// Delay between simulated-streaming pieces, in milliseconds.
    pub chunk_delay_ms: u64,
    /// Whether the upstream supports live streaming. When false, callers
    /// asking for a stream get the simulated-chunking fallback.
    pub upstream_streaming: bool,
    /// Total timeout for the buffered upstream call, in milliseconds.
    /// Not applied to live streams, where a partial response cannot be
    /// safely replayed.
    pub request_timeout_ms: Option<u64>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Configuration keys read from the source.
pub mod keys {
    pub const API_KEY: &str = "OPENAI_API_KEY";
    pub const API_KEY_FALLBACK: &str = "LLM_API_KEY";
    pub const ENDPOINT: &str = "OPENAI_API_URL";
    pub const MODEL: &str = "OPENAI_MODEL";
    pub const TEMPERATURE: &str = "OPENAI_TEMPERATURE";
    pub const SYSTEM_PROMPT: &str = "RELAY_SYSTEM_PROMPT";
    pub const BLOCK_TERMS: &str = "RELAY_BLOCK_TERMS";
    pub const MAX_TOKENS: &str = "RELAY_MAX_TOKENS";
    pub const CHUNK_SIZE: &str = "RELAY_CHUNK_SIZE";
    pub const CHUNK_DELAY_MS: &str = "RELAY_CHUNK_DELAY_MS";
    pub const UPSTREAM_STREAMING: &str = "RELAY_UPSTREAM_STREAMING";
    pub const REQUEST_TIMEOUT_MS: &str = "RELAY_REQUEST_TIMEOUT_MS";
}

/// Load and validate the relay configuration from the given source.
///
/// Every value has a default except the credential, whose absence is
/// surfaced per-request rather than at startup.
pub fn load_config(source: &dyn ConfigSource) -> Result<RelayConfig, ConfigError> {
    let api_key = source
        .get(keys::API_KEY)
        .or_else(|| source.get(keys::API_KEY_FALLBACK));

    let endpoint = source
        .get(keys::ENDPOINT)
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

    let default_model = source
        .get(keys::MODEL)
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let default_temperature = parse_value(source, keys::TEMPERATURE, DEFAULT_TEMPERATURE)?;

    let system_prompt = source
        .get(keys::SYSTEM_PROMPT)
        .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

    let terms = match source.get(keys::BLOCK_TERMS) {
        Some(raw) => {
            let terms: Vec<String> = raw
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
            if terms.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: keys::BLOCK_TERMS.to_string(),
                    value: raw,
                    reason: "no non-empty terms".to_string(),
                });
            }
            terms
        }
        None => default_block_terms(),
    };
    let disallow = CompiledPattern::from_terms(&terms)?;

    let max_tokens = parse_value(source, keys::MAX_TOKENS, DEFAULT_MAX_TOKENS)?;
    let chunk_size: usize = parse_value(source, keys::CHUNK_SIZE, DEFAULT_CHUNK_SIZE)?;
    if chunk_size == 0 {
        return Err(ConfigError::InvalidValue {
            key: keys::CHUNK_SIZE.to_string(),
            value: "0".to_string(),
            reason: "chunk size must be positive".to_string(),
        });
    }
    let chunk_delay_ms = parse_value(source, keys::CHUNK_DELAY_MS, DEFAULT_CHUNK_DELAY_MS)?;

    let upstream_streaming = parse_bool(source, keys::UPSTREAM_STREAMING, true)?;

    let request_timeout_ms = match source.get(keys::REQUEST_TIMEOUT_MS) {
        Some(raw) => Some(raw.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
            key: keys::REQUEST_TIMEOUT_MS.to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        })?),
        None => None,
    };

    Ok(RelayConfig {
        endpoint,
        api_key,
        default_model,
        default_temperature,
        system_prompt,
        disallow,
        max_tokens,
        chunk_size,
        chunk_delay_ms,
        upstream_streaming,
        request_timeout_ms,
    })
}

fn parse_value<T: std::str::FromStr>(
    source: &dyn ConfigSource,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match source.get(key) {
        Some(raw) => raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_bool(source: &dyn ConfigSource, key: &str, default: bool) -> Result<bool, ConfigError> {
    match source.get(key) {
        Some(raw) => match raw.as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
                reason: "expected a boolean".to_string(),
            }),
        },
        None => Ok(default),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

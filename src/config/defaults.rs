// Defaults for every configurable relay value.
//
// These mirror the values the service shipped with before they became
// configuration: endpoint/model/temperature from the upstream provider
// integration, the disallow terms from the request filter, and the
// chunking parameters from the simulated-streaming path.

/// Default upstream chat-completions endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Default model requested when the caller does not name one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Default completion token budget sent upstream.
pub const DEFAULT_MAX_TOKENS: u32 = 800;

/// System instruction prepended to every relayed prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a defensive cybersecurity assistant. \
    Provide high-level, lawful, ethical guidance only. Refuse to provide steps that \
    enable illegal activity, exploitation, or unauthorized access. Provide tool \
    recommendations and defensive best practices.";

/// Terms that cause the content gate to reject a prompt (case-insensitive).
pub const DEFAULT_BLOCK_TERMS: &[&str] = &[
    "exploit",
    "ddos",
    "malware",
    "phishing",
    "password cracking",
    "unauthorized access",
    "bypass",
    "rootkit",
    "sql injection",
    "xss",
];

/// Piece size (in characters) for simulated streaming of buffered responses.
pub const DEFAULT_CHUNK_SIZE: usize = 120;

/// Delay between simulated-streaming pieces, in milliseconds.
pub const DEFAULT_CHUNK_DELAY_MS: u64 = 80;

/// Collect the default disallow terms as owned strings.
pub fn default_block_terms() -> Vec<String> {
    DEFAULT_BLOCK_TERMS.iter().map(|t| t.to_string()).collect()
}

use std::fmt;

use regex::Regex;

use super::error::ConfigError;

/// A pre-compiled regex pattern. Wraps `regex::Regex` with the original
/// pattern string preserved for debugging/display.
#[derive(Clone)]
pub struct CompiledPattern {
    pub pattern: String,
    pub regex: Regex,
}

impl CompiledPattern {
    /// Compile a regex pattern, returning `ConfigError::InvalidRegex` on failure.
    pub fn compile(pattern: &str) -> Result<Self, ConfigError> {
        let regex = Regex::new(pattern).map_err(|e| ConfigError::InvalidRegex {
            pattern: pattern.to_string(),
            source: e,
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// Build a case-insensitive alternation over a list of literal terms.
    ///
    /// Terms are regex-escaped, so "sql injection" matches as a literal
    /// phrase rather than as a pattern.
    pub fn from_terms(terms: &[String]) -> Result<Self, ConfigError> {
        if terms.is_empty() {
            return Err(ConfigError::Validation(
                "disallow-term list must contain at least one term".to_string(),
            ));
        }
        let escaped: Vec<String> = terms.iter().map(|t| regex::escape(t)).collect();
        let pattern = format!("(?i)({})", escaped.join("|"));
        Self::compile(&pattern)
    }

    /// Test whether the pattern matches the given text.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl fmt::Debug for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledPattern")
            .field("pattern", &self.pattern)
            .finish()
    }
}

impl PartialEq for CompiledPattern {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

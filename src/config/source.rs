// Copyright 2026 The Prompt Relay Project
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

/// Abstraction over where configuration values come from.
///
/// `EnvSource` reads process environment variables; `MapSource` provides
/// values directly (used in tests to avoid environment mutation).
pub trait ConfigSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads configuration from process environment variables.
///
/// An empty value is treated the same as an unset one, matching how the
/// deployment platform surfaces blank env entries.
pub struct EnvSource;

impl ConfigSource for EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }
}

/// Provides configuration values from an in-memory map. Used for testing.
#[derive(Default)]
pub struct MapSource {
    pub values: HashMap<String, String>,
}

impl MapSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl ConfigSource for MapSource {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

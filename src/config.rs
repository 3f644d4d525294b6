//! Environment configuration.

use std::env;

/// Settings read once at startup from the process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    /// Append every terminal write to this file (rendering forensics).
    pub write_log: Option<String>,
    /// Append painter region decisions to this file.
    pub debug_log: Option<String>,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            write_log: env_string_opt("TERMCHAT_WRITE_LOG"),
            debug_log: env_string_opt("TERMCHAT_DEBUG_LOG"),
        }
    }
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

//! Env-gated append-only debug log.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use crate::config::EnvConfig;

/// Best-effort line sink for painter/region decisions.
///
/// The first append failure disables the sink for the rest of the process;
/// diagnostics must never take the UI down with them.
#[derive(Debug, Default)]
pub struct DebugLog {
    path: Option<PathBuf>,
    failed: bool,
}

impl DebugLog {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn to_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            failed: false,
        }
    }

    pub fn from_env(config: &EnvConfig) -> Self {
        match config.debug_log.as_deref() {
            Some(path) => Self::to_path(path),
            None => Self::disabled(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.path.is_some() && !self.failed
    }

    pub fn log(&mut self, message: &str) {
        if self.failed {
            return;
        }
        let Some(path) = self.path.as_ref() else {
            return;
        };
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| writeln!(file, "{message}"));
        if result.is_err() {
            self.failed = true;
        }
    }
}

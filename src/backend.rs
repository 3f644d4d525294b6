//! Conversational backend boundary.
//!
//! The client treats the backend as a black box behind two calls: submit a
//! line and read back one reply, and report the active model selection.
//! Reply shape is decided once, here, as a tagged type — call sites never
//! re-sniff payloads.

use thiserror::Error;

/// One backend reply, decided at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendReply {
    Text(String),
    /// The backend completed but produced no printable text.
    Empty,
}

/// Backend failures surface as display text, never as a process error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("invocation failed: {0}")]
    Invocation(String),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// External collaborator contract.
pub trait Backend {
    /// Submit one user line; may block until the reply is ready.
    fn invoke(&mut self, text: &str) -> Result<BackendReply, BackendError>;

    /// Raw identifier of the active model selection.
    fn model_label(&self) -> String;
}

/// Deterministic in-process backend for local runs and tests.
pub struct MockBackend {
    model_id: String,
    script: Vec<Result<BackendReply, BackendError>>,
    cycle: Vec<String>,
    invocations: usize,
}

impl MockBackend {
    /// Cycles through `replies` forever; an empty list yields
    /// [`BackendReply::Empty`] replies.
    pub fn cycling(model_id: impl Into<String>, replies: Vec<String>) -> Self {
        Self {
            model_id: model_id.into(),
            script: Vec::new(),
            cycle: replies,
            invocations: 0,
        }
    }

    /// Plays `script` front to back, then falls back to cycling replies
    /// (or [`BackendReply::Empty`]).
    pub fn scripted(
        model_id: impl Into<String>,
        script: Vec<Result<BackendReply, BackendError>>,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            script,
            cycle: Vec::new(),
            invocations: 0,
        }
    }

    pub fn invocations(&self) -> usize {
        self.invocations
    }
}

impl Backend for MockBackend {
    fn invoke(&mut self, _text: &str) -> Result<BackendReply, BackendError> {
        self.invocations += 1;

        if !self.script.is_empty() {
            return self.script.remove(0);
        }

        if self.cycle.is_empty() {
            return Ok(BackendReply::Empty);
        }
        let index = (self.invocations - 1) % self.cycle.len();
        Ok(BackendReply::Text(self.cycle[index].clone()))
    }

    fn model_label(&self) -> String {
        self.model_id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::{Backend, BackendError, BackendReply, MockBackend};

    #[test]
    fn cycling_backend_rotates_replies() {
        let mut backend = MockBackend::cycling("mock", vec!["a".into(), "b".into()]);
        assert_eq!(backend.invoke("1"), Ok(BackendReply::Text("a".into())));
        assert_eq!(backend.invoke("2"), Ok(BackendReply::Text("b".into())));
        assert_eq!(backend.invoke("3"), Ok(BackendReply::Text("a".into())));
        assert_eq!(backend.invocations(), 3);
    }

    #[test]
    fn empty_cycle_yields_empty_replies() {
        let mut backend = MockBackend::cycling("mock", Vec::new());
        assert_eq!(backend.invoke("hi"), Ok(BackendReply::Empty));
    }

    #[test]
    fn scripted_backend_plays_failures_in_order() {
        let mut backend = MockBackend::scripted(
            "mock",
            vec![
                Ok(BackendReply::Text("fine".into())),
                Err(BackendError::Invocation("boom".into())),
            ],
        );
        assert_eq!(backend.invoke("1"), Ok(BackendReply::Text("fine".into())));
        let err = backend.invoke("2").expect_err("scripted failure");
        assert_eq!(err.to_string(), "invocation failed: boom");
        assert_eq!(backend.invoke("3"), Ok(BackendReply::Empty));
    }
}

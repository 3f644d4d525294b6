//! Append-only, capacity-bounded conversation buffer.

use std::collections::VecDeque;

use crate::core::wrap::wrap_line;

/// Default retention cap, in rendered lines.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Who produced a conversation line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
    System,
}

impl Sender {
    /// Prefix shown on the first wrapped line of a turn.
    pub fn prefix(self) -> &'static str {
        match self {
            Sender::User => "You: ",
            Sender::Assistant => "Agent: ",
            Sender::System => "",
        }
    }
}

/// One rendered line of conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptLine {
    pub sender: Sender,
    pub text: String,
}

/// Ordered sequence of rendered lines, word-wrapped at insertion time and
/// trimmed from the head once the capacity is exceeded.
#[derive(Debug, Clone)]
pub struct Transcript {
    lines: VecDeque<TranscriptLine>,
    wrap_width: usize,
    capacity: usize,
}

impl Transcript {
    pub fn new(wrap_width: usize, capacity: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            wrap_width: wrap_width.max(1),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Appends one turn, wrapping to the configured width. The sender
    /// prefix lands on the first wrapped line only; embedded newlines
    /// split the text into separately wrapped paragraphs.
    pub fn append(&mut self, sender: Sender, text: &str) {
        let prefix = sender.prefix();
        for (index, paragraph) in text.split('\n').enumerate() {
            let source = if index == 0 {
                format!("{prefix}{paragraph}")
            } else {
                paragraph.to_string()
            };
            for segment in wrap_line(&source, self.wrap_width) {
                self.lines.push_back(TranscriptLine {
                    sender,
                    text: segment,
                });
            }
        }

        while self.lines.len() > self.capacity {
            self.lines.pop_front();
        }
    }

    /// The last `max_lines` entries in original order (all of them when
    /// fewer exist).
    pub fn recent_window(&self, max_lines: usize) -> Vec<&TranscriptLine> {
        let skip = self.lines.len().saturating_sub(max_lines);
        self.lines.iter().skip(skip).collect()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new(78, DEFAULT_CAPACITY)
    }
}

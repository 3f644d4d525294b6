//! Input controller: the main loop that owns the terminal in raw mode.

use std::io;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use crate::core::autocomplete::{command_matches, CommandMatch};
use crate::core::commands::CommandRegistry;
use crate::core::key::{classify_byte, step_escape, ByteClass, EscapeStep, Key};
use crate::core::terminal::Terminal;
use crate::core::transcript::{Sender, Transcript};
use crate::logging::DebugLog;
use crate::render::painter::Painter;
use crate::render::{Layout, RenderState};

/// How long the read loop waits before checking the status channel again.
const POLL_INTERVAL_MS: i32 = 100;

/// A quiet stream for this long abandons a pending escape sequence.
const ESCAPE_TIMEOUT: Duration = Duration::from_millis(50);

/// What one pump of the loop produced for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The user pressed Enter; the completed line (buffer already cleared).
    Submitted(String),
    /// Ctrl-C. Loop termination is the caller's decision.
    Interrupted,
    /// Ctrl-D on an empty buffer, or the input stream closed.
    EndOfInput,
}

/// Input controller states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Editing,
    EscapeSeen,
    Submitted,
}

/// The main loop: raw keystrokes in, paints and [`SessionEvent`]s out.
///
/// Owns the terminal for its lifetime. Raw mode is entered on
/// construction and left in [`ChatSession::finish`] (also invoked on
/// drop), so every ordinary exit path restores the terminal.
pub struct ChatSession<T: Terminal> {
    term: T,
    painter: Painter,
    registry: CommandRegistry,
    transcript: Transcript,
    status_rx: Receiver<String>,
    input: String,
    cursor: usize,
    matches: Vec<CommandMatch>,
    overlay_visible: bool,
    status_text: String,
    state: LoopState,
    pending_escape: Vec<u8>,
    escape_deadline: Option<Instant>,
    finished: bool,
}

impl<T: Terminal> ChatSession<T> {
    pub fn new(
        mut term: T,
        layout: Layout,
        registry: CommandRegistry,
        transcript: Transcript,
        status_rx: Receiver<String>,
        debug: DebugLog,
    ) -> io::Result<Self> {
        term.enter_raw()?;
        let mut session = Self {
            term,
            painter: Painter::new(layout, debug),
            registry,
            transcript,
            status_rx,
            input: String::new(),
            cursor: 0,
            matches: Vec::new(),
            overlay_visible: false,
            status_text: String::new(),
            state: LoopState::Idle,
            pending_escape: Vec::new(),
            escape_deadline: None,
            finished: false,
        };
        session.repaint()?;
        Ok(session)
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn overlay_visible(&self) -> bool {
        self.overlay_visible
    }

    /// Appends a conversation turn and repaints.
    pub fn push_line(&mut self, sender: Sender, text: &str) -> io::Result<()> {
        self.transcript.append(sender, text);
        self.repaint()
    }

    /// One iteration of the loop: apply pending status updates, then wait
    /// briefly for a byte and dispatch it.
    pub fn pump(&mut self) -> io::Result<Option<SessionEvent>> {
        self.apply_status_updates()?;
        self.expire_pending_escape();

        let byte = match self.term.read_byte(POLL_INTERVAL_MS) {
            Ok(Some(byte)) => byte,
            Ok(None) => return Ok(None),
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                return Ok(Some(SessionEvent::EndOfInput));
            }
            Err(err) => return Err(err),
        };

        self.feed(byte)
    }

    /// Restores the terminal. Idempotent; also run on drop.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;

        // Park the cursor under the status bar so the shell resumes on a
        // clean line, then hand the terminal back.
        let rows = self.painter.layout().rows();
        self.term
            .write(&format!("\x1b[{rows};1H\x1b[?25h\r\n"))?;
        self.term.leave_raw()
    }

    fn apply_status_updates(&mut self) -> io::Result<()> {
        let mut latest = None;
        while let Ok(status) = self.status_rx.try_recv() {
            latest = Some(status);
        }

        if let Some(status) = latest {
            if status != self.status_text {
                self.status_text = status;
                self.painter
                    .paint_status_only(&mut self.term, &self.status_text)?;
            }
        }
        Ok(())
    }

    fn expire_pending_escape(&mut self) {
        let Some(deadline) = self.escape_deadline else {
            return;
        };
        if Instant::now() >= deadline {
            self.abandon_escape();
        }
    }

    fn abandon_escape(&mut self) {
        self.pending_escape.clear();
        self.escape_deadline = None;
        self.sync_state();
    }

    fn sync_state(&mut self) {
        self.state = if self.input.is_empty() && self.cursor == 0 {
            LoopState::Idle
        } else {
            LoopState::Editing
        };
    }

    fn feed(&mut self, byte: u8) -> io::Result<Option<SessionEvent>> {
        if self.state == LoopState::EscapeSeen {
            return self.feed_escape(byte);
        }

        match classify_byte(byte) {
            ByteClass::EscapeStart => {
                self.state = LoopState::EscapeSeen;
                self.pending_escape.clear();
                self.escape_deadline = Some(Instant::now() + ESCAPE_TIMEOUT);
                Ok(None)
            }
            ByteClass::Key(key) => self.dispatch(key),
            ByteClass::Ignore => Ok(None),
        }
    }

    fn feed_escape(&mut self, byte: u8) -> io::Result<Option<SessionEvent>> {
        match step_escape(&self.pending_escape, byte) {
            EscapeStep::Incomplete => {
                self.pending_escape.push(byte);
                self.escape_deadline = Some(Instant::now() + ESCAPE_TIMEOUT);
                Ok(None)
            }
            EscapeStep::Key(key) => {
                self.abandon_escape();
                self.dispatch(key)
            }
            EscapeStep::Discard => {
                self.abandon_escape();
                Ok(None)
            }
        }
    }

    fn dispatch(&mut self, key: Key) -> io::Result<Option<SessionEvent>> {
        match key {
            Key::Char(ch) => {
                self.input.insert(self.cursor, ch);
                self.cursor += 1;
                self.recompute_matches();
                self.sync_state();
                self.repaint()?;
                Ok(None)
            }
            Key::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.input.remove(self.cursor);
                    self.recompute_matches();
                    self.sync_state();
                    self.repaint()?;
                }
                Ok(None)
            }
            Key::Enter => {
                let line = std::mem::take(&mut self.input);
                self.cursor = 0;
                self.matches.clear();
                self.overlay_visible = false;
                self.state = LoopState::Submitted;
                self.repaint()?;
                self.state = LoopState::Idle;
                Ok(Some(SessionEvent::Submitted(line)))
            }
            Key::Left => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.painter
                        .park_cursor(&mut self.term, &self.input, self.cursor)?;
                }
                Ok(None)
            }
            Key::Right => {
                if self.cursor < self.input.len() {
                    self.cursor += 1;
                    self.painter
                        .park_cursor(&mut self.term, &self.input, self.cursor)?;
                }
                Ok(None)
            }
            Key::Interrupt => Ok(Some(SessionEvent::Interrupted)),
            Key::EndOfInput => {
                if self.input.is_empty() {
                    Ok(Some(SessionEvent::EndOfInput))
                } else {
                    Ok(None)
                }
            }
        }
    }

    fn recompute_matches(&mut self) {
        match self.input.strip_prefix('/') {
            Some(partial) => {
                let matches = command_matches(&self.registry, partial);
                self.overlay_visible = !matches.is_empty()
                    && (partial.is_empty()
                        || matches.len() > 1
                        || !self.registry.has_exact(partial));
                self.matches = matches;
            }
            None => {
                self.matches.clear();
                self.overlay_visible = false;
            }
        }
    }

    fn repaint(&mut self) -> io::Result<()> {
        let window = self
            .transcript
            .recent_window(self.painter.layout().conversation_rows());
        let state = RenderState {
            input: &self.input,
            cursor: self.cursor,
            overlay: self
                .overlay_visible
                .then_some(self.matches.as_slice()),
            status: &self.status_text,
            conversation: window,
        };
        self.painter.paint(&mut self.term, &state)
    }
}

impl<T: Terminal> Drop for ChatSession<T> {
    fn drop(&mut self) {
        let _ = self.finish();
    }
}

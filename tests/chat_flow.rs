//! End-to-end session flows over a scripted terminal and a mock backend.

use std::collections::VecDeque;
use std::io;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use termchat::{
    runtime, BackendError, BackendReply, ChatSession, CommandRegistry, DebugLog, Layout,
    MockBackend, Sender, Terminal, Transcript,
};

struct ScriptedTerminal {
    reads: VecDeque<u8>,
    written: Arc<Mutex<String>>,
    raw: Arc<Mutex<bool>>,
}

impl ScriptedTerminal {
    fn new(script: &[u8]) -> (Self, Arc<Mutex<String>>, Arc<Mutex<bool>>) {
        let written = Arc::new(Mutex::new(String::new()));
        let raw = Arc::new(Mutex::new(false));
        (
            Self {
                reads: script.iter().copied().collect(),
                written: Arc::clone(&written),
                raw: Arc::clone(&raw),
            },
            written,
            raw,
        )
    }
}

impl Terminal for ScriptedTerminal {
    fn enter_raw(&mut self) -> io::Result<()> {
        *self.raw.lock().expect("raw lock poisoned") = true;
        Ok(())
    }

    fn leave_raw(&mut self) -> io::Result<()> {
        *self.raw.lock().expect("raw lock poisoned") = false;
        Ok(())
    }

    fn read_byte(&mut self, _timeout_ms: i32) -> io::Result<Option<u8>> {
        match self.reads.pop_front() {
            Some(byte) => Ok(Some(byte)),
            None => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "script done")),
        }
    }

    fn write(&mut self, data: &str) -> io::Result<()> {
        self.written
            .lock()
            .expect("written lock poisoned")
            .push_str(data);
        Ok(())
    }

    fn columns(&self) -> u16 {
        80
    }

    fn rows(&self) -> u16 {
        24
    }
}

fn session_over(
    script: &[u8],
) -> (
    ChatSession<ScriptedTerminal>,
    Arc<Mutex<String>>,
    Arc<Mutex<bool>>,
) {
    let (term, written, raw) = ScriptedTerminal::new(script);
    let (_status_tx, status_rx) = mpsc::channel();
    let session = ChatSession::new(
        term,
        Layout::new(80, 24),
        CommandRegistry::builtin(),
        Transcript::new(78, 200),
        status_rx,
        DebugLog::disabled(),
    )
    .expect("session");
    (session, written, raw)
}

fn transcript_texts(session: &ChatSession<ScriptedTerminal>) -> Vec<String> {
    session
        .transcript()
        .recent_window(usize::MAX)
        .iter()
        .map(|line| line.text.clone())
        .collect()
}

#[test]
fn submitted_line_becomes_user_then_assistant_turns() {
    let (mut session, written, raw) = session_over(b"hello\r\x04");
    let mut backend = MockBackend::cycling("claude-sonnet-4", vec!["hi there".to_string()]);

    runtime::run(&mut session, &mut backend).expect("run");

    let texts = transcript_texts(&session);
    assert!(texts.contains(&"You: hello".to_string()));
    assert!(texts.contains(&"Agent: hi there".to_string()));
    assert_eq!(backend.invocations(), 1);

    assert!(written.lock().expect("written").contains("You: hello"));
    assert!(!*raw.lock().expect("raw"), "terminal restored after run");
}

#[test]
fn backend_failure_adds_exactly_one_system_line() {
    let (mut session, _, _) = session_over(b"boom\r\x04");
    let mut backend = MockBackend::scripted(
        "claude-sonnet-4",
        vec![Err(BackendError::Invocation("agent exploded".to_string()))],
    );

    let before = session.transcript().len();
    runtime::run(&mut session, &mut backend).expect("run");

    let texts = transcript_texts(&session);
    let user_lines = texts.iter().filter(|text| *text == "You: boom").count();
    let error_lines = texts
        .iter()
        .filter(|text| text.contains("Error invoking agent") && text.contains("agent exploded"))
        .count();
    assert_eq!(user_lines, 1);
    assert_eq!(error_lines, 1);
    assert_eq!(session.transcript().len(), before + 2, "user line + one notice");
}

#[test]
fn empty_reply_is_reported_as_a_system_notice() {
    let (mut session, _, _) = session_over(b"hi\r\x04");
    let mut backend =
        MockBackend::scripted("claude-sonnet-4", vec![Ok(BackendReply::Empty)]);

    runtime::run(&mut session, &mut backend).expect("run");

    let texts = transcript_texts(&session);
    assert!(texts.contains(&"(no text output)".to_string()));
}

#[test]
fn whitespace_only_submissions_are_dropped() {
    let (mut session, _, _) = session_over(b"   \r\x04");
    let mut backend = MockBackend::cycling("claude-sonnet-4", vec!["never".to_string()]);

    let before = session.transcript().len();
    runtime::run(&mut session, &mut backend).expect("run");

    assert_eq!(session.transcript().len(), before);
    assert_eq!(backend.invocations(), 0);
}

#[test]
fn interrupt_ends_the_loop_without_invoking_the_backend() {
    let (mut session, _, raw) = session_over(b"half-typed\x03");
    let mut backend = MockBackend::cycling("claude-sonnet-4", vec!["never".to_string()]);

    runtime::run(&mut session, &mut backend).expect("run");

    assert_eq!(backend.invocations(), 0);
    assert!(!*raw.lock().expect("raw"));
}

#[test]
fn slash_typing_paints_the_autocomplete_overlay() {
    let (mut session, written, _) = session_over(b"/task d\x04");
    // EOF is ignored while the buffer is non-empty; the script then runs dry
    // and the loop ends on the stream-closed signal.
    let mut backend = MockBackend::cycling("claude-sonnet-4", Vec::new());

    runtime::run(&mut session, &mut backend).expect("run");

    let output = written.lock().expect("written").clone();
    assert!(output.contains("/task done"), "overlay should suggest the subcommand");
    assert_eq!(session.input(), "/task d", "EOF on a non-empty buffer is ignored");
    assert!(session.overlay_visible());
}

#[test]
fn conversation_scrolls_and_drops_oldest_lines() {
    let (mut session, _, _) = session_over(b"\x04");
    let mut backend = MockBackend::cycling("claude-sonnet-4", Vec::new());

    for i in 0..250 {
        session
            .push_line(Sender::System, &format!("notice-{i}"))
            .expect("push");
    }
    runtime::run(&mut session, &mut backend).expect("run");

    let texts = transcript_texts(&session);
    assert_eq!(texts.len(), 200);
    assert_eq!(texts.first().map(String::as_str), Some("notice-50"));
    assert_eq!(texts.last().map(String::as_str), Some("notice-249"));
}

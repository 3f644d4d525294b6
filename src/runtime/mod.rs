//! Session loop, status refresh task, and the driver that ties them to a
//! backend.

pub mod session;
pub mod ticker;

use std::io;

use crate::backend::{Backend, BackendReply};
use crate::core::terminal::Terminal;
use crate::core::transcript::Sender;
use crate::runtime::session::{ChatSession, SessionEvent};

/// Drives the session until interrupt or end-of-input.
///
/// Submitted lines become user turns; backend replies become assistant
/// turns; backend failures become exactly one system notice and never end
/// the loop. Whitespace-only submissions are dropped without a turn.
pub fn run<T: Terminal, B: Backend>(session: &mut ChatSession<T>, backend: &mut B) -> io::Result<()> {
    loop {
        let Some(event) = session.pump()? else {
            continue;
        };

        match event {
            SessionEvent::Submitted(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                session.push_line(Sender::User, line)?;
                match backend.invoke(line) {
                    Ok(BackendReply::Text(text)) => {
                        session.push_line(Sender::Assistant, &text)?;
                    }
                    Ok(BackendReply::Empty) => {
                        session.push_line(Sender::System, "(no text output)")?;
                    }
                    Err(error) => {
                        session.push_line(Sender::System, &format!("Error invoking agent: {error}"))?;
                    }
                }
            }
            SessionEvent::Interrupted | SessionEvent::EndOfInput => break,
        }
    }

    session.finish()
}

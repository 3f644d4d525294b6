//! Raw-mode terminal chat client core.
//!
//! Invariant: the session's input loop is the only terminal writer — every
//! paint leaves the render engine as one buffered write.
//!
//! # Public API Overview
//! - Build a [`ChatSession`] over a [`Terminal`] and drive it with [`run`].
//! - Feed the autocomplete overlay from a [`CommandRegistry`].
//! - Compose status lines with [`StatusProvider`] and refresh them in the
//!   background with [`StatusTicker`].
//! - Plug a conversational backend in through the [`Backend`] trait.

pub mod backend;
pub mod config;
pub mod core;
pub mod logging;
pub mod platform;
pub mod render;
pub mod runtime;
pub mod status;

pub use crate::backend::{Backend, BackendError, BackendReply, MockBackend};
pub use crate::config::EnvConfig;
pub use crate::core::autocomplete::{command_matches, CommandMatch, MAX_VISIBLE_MATCHES};
pub use crate::core::commands::{CommandRegistry, CommandSpec};
pub use crate::core::key::{ByteClass, Key};
pub use crate::core::terminal::Terminal;
pub use crate::core::transcript::{Sender, Transcript, TranscriptLine};
pub use crate::core::wrap::wrap_line;
pub use crate::logging::DebugLog;
pub use crate::platform::process_terminal::ProcessTerminal;
pub use crate::render::painter::Painter;
pub use crate::render::{Layout, RenderState};
pub use crate::runtime::run;
pub use crate::runtime::session::{ChatSession, SessionEvent};
pub use crate::runtime::ticker::StatusTicker;
pub use crate::status::StatusProvider;

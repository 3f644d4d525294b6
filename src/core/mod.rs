//! Pure chat-client logic: commands, matching, key decoding, wrapping, and
//! the conversation buffer.

pub mod autocomplete;
pub mod commands;
pub mod key;
pub mod terminal;
pub mod transcript;
pub mod wrap;

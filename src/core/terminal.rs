//! Terminal trait: the seam between the session loop and the process
//! terminal.

use std::io;

/// Minimal terminal interface for the chat client.
///
/// The session owns the implementation for its lifetime: it enters raw
/// mode on startup and must restore cooked mode (and cursor visibility)
/// on every exit path.
pub trait Terminal {
    /// Switch the input stream to raw (byte-at-a-time, no echo) mode.
    fn enter_raw(&mut self) -> io::Result<()>;

    /// Restore the mode captured before `enter_raw`.
    fn leave_raw(&mut self) -> io::Result<()>;

    /// Read one byte, waiting at most `timeout_ms` (negative blocks).
    ///
    /// `Ok(None)` means the timeout elapsed. A closed input stream
    /// surfaces as `ErrorKind::UnexpectedEof`.
    fn read_byte(&mut self, timeout_ms: i32) -> io::Result<Option<u8>>;

    /// Write output. Failures here are fatal to the session.
    fn write(&mut self, data: &str) -> io::Result<()>;

    /// Terminal dimensions, sampled from the live device.
    fn columns(&self) -> u16;
    fn rows(&self) -> u16;
}

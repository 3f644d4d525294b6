//! Process-based terminal: termios raw mode, poll-based byte reads, and
//! restore hooks for signal/panic exit paths.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::core::terminal::Terminal;

#[cfg(unix)]
use libc::{self, c_int};
#[cfg(unix)]
use signal_hook::iterator::Signals;
#[cfg(unix)]
use std::thread::{self, JoinHandle};

#[cfg(unix)]
fn get_termios(fd: c_int) -> io::Result<libc::termios> {
    let mut termios = unsafe { std::mem::zeroed::<libc::termios>() };
    let result = unsafe { libc::tcgetattr(fd, &mut termios) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(termios)
}

#[cfg(unix)]
fn set_termios(fd: c_int, termios: &libc::termios) -> io::Result<()> {
    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, termios) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(unix)]
fn poll_fd(fd: c_int, events: libc::c_short, timeout_ms: i32) -> io::Result<bool> {
    let mut fds = libc::pollfd {
        fd,
        events,
        revents: 0,
    };
    loop {
        let result = unsafe { libc::poll(&mut fds, 1, timeout_ms) };
        if result < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        return Ok(result > 0 && (fds.revents & events) != 0);
    }
}

#[cfg(unix)]
fn write_all_fd(fd: c_int, bytes: &[u8]) -> io::Result<()> {
    let mut written = 0;
    while written < bytes.len() {
        let remaining = &bytes[written..];
        let result =
            unsafe { libc::write(fd, remaining.as_ptr() as *const libc::c_void, remaining.len()) };
        if result > 0 {
            written += result as usize;
            continue;
        }
        if result == 0 {
            return Err(io::Error::new(io::ErrorKind::WriteZero, "write returned 0"));
        }

        let err = io::Error::last_os_error();
        match err.kind() {
            io::ErrorKind::Interrupted => continue,
            io::ErrorKind::WouldBlock => {
                poll_fd(fd, libc::POLLOUT, -1)?;
            }
            _ => return Err(err),
        }
    }
    Ok(())
}

#[cfg(unix)]
fn read_winsize(fd: c_int) -> Option<(u16, u16)> {
    let mut size = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut size) };
    if result == 0 && size.ws_col > 0 && size.ws_row > 0 {
        Some((size.ws_col, size.ws_row))
    } else {
        None
    }
}

/// Terminal over the process stdin/stdout file descriptors.
#[cfg(unix)]
pub struct ProcessTerminal {
    stdin_fd: c_int,
    stdout_fd: c_int,
    original_termios: Option<libc::termios>,
    write_log_path: Option<PathBuf>,
    write_log_failed: bool,
}

#[cfg(unix)]
impl ProcessTerminal {
    pub fn new() -> Self {
        Self {
            stdin_fd: libc::STDIN_FILENO,
            stdout_fd: libc::STDOUT_FILENO,
            original_termios: None,
            write_log_path: None,
            write_log_failed: false,
        }
    }

    /// Mirror every write into `path` (rendering forensics).
    pub fn set_write_log(&mut self, path: impl Into<PathBuf>) {
        self.write_log_path = Some(path.into());
        self.write_log_failed = false;
    }

    /// Captures the current (cooked) terminal attributes for out-of-band
    /// restoration from signal/panic hooks. Call before entering raw mode.
    pub fn restore_handle(&self) -> io::Result<RestoreHandle> {
        Ok(RestoreHandle {
            fd: self.stdin_fd,
            termios: get_termios(self.stdin_fd)?,
        })
    }
}

#[cfg(unix)]
impl Default for ProcessTerminal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
impl Terminal for ProcessTerminal {
    fn enter_raw(&mut self) -> io::Result<()> {
        if self.original_termios.is_none() {
            self.original_termios = Some(get_termios(self.stdin_fd)?);
        }
        let Some(original) = self.original_termios.as_ref() else {
            return Ok(());
        };
        let mut raw = *original;
        unsafe {
            libc::cfmakeraw(&mut raw);
        }
        set_termios(self.stdin_fd, &raw)
    }

    fn leave_raw(&mut self) -> io::Result<()> {
        // Flush pending input first so buffered bytes never leak to the shell.
        let _ = unsafe { libc::tcflush(self.stdin_fd, libc::TCIFLUSH) };
        if let Some(original) = self.original_termios.take() {
            set_termios(self.stdin_fd, &original)?;
        }
        Ok(())
    }

    fn read_byte(&mut self, timeout_ms: i32) -> io::Result<Option<u8>> {
        if !poll_fd(self.stdin_fd, libc::POLLIN, timeout_ms)? {
            return Ok(None);
        }

        let mut byte = 0u8;
        let result = unsafe { libc::read(self.stdin_fd, &mut byte as *mut u8 as *mut _, 1) };
        if result < 0 {
            let err = io::Error::last_os_error();
            if matches!(
                err.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
            ) {
                return Ok(None);
            }
            return Err(err);
        }
        if result == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input stream closed",
            ));
        }
        Ok(Some(byte))
    }

    fn write(&mut self, data: &str) -> io::Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        write_all_fd(self.stdout_fd, data.as_bytes())?;

        if self.write_log_failed {
            return Ok(());
        }
        if let Some(path) = self.write_log_path.as_ref() {
            let result = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .and_then(|mut file| file.write_all(data.as_bytes()));
            if result.is_err() {
                self.write_log_failed = true;
            }
        }
        Ok(())
    }

    fn columns(&self) -> u16 {
        read_winsize(self.stdout_fd)
            .map(|(cols, _)| cols)
            .unwrap_or(80)
    }

    fn rows(&self) -> u16 {
        read_winsize(self.stdout_fd)
            .map(|(_, rows)| rows)
            .unwrap_or(24)
    }
}

/// Everything a crash path needs to put the terminal back: the saved
/// cooked-mode attributes plus the fd they belong to.
#[cfg(unix)]
#[derive(Clone, Copy, Debug)]
pub struct RestoreHandle {
    fd: c_int,
    termios: libc::termios,
}

#[cfg(unix)]
impl RestoreHandle {
    /// Best-effort restoration: cooked mode, visible cursor, fresh line.
    pub fn restore(&self) {
        let _ = set_termios(self.fd, &self.termios);
        let bytes = b"\x1b[?25h\r\n";
        let _ = unsafe { libc::write(self.fd, bytes.as_ptr() as *const libc::c_void, bytes.len()) };
    }
}

/// Guard for the SIGINT/SIGTERM restore thread.
#[cfg(unix)]
pub struct SignalRestoreGuard {
    handle: signal_hook::iterator::Handle,
    thread: Option<JoinHandle<()>>,
}

#[cfg(unix)]
impl Drop for SignalRestoreGuard {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Installs a thread that restores the terminal and exits the process when
/// SIGINT or SIGTERM arrives while the UI owns raw mode.
#[cfg(unix)]
pub fn install_signal_restore(restore: RestoreHandle) -> io::Result<SignalRestoreGuard> {
    let mut signals = Signals::new([libc::SIGINT, libc::SIGTERM])?;
    let handle = signals.handle();
    let thread = thread::Builder::new()
        .name("signal-restore".to_string())
        .spawn(move || {
            for signal in signals.forever() {
                restore.restore();
                std::process::exit(128 + signal);
            }
        })?;

    Ok(SignalRestoreGuard {
        handle,
        thread: Some(thread),
    })
}

/// Wraps the current panic hook so the terminal is restored before the
/// default hook prints the panic report. Process-wide; install once.
#[cfg(unix)]
pub fn install_panic_restore(restore: RestoreHandle) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore.restore();
        previous(info);
    }));
}

#[cfg(not(unix))]
pub struct ProcessTerminal;

#[cfg(not(unix))]
impl ProcessTerminal {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(not(unix))]
impl Default for ProcessTerminal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(unix))]
impl ProcessTerminal {
    pub fn set_write_log(&mut self, _path: impl Into<PathBuf>) {}

    pub fn restore_handle(&self) -> io::Result<RestoreHandle> {
        Ok(RestoreHandle)
    }
}

/// Non-Unix placeholder; restoration is a no-op.
#[cfg(not(unix))]
#[derive(Clone, Copy)]
pub struct RestoreHandle;

#[cfg(not(unix))]
impl RestoreHandle {
    pub fn restore(&self) {}
}

#[cfg(not(unix))]
pub struct SignalRestoreGuard;

#[cfg(not(unix))]
pub fn install_signal_restore(_restore: RestoreHandle) -> io::Result<SignalRestoreGuard> {
    Ok(SignalRestoreGuard)
}

#[cfg(not(unix))]
pub fn install_panic_restore(_restore: RestoreHandle) {}

#[cfg(not(unix))]
impl Terminal for ProcessTerminal {
    fn enter_raw(&mut self) -> io::Result<()> {
        panic!("ProcessTerminal is only supported on Unix platforms");
    }

    fn leave_raw(&mut self) -> io::Result<()> {
        panic!("ProcessTerminal is only supported on Unix platforms");
    }

    fn read_byte(&mut self, _timeout_ms: i32) -> io::Result<Option<u8>> {
        panic!("ProcessTerminal is only supported on Unix platforms");
    }

    fn write(&mut self, _data: &str) -> io::Result<()> {
        panic!("ProcessTerminal is only supported on Unix platforms");
    }

    fn columns(&self) -> u16 {
        80
    }

    fn rows(&self) -> u16 {
        24
    }
}

//! Process-backed terminal I/O.

pub mod process_terminal;

pub use process_terminal::{
    install_panic_restore, install_signal_restore, ProcessTerminal, RestoreHandle,
};

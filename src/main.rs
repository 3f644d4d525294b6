use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;

use clap::Parser;

use termchat::core::transcript::DEFAULT_CAPACITY;
use termchat::runtime::ticker::STATUS_INTERVAL;
use termchat::{
    runtime, Backend, ChatSession, CommandRegistry, DebugLog, EnvConfig, Layout, MockBackend,
    ProcessTerminal, Sender, StatusProvider, StatusTicker, Terminal, Transcript,
};

#[derive(Debug, Parser)]
#[command(
    name = "termchat",
    about = "Terminal chat client with a persistent status bar and command autocomplete"
)]
struct Cli {
    /// Working directory to run in (also shown as the sandbox root).
    #[arg(long)]
    cwd: Option<PathBuf>,

    /// Allow host filesystem writes (banner only; enforcement is backend policy).
    #[arg(long)]
    allow_write: bool,

    /// Auto-apply write proposals (banner only).
    #[arg(long)]
    auto_apply: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(cwd) = &cli.cwd {
        if let Err(error) = std::env::set_current_dir(cwd) {
            eprintln!("failed to set --cwd {}: {error}", cwd.display());
            return ExitCode::FAILURE;
        }
    }

    match run_client(&cli) {
        Ok(()) => {
            println!("Goodbye.");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("terminal error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run_client(cli: &Cli) -> io::Result<()> {
    let config = EnvConfig::from_env();

    let mut terminal = ProcessTerminal::new();
    if let Some(path) = &config.write_log {
        terminal.set_write_log(path);
    }

    // Crash paths must hand the terminal back no matter where we die.
    let restore = terminal.restore_handle()?;
    let _signal_guard = termchat::platform::install_signal_restore(restore)?;
    termchat::platform::install_panic_restore(restore);

    let layout = Layout::new(terminal.columns(), terminal.rows());

    let mut transcript = Transcript::new(layout.wrap_width(), DEFAULT_CAPACITY);
    banner(&mut transcript, cli);

    let mut backend = MockBackend::cycling(
        "claude-sonnet-4",
        vec![
            "I hear you. (This build wires a canned backend; plug a live agent into the Backend trait.)".to_string(),
            "Still here — the status bar above keeps ticking while we talk.".to_string(),
        ],
    );

    let model_id = backend.model_label();
    let provider = StatusProvider::new(Box::new(move || Some(model_id.clone())));
    let (status_tx, status_rx) = mpsc::channel();
    let _ticker = StatusTicker::spawn(provider, status_tx, STATUS_INTERVAL)?;

    let mut session = ChatSession::new(
        terminal,
        layout,
        CommandRegistry::builtin(),
        transcript,
        status_rx,
        DebugLog::from_env(&config),
    )?;

    runtime::run(&mut session, &mut backend)
}

fn banner(transcript: &mut Transcript, cli: &Cli) {
    let root = std::env::current_dir()
        .map(|dir| dir.display().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    transcript.append(
        Sender::System,
        "termchat — type / to browse commands; Ctrl-C or Ctrl-D exits.",
    );
    transcript.append(
        Sender::System,
        "(Your text is yellow, agent responses are white)",
    );
    transcript.append(Sender::System, &format!("[sandbox] root: {root}"));
    transcript.append(
        Sender::System,
        &format!("[sandbox] write-enabled: {}", cli.allow_write),
    );
    transcript.append(
        Sender::System,
        &format!("[sandbox] auto-apply: {}", cli.auto_apply),
    );
}

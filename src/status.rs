//! Status line provider: live fields plus a TTL-cached branch lookup.

use std::env;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use chrono::Local;
use once_cell::sync::OnceCell;
use wait_timeout::ChildExt;

/// Separator between status fields.
pub const STATUS_SEPARATOR: &str = " | ";

/// Label shown when no model selection is available.
pub const DEFAULT_MODEL_LABEL: &str = "Sonnet 4";

/// How long a branch lookup stays valid for an unchanged working path.
const BRANCH_CACHE_TTL: Duration = Duration::from_secs(5);

/// Upper bound on each git subprocess.
const GIT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Supplies the backend's last model selection, if any.
pub type ModelLabelFn = Box<dyn Fn() -> Option<String> + Send>;

/// Composes the status line. Every sub-lookup degrades to a fixed
/// fallback; `current_status` never fails.
pub struct StatusProvider {
    model_label: ModelLabelFn,
    hostname: OnceCell<String>,
    branch_cache: GitBranchCache,
}

impl StatusProvider {
    pub fn new(model_label: ModelLabelFn) -> Self {
        Self::with_git_binary(model_label, "git")
    }

    pub fn with_git_binary(model_label: ModelLabelFn, git_binary: impl Into<PathBuf>) -> Self {
        Self {
            model_label,
            hostname: OnceCell::new(),
            branch_cache: GitBranchCache::new(git_binary, BRANCH_CACHE_TTL),
        }
    }

    /// TIME | HOST | MODEL | FOLDER | BRANCH (inside a repo) | PATH.
    pub fn current_status(&mut self) -> String {
        let cwd = env::current_dir().ok();

        let mut fields = vec![
            format!("TIME {}", current_time()),
            format!("HOST {}", self.hostname()),
            format!("MODEL {}", self.model_label()),
            format!("FOLDER {}", folder_name(cwd.as_deref())),
        ];

        if let Some(dir) = cwd.as_deref() {
            if let Some(branch) = self.branch_cache.branch(dir) {
                fields.push(format!("BRANCH {branch}"));
            }
        }

        fields.push(format!("PATH {}", full_path(cwd.as_deref())));
        fields.join(STATUS_SEPARATOR)
    }

    /// Re-runs the branch probe immediately, bypassing the TTL.
    pub fn refresh_branch(&mut self) {
        if let Ok(dir) = env::current_dir() {
            self.branch_cache.branch_forced(&dir);
        }
    }

    fn hostname(&self) -> &str {
        self.hostname.get_or_init(read_hostname)
    }

    fn model_label(&self) -> String {
        match (self.model_label)() {
            Some(raw) => friendly_model_label(&raw),
            None => DEFAULT_MODEL_LABEL.to_string(),
        }
    }
}

fn current_time() -> String {
    Local::now().format("%I:%M:%S %p").to_string()
}

fn folder_name(cwd: Option<&Path>) -> String {
    cwd.and_then(|dir| dir.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}

fn full_path(cwd: Option<&Path>) -> String {
    cwd.map(|dir| dir.display().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(unix)]
fn read_hostname() -> String {
    let mut buf = [0u8; 256];
    let result = unsafe { libc::gethostname(buf.as_mut_ptr() as *mut libc::c_char, buf.len()) };
    if result != 0 {
        return "unknown".to_string();
    }
    let end = buf.iter().position(|&byte| byte == 0).unwrap_or(buf.len());
    match std::str::from_utf8(&buf[..end]) {
        Ok(name) if !name.is_empty() => name.to_string(),
        _ => "unknown".to_string(),
    }
}

#[cfg(not(unix))]
fn read_hostname() -> String {
    "unknown".to_string()
}

/// Maps a raw model identifier to the short label shown in the status bar.
pub fn friendly_model_label(raw: &str) -> String {
    let lower = raw.to_lowercase();
    let label = if lower.contains("claude") {
        if lower.contains("sonnet") {
            "Sonnet 4"
        } else if lower.contains("haiku") {
            "Haiku 3.5"
        } else {
            "Claude"
        }
    } else if lower.contains("gpt-5") {
        "GPT-5"
    } else if lower.contains("gpt-4") {
        "GPT-4"
    } else if lower.contains("gpt") {
        "GPT"
    } else if lower.contains("gemini") {
        "Gemini"
    } else {
        "AI Model"
    };
    label.to_string()
}

#[derive(Debug, Clone)]
struct CachedBranch {
    branch: Option<String>,
    path: PathBuf,
    checked_at: Instant,
}

/// Branch lookup behind a TTL keyed by working path.
///
/// The cache entry is replaced wholesale on each refresh; a negative
/// result (not inside a repository) is cached the same as a branch name.
#[derive(Debug)]
pub struct GitBranchCache {
    git_binary: PathBuf,
    ttl: Duration,
    cached: Option<CachedBranch>,
}

impl GitBranchCache {
    pub fn new(git_binary: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            git_binary: git_binary.into(),
            ttl,
            cached: None,
        }
    }

    /// Cached branch for `cwd`; probes when the path changed or the TTL
    /// elapsed.
    pub fn branch(&mut self, cwd: &Path) -> Option<String> {
        if let Some(cached) = self.cached.as_ref() {
            if cached.path == cwd && cached.checked_at.elapsed() < self.ttl {
                return cached.branch.clone();
            }
        }
        self.branch_forced(cwd)
    }

    /// Probes now and replaces the cache entry, ignoring the TTL.
    pub fn branch_forced(&mut self, cwd: &Path) -> Option<String> {
        let branch = probe_branch(&self.git_binary, cwd);
        self.cached = Some(CachedBranch {
            branch: branch.clone(),
            path: cwd.to_path_buf(),
            checked_at: Instant::now(),
        });
        branch
    }
}

fn probe_branch(git_binary: &Path, cwd: &Path) -> Option<String> {
    run_git(git_binary, cwd, &["rev-parse", "--is-inside-work-tree"])?;

    let branch = run_git(git_binary, cwd, &["branch", "--show-current"])?;
    let branch = branch.trim();
    if branch.is_empty() {
        None
    } else {
        Some(branch.to_string())
    }
}

/// Runs one git subprocess under the probe timeout; `None` on spawn
/// failure, non-zero exit, or timeout.
fn run_git(git_binary: &Path, cwd: &Path, args: &[&str]) -> Option<String> {
    let mut child = Command::new(git_binary)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .ok()?;

    let status = match child.wait_timeout(GIT_PROBE_TIMEOUT) {
        Ok(Some(status)) => status,
        Ok(None) | Err(_) => {
            let _ = child.kill();
            let _ = child.wait();
            return None;
        }
    };

    if !status.success() {
        return None;
    }

    let mut output = String::new();
    if let Some(mut stdout) = child.stdout.take() {
        let _ = stdout.read_to_string(&mut output);
    }
    Some(output)
}

//! Background status refresh task.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::status::StatusProvider;

/// Default recompute interval.
pub const STATUS_INTERVAL: Duration = Duration::from_secs(1);

/// Granularity of the stop-flag check while sleeping between ticks.
const STOP_POLL: Duration = Duration::from_millis(100);

/// Recomputes the status string on an interval and sends each result over
/// a channel; it never touches the terminal itself.
///
/// The first tick fires immediately so the status bar fills in on startup.
/// Dropping the ticker stops the thread and joins it.
pub struct StatusTicker {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl StatusTicker {
    pub fn spawn(
        mut provider: StatusProvider,
        tx: Sender<String>,
        interval: Duration,
    ) -> io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let thread = thread::Builder::new()
            .name("status-refresh".to_string())
            .spawn(move || {
                while !stop_flag.load(Ordering::SeqCst) {
                    if tx.send(provider.current_status()).is_err() {
                        break;
                    }

                    let mut waited = Duration::ZERO;
                    while waited < interval {
                        if stop_flag.load(Ordering::SeqCst) {
                            return;
                        }
                        let step = STOP_POLL.min(interval - waited);
                        thread::sleep(step);
                        waited += step;
                    }
                }
            })?;

        Ok(Self {
            stop,
            thread: Some(thread),
        })
    }
}

impl Drop for StatusTicker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

//! Progress reporting on a one-second tick.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{Duration, interval};

use super::events::EventSink;
use super::frontier::Frontier;
use super::job::CrawlJob;

/// Spawn the reporter task.
///
/// Emits one advisory line per second to the event channel and the log
/// sink; ends when the job is cancelled or the work runs out.
pub fn spawn_reporter(
    job: Arc<CrawlJob>,
    frontier: Arc<Frontier>,
    events: EventSink,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let cancel = job.cancel_token();
        let done = job.work_done_token();
        let mut ticker = interval(Duration::from_secs(1));
        let mut last_bytes = job.stats.bytes();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let bytes = job.stats.bytes();
                    let kbps = (bytes.saturating_sub(last_bytes)) as f64 / 1024.0;
                    last_bytes = bytes;

                    let line = format!(
                        "Файлов: {} | Скорость: {:.1} KB/s | В очереди: {}",
                        job.stats.files(),
                        kbps,
                        frontier.len()
                    );
                    log::info!("{line}");
                    events.emit(line);
                }
                () = cancel.cancelled() => break,
                () = done.cancelled() => break,
            }
        }
    })
}

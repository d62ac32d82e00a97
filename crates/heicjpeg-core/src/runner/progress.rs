/// Run events: lightweight messages sent from the runner thread to the
/// host via a crossbeam channel.
///
/// All three kinds (progress, status, completion) travel on one channel so
/// the host observes them in exactly the order they were emitted. Payloads
/// are structured; turning them into text is the host's job.
use serde::Serialize;
use std::path::PathBuf;

/// One message from the runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum RunEvent {
    /// Percent of items processed, `0..=100`, non-decreasing within a run.
    Progress { percent: u8 },
    /// A status line.
    Status(StatusEvent),
    /// Terminal signal. Sent exactly once per run, on every exit path.
    Finished,
}

/// Everything the runner reports besides progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatusEvent {
    /// Batch run started on this folder.
    InputFolder { path: PathBuf },
    /// Batch classification counts.
    FilesFound { images: usize, others: usize },
    /// The input folder had nothing to process.
    NoFilesFound,
    /// Batch output folder chosen and created.
    OutputFolder { path: PathBuf },
    Copied { name: String },
    CopyFailed { name: String, cause: String },
    Converted { name: String },
    ConvertFailed { name: String, cause: String },
    /// Single-file conversion wrote `output`.
    SingleConverted { output: PathBuf },
    SingleFailed { name: String, cause: String },
    /// Single-file input does not have a `.heic`/`.heif` extension.
    InvalidFileType { path: PathBuf },
    /// Batch run finished; everything was written under `output`.
    Complete { output: PathBuf },
    /// The host cancelled the run between items.
    Cancelled { processed: usize, total: usize },
    /// The run aborted.
    Fatal { message: String },
}

impl StatusEvent {
    /// `true` for the one-per-item lines (success or scoped failure).
    pub fn is_item_line(&self) -> bool {
        matches!(
            self,
            Self::Copied { .. }
                | Self::CopyFailed { .. }
                | Self::Converted { .. }
                | Self::ConvertFailed { .. }
        )
    }
}

/// Callback-style subscription to a run's events.
///
/// Every method defaults to a no-op so observers only implement what they
/// render.
pub trait RunObserver {
    fn on_progress(&mut self, _percent: u8) {}
    fn on_status(&mut self, _status: &StatusEvent) {}
    fn on_finished(&mut self) {}
}

impl RunEvent {
    /// Hand this event to the matching observer callback.
    pub fn dispatch<O: RunObserver + ?Sized>(&self, observer: &mut O) {
        match self {
            Self::Progress { percent } => observer.on_progress(*percent),
            Self::Status(status) => observer.on_status(status),
            Self::Finished => observer.on_finished(),
        }
    }
}

/// Percent complete after `done` of `total` items, floored.
pub fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    (done.min(total) * 100 / total) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_floors() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 66);
        assert_eq!(percent(3, 3), 100);
        assert_eq!(percent(1, 7), 14);
        assert_eq!(percent(0, 5), 0);
    }

    #[test]
    fn test_percent_bounds() {
        assert_eq!(percent(0, 0), 100);
        assert_eq!(percent(9, 4), 100);
    }

    #[test]
    fn test_item_lines() {
        assert!(StatusEvent::Copied { name: "a".into() }.is_item_line());
        assert!(StatusEvent::ConvertFailed {
            name: "a".into(),
            cause: "b".into()
        }
        .is_item_line());
        assert!(!StatusEvent::NoFilesFound.is_item_line());
        assert!(!StatusEvent::Complete {
            output: PathBuf::from("x")
        }
        .is_item_line());
    }

    #[derive(Default)]
    struct Recorder {
        log: Vec<String>,
    }

    impl RunObserver for Recorder {
        fn on_progress(&mut self, percent: u8) {
            self.log.push(format!("p{percent}"));
        }
        fn on_finished(&mut self) {
            self.log.push("done".into());
        }
    }

    #[test]
    fn test_dispatch_routes_events() {
        let mut rec = Recorder::default();
        RunEvent::Progress { percent: 50 }.dispatch(&mut rec);
        RunEvent::Status(StatusEvent::NoFilesFound).dispatch(&mut rec);
        RunEvent::Finished.dispatch(&mut rec);
        assert_eq!(rec.log, vec!["p50", "done"]);
    }
}

/// Runner module: orchestrates one conversion run on a background thread.
///
/// The host calls [`ConversionRunner::start_run`] and receives a
/// [`RunHandle`] whose channel carries every [`RunEvent`] in emission order.
/// At most one run is in flight per runner; a second start request while
/// one is active is refused without side effects.
///
/// Every exit path of the worker, including a panic inside a codec, ends
/// with exactly one [`RunEvent::Finished`].
pub mod progress;
pub mod state;

use crate::classifier::classify;
use crate::convert::ItemConverter;
use crate::error::{RunError, StartError};
use crate::locator::{batch_parent, create_batch_output, locate_single};
use crate::model::{is_convertible, ClassifiedEntry, ConversionRequest, EntryKind, RunMode};
use progress::{percent, RunEvent, RunObserver, StatusEvent};
use state::RunState;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info, warn};

/// Maximum number of events that may queue up before the runner blocks.
///
/// A run emits roughly two events per item, so this covers a couple of
/// thousand files before a host that stopped draining stalls the worker
/// instead of growing the queue without bound.
pub const EVENT_CHANNEL_CAPACITY: usize = 4_096;

/// Handle to a running or finished run.
pub struct RunHandle {
    /// Receiver for run events, in emission order.
    pub events: Receiver<RunEvent>,
    /// Flag to request cancellation.
    cancel_flag: Arc<AtomicBool>,
    /// Join handle for the runner thread.
    _thread: Option<thread::JoinHandle<()>>,
}

impl RunHandle {
    /// Ask the run to stop before its next item. The item in progress
    /// always finishes.
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::Relaxed)
    }

    /// Block, delivering each event to `observer` until the run finishes.
    ///
    /// Returns early if the runner thread vanished without finishing.
    pub fn forward_to<O: RunObserver + ?Sized>(&self, observer: &mut O) {
        while let Ok(event) = self.events.recv() {
            event.dispatch(observer);
            if event == RunEvent::Finished {
                break;
            }
        }
    }
}

/// Owns the run guard and the item converter shared by every run.
pub struct ConversionRunner {
    converter: ItemConverter,
    state: Arc<Mutex<RunState>>,
}

impl Default for ConversionRunner {
    fn default() -> Self {
        Self::new(ItemConverter::default())
    }
}

impl ConversionRunner {
    pub fn new(converter: ItemConverter) -> Self {
        Self {
            converter,
            state: Arc::new(Mutex::new(RunState::Idle)),
        }
    }

    /// Current state of the most recent run.
    pub fn state(&self) -> RunState {
        *self.state.lock()
    }

    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    /// Start a new run on a background thread.
    ///
    /// Fails with [`StartError::AlreadyRunning`] (and touches nothing) while
    /// a previous run is still active.
    pub fn start_run(&self, request: ConversionRequest) -> Result<RunHandle, StartError> {
        {
            let mut state = self.state.lock();
            if state.is_active() {
                info!(
                    "Ignoring request for {}: a run is already active",
                    request.input_path().display()
                );
                return Err(StartError::AlreadyRunning);
            }
            *state = match request.mode() {
                RunMode::Batch => RunState::Scanning,
                RunMode::Single => RunState::Processing,
            };
        }

        let (events_tx, events_rx) = crossbeam_channel::bounded::<RunEvent>(EVENT_CHANNEL_CAPACITY);
        let cancel_flag = Arc::new(AtomicBool::new(false));
        let cancel_clone = cancel_flag.clone();
        let state_clone = self.state.clone();
        let converter = self.converter.clone();

        let spawned = thread::Builder::new()
            .name("heicjpeg-runner".into())
            .spawn(move || {
                let worker = Worker {
                    converter,
                    state: state_clone,
                    events: events_tx,
                    cancel_flag: cancel_clone,
                };
                worker.run(request);
            });

        match spawned {
            Ok(thread) => Ok(RunHandle {
                events: events_rx,
                cancel_flag,
                _thread: Some(thread),
            }),
            Err(err) => {
                error!("Failed to spawn runner thread: {err}");
                *self.state.lock() = RunState::Idle;
                Err(StartError::Spawn(err))
            }
        }
    }
}

/// Everything the background thread needs for one run.
struct Worker {
    converter: ItemConverter,
    state: Arc<Mutex<RunState>>,
    events: Sender<RunEvent>,
    cancel_flag: Arc<AtomicBool>,
}

impl Worker {
    fn run(self, request: ConversionRequest) {
        info!(
            "Starting {:?} run on {}",
            request.mode(),
            request.input_path().display()
        );

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.execute(&request)));
        let terminal = match outcome {
            Ok(Ok(terminal)) => terminal,
            Ok(Err(err)) => {
                warn!("Run failed: {err}");
                self.status(StatusEvent::Fatal {
                    message: err.to_string(),
                });
                RunState::Failed
            }
            Err(payload) => {
                let err = RunError::Unexpected(panic_message(payload.as_ref()));
                error!("Run aborted: {err}");
                self.status(StatusEvent::Fatal {
                    message: err.to_string(),
                });
                RunState::Failed
            }
        };

        // Release the guard first so a host reacting to `Finished` can
        // start the next run straight away.
        self.transition(terminal);
        info!("Run finished: {terminal:?}");
        self.send(RunEvent::Finished);
    }

    fn execute(&self, request: &ConversionRequest) -> Result<RunState, RunError> {
        match request.mode() {
            RunMode::Single => Ok(self.run_single(request.input_path())),
            RunMode::Batch => self.run_batch(request.input_path()),
        }
    }

    fn run_single(&self, path: &Path) -> RunState {
        if !is_convertible(path) {
            warn!("Rejecting {}: not a HEIC/HEIF file", path.display());
            self.status(StatusEvent::InvalidFileType {
                path: path.to_path_buf(),
            });
            return RunState::Rejected;
        }

        self.transition(RunState::Processing);
        let output = locate_single(path);
        match self.converter.convert_image(path, &output) {
            Ok(()) => self.status(StatusEvent::SingleConverted { output }),
            Err(err) => {
                warn!("Conversion failed: {err}");
                self.status(StatusEvent::SingleFailed {
                    name: err.name().to_string(),
                    cause: err.to_string(),
                });
            }
        }
        // 100 means "attempt finished", whatever the outcome.
        self.progress(100);
        RunState::Completed
    }

    fn run_batch(&self, input: &Path) -> Result<RunState, RunError> {
        self.transition(RunState::Scanning);
        self.status(StatusEvent::InputFolder {
            path: input.to_path_buf(),
        });

        let classification = classify(input)?;
        self.status(StatusEvent::FilesFound {
            images: classification.images.len(),
            others: classification.others.len(),
        });
        if classification.is_empty() {
            info!("Nothing to process in {}", input.display());
            self.status(StatusEvent::NoFilesFound);
            return Ok(RunState::Completed);
        }

        self.transition(RunState::Locating);
        let target = create_batch_output(&batch_parent(input))?;
        info!("Writing output to {}", target.path.display());
        self.status(StatusEvent::OutputFolder {
            path: target.path.clone(),
        });

        self.transition(RunState::Processing);
        let total = classification.total();
        // Copies first: they are cheap and give early feedback.
        let work = classification
            .others
            .iter()
            .chain(classification.images.iter());
        for (done, entry) in work.enumerate() {
            if self.cancel_flag.load(Ordering::Relaxed) {
                info!("Run cancelled after {done} of {total} items");
                self.status(StatusEvent::Cancelled {
                    processed: done,
                    total,
                });
                return Ok(RunState::Cancelled);
            }
            let line = self.process_entry(entry, &target.path);
            self.status(line);
            self.progress(percent(done + 1, total));
        }

        self.status(StatusEvent::Complete {
            output: target.path,
        });
        Ok(RunState::Completed)
    }

    /// Copy or convert one entry into `out_dir`; never fails the run.
    fn process_entry(&self, entry: &ClassifiedEntry, out_dir: &Path) -> StatusEvent {
        let Some(file_name) = entry.path.file_name() else {
            return StatusEvent::CopyFailed {
                name: entry.name.clone(),
                cause: "entry has no file name".to_string(),
            };
        };

        match entry.kind {
            EntryKind::PassThrough => {
                let dest = out_dir.join(file_name);
                match self.converter.copy_file(&entry.path, &dest) {
                    Ok(()) => {
                        debug!("Copied {}", entry.name);
                        StatusEvent::Copied {
                            name: entry.name.clone(),
                        }
                    }
                    Err(err) => {
                        warn!("Copy failed: {err}");
                        StatusEvent::CopyFailed {
                            name: entry.name.clone(),
                            cause: err.source.to_string(),
                        }
                    }
                }
            }
            EntryKind::ConvertibleImage => {
                let dest = locate_single(&out_dir.join(file_name));
                match self.converter.convert_image(&entry.path, &dest) {
                    Ok(()) => StatusEvent::Converted {
                        name: entry.name.clone(),
                    },
                    Err(err) => {
                        warn!("Conversion failed: {err}");
                        StatusEvent::ConvertFailed {
                            name: entry.name.clone(),
                            cause: err.to_string(),
                        }
                    }
                }
            }
        }
    }

    fn transition(&self, to: RunState) {
        let mut state = self.state.lock();
        debug!("Run state {:?} -> {to:?}", *state);
        *state = to;
    }

    fn status(&self, status: StatusEvent) {
        self.send(RunEvent::Status(status));
    }

    fn progress(&self, percent: u8) {
        self.send(RunEvent::Progress { percent });
    }

    /// A host that dropped its receiver no longer cares; keep going so the
    /// filesystem work still completes.
    fn send(&self, event: RunEvent) {
        let _ = self.events.send(event);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

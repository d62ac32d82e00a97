/// Host state management.
///
/// Centralises the state a frontend reads and writes: the current
/// selection, whether a run may start, the latest progress and status.
/// The runner thread communicates via its event channel; state updates
/// happen in [`HostState::process_run_messages`], which the frontend calls
/// on every tick.
use crate::strings::{self, Language};
use heicjpeg_core::classifier::classify;
use heicjpeg_core::error::StartError;
use heicjpeg_core::model::is_convertible;
use heicjpeg_core::runner::progress::{RunEvent, RunObserver, StatusEvent};
use heicjpeg_core::runner::state::RunState;
use heicjpeg_core::{ConversionRequest, ConversionRunner, RunHandle, RunMode};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// The current phase of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPhase {
    /// Nothing valid selected; start is disabled.
    Idle,
    /// A valid file or folder is selected; start is enabled.
    Ready,
    /// A run is in flight; selection and start are disabled.
    Converting,
}

/// What is currently shown on the status line, kept structured so a
/// language switch can re-render it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
    StartPrompt,
    ReadyToConvert(PathBuf),
    InvalidFile,
    UnreadableFolder(PathBuf),
    FolderCounts { images: usize, others: usize },
    Run(StatusEvent),
}

/// A validated input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub path: PathBuf,
    pub mode: RunMode,
}

/// Maximum run events drained per tick.
///
/// Keeps a backlog from starving the frontend's own work; the rest is
/// picked up on the next tick.
const MAX_MESSAGES_PER_TICK: usize = 300;

/// All host state.
pub struct HostState {
    pub phase: HostPhase,
    pub language: Language,
    pub selection: Option<Selection>,
    pub progress: u8,
    pub message: StatusMessage,
    /// Items that failed to copy or convert in the current run.
    pub item_error_count: usize,
    runner: ConversionRunner,
    run_handle: Option<RunHandle>,
}

impl HostState {
    pub fn new(runner: ConversionRunner, language: Language) -> Self {
        Self {
            phase: HostPhase::Idle,
            language,
            selection: None,
            progress: 0,
            message: StatusMessage::StartPrompt,
            item_error_count: 0,
            runner,
            run_handle: None,
        }
    }

    /// The status line in the current language.
    pub fn status_text(&self) -> String {
        let lang = self.language;
        match &self.message {
            StatusMessage::StartPrompt => strings::start_prompt(lang),
            StatusMessage::ReadyToConvert(path) => strings::ready_to_convert(lang, path),
            StatusMessage::InvalidFile => strings::invalid_file(lang),
            StatusMessage::UnreadableFolder(path) => strings::unreadable_folder(lang, path),
            StatusMessage::FolderCounts { images, others } => {
                strings::found_files(lang, *images, *others)
            }
            StatusMessage::Run(status) => strings::render_status(lang, status),
        }
    }

    pub fn can_start(&self) -> bool {
        self.phase == HostPhase::Ready
    }

    pub fn is_converting(&self) -> bool {
        self.phase == HostPhase::Converting
    }

    /// State of the most recent run.
    pub fn run_state(&self) -> RunState {
        self.runner.state()
    }

    /// Select `path`, choosing the mode from the filesystem when `mode` is
    /// `None`: an existing directory is a folder, anything else a file.
    pub fn select(&mut self, path: PathBuf, mode: Option<RunMode>) -> bool {
        let mode = mode.unwrap_or(if path.is_dir() {
            RunMode::Batch
        } else {
            RunMode::Single
        });
        match mode {
            RunMode::Single => self.select_file(path),
            RunMode::Batch => self.select_folder(path),
        }
    }

    /// Select one image. Only `.heic`/`.heif` names are accepted.
    pub fn select_file(&mut self, path: PathBuf) -> bool {
        if self.is_converting() {
            return false;
        }
        if !is_convertible(&path) {
            info!("Rejected selection {}: not a HEIC/HEIF file", path.display());
            self.selection = None;
            self.phase = HostPhase::Idle;
            self.message = StatusMessage::InvalidFile;
            return false;
        }
        self.progress = 0;
        self.message = StatusMessage::ReadyToConvert(path.clone());
        self.selection = Some(Selection {
            path,
            mode: RunMode::Single,
        });
        self.phase = HostPhase::Ready;
        true
    }

    /// Select a folder and show how many images and other files it holds.
    pub fn select_folder(&mut self, path: PathBuf) -> bool {
        if self.is_converting() {
            return false;
        }
        match count_files(&path) {
            Some((images, others)) => {
                self.progress = 0;
                self.message = StatusMessage::FolderCounts { images, others };
                self.selection = Some(Selection {
                    path,
                    mode: RunMode::Batch,
                });
                self.phase = HostPhase::Ready;
                true
            }
            None => {
                self.selection = None;
                self.phase = HostPhase::Idle;
                self.message = StatusMessage::UnreadableFolder(path);
                false
            }
        }
    }

    /// Switch language and refresh the status line. A selected folder is
    /// recounted, since its contents may have changed.
    pub fn switch_language(&mut self) {
        self.language = self.language.toggled();
        if self.is_converting() {
            return;
        }
        if let Some(Selection {
            path,
            mode: RunMode::Batch,
        }) = &self.selection
        {
            if let Some((images, others)) = count_files(path) {
                self.message = StatusMessage::FolderCounts { images, others };
            }
        } else if self.selection.is_none()
            && !matches!(self.message, StatusMessage::UnreadableFolder(_))
        {
            self.message = StatusMessage::StartPrompt;
        }
    }

    /// Start converting the current selection.
    ///
    /// Returns `false` (and changes nothing) without a selection or while a
    /// run is in flight.
    pub fn start_conversion(&mut self) -> bool {
        if !self.can_start() {
            return false;
        }
        let Some(selection) = &self.selection else {
            return false;
        };
        let request = ConversionRequest::new(selection.path.clone(), selection.mode);

        match self.runner.start_run(request) {
            Ok(handle) => {
                self.phase = HostPhase::Converting;
                self.progress = 0;
                self.item_error_count = 0;
                self.run_handle = Some(handle);
                true
            }
            Err(StartError::AlreadyRunning) => false,
            Err(err) => {
                warn!("Could not start conversion: {err}");
                self.message = StatusMessage::Run(StatusEvent::Fatal {
                    message: err.to_string(),
                });
                false
            }
        }
    }

    /// Ask the active run to stop after its current item.
    pub fn cancel_conversion(&mut self) {
        if let Some(handle) = &self.run_handle {
            handle.cancel();
        }
    }

    /// Drain pending run events, update state, and forward each event to
    /// `observer`. Called once per tick.
    ///
    /// Returns `true` if anything arrived.
    pub fn process_run_messages<O: RunObserver + ?Sized>(&mut self, observer: &mut O) -> bool {
        let mut received = false;
        let mut messages_this_tick = 0usize;
        while messages_this_tick < MAX_MESSAGES_PER_TICK {
            let Some(handle) = &self.run_handle else {
                break;
            };
            let event = match handle.events.try_recv() {
                Ok(e) => e,
                Err(crossbeam_channel::TryRecvError::Empty) => break,
                Err(crossbeam_channel::TryRecvError::Disconnected) => {
                    warn!("Runner disconnected without finishing");
                    self.finish_run();
                    break;
                }
            };
            messages_this_tick += 1;
            received = true;

            match &event {
                RunEvent::Progress { percent } => self.progress = *percent,
                RunEvent::Status(status) => {
                    if matches!(
                        status,
                        StatusEvent::CopyFailed { .. }
                            | StatusEvent::ConvertFailed { .. }
                            | StatusEvent::SingleFailed { .. }
                    ) {
                        self.item_error_count += 1;
                    }
                    self.message = StatusMessage::Run(status.clone());
                }
                RunEvent::Finished => self.finish_run(),
            }
            event.dispatch(observer);
        }
        received
    }

    /// Re-enable selection and start, keeping the selection for another go.
    fn finish_run(&mut self) {
        self.run_handle = None;
        self.phase = if self.selection.is_some() {
            HostPhase::Ready
        } else {
            HostPhase::Idle
        };
        info!(
            "Conversion finished with {} item error(s)",
            self.item_error_count
        );
    }
}

/// Count images and other files directly inside `dir`.
fn count_files(dir: &Path) -> Option<(usize, usize)> {
    match classify(dir) {
        Ok(c) => Some((c.images.len(), c.others.len())),
        Err(err) => {
            warn!("Cannot count files: {err}");
            None
        }
    }
}

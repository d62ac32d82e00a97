/// heicjpeg Core: the batch HEIC/HEIF to JPEG conversion pipeline.
///
/// This crate contains all conversion logic with zero UI dependencies.
/// Hosts (terminal, GUI, service) start a run, subscribe to its event
/// channel and render what they receive.
///
/// # Modules
///
/// - [`model`]: Requests, classified entries and the convertible-extension rule.
/// - [`classifier`]: Partitions a directory listing into images and pass-through files.
/// - [`locator`]: Chooses non-colliding output locations.
/// - [`convert`]: Per-item HEIF decode / JPEG encode and pass-through copy.
/// - [`runner`]: Background orchestration, run guard and the ordered event stream.
/// - [`error`]: Error taxonomy shared by the modules above.
pub mod classifier;
pub mod convert;
pub mod error;
pub mod locator;
pub mod model;
pub mod runner;

pub use model::{ConversionRequest, RunMode};
pub use runner::{ConversionRunner, RunHandle};

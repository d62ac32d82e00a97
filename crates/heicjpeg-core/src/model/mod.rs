/// Data model for a single conversion run.
///
/// Everything here is created and consumed within one run; nothing persists.
pub mod entry;
pub mod request;

pub use entry::{is_convertible, ClassifiedEntry, Classification, EntryKind, CONVERTIBLE_EXTENSIONS};
pub use request::{ConversionRequest, RunMode};

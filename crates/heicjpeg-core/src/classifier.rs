/// Directory classifier: partitions the direct children of the input
/// folder into convertible images and pass-through files.
///
/// Non-recursive: sub-directories (including symlinks that resolve to one)
/// are skipped entirely. Both output sequences keep the order the OS
/// enumerated them in; that order is not stable across platforms.
use crate::error::ClassifyError;
use crate::model::{ClassifiedEntry, Classification};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Classify every non-directory child of `dir`.
pub fn classify(dir: &Path) -> Result<Classification, ClassifyError> {
    if !dir.is_dir() {
        return Err(ClassifyError::NotADirectory(dir.to_path_buf()));
    }

    let read_dir = fs::read_dir(dir).map_err(|source| ClassifyError::Unreadable {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut classification = Classification::default();
    for entry_result in read_dir {
        let entry = match entry_result {
            Ok(e) => e,
            Err(err) => {
                // A vanished entry mid-listing is not worth failing the run over.
                warn!("Skipping unreadable entry in {}: {err}", dir.display());
                continue;
            }
        };

        let path = entry.path();
        // `is_dir` follows symlinks, matching how the entry would be opened.
        if path.is_dir() {
            debug!("Skipping sub-directory {}", path.display());
            continue;
        }
        classification.push(ClassifiedEntry::new(path));
    }

    debug!(
        "Classified {}: {} images, {} other files",
        dir.display(),
        classification.images.len(),
        classification.others.len()
    );
    Ok(classification)
}

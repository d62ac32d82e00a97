/// Output location selection.
///
/// Single mode writes next to the source; batch mode mints a fresh sibling
/// folder named `converted_imgs`, `converted_imgs1`, `converted_imgs2`, …
/// (first free suffix, unbounded). That naming is the one on-disk artifact
/// other tools may depend on, so it must not change.
use crate::error::LocateError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Base name of the batch output folder.
pub const OUTPUT_DIR_BASE: &str = "converted_imgs";

/// A chosen, created output location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub path: PathBuf,
    pub is_new_directory: bool,
}

/// Where a single converted file goes: same directory, same stem, `.jpg`.
///
/// No existence check; an existing file at that path is overwritten.
pub fn locate_single(file: &Path) -> PathBuf {
    file.with_extension("jpg")
}

/// The directory batch output is placed in: the input folder's parent, or
/// the input folder itself when it has none (a filesystem root).
pub fn batch_parent(input_dir: &Path) -> PathBuf {
    match input_dir.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        Some(_) => PathBuf::from("."),
        None => input_dir.to_path_buf(),
    }
}

/// Name of the `n`th candidate output folder (`n == 0` has no suffix).
pub fn output_dir_name(n: u64) -> String {
    if n == 0 {
        OUTPUT_DIR_BASE.to_string()
    } else {
        format!("{OUTPUT_DIR_BASE}{n}")
    }
}

/// An output folder that was free when checked but is not created yet.
#[derive(Debug)]
pub struct PendingDirectory {
    path: PathBuf,
}

impl PendingDirectory {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the folder. Non-recursive and exclusive: fails if anything
    /// appeared at the path since it was checked.
    pub fn create(self) -> io::Result<OutputTarget> {
        fs::create_dir(&self.path)?;
        Ok(OutputTarget {
            path: self.path,
            is_new_directory: true,
        })
    }
}

/// Scan `parent` for the first unused output folder name.
///
/// A path counts as used if anything at all is there, including a broken
/// symlink.
pub fn locate_batch(parent: &Path) -> PendingDirectory {
    let mut n = 0u64;
    loop {
        let candidate = parent.join(output_dir_name(n));
        if fs::symlink_metadata(&candidate).is_err() {
            debug!("Output folder candidate {} is free", candidate.display());
            return PendingDirectory { path: candidate };
        }
        n += 1;
    }
}

/// Find and create the batch output folder.
///
/// If another process claims the chosen name between lookup and creation,
/// the lookup is repeated once; any other failure, or a second collision,
/// is returned as [`LocateError::DirectoryCreateFailed`].
pub fn create_batch_output(parent: &Path) -> Result<OutputTarget, LocateError> {
    create_batch_output_with(parent, locate_batch)
}

/// [`create_batch_output`] with the lookup step supplied by the caller.
pub(crate) fn create_batch_output_with<F>(
    parent: &Path,
    mut lookup: F,
) -> Result<OutputTarget, LocateError>
where
    F: FnMut(&Path) -> PendingDirectory,
{
    let pending = lookup(parent);
    let first_path = pending.path().to_path_buf();
    match pending.create() {
        Ok(target) => Ok(target),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            warn!(
                "Output folder {} appeared before it could be created, looking again",
                first_path.display()
            );
            let retry = lookup(parent);
            let path = retry.path().to_path_buf();
            retry
                .create()
                .map_err(|source| LocateError::DirectoryCreateFailed { path, source })
        }
        Err(source) => Err(LocateError::DirectoryCreateFailed {
            path: first_path,
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_locate_single_forces_jpg() {
        assert_eq!(
            locate_single(Path::new("/photos/IMG_1.HEIC")),
            PathBuf::from("/photos/IMG_1.jpg")
        );
        assert_eq!(
            locate_single(Path::new("/photos/trip.day1.heif")),
            PathBuf::from("/photos/trip.day1.jpg")
        );
    }

    #[test]
    fn test_output_dir_names() {
        assert_eq!(output_dir_name(0), "converted_imgs");
        assert_eq!(output_dir_name(1), "converted_imgs1");
        assert_eq!(output_dir_name(12), "converted_imgs12");
    }

    #[test]
    fn test_locate_batch_first_free() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(
            locate_batch(tmp.path()).path(),
            tmp.path().join("converted_imgs")
        );
    }

    #[test]
    fn test_locate_batch_skips_taken_names() {
        let tmp = TempDir::new().unwrap();
        for n in 0..4 {
            fs::create_dir(tmp.path().join(output_dir_name(n))).unwrap();
        }
        let pending = locate_batch(tmp.path());
        assert_eq!(pending.path(), tmp.path().join("converted_imgs4"));
        assert!(!pending.path().exists());
    }

    #[test]
    fn test_locate_batch_treats_files_as_taken() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("converted_imgs"), b"not a dir").unwrap();
        assert_eq!(
            locate_batch(tmp.path()).path(),
            tmp.path().join("converted_imgs1")
        );
    }

    #[test]
    fn test_pending_create_is_exclusive() {
        let tmp = TempDir::new().unwrap();
        let pending = locate_batch(tmp.path());
        fs::create_dir(pending.path()).unwrap();
        let err = pending.create().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn test_create_batch_output_creates_directory() {
        let tmp = TempDir::new().unwrap();
        let first = create_batch_output(tmp.path()).unwrap();
        let second = create_batch_output(tmp.path()).unwrap();
        assert!(first.is_new_directory);
        assert!(first.path.is_dir());
        assert_eq!(second.path, tmp.path().join("converted_imgs1"));
    }

    /// Looks up normally, then has a rival claim the chosen name for the
    /// first `races` lookups.
    fn racing_lookup(races: usize) -> impl FnMut(&Path) -> PendingDirectory {
        let mut remaining = races;
        move |parent: &Path| {
            let pending = locate_batch(parent);
            if remaining > 0 {
                remaining -= 1;
                fs::create_dir(pending.path()).unwrap();
            }
            pending
        }
    }

    #[test]
    fn test_create_batch_output_retries_after_one_collision() {
        let tmp = TempDir::new().unwrap();
        let target = create_batch_output_with(tmp.path(), racing_lookup(1)).unwrap();
        assert_eq!(target.path, tmp.path().join("converted_imgs1"));
        assert!(target.is_new_directory);
        assert!(target.path.is_dir());
    }

    #[test]
    fn test_create_batch_output_gives_up_after_second_collision() {
        let tmp = TempDir::new().unwrap();
        let err = create_batch_output_with(tmp.path(), racing_lookup(2)).unwrap_err();
        match err {
            LocateError::DirectoryCreateFailed { path, source } => {
                assert_eq!(path, tmp.path().join("converted_imgs1"));
                assert_eq!(source.kind(), io::ErrorKind::AlreadyExists);
            }
        }
    }

    #[test]
    fn test_create_batch_output_missing_parent_fails() {
        let tmp = TempDir::new().unwrap();
        let err = create_batch_output(&tmp.path().join("gone")).unwrap_err();
        assert!(matches!(err, LocateError::DirectoryCreateFailed { .. }));
    }

    #[test]
    fn test_batch_parent() {
        assert_eq!(
            batch_parent(Path::new("/home/me/photos")),
            PathBuf::from("/home/me")
        );
        assert_eq!(batch_parent(Path::new("photos")), PathBuf::from("."));
        assert_eq!(batch_parent(Path::new("/")), PathBuf::from("/"));
    }
}

/// Classified directory entries and the extension rule that drives
/// classification.
use std::path::{Path, PathBuf};

/// Extensions (lowercase, with the leading dot) treated as convertible.
pub const CONVERTIBLE_EXTENSIONS: [&str; 2] = [".heic", ".heif"];

/// How an entry will be processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Decoded and re-encoded as JPEG.
    ConvertibleImage,
    /// Copied verbatim.
    PassThrough,
}

/// One non-directory child of the scanned input folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedEntry {
    /// File name as reported to the host (lossy for non-UTF-8 names).
    pub name: String,
    /// Full source path; always used for I/O so non-UTF-8 names survive.
    pub path: PathBuf,
    pub kind: EntryKind,
}

impl ClassifiedEntry {
    pub fn new(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let kind = if is_convertible(&path) {
            EntryKind::ConvertibleImage
        } else {
            EntryKind::PassThrough
        };
        Self { name, path, kind }
    }
}

/// Result of classifying a directory: two sequences in enumeration order.
#[derive(Debug, Default, Clone)]
pub struct Classification {
    pub images: Vec<ClassifiedEntry>,
    pub others: Vec<ClassifiedEntry>,
}

impl Classification {
    pub fn push(&mut self, entry: ClassifiedEntry) {
        match entry.kind {
            EntryKind::ConvertibleImage => self.images.push(entry),
            EntryKind::PassThrough => self.others.push(entry),
        }
    }

    pub fn total(&self) -> usize {
        self.images.len() + self.others.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// `true` iff the lowercased file name ends with `.heic` or `.heif`.
///
/// Only the name is inspected; the content is never sniffed.
pub fn is_convertible(path: &Path) -> bool {
    let Some(name) = path.file_name() else {
        return false;
    };
    let lower = name.to_string_lossy().to_lowercase();
    CONVERTIBLE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Real-filesystem lister built on `std::fs::read_dir`.
use super::{ChildDescriptor, DirectoryLister, Listing};
use crate::error::ListError;
use crate::model::entry::EntryKind;
use std::fs::{self, ReadDir};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Lists directories on the local filesystem.
///
/// Symlinks are reported as [`EntryKind::Symlink`] and never followed.
/// Entries whose type cannot be read are skipped individually; they do not
/// abort the listing.
#[derive(Debug, Default, Clone)]
pub struct FsLister {
    /// Path prefixes treated as remote storage (e.g. network mounts).
    remote_prefixes: Vec<PathBuf>,
}

impl FsLister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat everything under `prefix` as non-native storage.
    pub fn with_remote_prefix(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.remote_prefixes.push(prefix.into());
        self
    }
}

impl DirectoryLister for FsLister {
    fn open(&self, path: &Path) -> Result<Box<dyn Listing>, ListError> {
        let iter = fs::read_dir(path).map_err(|e| ListError::from_io(path, e))?;
        Ok(Box::new(FsListing {
            path: path.to_path_buf(),
            iter,
        }))
    }

    fn is_native(&self, path: &Path) -> bool {
        !self.remote_prefixes.iter().any(|p| path.starts_with(p))
    }
}

struct FsListing {
    path: PathBuf,
    iter: ReadDir,
}

impl Listing for FsListing {
    fn next_batch(&mut self, max: usize) -> Result<Vec<ChildDescriptor>, ListError> {
        let mut batch = Vec::with_capacity(max.min(1024));
        while batch.len() < max {
            let entry = match self.iter.next() {
                Some(Ok(entry)) => entry,
                Some(Err(err)) => {
                    if batch.is_empty() {
                        return Err(ListError::from_io(&self.path, err));
                    }
                    // Deliver what we have; reading resumes on the next call.
                    debug!("read_dir error in {}: {err}", self.path.display());
                    break;
                }
                None => break,
            };

            let kind = match entry.file_type() {
                Ok(ft) if ft.is_symlink() => EntryKind::Symlink,
                Ok(ft) if ft.is_dir() => EntryKind::Directory,
                Ok(ft) if ft.is_file() => EntryKind::File,
                Ok(_) => EntryKind::Other,
                Err(err) => {
                    debug!("skipping {}: {err}", entry.path().display());
                    continue;
                }
            };

            batch.push(ChildDescriptor::from_os(entry.file_name(), kind));
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lists_files_and_directories_in_batches() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        for name in ["a.txt", "b.txt", "c.txt"] {
            fs::write(tmp.path().join(name), b"x").unwrap();
        }

        let lister = FsLister::new();
        let mut listing = lister.open(tmp.path()).unwrap();

        let mut all = Vec::new();
        loop {
            let batch = listing.next_batch(2).unwrap();
            assert!(batch.len() <= 2);
            if batch.is_empty() {
                break;
            }
            all.extend(batch);
        }
        all.sort_by(|a, b| a.name.cmp(&b.name));

        let names: Vec<&str> = all.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "c.txt", "sub"]);
        assert_eq!(all[3].kind, EntryKind::Directory);
        assert_eq!(all[3].icon, "folder");
    }

    #[test]
    fn missing_directory_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = FsLister::new()
            .open(&tmp.path().join("missing"))
            .err()
            .unwrap();
        assert!(matches!(err, ListError::NotFound { .. }));
    }

    #[test]
    fn remote_prefixes_are_not_native() {
        let lister = FsLister::new().with_remote_prefix("/mnt/share");
        assert!(!lister.is_native(Path::new("/mnt/share/docs")));
        assert!(lister.is_native(Path::new("/home")));
    }
}

/// In-memory lister with fault injection.
///
/// Holds a synthetic directory tree keyed by absolute path. Faults can be
/// queued per path to exercise the scheduler's retry and failure paths
/// without touching a real filesystem. Cloning shares the same tree, so a
/// test can keep a handle for inspection after giving one to the scheduler.
use super::{ChildDescriptor, DirectoryLister, Listing};
use crate::error::ListError;
use crate::model::entry::EntryKind;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A one-shot failure returned by the next `open` of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenFault {
    ResourceExhausted,
    PermissionDenied,
    NotFound,
}

impl OpenFault {
    fn to_error(self, path: &Path) -> ListError {
        let path = path.to_path_buf();
        match self {
            Self::ResourceExhausted => ListError::ResourceExhausted { path },
            Self::PermissionDenied => ListError::PermissionDenied { path },
            Self::NotFound => ListError::NotFound { path },
        }
    }
}

#[derive(Default)]
struct MemoryTree {
    dirs: HashMap<PathBuf, Vec<ChildDescriptor>>,
    open_faults: HashMap<PathBuf, VecDeque<OpenFault>>,
    /// Number of successful batches before the listing errors out.
    fetch_faults: HashMap<PathBuf, usize>,
    remote: Vec<PathBuf>,
    opened: Vec<PathBuf>,
}

impl MemoryTree {
    fn ensure_dir(&mut self, path: &Path) {
        if self.dirs.contains_key(path) {
            return;
        }
        self.dirs.insert(path.to_path_buf(), Vec::new());
        if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
            self.ensure_dir(parent);
            let child = ChildDescriptor::new(name.to_string_lossy().as_ref(), EntryKind::Directory);
            if let Some(children) = self.dirs.get_mut(parent) {
                children.push(child);
            }
        }
    }

    fn add_leaf(&mut self, path: &Path, kind: EntryKind) {
        let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
            return;
        };
        self.ensure_dir(parent);
        let child = ChildDescriptor::new(name.to_string_lossy().as_ref(), kind);
        if let Some(children) = self.dirs.get_mut(parent) {
            children.push(child);
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryLister {
    tree: Arc<Mutex<MemoryTree>>,
}

impl MemoryLister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory (and any missing ancestors).
    pub fn add_dir(&self, path: impl AsRef<Path>) -> &Self {
        self.tree.lock().ensure_dir(path.as_ref());
        self
    }

    /// Add a regular file (and any missing ancestor directories).
    pub fn add_file(&self, path: impl AsRef<Path>) -> &Self {
        self.tree.lock().add_leaf(path.as_ref(), EntryKind::File);
        self
    }

    pub fn add_symlink(&self, path: impl AsRef<Path>) -> &Self {
        self.tree.lock().add_leaf(path.as_ref(), EntryKind::Symlink);
        self
    }

    /// Make the next `open` of `path` fail with `fault`. Faults queue up.
    pub fn fail_open(&self, path: impl AsRef<Path>, fault: OpenFault) -> &Self {
        self.tree
            .lock()
            .open_faults
            .entry(path.as_ref().to_path_buf())
            .or_default()
            .push_back(fault);
        self
    }

    /// Listings of `path` error out after `batches` successful batches.
    pub fn fail_fetch_after(&self, path: impl AsRef<Path>, batches: usize) -> &Self {
        self.tree
            .lock()
            .fetch_faults
            .insert(path.as_ref().to_path_buf(), batches);
        self
    }

    /// Treat everything under `prefix` as remote storage.
    pub fn mark_remote(&self, prefix: impl AsRef<Path>) -> &Self {
        self.tree.lock().remote.push(prefix.as_ref().to_path_buf());
        self
    }

    /// Paths opened successfully so far, in order.
    pub fn opened(&self) -> Vec<PathBuf> {
        self.tree.lock().opened.clone()
    }
}

impl DirectoryLister for MemoryLister {
    fn open(&self, path: &Path) -> Result<Box<dyn Listing>, ListError> {
        let mut tree = self.tree.lock();
        if let Some(fault) = tree.open_faults.get_mut(path).and_then(VecDeque::pop_front) {
            return Err(fault.to_error(path));
        }
        let children = match tree.dirs.get(path) {
            Some(children) => children.clone(),
            None => {
                return Err(ListError::NotFound {
                    path: path.to_path_buf(),
                })
            }
        };
        let fail_after = tree.fetch_faults.get(path).copied();
        tree.opened.push(path.to_path_buf());
        Ok(Box::new(MemoryListing {
            path: path.to_path_buf(),
            children: children.into(),
            fail_after,
        }))
    }

    fn is_native(&self, path: &Path) -> bool {
        !self.tree.lock().remote.iter().any(|p| path.starts_with(p))
    }
}

struct MemoryListing {
    path: PathBuf,
    children: VecDeque<ChildDescriptor>,
    fail_after: Option<usize>,
}

impl Listing for MemoryListing {
    fn next_batch(&mut self, max: usize) -> Result<Vec<ChildDescriptor>, ListError> {
        match self.fail_after {
            Some(0) => {
                return Err(ListError::Io {
                    path: self.path.clone(),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "injected fetch fault"),
                })
            }
            Some(ref mut n) => *n -= 1,
            None => {}
        }
        let take = max.min(self.children.len());
        Ok(self.children.drain(..take).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(listing: &mut dyn Listing, batch: usize) -> Vec<String> {
        let mut names = Vec::new();
        loop {
            let b = listing.next_batch(batch).unwrap();
            if b.is_empty() {
                return names;
            }
            names.extend(b.into_iter().map(|c| c.name.to_string()));
        }
    }

    #[test]
    fn builds_ancestors_automatically() {
        let fs = MemoryLister::new();
        fs.add_file("/r/A/x").add_file("/r/b");
        let mut root = fs.open(Path::new("/r")).unwrap();
        assert_eq!(drain(root.as_mut(), 10), vec!["A", "b"]);
        let mut a = fs.open(Path::new("/r/A")).unwrap();
        assert_eq!(drain(a.as_mut(), 10), vec!["x"]);
    }

    #[test]
    fn open_faults_are_one_shot() {
        let fs = MemoryLister::new();
        fs.add_dir("/r").fail_open("/r", OpenFault::ResourceExhausted);
        assert!(fs.open(Path::new("/r")).err().unwrap().is_resource_exhausted());
        assert!(fs.open(Path::new("/r")).is_ok());
        assert_eq!(fs.opened(), vec![PathBuf::from("/r")]);
    }

    #[test]
    fn fetch_fault_after_batches() {
        let fs = MemoryLister::new();
        for i in 0..5 {
            fs.add_file(format!("/r/f{i}"));
        }
        fs.fail_fetch_after("/r", 1);
        let mut listing = fs.open(Path::new("/r")).unwrap();
        assert_eq!(listing.next_batch(2).unwrap().len(), 2);
        assert!(listing.next_batch(2).is_err());
    }

    #[test]
    fn remote_marking() {
        let fs = MemoryLister::new();
        fs.mark_remote("/net");
        assert!(!fs.is_native(Path::new("/net/share")));
        assert!(fs.is_native(Path::new("/r")));
    }
}

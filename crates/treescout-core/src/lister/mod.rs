/// The directory-listing capability the scheduler consumes.
///
/// The core never touches the filesystem directly. A [`DirectoryLister`]
/// opens a [`Listing`] for a path, and the listing hands out children in
/// batches. Listings are `Send` because batch fetches run on the I/O pool.
///
/// - [`fs::FsLister`]: real filesystem via `std::fs::read_dir`.
/// - [`memory::MemoryLister`]: in-memory tree with fault injection, used by
///   tests and demos.
pub mod fs;
pub mod memory;

use crate::error::ListError;
use crate::model::entry::EntryKind;
use crate::model::icon::icon_name;
use compact_str::CompactString;
use std::ffi::OsString;
use std::path::Path;

pub use fs::FsLister;
pub use memory::MemoryLister;

/// What a listing reports about one child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildDescriptor {
    /// File name exactly as the OS reported it; joined onto the parent path.
    pub file_name: OsString,
    /// `file_name` as UTF-8, lossily converted when it is not valid UTF-8.
    pub name: CompactString,
    pub display_name: CompactString,
    pub icon: CompactString,
    pub kind: EntryKind,
}

impl ChildDescriptor {
    /// Descriptor whose display name equals its name and whose icon is
    /// derived from the kind and extension.
    pub fn new(name: impl Into<CompactString>, kind: EntryKind) -> Self {
        let name = name.into();
        let icon = CompactString::from(icon_name(&name, kind));
        Self {
            file_name: OsString::from(name.as_str()),
            display_name: name.clone(),
            name,
            icon,
            kind,
        }
    }

    /// Descriptor for a raw OS file name, which need not be valid UTF-8.
    pub fn from_os(file_name: OsString, kind: EntryKind) -> Self {
        let name = CompactString::new(file_name.to_string_lossy());
        Self {
            file_name,
            ..Self::new(name, kind)
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<CompactString>) -> Self {
        self.display_name = display_name.into();
        self
    }
}

/// An open directory handle.
pub trait Listing: Send {
    /// Fetch up to `max` further children. An empty batch means the end of
    /// the directory has been reached.
    fn next_batch(&mut self, max: usize) -> Result<Vec<ChildDescriptor>, ListError>;
}

/// Opens directories for enumeration.
pub trait DirectoryLister: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn Listing>, ListError>;

    /// `true` for local, fast storage. Non-native (remote) directories are
    /// fetched in much smaller batches.
    fn is_native(&self, _path: &Path) -> bool {
        true
    }
}

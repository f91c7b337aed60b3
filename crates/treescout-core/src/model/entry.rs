/// A single child of an enumerated directory.
///
/// Entries are immutable once built and shared (`Rc`) between the lazy
/// directory model that owns them and every row that displays them.
use crate::lister::ChildDescriptor;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// What kind of filesystem object an entry is.
///
/// Only directories can be expanded; everything else is a leaf. Symlinks are
/// never followed, so a link to a directory is still a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    Other,
}

impl EntryKind {
    /// `true` if rows of this kind can have children.
    #[inline]
    pub fn is_expandable(self) -> bool {
        matches!(self, Self::Directory)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "directory",
            Self::Symlink => "symlink",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// File name as UTF-8 (lossy for names that are not).
    name: CompactString,
    /// Name meant for display (may differ for non-UTF-8 names).
    display_name: CompactString,
    /// Icon name hint (freedesktop naming, e.g. `"folder"`).
    icon: CompactString,
    kind: EntryKind,
    /// Absolute path: the enumerated directory joined with `name`.
    path: PathBuf,
}

impl DirEntry {
    /// Build the entry for `child`, a listing result of directory `parent`.
    pub fn new(parent: &Path, child: ChildDescriptor) -> Self {
        let path = parent.join(&child.file_name);
        Self {
            name: child.name,
            display_name: child.display_name,
            icon: child.icon,
            kind: child.kind,
            path,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind.is_expandable()
    }

    /// Compare absolute paths ignoring ASCII case, falling back to the raw
    /// bytes so that distinct paths never compare equal.
    pub fn cmp_path_ignore_case(&self, other: &Self) -> Ordering {
        let a = self.path.as_os_str().as_encoded_bytes();
        let b = other.path.as_os_str().as_encoded_bytes();
        a.iter()
            .map(u8::to_ascii_lowercase)
            .cmp(b.iter().map(u8::to_ascii_lowercase))
            .then_with(|| a.cmp(b))
    }
}

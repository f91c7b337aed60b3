/// Error types for the TreeScout core.
///
/// Enumeration failures are deliberately quiet: the scheduler logs them and
/// the affected directory simply stops growing. Only a root directory that
/// cannot be opened at all is surfaced to the caller.
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// `EMFILE` / `ENFILE` on Unix.
#[cfg(unix)]
const RESOURCE_EXHAUSTED_CODES: &[i32] = &[24, 23];

/// `ERROR_TOO_MANY_OPEN_FILES` on Windows.
#[cfg(windows)]
const RESOURCE_EXHAUSTED_CODES: &[i32] = &[4];

#[cfg(not(any(unix, windows)))]
const RESOURCE_EXHAUSTED_CODES: &[i32] = &[];

/// Failure reported by a [`DirectoryLister`](crate::lister::DirectoryLister).
#[derive(Debug, Error)]
pub enum ListError {
    /// Too many open handles. Transient: the scheduler re-queues the request
    /// when other enumerations are still holding handles.
    #[error("too many open files while listing {}", path.display())]
    ResourceExhausted { path: PathBuf },

    #[error("permission denied: {}", path.display())]
    PermissionDenied { path: PathBuf },

    #[error("no such directory: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    #[error("I/O error listing {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ListError {
    /// Classify an OS error raised while opening or reading `path`.
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        let path = path.to_path_buf();
        if err
            .raw_os_error()
            .is_some_and(|code| RESOURCE_EXHAUSTED_CODES.contains(&code))
        {
            return Self::ResourceExhausted { path };
        }
        match err.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            io::ErrorKind::NotFound => Self::NotFound { path },
            io::ErrorKind::NotADirectory => Self::NotADirectory { path },
            _ => Self::Io { path, source: err },
        }
    }

    /// `true` for the one transient error class.
    pub fn is_resource_exhausted(&self) -> bool {
        matches!(self, Self::ResourceExhausted { .. })
    }

    /// The directory the error refers to.
    pub fn path(&self) -> &Path {
        match self {
            Self::ResourceExhausted { path }
            | Self::PermissionDenied { path }
            | Self::NotFound { path }
            | Self::NotADirectory { path }
            | Self::Io { path, .. } => path,
        }
    }
}

/// Misuse of the scheduler API.
///
/// These are programming errors, not runtime conditions: debug builds
/// assert before returning them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("{} is already queued or being enumerated", path.display())]
    AlreadyScheduled { path: PathBuf },
}

/// Errors surfaced when constructing a [`Browser`](crate::browser::Browser).
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("cannot open root directory: {0}")]
    RootUnavailable(#[source] ListError),

    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error("failed to start I/O thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Errors from exporting the visible rows.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported export format: {0}")]
    UnknownFormat(String),
}

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: `{field}` must be at least 1")]
    ZeroLimit { field: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_permission_denied() {
        let err = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        let list_err = ListError::from_io(Path::new("/root/secret"), err);
        assert!(matches!(list_err, ListError::PermissionDenied { .. }));
        assert_eq!(list_err.path(), Path::new("/root/secret"));
        assert!(!list_err.is_resource_exhausted());
    }

    #[cfg(unix)]
    #[test]
    fn classifies_emfile_as_resource_exhausted() {
        let err = io::Error::from_raw_os_error(24);
        let list_err = ListError::from_io(Path::new("/tmp"), err);
        assert!(list_err.is_resource_exhausted());
    }

    #[test]
    fn other_errors_keep_their_source() {
        let err = io::Error::new(io::ErrorKind::Other, "disk on fire");
        let list_err = ListError::from_io(Path::new("/mnt"), err);
        assert!(matches!(list_err, ListError::Io { .. }));
        assert!(list_err.to_string().contains("disk on fire"));
    }

    #[test]
    fn submit_error_display() {
        let err = SubmitError::AlreadyScheduled {
            path: PathBuf::from("/srv"),
        };
        assert_eq!(err.to_string(), "/srv is already queued or being enumerated");
    }
}

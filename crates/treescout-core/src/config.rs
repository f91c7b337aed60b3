/// Tunables for enumeration and the browsing pipeline.
///
/// Defaults live in module constants; both config structs are
/// serde-(de)serialisable so a frontend can load them from a JSON file and
/// override individual fields afterwards.
use crate::error::ConfigError;
use crate::tree::{CaseSensitivity, ExpandPolicy, SortOrder};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Maximum number of directories enumerated at the same time.
///
/// Each active enumeration holds one open directory handle. Everything above
/// the ceiling waits in a FIFO queue.
pub const DEFAULT_MAX_ACTIVE: usize = 20;

/// Entries fetched per batch from local (native) storage.
pub const NATIVE_BATCH_SIZE: usize = 5_000;

/// Entries fetched per batch from remote storage, where each round trip is
/// slow and large batches would stall the view.
pub const REMOTE_BATCH_SIZE: usize = 100;

/// Enumeration settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub max_active: usize,
    pub native_batch_size: usize,
    pub remote_batch_size: usize,
    /// Worker threads for batch fetches; `0` means one per CPU.
    pub io_threads: usize,
    /// Run batch fetches synchronously on the calling thread. Completions are
    /// still delivered through `dispatch`, so behaviour is identical but
    /// fully deterministic.
    pub inline_io: bool,
}

impl ScanConfig {
    /// Reject limits that would stall enumeration: a ceiling of zero never
    /// admits anything and a batch size of zero reads as end-of-directory.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("max_active", self.max_active),
            ("native_batch_size", self.native_batch_size),
            ("remote_batch_size", self.remote_batch_size),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroLimit { field });
            }
        }
        Ok(())
    }

    /// Copy with every limit raised to at least 1.
    pub fn sanitized(mut self) -> Self {
        self.max_active = self.max_active.max(1);
        self.native_batch_size = self.native_batch_size.max(1);
        self.remote_batch_size = self.remote_batch_size.max(1);
        self
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_active: DEFAULT_MAX_ACTIVE,
            native_batch_size: NATIVE_BATCH_SIZE,
            remote_batch_size: REMOTE_BATCH_SIZE,
            io_threads: 0,
            inline_io: false,
        }
    }
}

/// Everything a [`Browser`](crate::browser::Browser) needs besides the root
/// path and the lister.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub scan: ScanConfig,
    pub expand: ExpandPolicy,
    pub sort: SortOrder,
    pub filter: String,
    pub case: CaseSensitivity,
}

impl BrowserConfig {
    /// Load a JSON config file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.scan.validate()?;
        Ok(config)
    }
}

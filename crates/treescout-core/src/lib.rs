/// TreeScout Core: lazy directory models and the flatten/sort/filter pipeline.
///
/// This crate contains all business logic with zero UI dependencies.
/// It is designed to be reusable across different frontends (GUI, CLI, TUI).
///
/// # Modules
///
/// - [`model`]: Directory entries, lazy directory models, change notifications.
/// - [`lister`]: The abstract directory-listing capability and its implementations.
/// - [`scheduler`]: Bounded, queued, asynchronous directory enumeration.
/// - [`tree`]: Flattening, sorting, and filtering layers over the lazy models.
/// - [`progress`]: Item counts and outstanding-work summaries.
/// - [`browser`]: One object tying the pipeline together for a frontend.
/// - [`export`]: CSV/JSON export of the visible rows.
pub mod browser;
pub mod config;
pub mod error;
pub mod export;
pub mod lister;
pub mod model;
pub mod progress;
pub mod scheduler;
pub mod tree;

pub use browser::{Browser, RowView};
pub use config::{BrowserConfig, ScanConfig};
pub use error::{BrowserError, ListError, SubmitError};

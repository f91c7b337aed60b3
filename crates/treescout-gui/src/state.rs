/// Application state management.
///
/// Centralises all mutable state that the UI reads and writes. Batch
/// completions from the I/O pool are applied in `process_messages()`, which
/// runs once per frame; everything else is a direct call into the
/// [`Browser`].
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use treescout_core::export::export_to_path;
use treescout_core::lister::FsLister;
use treescout_core::model::{ListModel, NodeId};
use treescout_core::progress::Poll;
use treescout_core::tree::{CaseSensitivity, SortOrder};
use treescout_core::{Browser, BrowserConfig, RowView};

/// Maximum dispatch passes per frame.
///
/// Each pass applies at most one batch per active directory. Bounding the
/// passes keeps a deep backlog (e.g. after the window was hidden) from
/// stalling the render thread.
const MAX_PUMPS_PER_FRAME: usize = 8;

/// How often to repaint while enumeration is outstanding.
pub const REPAINT_INTERVAL: Duration = Duration::from_millis(100);

/// All application state.
pub struct AppState {
    // ── Session ────────────────────────────────────────
    pub root: PathBuf,
    pub config: BrowserConfig,
    pub browser: Option<Browser>,
    /// Why the root could not be opened, if it could not.
    pub open_error: Option<String>,
    /// Last result of the progress tick.
    pub poll: Poll,

    // ── UI state ───────────────────────────────────────
    /// Contents of the search box; applied by [`apply_search`](Self::apply_search).
    pub search_text: String,
    pub selected: Option<NodeId>,
    pub export_message: Option<String>,
    pub dark_mode: bool,
}

impl AppState {
    /// Create the state and start enumerating `root`.
    pub fn new(root: PathBuf, config: BrowserConfig) -> Self {
        let mut state = Self {
            search_text: config.filter.clone(),
            root: root.clone(),
            config,
            browser: None,
            open_error: None,
            poll: Poll::Stop,
            selected: None,
            export_message: None,
            dark_mode: true,
        };
        state.open(root);
        state
    }

    /// Start browsing `root`, discarding any previous session.
    pub fn open(&mut self, root: PathBuf) {
        self.selected = None;
        self.export_message = None;
        let mut config = self.config.clone();
        config.filter = self.search_text.clone();

        match Browser::open(&root, Arc::new(FsLister::new()), config) {
            Ok(browser) => {
                self.browser = Some(browser);
                self.open_error = None;
                self.poll = Poll::Continue;
            }
            Err(e) => {
                tracing::warn!("cannot browse {}: {e}", root.display());
                self.browser = None;
                self.open_error = Some(e.to_string());
                self.poll = Poll::Stop;
            }
        }
        self.root = root;
    }

    /// Apply pending batch completions and refresh progress.
    ///
    /// Returns `true` if any completion was applied this frame.
    pub fn process_messages(&mut self) -> bool {
        let Some(browser) = self.browser.as_mut() else {
            return false;
        };
        let mut applied = 0;
        for _ in 0..MAX_PUMPS_PER_FRAME {
            let n = browser.pump();
            if n == 0 {
                break;
            }
            applied += n;
        }
        self.poll = browser.tick();
        applied > 0
    }

    /// `true` while directories are still active or queued.
    pub fn is_busy(&self) -> bool {
        self.poll.is_continue()
    }

    pub fn row_count(&self) -> usize {
        self.browser.as_ref().map_or(0, |b| b.len())
    }

    pub fn rows(&self, start: usize, end: usize) -> Vec<RowView> {
        self.browser
            .as_ref()
            .map(|b| b.rows(start, end))
            .unwrap_or_default()
    }

    pub fn summary(&self) -> &str {
        self.browser.as_ref().map_or("", |b| b.summary())
    }

    /// Push the search box text into the filter.
    pub fn apply_search(&mut self) {
        if let Some(browser) = self.browser.as_mut() {
            browser.set_filter(&self.search_text);
        }
    }

    pub fn case_sensitivity(&self) -> CaseSensitivity {
        self.browser
            .as_ref()
            .map_or(self.config.case, |b| b.case_sensitivity())
    }

    pub fn set_case_sensitivity(&mut self, case: CaseSensitivity) {
        self.config.case = case;
        if let Some(browser) = self.browser.as_mut() {
            browser.set_case_sensitivity(case);
        }
    }

    pub fn sort_order(&self) -> SortOrder {
        self.browser
            .as_ref()
            .map_or(self.config.sort, |b| b.sort_order())
    }

    pub fn toggle_sort(&mut self) {
        if let Some(browser) = self.browser.as_mut() {
            browser.toggle_sort();
            self.config.sort = browser.sort_order();
        }
    }

    /// Expand or collapse the visible row at `row`.
    ///
    /// Collapsing frees node ids for reuse, so the selection is reset to the
    /// toggled row.
    pub fn toggle_row(&mut self, row: usize) {
        if let Some(browser) = self.browser.as_mut() {
            browser.toggle_expanded(row);
        }
        self.select_row(row);
    }

    pub fn select_row(&mut self, row: usize) {
        self.selected = self
            .browser
            .as_ref()
            .and_then(|b| b.row(row))
            .map(|r| r.node);
    }

    /// Export the visible rows; the format follows the file extension.
    pub fn export(&mut self, path: &Path) {
        let Some(browser) = self.browser.as_ref() else {
            return;
        };
        self.export_message = Some(match export_to_path(browser, path) {
            Ok(count) => format!("Exported {count} rows to {}", path.display()),
            Err(e) => {
                tracing::warn!("export to {} failed: {e}", path.display());
                format!("Export failed: {e}")
            }
        });
    }

    /// Where the toolbar's export buttons write: the working directory.
    pub fn default_export_path(extension: &str) -> PathBuf {
        std::env::current_dir()
            .unwrap_or_default()
            .join(format!("treescout-export.{extension}"))
    }
}

/// The browsing session a frontend drives.
///
/// `Browser` owns the scheduler, the three pipeline layers and the progress
/// aggregator, and is the only place where changes are propagated from one
/// layer to the next. A frontend calls [`Browser::pump`] once per frame (or
/// [`Browser::run_until_idle`] when headless), reads rows through
/// [`ListModel`], and forwards user actions to the `set_*`/`toggle_*` methods.
use crate::config::BrowserConfig;
use crate::error::BrowserError;
use crate::lister::DirectoryLister;
use crate::model::{DirEntry, DirModel, ListModel, NodeId, RangeChange, SubscriptionId};
use crate::progress::{Poll, ProgressAggregator, ProgressReport};
use crate::scheduler::{Admission, Scheduler, SchedulerStatus};
use crate::tree::{
    CaseSensitivity, FilterListModel, SortListModel, SortOrder, TreeDelta, TreeListModel,
};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Longest single wait inside [`Browser::run_until_idle`].
const IDLE_POLL: Duration = Duration::from_millis(50);

/// Everything a view needs to draw one visible row.
#[derive(Debug, Clone)]
pub struct RowView {
    pub node: NodeId,
    pub entry: Rc<DirEntry>,
    pub depth: u16,
    pub expanded: bool,
    pub expandable: bool,
}

impl RowView {
    pub fn name(&self) -> &str {
        self.entry.name()
    }

    pub fn display_name(&self) -> &str {
        self.entry.display_name()
    }

    pub fn icon(&self) -> &str {
        self.entry.icon()
    }

    pub fn path(&self) -> &Path {
        self.entry.path()
    }
}

pub struct Browser {
    root: PathBuf,
    scheduler: Scheduler,
    tree: TreeListModel,
    sort: SortListModel,
    filter: FilterListModel,
    progress: ProgressAggregator,
    started: Instant,
    finished: bool,
}

impl Browser {
    /// Start browsing `root`.
    ///
    /// Fails only if the root itself cannot be listed; everything below it
    /// degrades silently.
    pub fn open(
        root: impl Into<PathBuf>,
        lister: Arc<dyn DirectoryLister>,
        config: BrowserConfig,
    ) -> Result<Self, BrowserError> {
        let scheduler = Scheduler::new(lister, config.scan.clone())?;
        Self::with_scheduler(root, scheduler, config)
    }

    /// Like [`open`](Self::open) with a caller-built scheduler.
    pub fn with_scheduler(
        root: impl Into<PathBuf>,
        mut scheduler: Scheduler,
        config: BrowserConfig,
    ) -> Result<Self, BrowserError> {
        let root = root.into();
        let model = DirModel::new(&root);
        if let Admission::Dropped(err) = scheduler.submit(&model)? {
            return Err(BrowserError::RootUnavailable(err));
        }
        info!(
            "browsing {} (max {} active, expand {:?})",
            root.display(),
            scheduler.config().max_active,
            config.expand
        );

        let mut browser = Self {
            root,
            scheduler,
            tree: TreeListModel::new(model, config.expand),
            sort: SortListModel::new(config.sort),
            filter: FilterListModel::new(config.filter, config.case),
            progress: ProgressAggregator::new(),
            started: Instant::now(),
            finished: false,
        };
        browser.refresh_progress();
        Ok(browser)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Apply completions that have arrived and push the resulting changes
    /// through the pipeline. Never blocks. Returns the number of batch
    /// completions applied.
    pub fn pump(&mut self) -> usize {
        let applied = self.scheduler.dispatch();
        self.absorb();
        applied
    }

    /// Like [`pump`](Self::pump) but waits up to `timeout` for the first
    /// completion.
    pub fn wait(&mut self, timeout: Duration) -> usize {
        let applied = self.scheduler.wait_dispatch(timeout);
        self.absorb();
        applied
    }

    /// Pump until nothing is active or queued, or `timeout` elapses.
    /// Returns `true` if the browser went idle.
    pub fn run_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.absorb();
            if self.is_idle() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            self.wait((deadline - now).min(IDLE_POLL));
        }
    }

    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle() && !self.tree.has_pending()
    }

    fn absorb(&mut self) {
        let deltas = self.tree.process_pending(&mut self.scheduler);
        for delta in &deltas {
            self.propagate(delta);
        }
        self.refresh_progress();
    }

    fn propagate(&mut self, delta: &TreeDelta) {
        let Some(sorted) = self.sort.apply(delta, &self.tree) else {
            return;
        };
        self.filter.apply(&sorted, self.sort.as_slice(), &self.tree);
    }

    fn refresh_progress(&mut self) {
        let status = self.scheduler.status();
        self.progress
            .update(self.filter.len(), self.sort.len(), &status);
        if !self.finished && status.is_idle() && !self.tree.has_pending() {
            self.finished = true;
            info!(
                "enumeration idle after {:.2?}: {} rows, {} directories listed, {} failed",
                self.started.elapsed(),
                self.sort.len(),
                status.completed,
                status.failed
            );
        } else if !status.is_idle() {
            self.finished = false;
        }
    }

    /// Periodic progress recompute; `Stop` once nothing is outstanding.
    pub fn tick(&mut self) -> Poll {
        let status = self.scheduler.status();
        self.progress
            .tick(self.filter.len(), self.sort.len(), &status)
    }

    pub fn progress(&self) -> ProgressReport {
        self.progress.report()
    }

    /// The status bar text.
    pub fn summary(&self) -> &str {
        self.progress.summary()
    }

    pub fn status(&self) -> SchedulerStatus {
        self.scheduler.status()
    }

    pub fn row(&self, position: usize) -> Option<RowView> {
        let node = self.filter.get(position)?;
        self.view(node)
    }

    /// Visible rows in `start..end`, clamped to the current length.
    pub fn rows(&self, start: usize, end: usize) -> Vec<RowView> {
        let end = end.min(self.filter.len());
        (start.min(end)..end)
            .filter_map(|position| self.row(position))
            .collect()
    }

    fn view(&self, node: NodeId) -> Option<RowView> {
        Some(RowView {
            node,
            entry: Rc::clone(self.tree.entry(node)?),
            depth: self.tree.depth(node),
            expanded: self.tree.is_expanded(node),
            expandable: self.tree.is_expandable(node),
        })
    }

    /// Number of rows before filtering.
    pub fn total(&self) -> usize {
        self.sort.len()
    }

    /// Expand or collapse the visible row at `position`. Returns `false` if
    /// the row does not exist or was already in that state.
    pub fn set_expanded(&mut self, position: usize, expanded: bool) -> bool {
        match self.filter.get(position) {
            Some(node) => self.set_node_expanded(node, expanded),
            None => false,
        }
    }

    pub fn toggle_expanded(&mut self, position: usize) -> bool {
        match self.filter.get(position) {
            Some(node) => {
                let expanded = self.tree.is_expanded(node);
                self.set_node_expanded(node, !expanded)
            }
            None => false,
        }
    }

    pub fn set_node_expanded(&mut self, node: NodeId, expanded: bool) -> bool {
        if self.tree.is_expanded(node) == expanded {
            return false;
        }
        if let Some(delta) = self.tree.set_expanded(node, expanded, &mut self.scheduler) {
            self.propagate(&delta);
        }
        self.refresh_progress();
        self.tree.is_expanded(node) == expanded
    }

    pub fn filter_text(&self) -> &str {
        self.filter.text()
    }

    /// Change the filter text; setting the current text again is a no-op.
    pub fn set_filter(&mut self, text: &str) -> Option<RangeChange> {
        let change = self
            .filter
            .set_predicate(text, self.sort.as_slice(), &self.tree);
        if change.is_some() {
            debug!("filter {text:?}: {} of {} rows", self.filter.len(), self.sort.len());
        }
        self.refresh_progress();
        change
    }

    pub fn case_sensitivity(&self) -> CaseSensitivity {
        self.filter.case()
    }

    pub fn set_case_sensitivity(&mut self, case: CaseSensitivity) -> Option<RangeChange> {
        let change = self
            .filter
            .set_case(case, self.sort.as_slice(), &self.tree);
        self.refresh_progress();
        change
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort.order()
    }

    pub fn set_sort_order(&mut self, order: SortOrder) -> Option<RangeChange> {
        self.sort.set_order(order, &self.tree)?;
        self.filter.refilter(self.sort.as_slice(), &self.tree)
    }

    /// Flip the sort direction.
    pub fn toggle_sort(&mut self) -> Option<RangeChange> {
        self.set_sort_order(self.sort.order().toggled())
    }
}

impl ListModel for Browser {
    type Item = RowView;

    fn len(&self) -> usize {
        self.filter.len()
    }

    fn get(&self, position: usize) -> Option<RowView> {
        self.row(position)
    }

    fn subscribe(&self, callback: Box<dyn FnMut(&RangeChange)>) -> SubscriptionId {
        self.filter.subscribe(callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.filter.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use crate::lister::memory::{MemoryLister, OpenFault};
    use crate::tree::ExpandPolicy;
    use std::cell::RefCell;

    fn inline_config(expand: ExpandPolicy) -> BrowserConfig {
        BrowserConfig {
            scan: ScanConfig {
                inline_io: true,
                ..ScanConfig::default()
            },
            expand,
            ..BrowserConfig::default()
        }
    }

    fn open(fs: &MemoryLister, config: BrowserConfig) -> Browser {
        Browser::open("/r", Arc::new(fs.clone()), config).unwrap()
    }

    fn visible(browser: &Browser) -> Vec<String> {
        browser
            .rows(0, browser.len())
            .iter()
            .map(|row| row.name().to_string())
            .collect()
    }

    fn position(browser: &Browser, name: &str) -> usize {
        (0..browser.len())
            .find(|&i| browser.row(i).unwrap().name() == name)
            .unwrap()
    }

    fn scenario() -> MemoryLister {
        let fs = MemoryLister::new();
        fs.add_file("/r/b").add_file("/r/A/x").add_file("/r/c");
        fs
    }

    #[test]
    fn unreadable_root_is_an_error() {
        let fs = MemoryLister::new();
        fs.add_dir("/r").fail_open("/r", OpenFault::PermissionDenied);
        let err = Browser::open("/r", Arc::new(fs), inline_config(ExpandPolicy::Manual))
            .err()
            .unwrap();
        assert!(matches!(err, BrowserError::RootUnavailable(_)));
    }

    #[test]
    fn scenario_end_to_end() {
        let fs = scenario();
        let mut browser = open(&fs, inline_config(ExpandPolicy::Manual));
        assert!(browser.run_until_idle(Duration::from_secs(5)));
        assert_eq!(visible(&browser), ["A", "b", "c"]);

        assert!(browser.toggle_expanded(position(&browser, "A")));
        assert!(browser.run_until_idle(Duration::from_secs(5)));
        assert_eq!(visible(&browser), ["A", "x", "b", "c"]);
        assert_eq!(browser.row(1).unwrap().depth, 1);

        browser.toggle_sort();
        assert_eq!(browser.sort_order(), SortOrder::Descending);
        assert_eq!(visible(&browser), ["c", "b", "A", "x"]);
    }

    #[test]
    fn collapse_then_reexpand_restores_children() {
        let fs = scenario();
        let mut browser = open(&fs, inline_config(ExpandPolicy::RootChildren));
        browser.run_until_idle(Duration::from_secs(5));
        assert_eq!(visible(&browser), ["A", "x", "b", "c"]);

        let a = position(&browser, "A");
        assert!(browser.set_expanded(a, false));
        assert!(!browser.set_expanded(a, false));
        assert_eq!(visible(&browser), ["A", "b", "c"]);

        assert!(browser.set_expanded(a, true));
        browser.run_until_idle(Duration::from_secs(5));
        assert_eq!(visible(&browser), ["A", "x", "b", "c"]);
    }

    #[test]
    fn filter_updates_summary() {
        let fs = scenario();
        let mut browser = open(&fs, inline_config(ExpandPolicy::RootChildren));
        browser.run_until_idle(Duration::from_secs(5));
        assert_eq!(browser.summary(), "4 items");

        assert!(browser.set_filter("/r/A").is_some());
        assert_eq!(visible(&browser), ["A", "x"]);
        assert_eq!(browser.summary(), "2/4 items");
        assert!(browser.set_filter("/r/A").is_none());

        browser.set_filter("");
        assert_eq!(browser.summary(), "4 items");
    }

    #[test]
    fn summary_reports_outstanding_directories() {
        let fs = MemoryLister::new();
        for d in 0..5 {
            fs.add_file(format!("/r/d{d}/f"));
        }
        let mut config = inline_config(ExpandPolicy::RootChildren);
        config.scan.max_active = 2;
        let mut browser = open(&fs, config);

        // Root listing arrives; one child starts beside the root, four wait.
        browser.pump();
        assert_eq!(browser.tick(), Poll::Continue);
        assert_eq!(browser.summary(), "5 items (6 directories remaining)");

        browser.run_until_idle(Duration::from_secs(5));
        assert_eq!(browser.tick(), Poll::Stop);
        assert_eq!(browser.summary(), "10 items");
        assert!(browser.status().peak_active <= 2);
    }

    #[test]
    fn subscribers_see_one_change_per_sort_toggle() {
        let fs = scenario();
        let mut browser = open(&fs, inline_config(ExpandPolicy::Manual));
        browser.run_until_idle(Duration::from_secs(5));

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let id = browser.subscribe(Box::new(move |c| sink.borrow_mut().push(*c)));
        browser.toggle_sort();
        assert_eq!(seen.borrow().len(), 1);

        assert!(browser.unsubscribe(id));
        browser.toggle_sort();
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn initial_filter_and_order_come_from_config() {
        let fs = scenario();
        let config = BrowserConfig {
            filter: "b".into(),
            sort: SortOrder::Descending,
            case: CaseSensitivity::Insensitive,
            ..inline_config(ExpandPolicy::Manual)
        };
        let mut browser = open(&fs, config);
        browser.run_until_idle(Duration::from_secs(5));
        assert_eq!(visible(&browser), ["b"]);
        assert_eq!(browser.case_sensitivity(), CaseSensitivity::Insensitive);
    }
}

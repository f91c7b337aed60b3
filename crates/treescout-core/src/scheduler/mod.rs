/// Enumeration scheduler: bounded, queued, asynchronous directory listing.
///
/// The scheduler owns the only concurrency-coordination state in the core: a
/// count of active enumerations and a FIFO queue of deferred models. Batch
/// fetches run on an [`IoExecutor`]; their results come back over a
/// crossbeam channel and are applied only when the owner calls
/// [`Scheduler::dispatch`], so every model mutation happens on the owning
/// thread and no locking is needed downstream.
///
/// # Lifecycle of a request
///
/// 1. `submit`: queued if the ceiling is reached, otherwise the directory is
///    opened. Resource exhaustion while others are active re-queues; any other
///    open failure is terminal for that model.
/// 2. Each completed batch is spliced into the model in one piece and the next
///    fetch is issued.
/// 3. An empty batch (or a fetch error) frees the slot and admits deferred
///    models.
///
/// The scheduler only holds weak references. A model dropped mid-flight is
/// detected at completion time and its slot is released without touching it.
pub mod executor;

pub use executor::IoExecutor;

use crate::config::ScanConfig;
use crate::error::{ListError, SubmitError};
use crate::lister::{ChildDescriptor, DirectoryLister, Listing};
use crate::model::{DirEntry, DirModel, EnumerationState, ListModel};
use crate::tree::ModelSource;
use crossbeam_channel::{Receiver, Sender};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Identifies one in-flight enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TicketId(u64);

/// What happened to a submitted model.
#[derive(Debug)]
pub enum Admission {
    /// Listing opened and the first fetch issued.
    Started,
    /// Deferred until a slot frees up.
    Queued,
    /// Opening failed terminally; the model will never receive entries.
    Dropped(ListError),
}

/// Snapshot of scheduler counters for progress reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SchedulerStatus {
    pub active: usize,
    pub queued: usize,
    pub completed: u64,
    pub failed: u64,
    /// Enumerations abandoned because their model was released.
    pub cancelled: u64,
    pub entries_loaded: u64,
    pub peak_active: usize,
}

impl SchedulerStatus {
    /// Directories still owed work: active plus queued.
    pub fn remaining(&self) -> usize {
        self.active + self.queued
    }

    pub fn is_idle(&self) -> bool {
        self.remaining() == 0
    }
}

struct Ticket {
    model: Weak<DirModel>,
    directory: PathBuf,
    batch_size: usize,
}

/// A finished batch fetch, posted back from the executor.
struct Completion {
    ticket: TicketId,
    listing: Box<dyn Listing>,
    result: Result<Vec<ChildDescriptor>, ListError>,
}

pub struct Scheduler {
    lister: Arc<dyn DirectoryLister>,
    config: ScanConfig,
    executor: IoExecutor,
    completions_tx: Sender<Completion>,
    completions_rx: Receiver<Completion>,
    active: usize,
    pending: VecDeque<Weak<DirModel>>,
    in_flight: HashMap<TicketId, Ticket>,
    next_ticket: u64,
    completed: u64,
    failed: u64,
    cancelled: u64,
    entries_loaded: u64,
    peak_active: usize,
}

impl Scheduler {
    /// Create a scheduler with the executor described by `config`.
    pub fn new(
        lister: Arc<dyn DirectoryLister>,
        config: ScanConfig,
    ) -> Result<Self, rayon::ThreadPoolBuildError> {
        let executor = if config.inline_io {
            IoExecutor::Inline
        } else {
            IoExecutor::pool(config.io_threads)?
        };
        Ok(Self::with_executor(lister, config, executor))
    }

    pub fn with_executor(
        lister: Arc<dyn DirectoryLister>,
        config: ScanConfig,
        executor: IoExecutor,
    ) -> Self {
        if let Err(err) = config.validate() {
            warn!("{err}; raising zero limits to 1");
        }
        let config = config.sanitized();
        let (completions_tx, completions_rx) = crossbeam_channel::unbounded();
        Self {
            lister,
            config,
            executor,
            completions_tx,
            completions_rx,
            active: 0,
            pending: VecDeque::new(),
            in_flight: HashMap::new(),
            next_ticket: 0,
            completed: 0,
            failed: 0,
            cancelled: 0,
            entries_loaded: 0,
            peak_active: 0,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Request enumeration of `model`'s directory.
    ///
    /// Submitting a model that is already queued or active is a programming
    /// error: it panics in debug builds and returns
    /// [`SubmitError::AlreadyScheduled`] otherwise.
    pub fn submit(&mut self, model: &Rc<DirModel>) -> Result<Admission, SubmitError> {
        let state = model.state();
        debug_assert!(
            !state.is_pending(),
            "{} submitted twice",
            model.directory().display()
        );
        if state.is_pending() {
            return Err(SubmitError::AlreadyScheduled {
                path: model.directory().to_path_buf(),
            });
        }
        Ok(self.start(model))
    }

    fn start(&mut self, model: &Rc<DirModel>) -> Admission {
        if self.active >= self.config.max_active {
            self.defer(model);
            return Admission::Queued;
        }

        let directory = model.directory();
        let listing = match self.lister.open(directory) {
            Ok(listing) => listing,
            Err(err) if err.is_resource_exhausted() && self.active > 0 => {
                debug!(
                    "out of handles opening {} with {} active; deferring",
                    directory.display(),
                    self.active
                );
                self.defer(model);
                return Admission::Queued;
            }
            Err(err) => {
                match err {
                    ListError::Io { .. } => warn!("cannot list {}: {err}", directory.display()),
                    _ => debug!("cannot list {}: {err}", directory.display()),
                }
                model.set_state(EnumerationState::Failed);
                self.failed += 1;
                return Admission::Dropped(err);
            }
        };

        let batch_size = if self.lister.is_native(directory) {
            self.config.native_batch_size
        } else {
            self.config.remote_batch_size
        };

        self.active += 1;
        self.peak_active = self.peak_active.max(self.active);
        let ticket = TicketId(self.next_ticket);
        self.next_ticket += 1;
        self.in_flight.insert(
            ticket,
            Ticket {
                model: Rc::downgrade(model),
                directory: directory.to_path_buf(),
                batch_size,
            },
        );
        model.set_state(EnumerationState::Active);
        debug!(
            "enumerating {} (batch {batch_size}, {} active)",
            directory.display(),
            self.active
        );

        self.fetch(ticket, listing, batch_size);
        Admission::Started
    }

    fn defer(&mut self, model: &Rc<DirModel>) {
        model.set_state(EnumerationState::Queued);
        self.pending.push_back(Rc::downgrade(model));
    }

    fn fetch(&self, ticket: TicketId, mut listing: Box<dyn Listing>, batch_size: usize) {
        let tx = self.completions_tx.clone();
        self.executor.spawn(move || {
            let result = listing.next_batch(batch_size);
            // The receiver is gone only if the scheduler was dropped.
            let _ = tx.send(Completion {
                ticket,
                listing,
                result,
            });
        });
    }

    /// Apply the completions that have arrived so far.
    ///
    /// Completions posted while dispatching (the follow-up fetch of an inline
    /// executor, for instance) wait for the next call, so each call advances
    /// every directory by at most one batch. Returns the number applied.
    pub fn dispatch(&mut self) -> usize {
        let budget = self.completions_rx.len();
        let mut handled = 0;
        while handled < budget {
            match self.completions_rx.try_recv() {
                Ok(completion) => {
                    self.complete(completion);
                    handled += 1;
                }
                Err(_) => break,
            }
        }
        handled
    }

    /// Block up to `timeout` for at least one completion, then dispatch
    /// everything available. Returns immediately when nothing is in flight.
    pub fn wait_dispatch(&mut self, timeout: Duration) -> usize {
        if self.in_flight.is_empty() {
            return self.dispatch();
        }
        match self.completions_rx.recv_timeout(timeout) {
            Ok(completion) => {
                self.complete(completion);
                1 + self.dispatch()
            }
            Err(_) => 0,
        }
    }

    fn complete(&mut self, completion: Completion) {
        let Completion {
            ticket: id,
            listing,
            result,
        } = completion;

        let Some(ticket) = self.in_flight.remove(&id) else {
            warn!("completion for unknown ticket {id:?}");
            return;
        };

        let Some(model) = ticket.model.upgrade() else {
            debug!(
                "{} released mid-enumeration; abandoning",
                ticket.directory.display()
            );
            self.cancelled += 1;
            self.release_slot();
            return;
        };

        match result {
            Ok(batch) if batch.is_empty() => {
                model.set_state(EnumerationState::Complete);
                self.completed += 1;
                debug!(
                    "finished {} ({} entries)",
                    ticket.directory.display(),
                    model.len()
                );
                drop(model);
                self.release_slot();
            }
            Ok(batch) => {
                self.entries_loaded += batch.len() as u64;
                let entries: Vec<DirEntry> = batch
                    .into_iter()
                    .map(|child| DirEntry::new(&ticket.directory, child))
                    .collect();
                model.append_batch(entries);

                let batch_size = ticket.batch_size;
                self.in_flight.insert(id, ticket);
                self.fetch(id, listing, batch_size);
            }
            Err(err) => {
                warn!("enumeration of {} stopped early: {err}", ticket.directory.display());
                model.set_state(EnumerationState::Failed);
                self.failed += 1;
                drop(model);
                self.release_slot();
            }
        }
    }

    /// Free one concurrency slot and admit deferred models into free slots.
    fn release_slot(&mut self) {
        self.active -= 1;
        while self.active < self.config.max_active {
            let Some(weak) = self.pending.pop_front() else {
                break;
            };
            let Some(model) = weak.upgrade() else {
                continue;
            };
            if let Admission::Queued = self.start(&model) {
                // Still out of handles; wait for the next slot to free up.
                break;
            }
        }
    }

    pub fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            active: self.active,
            queued: self
                .pending
                .iter()
                .filter(|weak| weak.strong_count() > 0)
                .count(),
            completed: self.completed,
            failed: self.failed,
            cancelled: self.cancelled,
            entries_loaded: self.entries_loaded,
            peak_active: self.peak_active,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.status().is_idle()
    }
}

impl ModelSource for Scheduler {
    /// A fresh, submitted model for directories; `None` for leaves and for
    /// directories that cannot be opened.
    fn child_model(&mut self, entry: &DirEntry) -> Option<Rc<DirModel>> {
        if !entry.is_dir() {
            return None;
        }
        let model = DirModel::new(entry.path());
        match self.submit(&model) {
            Ok(Admission::Started | Admission::Queued) => Some(model),
            Ok(Admission::Dropped(_)) | Err(_) => None,
        }
    }
}

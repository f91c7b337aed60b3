/// Lazy directory model: the entries of one directory, filled in batches.
///
/// The model is a passive container. It is created empty, handed to the
/// [`Scheduler`](crate::scheduler::Scheduler) for enumeration, and grows as
/// batches arrive. Entries are only ever appended; each appended batch emits
/// exactly one [`RangeChange`] to subscribers.
///
/// Models are shared with `Rc`: the tree layer holds the strong references,
/// the scheduler only a weak one, so dropping a collapsed subtree cancels its
/// enumeration.
use super::change::{ListModel, RangeChange, Subscribers, SubscriptionId};
use super::entry::DirEntry;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_MODEL_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a model, stable for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelId(u64);

/// Where a model is in its enumeration lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumerationState {
    /// Never submitted.
    Idle,
    /// Waiting in the scheduler's deferred queue.
    Queued,
    /// Holds a concurrency slot and an open listing.
    Active,
    /// Reached the end of the directory.
    Complete,
    /// Enumeration stopped early; entries received so far remain.
    Failed,
}

impl EnumerationState {
    /// `true` while the scheduler still owes this model work.
    pub fn is_pending(self) -> bool {
        matches!(self, Self::Queued | Self::Active)
    }
}

pub struct DirModel {
    id: ModelId,
    directory: PathBuf,
    entries: RefCell<Vec<Rc<DirEntry>>>,
    state: Cell<EnumerationState>,
    subscribers: Subscribers<RangeChange>,
}

impl DirModel {
    /// Create an empty, not-yet-submitted model for `directory`.
    pub fn new(directory: impl Into<PathBuf>) -> Rc<Self> {
        Rc::new(Self {
            id: ModelId(NEXT_MODEL_ID.fetch_add(1, Ordering::Relaxed)),
            directory: directory.into(),
            entries: RefCell::new(Vec::new()),
            state: Cell::new(EnumerationState::Idle),
            subscribers: Subscribers::new(),
        })
    }

    pub fn id(&self) -> ModelId {
        self.id
    }

    /// The directory this model lists.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn state(&self) -> EnumerationState {
        self.state.get()
    }

    pub(crate) fn set_state(&self, state: EnumerationState) {
        self.state.set(state);
    }

    /// Append one arrival batch and notify subscribers once.
    ///
    /// Returns the change that was emitted; an empty batch emits nothing.
    pub fn append_batch(&self, batch: Vec<DirEntry>) -> RangeChange {
        let change = {
            let mut entries = self.entries.borrow_mut();
            let change = RangeChange::appended(entries.len(), batch.len());
            entries.extend(batch.into_iter().map(Rc::new));
            change
        };
        if !change.is_empty() {
            self.subscribers.emit(&change);
        }
        change
    }

    /// Entries from `start` to the current end.
    pub fn entries_from(&self, start: usize) -> Vec<Rc<DirEntry>> {
        let entries = self.entries.borrow();
        entries.get(start..).map(<[_]>::to_vec).unwrap_or_default()
    }

    /// Number of change subscribers currently attached.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl ListModel for DirModel {
    type Item = Rc<DirEntry>;

    fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    fn get(&self, position: usize) -> Option<Rc<DirEntry>> {
        self.entries.borrow().get(position).cloned()
    }

    fn subscribe(&self, callback: Box<dyn FnMut(&RangeChange)>) -> SubscriptionId {
        self.subscribers.subscribe_boxed(callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }
}

impl fmt::Debug for DirModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirModel")
            .field("id", &self.id)
            .field("directory", &self.directory)
            .field("len", &self.len())
            .field("state", &self.state.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lister::ChildDescriptor;
    use crate::model::EntryKind;

    fn batch(dir: &Path, names: &[&str]) -> Vec<DirEntry> {
        names
            .iter()
            .map(|n| DirEntry::new(dir, ChildDescriptor::new(*n, EntryKind::File)))
            .collect()
    }

    #[test]
    fn one_batch_one_notification() {
        let model = DirModel::new("/data");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        model.subscribe(Box::new(move |c| sink.borrow_mut().push(*c)));

        model.append_batch(batch(model.directory(), &["a", "b", "c", "d", "e"]));
        model.append_batch(batch(model.directory(), &["f", "g"]));

        assert_eq!(
            *seen.borrow(),
            vec![RangeChange::appended(0, 5), RangeChange::appended(5, 2)]
        );
        assert_eq!(model.len(), 7);
        assert_eq!(model.get(5).unwrap().name(), "f");
    }

    #[test]
    fn empty_batch_is_silent() {
        let model = DirModel::new("/data");
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        model.subscribe(Box::new(move |_| c.set(c.get() + 1)));
        assert!(model.append_batch(Vec::new()).is_empty());
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn entries_from_returns_tail() {
        let model = DirModel::new("/data");
        model.append_batch(batch(model.directory(), &["a", "b", "c"]));
        let tail: Vec<_> = model.entries_from(1).iter().map(|e| e.name().to_string()).collect();
        assert_eq!(tail, vec!["b", "c"]);
        assert!(model.entries_from(10).is_empty());
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(DirModel::new("/a").id(), DirModel::new("/a").id());
    }
}

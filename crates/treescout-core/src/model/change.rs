/// Change notifications shared by every layer of the pipeline.
///
/// A [`RangeChange`] says "at `position`, `removed` items were replaced by
/// `added` items". Every logical mutation (one enumeration batch, one
/// expand/collapse, one sort toggle, one filter update) produces exactly one
/// of these, so a virtualised view only ever repaints the affected window.
use std::cell::RefCell;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RangeChange {
    pub position: usize,
    pub removed: usize,
    pub added: usize,
}

impl RangeChange {
    pub fn new(position: usize, removed: usize, added: usize) -> Self {
        Self {
            position,
            removed,
            added,
        }
    }

    /// `added` items appended at `position` (the old length).
    pub fn appended(position: usize, added: usize) -> Self {
        Self::new(position, 0, added)
    }

    pub fn is_empty(&self) -> bool {
        self.removed == 0 && self.added == 0
    }

    /// Smallest single change turning `old` into `new`, found by trimming the
    /// common prefix and suffix. `None` if the slices are identical.
    pub fn between<T: PartialEq>(old: &[T], new: &[T]) -> Option<Self> {
        let prefix = old.iter().zip(new).take_while(|(a, b)| a == b).count();
        let max_suffix = old.len().min(new.len()) - prefix;
        let suffix = old
            .iter()
            .rev()
            .zip(new.iter().rev())
            .take(max_suffix)
            .take_while(|(a, b)| a == b)
            .count();
        let change = Self::new(prefix, old.len() - prefix - suffix, new.len() - prefix - suffix);
        (!change.is_empty()).then_some(change)
    }

    /// Single change covering a batch of removals and insertions applied to
    /// an ordered sequence whose surviving items kept their relative order.
    ///
    /// `removed` is the inclusive `(first, last)` span of removed positions in
    /// the old sequence, `added` the inclusive span of inserted positions in
    /// the new one.
    pub fn spanning(
        old_len: usize,
        new_len: usize,
        removed: Option<(usize, usize)>,
        added: Option<(usize, usize)>,
    ) -> Option<Self> {
        let lo = match (removed, added) {
            (None, None) => return None,
            (Some((r, _)), None) => r,
            (None, Some((a, _))) => a,
            (Some((r, _)), Some((a, _))) => r.min(a),
        };
        let hi_old = removed.map_or(lo, |(_, last)| (last + 1).max(lo));
        let hi_new = added.map_or(lo, |(_, last)| (last + 1).max(lo));
        let tail = (old_len - hi_old).min(new_len - hi_new);
        Some(Self::new(lo, old_len - tail - lo, new_len - tail - lo))
    }
}

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<E> = Box<dyn FnMut(&E)>;

struct SubscriberList<E> {
    next_id: u64,
    callbacks: Vec<(SubscriptionId, Callback<E>)>,
    emitting: bool,
    /// Ids of the callbacks taken out for the delivery in progress.
    delivering: Vec<SubscriptionId>,
    /// Of `delivering`, those unsubscribed before the delivery finished.
    cancelled: Vec<SubscriptionId>,
    /// Events emitted from inside a callback, delivered after the current one.
    queued: VecDeque<E>,
}

/// An explicit subscriber list.
///
/// Callbacks may subscribe, unsubscribe or emit while an event is being
/// delivered. New subscribers start receiving events from the next delivery;
/// nested events are queued and delivered, in order, once the current event
/// has reached every subscriber.
pub struct Subscribers<E> {
    inner: RefCell<SubscriberList<E>>,
}

impl<E> Default for Subscribers<E> {
    fn default() -> Self {
        Self {
            inner: RefCell::new(SubscriberList {
                next_id: 0,
                callbacks: Vec::new(),
                emitting: false,
                delivering: Vec::new(),
                cancelled: Vec::new(),
                queued: VecDeque::new(),
            }),
        }
    }
}

impl<E> Subscribers<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, callback: impl FnMut(&E) + 'static) -> SubscriptionId {
        self.subscribe_boxed(Box::new(callback))
    }

    pub fn subscribe_boxed(&self, callback: Callback<E>) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.callbacks.push((id, callback));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.borrow_mut();
        if let Some(pos) = inner.callbacks.iter().position(|(sid, _)| *sid == id) {
            inner.callbacks.remove(pos);
            return true;
        }
        if inner.delivering.contains(&id) && !inner.cancelled.contains(&id) {
            inner.cancelled.push(id);
            return true;
        }
        false
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.borrow();
        inner.callbacks.len() + inner.delivering.len() - inner.cancelled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn next_queued(&self) -> Option<E> {
        self.inner.borrow_mut().queued.pop_front()
    }

    fn is_cancelled(&self, id: SubscriptionId) -> bool {
        self.inner.borrow().cancelled.contains(&id)
    }

    fn deliver(&self, event: &E) {
        let mut callbacks = {
            let mut inner = self.inner.borrow_mut();
            let callbacks = std::mem::take(&mut inner.callbacks);
            inner.delivering = callbacks.iter().map(|(id, _)| *id).collect();
            callbacks
        };

        for (id, callback) in callbacks.iter_mut() {
            if !self.is_cancelled(*id) {
                callback(event);
            }
        }

        let mut inner = self.inner.borrow_mut();
        callbacks.append(&mut inner.callbacks);
        let cancelled = std::mem::take(&mut inner.cancelled);
        callbacks.retain(|(id, _)| !cancelled.contains(id));
        inner.callbacks = callbacks;
        inner.delivering.clear();
    }
}

impl<E: Clone> Subscribers<E> {
    pub fn emit(&self, event: &E) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.emitting {
                inner.queued.push_back(event.clone());
                return;
            }
            inner.emitting = true;
        }

        self.deliver(event);
        while let Some(next) = self.next_queued() {
            self.deliver(&next);
        }
        self.inner.borrow_mut().emitting = false;
    }
}

/// The ordered, change-notifying collection a virtualised view consumes.
pub trait ListModel {
    type Item;

    fn len(&self) -> usize;

    fn get(&self, position: usize) -> Option<Self::Item>;

    fn subscribe(&self, callback: Box<dyn FnMut(&RangeChange)>) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

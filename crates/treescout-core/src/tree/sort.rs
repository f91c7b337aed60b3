/// Sort layer: hierarchical, depth-aware ordering of flattened rows.
///
/// Rows are compared by walking both up to their nearest pair of sibling
/// ancestors and comparing those by path. An ancestor always precedes its
/// descendants, in either direction, so the sorted sequence is still a valid
/// pre-order traversal where each directory's children appear in sorted order.
use super::flatten::{TreeDelta, TreeListModel};
use super::SortOrder;
use crate::model::{ListModel, NodeId, RangeChange, Subscribers, SubscriptionId};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Total order over live rows of `tree`.
///
/// Only the sibling comparison is reversed for [`SortOrder::Descending`]; the
/// ancestor-first rule never is.
pub fn compare_rows(tree: &TreeListModel, a: NodeId, b: NodeId, order: SortOrder) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    let (depth_a, depth_b) = (tree.depth(a), tree.depth(b));
    let (mut a, mut b) = (a, b);

    while tree.depth(a) > depth_b {
        match tree.parent(a) {
            Some(parent) => a = parent,
            None => break,
        }
    }
    while tree.depth(b) > depth_a {
        match tree.parent(b) {
            Some(parent) => b = parent,
            None => break,
        }
    }
    if a == b {
        // One row is an ancestor of the other.
        return depth_a.cmp(&depth_b);
    }

    while tree.parent(a) != tree.parent(b) {
        match (tree.parent(a), tree.parent(b)) {
            (Some(pa), Some(pb)) => {
                a = pa;
                b = pb;
            }
            _ => break,
        }
    }

    let ordering = match (tree.entry(a), tree.entry(b)) {
        (Some(ea), Some(eb)) => ea.cmp_path_ignore_case(eb),
        _ => a.cmp(&b),
    };
    if order.is_descending() {
        ordering.reverse()
    } else {
        ordering
    }
}

pub struct SortListModel {
    order: SortOrder,
    sorted: Vec<NodeId>,
    subscribers: Subscribers<RangeChange>,
}

impl SortListModel {
    pub fn new(order: SortOrder) -> Self {
        Self {
            order,
            sorted: Vec::new(),
            subscribers: Subscribers::new(),
        }
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    pub fn as_slice(&self) -> &[NodeId] {
        &self.sorted
    }

    /// Fold one tree delta into the sorted sequence.
    ///
    /// Departed rows are dropped, new rows are merged in at their sorted
    /// positions, and a single notification spanning everything that moved
    /// is emitted.
    pub fn apply(&mut self, delta: &TreeDelta, tree: &TreeListModel) -> Option<RangeChange> {
        let old_len = self.sorted.len();

        let removed_span = if delta.removed.is_empty() {
            None
        } else {
            let gone: HashSet<NodeId> = delta.removed.iter().copied().collect();
            let first = self.sorted.iter().position(|id| gone.contains(id));
            let last = self.sorted.iter().rposition(|id| gone.contains(id));
            self.sorted.retain(|id| !gone.contains(id));
            first.zip(last)
        };

        let added_span = if delta.added.is_empty() {
            None
        } else {
            let mut fresh = delta.added.clone();
            let order = self.order;
            fresh.sort_by(|&a, &b| compare_rows(tree, a, b, order));
            self.merge(fresh, tree)
        };

        let change = RangeChange::spanning(old_len, self.sorted.len(), removed_span, added_span)?;
        self.subscribers.emit(&change);
        Some(change)
    }

    /// Merge already sorted `fresh` rows in; returns the inclusive span of
    /// positions they landed on.
    fn merge(&mut self, fresh: Vec<NodeId>, tree: &TreeListModel) -> Option<(usize, usize)> {
        let order = self.order;
        let existing = std::mem::take(&mut self.sorted);
        let mut merged = Vec::with_capacity(existing.len() + fresh.len());
        let mut span: Option<(usize, usize)> = None;

        let mut old = existing.into_iter().peekable();
        for id in fresh {
            while let Some(&next) = old.peek() {
                if compare_rows(tree, next, id, order) == Ordering::Greater {
                    break;
                }
                merged.push(next);
                old.next();
            }
            let at = merged.len();
            span = Some(span.map_or((at, at), |(first, _)| (first, at)));
            merged.push(id);
        }
        merged.extend(old);
        self.sorted = merged;
        span
    }

    /// Replace the whole sequence with `tree`'s rows.
    pub fn rebuild(&mut self, tree: &TreeListModel) -> Option<RangeChange> {
        let old_len = self.sorted.len();
        self.sorted = tree.rows().to_vec();
        self.resort(tree);
        self.emit_reset(old_len)
    }

    /// Switch direction with a stable full re-sort and one notification.
    pub fn set_order(&mut self, order: SortOrder, tree: &TreeListModel) -> Option<RangeChange> {
        if order == self.order {
            return None;
        }
        self.order = order;
        self.resort(tree);
        self.emit_reset(self.sorted.len())
    }

    pub fn toggle(&mut self, tree: &TreeListModel) -> Option<RangeChange> {
        self.set_order(self.order.toggled(), tree)
    }

    fn resort(&mut self, tree: &TreeListModel) {
        let order = self.order;
        self.sorted.sort_by(|&a, &b| compare_rows(tree, a, b, order));
    }

    fn emit_reset(&self, old_len: usize) -> Option<RangeChange> {
        let change = RangeChange::new(0, old_len, self.sorted.len());
        if change.is_empty() {
            return None;
        }
        self.subscribers.emit(&change);
        Some(change)
    }
}

impl ListModel for SortListModel {
    type Item = NodeId;

    fn len(&self) -> usize {
        self.sorted.len()
    }

    fn get(&self, position: usize) -> Option<NodeId> {
        self.sorted.get(position).copied()
    }

    fn subscribe(&self, callback: Box<dyn FnMut(&RangeChange)>) -> SubscriptionId {
        self.subscribers.subscribe_boxed(callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lister::memory::MemoryLister;
    use crate::scheduler::Scheduler;
    use crate::tree::test_support::{find, names, settle, setup};
    use crate::tree::ExpandPolicy;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn feed(sort: &mut SortListModel, sched: &mut Scheduler, tree: &mut TreeListModel) {
        for delta in settle(sched, tree) {
            sort.apply(&delta, tree);
        }
    }

    fn scenario() -> MemoryLister {
        let fs = MemoryLister::new();
        fs.add_file("/r/b").add_file("/r/A/x").add_file("/r/c");
        fs
    }

    #[test]
    fn scenario_ascending_then_expand_then_descending() {
        let fs = scenario();
        let (mut sched, mut tree) = setup(&fs, "/r", ExpandPolicy::Manual);
        let mut sort = SortListModel::new(SortOrder::Ascending);
        feed(&mut sort, &mut sched, &mut tree);
        assert_eq!(names(&tree, sort.as_slice()), ["A", "b", "c"]);

        let a = find(&tree, "A");
        tree.set_expanded(a, true, &mut sched);
        feed(&mut sort, &mut sched, &mut tree);
        assert_eq!(names(&tree, sort.as_slice()), ["A", "x", "b", "c"]);

        let change = sort.toggle(&tree).unwrap();
        assert_eq!(change, RangeChange::new(0, 4, 4));
        assert_eq!(names(&tree, sort.as_slice()), ["c", "b", "A", "x"]);
    }

    #[test]
    fn ancestor_precedes_descendant_in_both_directions() {
        let fs = MemoryLister::new();
        fs.add_file("/r/A/B/deep").add_file("/r/A/f");
        let (mut sched, mut tree) = setup(&fs, "/r", ExpandPolicy::Recursive);
        settle(&mut sched, &mut tree);
        let a = find(&tree, "A");
        let deep = find(&tree, "deep");
        for order in [SortOrder::Ascending, SortOrder::Descending] {
            assert_eq!(compare_rows(&tree, a, deep, order), Ordering::Less);
            assert_eq!(compare_rows(&tree, deep, a, order), Ordering::Greater);
        }
    }

    #[test]
    fn descending_reverses_every_sibling_comparison() {
        let fs = MemoryLister::new();
        fs.add_file("/r/A/q").add_file("/r/A/P").add_file("/r/b/z");
        let (mut sched, mut tree) = setup(&fs, "/r", ExpandPolicy::Recursive);
        settle(&mut sched, &mut tree);
        let rows = tree.rows().to_vec();
        for &x in &rows {
            for &y in &rows {
                let asc = compare_rows(&tree, x, y, SortOrder::Ascending);
                let desc = compare_rows(&tree, x, y, SortOrder::Descending);
                let related = tree.parent(x) == Some(y) || tree.parent(y) == Some(x);
                if x == y || related {
                    assert_eq!(asc, desc);
                } else {
                    assert_eq!(asc, desc.reverse());
                }
            }
        }
    }

    #[test]
    fn case_only_differences_are_ordered_by_raw_bytes() {
        let fs = MemoryLister::new();
        fs.add_file("/r/readme").add_file("/r/README");
        let (mut sched, mut tree) = setup(&fs, "/r", ExpandPolicy::Manual);
        let mut sort = SortListModel::new(SortOrder::Ascending);
        feed(&mut sort, &mut sched, &mut tree);
        assert_eq!(names(&tree, sort.as_slice()), ["README", "readme"]);
    }

    #[test]
    fn incremental_insert_emits_one_spanning_change() {
        let fs = scenario();
        let (mut sched, mut tree) = setup(&fs, "/r", ExpandPolicy::Manual);
        let mut sort = SortListModel::new(SortOrder::Ascending);
        feed(&mut sort, &mut sched, &mut tree);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        sort.subscribe(Box::new(move |c| sink.borrow_mut().push(*c)));

        let a = find(&tree, "A");
        tree.set_expanded(a, true, &mut sched);
        feed(&mut sort, &mut sched, &mut tree);
        assert_eq!(*seen.borrow(), vec![RangeChange::new(1, 0, 1)]);
    }

    #[test]
    fn collapse_removes_descendants_from_sorted_order() {
        let fs = scenario();
        let (mut sched, mut tree) = setup(&fs, "/r", ExpandPolicy::RootChildren);
        let mut sort = SortListModel::new(SortOrder::Descending);
        feed(&mut sort, &mut sched, &mut tree);
        assert_eq!(names(&tree, sort.as_slice()), ["c", "b", "A", "x"]);

        let a = find(&tree, "A");
        let delta = tree.set_expanded(a, false, &mut sched).unwrap();
        let change = sort.apply(&delta, &tree).unwrap();
        assert_eq!(change, RangeChange::new(3, 1, 0));
        assert_eq!(names(&tree, sort.as_slice()), ["c", "b", "A"]);
    }

    #[test]
    fn rebuild_matches_incremental_result() {
        let fs = MemoryLister::new();
        fs.add_file("/r/m/2").add_file("/r/Z").add_file("/r/m/1").add_file("/r/a");
        let (mut sched, mut tree) = setup(&fs, "/r", ExpandPolicy::Recursive);
        let mut incremental = SortListModel::new(SortOrder::Ascending);
        feed(&mut incremental, &mut sched, &mut tree);

        let mut rebuilt = SortListModel::new(SortOrder::Ascending);
        rebuilt.rebuild(&tree);
        assert_eq!(incremental.as_slice(), rebuilt.as_slice());
        assert_eq!(names(&tree, rebuilt.as_slice()), ["a", "m", "1", "2", "Z"]);
    }
}

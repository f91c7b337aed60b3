/// Filter layer: live substring predicate over the sorted rows.
///
/// Keeps a match flag per sorted row so that incremental sort changes only
/// re-evaluate the rows they touch. The sorted sequence is never mutated.
use super::flatten::TreeListModel;
use super::CaseSensitivity;
use crate::model::{DirEntry, ListModel, NodeId, RangeChange, Subscribers, SubscriptionId};

pub struct FilterListModel {
    text: String,
    case: CaseSensitivity,
    /// `text`, lowercased when matching ignores case.
    needle: String,
    /// One flag per row of the sorted sequence.
    matches: Vec<bool>,
    visible: Vec<NodeId>,
    subscribers: Subscribers<RangeChange>,
}

impl FilterListModel {
    pub fn new(text: impl Into<String>, case: CaseSensitivity) -> Self {
        let text = text.into();
        Self {
            needle: needle_for(&text, case),
            text,
            case,
            matches: Vec::new(),
            visible: Vec::new(),
            subscribers: Subscribers::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn case(&self) -> CaseSensitivity {
        self.case
    }

    pub fn as_slice(&self) -> &[NodeId] {
        &self.visible
    }

    /// Whether `entry`'s absolute path contains the filter text.
    pub fn matches(&self, entry: &DirEntry) -> bool {
        if self.needle.is_empty() {
            return true;
        }
        let path = entry.path().to_string_lossy();
        match self.case {
            CaseSensitivity::Sensitive => path.contains(self.needle.as_str()),
            CaseSensitivity::Insensitive => path.to_lowercase().contains(self.needle.as_str()),
        }
    }

    fn row_matches(&self, tree: &TreeListModel, id: NodeId) -> bool {
        tree.entry(id).is_some_and(|entry| self.matches(entry))
    }

    /// Translate one change of the sorted sequence into a visible-row change.
    pub fn apply(
        &mut self,
        change: &RangeChange,
        sorted: &[NodeId],
        tree: &TreeListModel,
    ) -> Option<RangeChange> {
        let start = change.position;
        let end = start + change.removed;
        // Counting the prefix costs the same as the `visible` splice below.
        let visible_start = self.matches[..start].iter().filter(|&&m| m).count();
        let visible_removed = self.matches[start..end].iter().filter(|&&m| m).count();

        let fresh = &sorted[start..start + change.added];
        let flags: Vec<bool> = fresh.iter().map(|&id| self.row_matches(tree, id)).collect();
        let shown: Vec<NodeId> = fresh
            .iter()
            .zip(&flags)
            .filter_map(|(&id, &keep)| keep.then_some(id))
            .collect();
        let visible_added = shown.len();

        self.matches.splice(start..end, flags);
        self.visible
            .splice(visible_start..visible_start + visible_removed, shown);

        let change = RangeChange::new(visible_start, visible_removed, visible_added);
        if change.is_empty() {
            return None;
        }
        self.subscribers.emit(&change);
        Some(change)
    }

    /// Change the filter text. Setting the current text again does nothing.
    pub fn set_predicate(
        &mut self,
        text: &str,
        sorted: &[NodeId],
        tree: &TreeListModel,
    ) -> Option<RangeChange> {
        if text == self.text {
            return None;
        }
        self.text = text.to_owned();
        self.refilter(sorted, tree)
    }

    pub fn set_case(
        &mut self,
        case: CaseSensitivity,
        sorted: &[NodeId],
        tree: &TreeListModel,
    ) -> Option<RangeChange> {
        if case == self.case {
            return None;
        }
        self.case = case;
        self.refilter(sorted, tree)
    }

    /// Re-evaluate every row against the current predicate.
    ///
    /// Emits the smallest single change between the old and new visible
    /// sequences, or nothing if they are identical.
    pub fn refilter(&mut self, sorted: &[NodeId], tree: &TreeListModel) -> Option<RangeChange> {
        self.needle = needle_for(&self.text, self.case);
        let flags: Vec<bool> = sorted.iter().map(|&id| self.row_matches(tree, id)).collect();
        let visible: Vec<NodeId> = sorted
            .iter()
            .zip(&flags)
            .filter_map(|(&id, &keep)| keep.then_some(id))
            .collect();
        self.matches = flags;

        let change = RangeChange::between(&self.visible, &visible);
        self.visible = visible;
        if let Some(change) = &change {
            self.subscribers.emit(change);
        }
        change
    }

    /// Number of rows hidden by the predicate.
    pub fn hidden(&self) -> usize {
        self.matches.len() - self.visible.len()
    }
}

fn needle_for(text: &str, case: CaseSensitivity) -> String {
    match case {
        CaseSensitivity::Sensitive => text.to_owned(),
        CaseSensitivity::Insensitive => text.to_lowercase(),
    }
}

impl ListModel for FilterListModel {
    type Item = NodeId;

    fn len(&self) -> usize {
        self.visible.len()
    }

    fn get(&self, position: usize) -> Option<NodeId> {
        self.visible.get(position).copied()
    }

    fn subscribe(&self, callback: Box<dyn FnMut(&RangeChange)>) -> SubscriptionId {
        self.subscribers.subscribe_boxed(callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }
}

/// Tree flattening layer.
///
/// Composes one lazy [`DirModel`] per expanded directory into a single
/// pre-order sequence of rows. Rows live in an arena and are addressed by
/// [`NodeId`]; the visible order is a plain `Vec<NodeId>`.
///
/// A node exists only while its parent is expanded, so every live node is a
/// row. Expanding a node creates and submits a fresh child model; collapsing
/// drops that model (cancelling any enumeration still in flight) and frees
/// every descendant node.
///
/// Child models announce new batches through their subscriber lists. The
/// callbacks only record which node went stale; the rows themselves are
/// spliced in by [`TreeListModel::process_pending`], which the owner calls
/// after each scheduler dispatch.
use super::{ExpandPolicy, ModelSource};
use crate::model::{
    DirEntry, DirModel, ListModel, ModelId, NodeId, RangeChange, Subscribers, SubscriptionId,
};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

/// One structural change to the flattened sequence.
///
/// `change` is expressed in tree-row coordinates. `removed` nodes are already
/// freed and `added` nodes are live; both are listed in row order. Deltas must
/// be applied downstream before the next mutation of the tree because freed
/// ids are recycled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeDelta {
    pub change: RangeChange,
    pub removed: Vec<NodeId>,
    pub added: Vec<NodeId>,
}

struct ChildRows {
    model: Rc<DirModel>,
    subscription: SubscriptionId,
    /// Nodes created so far, aligned with the model's entries.
    nodes: Vec<NodeId>,
}

struct TreeNode {
    entry: Rc<DirEntry>,
    parent: Option<NodeId>,
    depth: u16,
    expanded: bool,
    /// Cleared when the directory turned out not to be listable.
    expandable: bool,
    children: Option<ChildRows>,
}

/// A model that has grown since its rows were last materialised.
#[derive(Debug, Clone, Copy)]
struct PendingSplice {
    /// `None` for the root model.
    owner: Option<NodeId>,
    model: ModelId,
}

type Inbox = Rc<RefCell<Vec<PendingSplice>>>;

pub struct TreeListModel {
    nodes: Vec<Option<TreeNode>>,
    free: Vec<NodeId>,
    root: Rc<DirModel>,
    root_subscription: SubscriptionId,
    /// Nodes for the root model's entries, aligned with them.
    roots: Vec<NodeId>,
    /// Pre-order sequence of every live node.
    rows: Vec<NodeId>,
    policy: ExpandPolicy,
    inbox: Inbox,
    subscribers: Subscribers<RangeChange>,
}

impl TreeListModel {
    /// Flatten `root`. Entries it already holds are picked up by the first
    /// [`process_pending`](Self::process_pending).
    pub fn new(root: Rc<DirModel>, policy: ExpandPolicy) -> Self {
        let inbox: Inbox = Rc::default();
        let root_subscription = watch(&root, None, &inbox);
        inbox.borrow_mut().push(PendingSplice {
            owner: None,
            model: root.id(),
        });
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root,
            root_subscription,
            roots: Vec::new(),
            rows: Vec::new(),
            policy,
            inbox,
            subscribers: Subscribers::new(),
        }
    }

    pub fn root_model(&self) -> &Rc<DirModel> {
        &self.root
    }

    pub fn policy(&self) -> ExpandPolicy {
        self.policy
    }

    /// Number of live nodes (equal to the number of rows).
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn rows(&self) -> &[NodeId] {
        &self.rows
    }

    /// Position of `id` in the row sequence.
    ///
    /// A linear scan. Every caller goes on to splice `rows`, which already
    /// shifts the tail, so a position index would not change the cost of a
    /// splice or an expand.
    pub fn row_of(&self, id: NodeId) -> Option<usize> {
        self.rows.iter().position(|&row| row == id)
    }

    fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.idx()).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut TreeNode> {
        self.nodes.get_mut(id.idx()).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn entry(&self, id: NodeId) -> Option<&Rc<DirEntry>> {
        self.node(id).map(|node| &node.entry)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.parent)
    }

    /// Number of ancestors; root-level rows are depth 0.
    pub fn depth(&self, id: NodeId) -> u16 {
        self.node(id).map_or(0, |node| node.depth)
    }

    pub fn is_expanded(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|node| node.expanded)
    }

    pub fn is_expandable(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|node| node.expandable)
    }

    /// The model backing an expanded node's children.
    pub fn child_model(&self, id: NodeId) -> Option<&Rc<DirModel>> {
        self.node(id)
            .and_then(|node| node.children.as_ref())
            .map(|children| &children.model)
    }

    /// Whether any model has announced entries not yet spliced in.
    pub fn has_pending(&self) -> bool {
        !self.inbox.borrow().is_empty()
    }

    fn alloc(&mut self, node: TreeNode) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id.idx()] = Some(node);
                id
            }
            None => {
                let id = NodeId::new(self.nodes.len());
                self.nodes.push(Some(node));
                id
            }
        }
    }

    fn release(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(id.idx()).and_then(Option::take) else {
            return;
        };
        if let Some(children) = node.children {
            children.model.unsubscribe(children.subscription);
        }
        self.free.push(id);
    }

    /// Index one past the last descendant row of the row at `pos`.
    fn subtree_end(&self, pos: usize) -> usize {
        let depth = self.depth(self.rows[pos]);
        self.rows[pos + 1..]
            .iter()
            .position(|&id| self.depth(id) <= depth)
            .map_or(self.rows.len(), |offset| pos + 1 + offset)
    }

    /// Create a node for `entry` and, if the policy says so, expand it.
    /// Returns the node followed by its materialised descendants.
    fn build(
        &mut self,
        entry: Rc<DirEntry>,
        parent: Option<NodeId>,
        depth: u16,
        source: &mut dyn ModelSource,
    ) -> Vec<NodeId> {
        let expandable = entry.kind().is_expandable();
        let id = self.alloc(TreeNode {
            entry,
            parent,
            depth,
            expanded: false,
            expandable,
            children: None,
        });
        let mut subtree = vec![id];
        if expandable && self.policy.auto_expands(depth) {
            subtree.extend(self.attach_children(id, source));
        }
        subtree
    }

    /// Mark `id` expanded, obtain its child model and materialise whatever
    /// entries it already holds. Returns the new descendant rows.
    fn attach_children(&mut self, id: NodeId, source: &mut dyn ModelSource) -> Vec<NodeId> {
        let Some(entry) = self.entry(id).cloned() else {
            return Vec::new();
        };
        let Some(model) = source.child_model(&entry) else {
            debug!("{} cannot be expanded", entry.path().display());
            if let Some(node) = self.node_mut(id) {
                node.expandable = false;
            }
            return Vec::new();
        };

        let subscription = watch(&model, Some(id), &self.inbox);
        let existing = model.entries_from(0);
        let depth = self.depth(id);
        if let Some(node) = self.node_mut(id) {
            node.expanded = true;
            node.children = Some(ChildRows {
                model,
                subscription,
                nodes: Vec::new(),
            });
        }
        self.materialise(Some(id), existing, depth + 1, source)
    }

    /// Build nodes for `entries` under `owner` and record them as its
    /// children. Returns the new rows in pre-order.
    fn materialise(
        &mut self,
        owner: Option<NodeId>,
        entries: Vec<Rc<DirEntry>>,
        depth: u16,
        source: &mut dyn ModelSource,
    ) -> Vec<NodeId> {
        let mut rows = Vec::with_capacity(entries.len());
        let mut direct = Vec::with_capacity(entries.len());
        for entry in entries {
            let subtree = self.build(entry, owner, depth, source);
            direct.push(subtree[0]);
            rows.extend(subtree);
        }
        match owner {
            None => self.roots.extend(direct),
            Some(id) => {
                if let Some(children) = self.node_mut(id).and_then(|n| n.children.as_mut()) {
                    children.nodes.extend(direct);
                }
            }
        }
        rows
    }

    /// Splice in every batch announced since the last call.
    ///
    /// Produces one delta per grown model, in arrival order, and emits each
    /// one to this model's subscribers.
    pub fn process_pending(&mut self, source: &mut dyn ModelSource) -> Vec<TreeDelta> {
        let pending = std::mem::take(&mut *self.inbox.borrow_mut());
        let mut deltas = Vec::new();
        for splice in pending {
            if let Some(delta) = self.splice(splice, source) {
                self.subscribers.emit(&delta.change);
                deltas.push(delta);
            }
        }
        deltas
    }

    fn splice(&mut self, splice: PendingSplice, source: &mut dyn ModelSource) -> Option<TreeDelta> {
        let (model, known, depth, insert_at) = match splice.owner {
            None => (
                self.root.clone(),
                self.roots.len(),
                0,
                self.rows.len(),
            ),
            Some(owner) => {
                let node = self.node(owner)?;
                let children = node.children.as_ref()?;
                // The node may have been collapsed and its id recycled.
                if children.model.id() != splice.model {
                    return None;
                }
                let model = children.model.clone();
                let known = children.nodes.len();
                let depth = node.depth + 1;
                let pos = self.row_of(owner)?;
                (model, known, depth, self.subtree_end(pos))
            }
        };

        let fresh = model.entries_from(known);
        if fresh.is_empty() {
            return None;
        }
        let added = self.materialise(splice.owner, fresh, depth, source);
        self.rows.splice(insert_at..insert_at, added.iter().copied());
        Some(TreeDelta {
            change: RangeChange::new(insert_at, 0, added.len()),
            removed: Vec::new(),
            added,
        })
    }

    /// Expand or collapse `id`.
    ///
    /// Returns the resulting delta, or `None` when no rows changed (already
    /// in the requested state, not expandable, or the directory is still
    /// empty).
    pub fn set_expanded(
        &mut self,
        id: NodeId,
        expanded: bool,
        source: &mut dyn ModelSource,
    ) -> Option<TreeDelta> {
        let node = self.node(id)?;
        if node.expanded == expanded || (expanded && !node.expandable) {
            return None;
        }
        let pos = self.row_of(id)?;

        let delta = if expanded {
            let added = self.attach_children(id, source);
            if added.is_empty() {
                return None;
            }
            let at = pos + 1;
            self.rows.splice(at..at, added.iter().copied());
            TreeDelta {
                change: RangeChange::new(at, 0, added.len()),
                removed: Vec::new(),
                added,
            }
        } else {
            let end = self.subtree_end(pos);
            let removed: Vec<NodeId> = self.rows.drain(pos + 1..end).collect();
            if let Some(node) = self.node_mut(id) {
                node.expanded = false;
                if let Some(children) = node.children.take() {
                    children.model.unsubscribe(children.subscription);
                }
            }
            for &gone in &removed {
                self.release(gone);
            }
            if removed.is_empty() {
                return None;
            }
            TreeDelta {
                change: RangeChange::new(pos + 1, removed.len(), 0),
                removed,
                added: Vec::new(),
            }
        };

        self.subscribers.emit(&delta.change);
        Some(delta)
    }

    pub fn toggle_expanded(&mut self, id: NodeId, source: &mut dyn ModelSource) -> Option<TreeDelta> {
        let expanded = self.is_expanded(id);
        self.set_expanded(id, !expanded, source)
    }
}

impl Drop for TreeListModel {
    fn drop(&mut self) {
        self.root.unsubscribe(self.root_subscription);
        for node in self.nodes.iter().flatten() {
            if let Some(children) = &node.children {
                children.model.unsubscribe(children.subscription);
            }
        }
    }
}

/// Subscribe to `model`, queueing a splice for `owner` on every batch.
fn watch(model: &Rc<DirModel>, owner: Option<NodeId>, inbox: &Inbox) -> SubscriptionId {
    let inbox = Rc::clone(inbox);
    let splice = PendingSplice {
        owner,
        model: model.id(),
    };
    model.subscribe(Box::new(move |_| {
        let mut inbox = inbox.borrow_mut();
        // One entry per model is enough; the splice reads up to the end.
        if !inbox
            .iter()
            .any(|p| p.owner == splice.owner && p.model == splice.model)
        {
            inbox.push(splice);
        }
    }))
}

impl ListModel for TreeListModel {
    type Item = NodeId;

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn get(&self, position: usize) -> Option<NodeId> {
        self.rows.get(position).copied()
    }

    fn subscribe(&self, callback: Box<dyn FnMut(&RangeChange)>) -> SubscriptionId {
        self.subscribers.subscribe_boxed(callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }
}

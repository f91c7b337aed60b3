//! Helpers shared by the layer tests: an inline scheduler over a
//! [`MemoryLister`] and a loop that drives it until nothing is pending.
use super::flatten::{TreeDelta, TreeListModel};
use super::ExpandPolicy;
use crate::config::ScanConfig;
use crate::lister::memory::MemoryLister;
use crate::model::{DirModel, NodeId};
use crate::scheduler::{IoExecutor, Scheduler};
use std::sync::Arc;

pub fn setup(fs: &MemoryLister, root: &str, policy: ExpandPolicy) -> (Scheduler, TreeListModel) {
    setup_with(fs, root, policy, ScanConfig::default())
}

pub fn setup_with(
    fs: &MemoryLister,
    root: &str,
    policy: ExpandPolicy,
    config: ScanConfig,
) -> (Scheduler, TreeListModel) {
    let mut sched = Scheduler::with_executor(Arc::new(fs.clone()), config, IoExecutor::Inline);
    let model = DirModel::new(root);
    sched.submit(&model).unwrap();
    (sched, TreeListModel::new(model, policy))
}

pub fn settle(sched: &mut Scheduler, tree: &mut TreeListModel) -> Vec<TreeDelta> {
    let mut deltas = Vec::new();
    for _ in 0..1_000 {
        sched.dispatch();
        deltas.extend(tree.process_pending(sched));
        if sched.is_idle() && !tree.has_pending() {
            return deltas;
        }
    }
    panic!("tree never settled");
}

pub fn name(tree: &TreeListModel, id: NodeId) -> String {
    tree.entry(id).unwrap().name().to_string()
}

pub fn names(tree: &TreeListModel, ids: &[NodeId]) -> Vec<String> {
    ids.iter().map(|&id| name(tree, id)).collect()
}

pub fn find(tree: &TreeListModel, wanted: &str) -> NodeId {
    *tree
        .rows()
        .iter()
        .find(|&&id| tree.entry(id).unwrap().name() == wanted)
        .unwrap()
}

/// Slot of a row in the tree arena.
///
/// Slots of collapsed subtrees go back on a free list and are handed out
/// again, so an id only names a row while that row is live.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn new(slot: usize) -> Self {
        debug_assert!(u32::try_from(slot).is_ok(), "tree arena exceeds u32 slots");
        Self(slot as u32)
    }

    #[inline]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

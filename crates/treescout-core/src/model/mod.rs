/// Data model for TreeScout.
///
/// Directory entries are immutable and shared; lazy directory models grow in
/// batches and announce each batch through a [`RangeChange`].
pub mod change;
pub mod dir_model;
pub mod entry;
pub mod format;
pub mod icon;
pub mod node;

pub use change::{ListModel, RangeChange, Subscribers, SubscriptionId};
pub use dir_model::{DirModel, EnumerationState, ModelId};
pub use entry::{DirEntry, EntryKind};
pub use node::NodeId;

/// The flatten → sort → filter pipeline over lazy directory models.
///
/// Each layer owns plain vectors of [`NodeId`](crate::model::NodeId)s and is
/// updated explicitly by its owner with the [`TreeDelta`] or
/// [`RangeChange`](crate::model::RangeChange) produced by the layer below.
/// Layers never observe each other directly, so there are no callback cycles.
pub mod filter;
pub mod flatten;
pub mod sort;
#[cfg(test)]
pub(crate) mod test_support;

pub use filter::FilterListModel;
pub use flatten::{TreeDelta, TreeListModel};
pub use sort::SortListModel;

use crate::model::{DirEntry, DirModel};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Produces the child model for an expandable row.
pub trait ModelSource {
    /// A fresh, already submitted model for `entry`, or `None` if the entry
    /// is a leaf or its directory cannot be listed.
    fn child_model(&mut self, entry: &DirEntry) -> Option<Rc<DirModel>>;
}

/// Which directory rows expand on their own as they appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpandPolicy {
    /// Nothing expands until asked.
    Manual,
    /// Direct children of the root expand; deeper rows stay collapsed.
    #[default]
    RootChildren,
    /// Every directory row expands as soon as it appears.
    Recursive,
}

impl ExpandPolicy {
    /// Whether a directory row at `depth` expands automatically.
    pub fn auto_expands(self, depth: u16) -> bool {
        match self {
            Self::Manual => false,
            Self::RootChildren => depth == 0,
            Self::Recursive => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    pub fn is_descending(self) -> bool {
        self == Self::Descending
    }
}

/// How the filter text is matched against paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseSensitivity {
    #[default]
    Sensitive,
    Insensitive,
}

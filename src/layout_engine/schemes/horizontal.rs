use serde::{Deserialize, Serialize};

use super::{SchemeChoice, TilingScheme, fill_empty_leaf};
use crate::layout_engine::error::LayoutResult;
use crate::layout_engine::graph::Orientation;
use crate::layout_engine::partition::{PartitionTree, Removed};
use crate::model::tree::NodeId;
use crate::model::window::WindowId;

/// Lays windows out as equal-width columns.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct HorizontalTilingScheme;

impl TilingScheme for HorizontalTilingScheme {
    fn tile(
        &mut self,
        tree: &mut PartitionTree,
        leaf: NodeId,
        window: Option<WindowId>,
    ) -> LayoutResult<NodeId> {
        if let Some(done) = fill_empty_leaf(tree, leaf, window) {
            return done;
        }
        tree.multi_split(leaf, Orientation::Horizontal, window)
    }

    fn manual_tile(&mut self, _tree: &PartitionTree, _leaves: &[NodeId], _window: Option<WindowId>) {}

    fn untile(&mut self, tree: &mut PartitionTree, removed: &Removed) {
        // After an absorb the parent carries the sibling's split, not ours.
        if removed.absorbed.is_none() {
            tree.shrink_equal_count(removed.parent);
        }
    }

    fn choice(&self) -> SchemeChoice { SchemeChoice::Horizontal }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::layout_engine::geometry::Rect;
    use crate::layout_engine::graph::{SplitAxis, SplitDescriptor};
    use crate::layout_engine::schemes::SchemeId;

    #[test]
    fn columns_share_width_equally() {
        let mut tree = PartitionTree::new(Rect::new(0, 0, 400, 100), SchemeId::default(), 0.05);
        let mut scheme = HorizontalTilingScheme;
        let mut leaf = tree.root();
        for raw in 1..=4 {
            leaf = scheme.tile(&mut tree, leaf, Some(WindowId::new(raw))).unwrap();
        }
        let root = tree.root();
        assert_eq!(tree.split_of(root), Some(SplitDescriptor::equal(SplitAxis::Horizontal, 4)));
        let widths: Vec<_> = tree.leaves(root).map(|l| tree.dims(l).w).collect();
        assert_eq!(widths, vec![100; 4]);
        tree.assert_invariants();
    }

    #[test]
    fn untile_shrinks_share_count() {
        let mut tree = PartitionTree::new(Rect::new(0, 0, 300, 100), SchemeId::default(), 0.05);
        let mut scheme = HorizontalTilingScheme;
        let root = tree.root();
        let second = scheme.tile(&mut tree, root, None).unwrap();
        let third = scheme.tile(&mut tree, second, None).unwrap();
        assert_eq!(tree.children(root).len(), 3);

        let removed = tree.remove_leaf(third).unwrap();
        scheme.untile(&mut tree, &removed);
        tree.resize_subtree(removed.parent);
        assert_eq!(tree.split_of(root), Some(SplitDescriptor::equal(SplitAxis::Horizontal, 2)));
        let widths: Vec<_> = tree.leaves(root).map(|l| tree.dims(l).w).collect();
        assert_eq!(widths, vec![150, 150]);
        tree.assert_invariants();
    }
}

use serde::{Deserialize, Serialize};

use super::{SchemeChoice, TilingScheme, fill_empty_leaf};
use crate::layout_engine::error::{LayoutError, LayoutResult};
use crate::layout_engine::partition::{PartitionTree, Removed};
use crate::model::tree::NodeId;
use crate::model::window::WindowId;

/// Never splits on its own. Windows only go into partitions the user has
/// already made room for; hand-made splits are tagged with this scheme.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct ManualTilingScheme;

impl TilingScheme for ManualTilingScheme {
    fn tile(
        &mut self,
        tree: &mut PartitionTree,
        leaf: NodeId,
        window: Option<WindowId>,
    ) -> LayoutResult<NodeId> {
        if let Some(done) = fill_empty_leaf(tree, leaf, window) {
            return done;
        }
        if window.is_none() && tree.is_leaf(leaf) && tree.window(leaf).is_none() {
            return Ok(leaf);
        }
        Err(LayoutError::AlreadyOccupied)
    }

    fn manual_tile(&mut self, _tree: &PartitionTree, _leaves: &[NodeId], _window: Option<WindowId>) {}

    fn untile(&mut self, _tree: &mut PartitionTree, _removed: &Removed) {}

    fn choice(&self) -> SchemeChoice { SchemeChoice::Manual }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::layout_engine::geometry::Rect;
    use crate::layout_engine::schemes::SchemeId;

    #[test]
    fn fills_empty_leaf_but_never_splits() {
        let mut tree = PartitionTree::new(Rect::new(0, 0, 200, 100), SchemeId::default(), 0.05);
        let mut scheme = ManualTilingScheme;
        let root = tree.root();

        assert_eq!(scheme.tile(&mut tree, root, None), Ok(root));
        assert_eq!(scheme.tile(&mut tree, root, Some(WindowId::new(7))), Ok(root));
        assert_eq!(
            scheme.tile(&mut tree, root, Some(WindowId::new(8))),
            Err(LayoutError::AlreadyOccupied)
        );
        assert_eq!(scheme.tile(&mut tree, root, None), Err(LayoutError::AlreadyOccupied));
        assert_eq!(tree.leaves(root).count(), 1);
    }
}

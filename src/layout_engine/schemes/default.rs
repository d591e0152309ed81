use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{SchemeChoice, TilingScheme, fill_empty_leaf};
use crate::common::config::TilingSettings;
use crate::layout_engine::error::LayoutResult;
use crate::layout_engine::geometry::Rect;
use crate::layout_engine::graph::Orientation;
use crate::layout_engine::partition::{PartitionTree, Removed};
use crate::model::tree::NodeId;
use crate::model::window::WindowId;

/// Spiral-style tiling: the first split favors the existing window along the
/// longer side of the screen, then splits alternate between the two axes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DefaultTilingScheme {
    tile_count: usize,
    primary: Orientation,
    first_ratio: f64,
    ratio: f64,
}

impl DefaultTilingScheme {
    pub fn new(primary: Orientation, first_ratio: f64, ratio: f64) -> Self {
        Self { tile_count: 0, primary, first_ratio, ratio }
    }

    /// Wide rects split side by side first, tall ones top to bottom.
    pub fn for_dims(dims: Rect, settings: &TilingSettings) -> Self {
        let primary = if dims.w > dims.h {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        };
        Self::new(primary, settings.first_split_ratio, settings.split_ratio)
    }

    pub fn tile_count(&self) -> usize { self.tile_count }

    fn next_split(&self) -> (Orientation, f64) {
        match self.tile_count {
            0 => (self.primary, self.first_ratio),
            n if n % 2 == 0 => (self.primary, self.ratio),
            _ => (self.primary.flip(), self.ratio),
        }
    }
}

impl TilingScheme for DefaultTilingScheme {
    fn tile(
        &mut self,
        tree: &mut PartitionTree,
        leaf: NodeId,
        window: Option<WindowId>,
    ) -> LayoutResult<NodeId> {
        if let Some(done) = fill_empty_leaf(tree, leaf, window) {
            return done;
        }
        let (orientation, ratio) = self.next_split();
        let (first, second) = tree.split(leaf, orientation.into(), ratio, window)?;
        self.tile_count += 1;
        trace!(?leaf, ?orientation, count = self.tile_count, "default scheme split");
        Ok(if window.is_some() { first } else { second })
    }

    fn manual_tile(&mut self, _tree: &PartitionTree, leaves: &[NodeId], _window: Option<WindowId>) {
        if !leaves.is_empty() {
            self.tile_count += 1;
        }
    }

    fn untile(&mut self, _tree: &mut PartitionTree, _removed: &Removed) {
        self.tile_count = self.tile_count.saturating_sub(1);
    }

    fn choice(&self) -> SchemeChoice { SchemeChoice::Default }
}

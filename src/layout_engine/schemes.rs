use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::common::config::TilingSettings;
use crate::layout_engine::error::{LayoutError, LayoutResult};
use crate::layout_engine::geometry::Rect;
use crate::layout_engine::partition::{PartitionTree, Removed};
use crate::model::tree::NodeId;
use crate::model::window::WindowId;

slotmap::new_key_type! { pub struct SchemeId; }

/// Policy for where a window goes when it is tiled into a partition.
///
/// A scheme may keep state (how many windows it has placed, which axis it
/// prefers). One scheme instance can govern several subtrees.
#[enum_dispatch]
pub trait TilingScheme: Serialize + for<'de> Deserialize<'de> {
    /// Places `window` at or next to `leaf`, returning the leaf that now
    /// holds it. With no window, returns the slot a window would go to.
    fn tile(
        &mut self,
        tree: &mut PartitionTree,
        leaf: NodeId,
        window: Option<WindowId>,
    ) -> LayoutResult<NodeId>;

    /// Told about a split the user made by hand under this scheme.
    fn manual_tile(&mut self, tree: &PartitionTree, leaves: &[NodeId], window: Option<WindowId>);

    /// Told that a leaf governed by this scheme was removed.
    fn untile(&mut self, tree: &mut PartitionTree, removed: &Removed);

    fn choice(&self) -> SchemeChoice;
}

mod default;
pub use default::DefaultTilingScheme;
mod horizontal;
pub use horizontal::HorizontalTilingScheme;
mod manual;
pub use manual::ManualTilingScheme;

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[enum_dispatch(TilingScheme)]
pub enum SchemeKind {
    Default(DefaultTilingScheme),
    Horizontal(HorizontalTilingScheme),
    Manual(ManualTilingScheme),
}

#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SchemeChoice {
    #[default]
    Default,
    Horizontal,
    Manual,
}

impl SchemeKind {
    /// Builds a fresh scheme for a subtree currently covering `dims`.
    pub fn new(choice: SchemeChoice, settings: &TilingSettings, dims: Rect) -> Self {
        match choice {
            SchemeChoice::Default => DefaultTilingScheme::for_dims(dims, settings).into(),
            SchemeChoice::Horizontal => HorizontalTilingScheme.into(),
            SchemeChoice::Manual => ManualTilingScheme.into(),
        }
    }
}

/// Shared first step of every scheme: reject windows that are already in the
/// tree and drop a window straight into `leaf` when it is empty.
///
/// Returns `None` when the scheme has to make room itself.
fn fill_empty_leaf(
    tree: &mut PartitionTree,
    leaf: NodeId,
    window: Option<WindowId>,
) -> Option<LayoutResult<NodeId>> {
    let window = window?;
    if tree.contains_window(window) {
        return Some(Err(LayoutError::AlreadyTiled(window)));
    }
    if tree.is_leaf(leaf) && tree.window(leaf).is_none() {
        return Some(tree.place_window(leaf, window).map(|()| leaf));
    }
    None
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn choice_picks_matching_scheme() {
        let settings = TilingSettings::default();
        let dims = Rect::new(0, 0, 400, 225);
        for (choice, name) in
            [(SchemeChoice::Default, "default"), (SchemeChoice::Horizontal, "horizontal")]
        {
            assert_eq!(SchemeChoice::from_str(name).unwrap(), choice);
            assert_eq!(SchemeKind::new(choice, &settings, dims).choice(), choice);
        }
        assert_eq!(
            SchemeKind::new(SchemeChoice::Manual, &settings, dims).choice(),
            SchemeChoice::Manual
        );
    }

    #[test]
    fn schemes_reject_already_tiled_window() {
        let settings = TilingSettings::default();
        let dims = Rect::new(0, 0, 400, 225);
        let mut tree = PartitionTree::new(dims, SchemeId::default(), settings.min_ratio);
        let root = tree.root();
        let w = WindowId::new(1);
        tree.place_window(root, w).unwrap();
        for choice in [SchemeChoice::Default, SchemeChoice::Horizontal, SchemeChoice::Manual] {
            let mut scheme = SchemeKind::new(choice, &settings, dims);
            assert_eq!(scheme.tile(&mut tree, root, Some(w)), Err(LayoutError::AlreadyTiled(w)));
        }
    }
}

//! A single tiled desktop: one partition tree, the schemes governing its
//! subtrees and the cursor (the current leaf).

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use tracing::{debug, instrument, trace};

use crate::common::collections::{HashMap, HashSet};
use crate::common::config::{InnerGaps, TilingSettings};
use crate::layout_engine::error::{LayoutError, LayoutResult};
use crate::layout_engine::geometry::Rect;
use crate::layout_engine::graph::{SplitAxis, SplitKind};
use crate::layout_engine::partition::PartitionTree;
use crate::layout_engine::schemes::{SchemeChoice, SchemeId, SchemeKind, TilingScheme};
use crate::model::tree::NodeId;
use crate::model::window::WindowId;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct LeafLayout {
    pub node: NodeId,
    pub dims: Rect,
    pub window: Option<WindowId>,
}

/// Rect and window of a leaf taken out by [`Workspace::untile`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Released {
    pub dims: Rect,
    pub window: Option<WindowId>,
}

/// Leaves whose rect or window changed during a command, and where the
/// cursor ended up.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    pub changed: Vec<LeafLayout>,
    pub current: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released: Option<Released>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Workspace {
    tree: PartitionTree,
    current: NodeId,
    schemes: SlotMap<SchemeId, SchemeKind>,
    /// Shared scheme tagged onto every hand-made split.
    manual: SchemeId,
    settings: TilingSettings,
}

static_assertions::assert_impl_all!(Workspace: Send);

impl Workspace {
    pub fn new(base_dims: Rect, settings: &TilingSettings) -> Self {
        Self::with_scheme(base_dims, settings, settings.default_scheme)
    }

    pub fn with_scheme(base_dims: Rect, settings: &TilingSettings, choice: SchemeChoice) -> Self {
        let mut schemes = SlotMap::with_key();
        let root_scheme = schemes.insert(SchemeKind::new(choice, settings, base_dims));
        let manual = schemes.insert(SchemeKind::new(SchemeChoice::Manual, settings, base_dims));
        let tree = PartitionTree::new(base_dims, root_scheme, settings.min_ratio);
        let current = tree.root();
        Self {
            tree,
            current,
            schemes,
            manual,
            settings: settings.clone(),
        }
    }

    pub fn base_dims(&self) -> Rect { self.tree.dims(self.tree.root()) }

    pub fn current(&self) -> NodeId { self.current }

    pub fn tree(&self) -> &PartitionTree { &self.tree }

    pub(crate) fn tree_mut(&mut self) -> &mut PartitionTree { &mut self.tree }

    pub(crate) fn settings(&self) -> &TilingSettings { &self.settings }

    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ { self.tree.leaves(self.tree.root()) }

    pub fn leaf_layouts(&self) -> Vec<LeafLayout> {
        self.leaves()
            .map(|node| LeafLayout {
                node,
                dims: self.tree.dims(node),
                window: self.tree.window(node),
            })
            .collect()
    }

    pub fn leaf_of_window(&self, window: WindowId) -> Option<NodeId> {
        self.tree.leaf_of_window(window)
    }

    pub fn windows(&self) -> impl Iterator<Item = WindowId> + '_ {
        self.leaves().filter_map(|l| self.tree.window(l))
    }

    pub fn scheme_of(&self, node: NodeId) -> Option<&SchemeKind> {
        self.schemes.get(self.tree.get(node)?.scheme)
    }

    pub fn scheme_count(&self) -> usize { self.schemes.len() }

    /// Runs `op` and reports which leaves it changed. `op` must validate
    /// before it mutates: an `Err` leaves the workspace untouched.
    pub(crate) fn apply<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> LayoutResult<T>,
    ) -> LayoutResult<(T, CommandOutcome)> {
        let before: HashMap<NodeId, (Rect, Option<WindowId>)> = self
            .leaves()
            .map(|l| (l, (self.tree.dims(l), self.tree.window(l))))
            .collect();
        let value = op(self)?;
        let changed = self
            .leaf_layouts()
            .into_iter()
            .filter(|l| before.get(&l.node) != Some(&(l.dims, l.window)))
            .collect();
        debug_assert!(self.tree.is_leaf(self.current));
        Ok((value, CommandOutcome {
            changed,
            current: self.current,
            released: None,
        }))
    }

    fn in_stacked_group(&self, node: NodeId) -> bool {
        self.tree
            .parent(node)
            .and_then(|p| self.tree.split_of(p))
            .is_some_and(|s| s.axis == SplitAxis::None)
    }

    pub fn select(&mut self, node: NodeId) -> LayoutResult<()> {
        self.tree.node(node)?;
        if !self.tree.is_leaf(node) {
            return Err(LayoutError::NotLeaf);
        }
        self.current = node;
        Ok(())
    }

    /// Focuses the leaf holding `window`, if it is tiled here.
    pub fn select_window(&mut self, window: WindowId) -> Option<NodeId> {
        let leaf = self.tree.leaf_of_window(window)?;
        self.current = leaf;
        Some(leaf)
    }

    /// Splits the current leaf by hand and freezes both children under the
    /// manual scheme. The cursor follows `window` into the new child, or
    /// stays on the first child when no window is given.
    #[instrument(level = "debug", skip(self))]
    pub fn split(
        &mut self,
        axis: SplitAxis,
        ratio: f64,
        window: Option<WindowId>,
    ) -> LayoutResult<CommandOutcome> {
        if self.in_stacked_group(self.current) {
            return Err(LayoutError::Stacked);
        }
        let (_, outcome) = self.apply(|ws| {
            let leaf = ws.current;
            let (a, b) = ws.tree.split(leaf, axis, ratio, window)?;
            ws.current = a;

            let governing = ws.tree.scheme_of(leaf);
            if let Some(scheme) = ws.schemes.get_mut(governing) {
                scheme.manual_tile(&ws.tree, &[a, b], window);
            }
            ws.tree.set_scheme(a, ws.manual);
            ws.tree.set_scheme(b, ws.manual);
            Ok(())
        })?;
        Ok(outcome)
    }

    /// Asks the scheme governing the current leaf to place `window`, then
    /// moves the cursor to wherever it went.
    #[instrument(level = "debug", skip(self))]
    pub fn tile(&mut self, window: Option<WindowId>) -> LayoutResult<CommandOutcome> {
        let leaf = self.current;
        let fills_empty =
            window.is_some() && self.tree.is_leaf(leaf) && self.tree.window(leaf).is_none();
        if !fills_empty && self.in_stacked_group(leaf) {
            return Err(LayoutError::Stacked);
        }
        let (_, outcome) = self.apply(|ws| {
            let id = ws.tree.scheme_of(leaf);
            let scheme = ws.schemes.get_mut(id).ok_or(LayoutError::UnknownNode)?;
            ws.current = scheme.tile(&mut ws.tree, leaf, window)?;
            Ok(())
        })?;
        Ok(outcome)
    }

    /// Removes `leaf` (the current leaf when `None`) from the tree.
    ///
    /// The cursor moves to the first leaf of the preceding sibling, or to the
    /// parent when the last sibling was folded into it.
    #[instrument(level = "debug", skip(self))]
    pub fn untile(&mut self, leaf: Option<NodeId>) -> LayoutResult<CommandOutcome> {
        let target = leaf.unwrap_or(self.current);
        let (released, mut outcome) = self.apply(|ws| {
            let removed = ws.tree.remove_leaf(target)?;
            if let Some(scheme) = ws.schemes.get_mut(removed.scheme) {
                scheme.untile(&mut ws.tree, &removed);
            }
            ws.tree.sync_equal_count(removed.parent);
            ws.tree.resize_subtree(removed.parent);

            if ws.current == target {
                ws.current = match removed.preceding {
                    Some(sibling) => ws.tree.first_leaf(sibling),
                    None => ws.tree.first_leaf(removed.parent),
                };
            } else if removed.absorbed == Some(ws.current) || !ws.tree.contains(ws.current) {
                ws.current = ws.tree.first_leaf(removed.parent);
            }
            debug!(?target, parent = ?removed.parent, "untiled");
            Ok(Released { dims: removed.dims, window: removed.window })
        })?;
        outcome.released = Some(released);
        Ok(outcome)
    }

    /// Flips the split containing `node` (the current leaf when `None`).
    #[instrument(level = "debug", skip(self))]
    pub fn rotate(&mut self, node: Option<NodeId>) -> LayoutResult<CommandOutcome> {
        let node = node.unwrap_or(self.current);
        let (_, outcome) = self.apply(|ws| ws.tree.rotate(node))?;
        Ok(outcome)
    }

    /// Sets the ratio of `node`'s proportional split.
    #[instrument(level = "debug", skip(self))]
    pub fn resplit(&mut self, node: NodeId, ratio: f64) -> LayoutResult<CommandOutcome> {
        let (_, outcome) = self.apply(|ws| ws.tree.resplit(node, ratio))?;
        Ok(outcome)
    }

    /// The split the cursor would resize from the keyboard: the nearest
    /// proportional split above the current leaf.
    pub fn resizable_ancestor(&self) -> Option<NodeId> {
        self.tree
            .ancestors(self.current)
            .skip(1)
            .find(|&a| self.tree.split_of(a).and_then(|s| s.ratio()).is_some())
    }

    /// Moves `node`'s ratio by `delta` of `ratio_steps` equal notches,
    /// never reaching either edge.
    pub fn step_split(&mut self, node: NodeId, delta: i32) -> LayoutResult<CommandOutcome> {
        let split = self.tree.node(node)?.split.ok_or(LayoutError::NotSplit)?;
        let SplitKind::Proportional { ratio } = split.kind else {
            return Err(LayoutError::NotSplit);
        };
        let steps = self.settings.ratio_steps.max(2) as i32;
        let notch = ((ratio * steps as f64).floor() as i32 + delta).clamp(1, steps - 1);
        trace!(?node, ratio, notch, steps, "stepping split");
        self.resplit(node, notch as f64 / steps as f64)
    }

    /// Hands the subtree under `node` to a fresh scheme of kind `choice`.
    #[instrument(level = "debug", skip(self))]
    pub fn change_scheme(
        &mut self,
        node: NodeId,
        choice: SchemeChoice,
    ) -> LayoutResult<CommandOutcome> {
        let dims = self.tree.node(node)?.dims;
        let id = self.schemes.insert(SchemeKind::new(choice, &self.settings, dims));
        let (_, outcome) = self.apply(|ws| {
            ws.tree.assign_scheme(node, id);
            Ok(())
        })?;
        self.prune_schemes();
        Ok(outcome)
    }

    /// Drops schemes no partition refers to any more.
    pub fn prune_schemes(&mut self) {
        let mut used: HashSet<SchemeId> = self.tree.schemes_in_use().collect();
        used.insert(self.manual);
        let before = self.schemes.len();
        self.schemes.retain(|id, _| used.contains(&id));
        if self.schemes.len() != before {
            trace!(dropped = before - self.schemes.len(), "pruned schemes");
        }
    }

    /// Resizes the root partition and reflows everything below it.
    pub fn set_base_dims(&mut self, dims: Rect) -> CommandOutcome {
        match self.apply(|ws| {
            ws.tree.set_root_dims(dims);
            Ok(())
        }) {
            Ok(((), outcome)) => outcome,
            Err(_) => CommandOutcome {
                changed: Vec::new(),
                current: self.current,
                released: None,
            },
        }
    }

    /// On-screen frame of every tiled window: its leaf rect shrunk by the
    /// inner gaps.
    pub fn window_frames(&self, gaps: &InnerGaps) -> Vec<(WindowId, Rect)> {
        self.leaves()
            .filter_map(|leaf| {
                let window = self.tree.window(leaf)?;
                let frame = self.tree.dims(leaf).inset(
                    gaps.horizontal,
                    gaps.vertical,
                    gaps.horizontal,
                    gaps.vertical,
                );
                Some((window, frame))
            })
            .collect()
    }

    pub fn draw_tree(&self) -> String {
        let tree = self.draw_node(self.tree.root());
        let mut out = String::new();
        if ascii_tree::write_tree(&mut out, &tree).is_err() {
            return String::new();
        }
        out
    }

    fn draw_node(&self, node: NodeId) -> ascii_tree::Tree {
        let dims = self.tree.dims(node);
        let scheme = self.scheme_of(node).map(|s| s.choice().to_string()).unwrap_or_default();
        match self.tree.split_of(node) {
            None => {
                let cursor = if node == self.current { " *" } else { "" };
                let content = match self.tree.window(node) {
                    Some(w) => format!("window {w}"),
                    None => "empty".to_string(),
                };
                ascii_tree::Tree::Leaf(vec![format!("{content} {dims} [{scheme}]{cursor}")])
            }
            Some(split) => {
                let how = match split.kind {
                    SplitKind::Proportional { ratio } => format!("{} {ratio:.2}", split.axis),
                    SplitKind::Equal { count } => format!("{} x{count}", split.axis),
                };
                let children =
                    self.tree.children(node).iter().map(|&c| self.draw_node(c)).collect();
                ascii_tree::Tree::Node(format!("{how} {dims} [{scheme}]"), children)
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        self.tree.assert_invariants();
        assert!(self.tree.is_leaf(self.current), "cursor is not on a leaf");
        for id in self.tree.schemes_in_use() {
            assert!(self.schemes.contains_key(id), "partition refers to a dropped scheme");
        }
    }
}

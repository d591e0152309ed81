//! Structural operations on the partition tree.
//!
//! Every internal node carries a [`SplitDescriptor`]; every leaf may carry one
//! window. A child's rect is always recomputed from its parent's rect, the
//! parent's split and the child's sibling index, so any change to a split is
//! followed by [`PartitionTree::resize_subtree`] on the node that changed.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::common::collections::HashMap;
use crate::layout_engine::error::{LayoutError, LayoutResult};
use crate::layout_engine::geometry::Rect;
use crate::layout_engine::graph::{Orientation, SplitAxis, SplitDescriptor, SplitKind};
use crate::layout_engine::schemes::SchemeId;
use crate::model::tree::{Leaves, NodeId, Tree};
use crate::model::window::WindowId;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Partition {
    pub dims: Rect,
    pub window: Option<WindowId>,
    pub split: Option<SplitDescriptor>,
    /// Scheme deciding automatic tiling inside this partition.
    pub scheme: SchemeId,
}

impl Partition {
    fn new(dims: Rect, window: Option<WindowId>, scheme: SchemeId) -> Self {
        Self { dims, window, split: None, scheme }
    }
}

/// What [`PartitionTree::remove_leaf`] took out of the tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Removed {
    pub dims: Rect,
    pub window: Option<WindowId>,
    pub scheme: SchemeId,
    pub parent: NodeId,
    /// Sibling folded into `parent` when only one child was left.
    pub absorbed: Option<NodeId>,
    /// Sibling that preceded the removed leaf when two or more remain.
    pub preceding: Option<NodeId>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PartitionTree {
    tree: Tree<Partition>,
    root: NodeId,
    window_to_node: HashMap<WindowId, NodeId>,
    min_ratio: f64,
}

impl PartitionTree {
    pub fn new(dims: Rect, scheme: SchemeId, min_ratio: f64) -> Self {
        let mut tree = Tree::new();
        let root = tree.insert_root(Partition::new(dims, None, scheme));
        Self {
            tree,
            root,
            window_to_node: HashMap::default(),
            min_ratio: min_ratio.clamp(0.0, 0.49),
        }
    }

    pub fn root(&self) -> NodeId { self.root }

    pub fn min_ratio(&self) -> f64 { self.min_ratio }

    pub fn contains(&self, node: NodeId) -> bool { self.tree.contains(node) }

    pub fn get(&self, node: NodeId) -> Option<&Partition> { self.tree.get(node) }

    pub fn node(&self, node: NodeId) -> LayoutResult<&Partition> {
        self.tree.get(node).ok_or(LayoutError::UnknownNode)
    }

    pub fn dims(&self, node: NodeId) -> Rect { self.tree[node].dims }

    pub fn window(&self, node: NodeId) -> Option<WindowId> { self.tree.get(node)?.window }

    pub fn split_of(&self, node: NodeId) -> Option<SplitDescriptor> { self.tree.get(node)?.split }

    pub fn scheme_of(&self, node: NodeId) -> SchemeId { self.tree[node].scheme }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> { self.tree.parent(node) }

    pub fn children(&self, node: NodeId) -> &[NodeId] { self.tree.children(node) }

    pub fn is_leaf(&self, node: NodeId) -> bool { self.tree.contains(node) && self.tree.is_leaf(node) }

    pub fn index_of(&self, node: NodeId) -> usize { self.tree.index_in_parent(node) }

    pub fn leaves(&self, root: NodeId) -> Leaves<'_, Partition> { self.tree.leaves(root) }

    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.tree.ancestors(node)
    }

    pub fn subtree(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.tree.preorder(node)
    }

    pub fn first_leaf(&self, node: NodeId) -> NodeId { self.leaves(node).next().unwrap_or(node) }

    pub fn leaf_of_window(&self, window: WindowId) -> Option<NodeId> {
        self.window_to_node.get(&window).copied()
    }

    pub fn contains_window(&self, window: WindowId) -> bool {
        self.window_to_node.contains_key(&window)
    }

    /// Clamps a requested ratio into the configured band, rejecting values
    /// outside `(0, 1)`.
    pub fn clamp_ratio(&self, ratio: f64) -> LayoutResult<f64> {
        if !ratio.is_finite() || ratio <= 0.0 || ratio >= 1.0 {
            return Err(LayoutError::InvalidRatio(ratio));
        }
        Ok(ratio.clamp(self.min_ratio, 1.0 - self.min_ratio))
    }

    fn require_empty_leaf(&self, node: NodeId) -> LayoutResult<()> {
        let part = self.node(node)?;
        if !self.tree.is_leaf(node) {
            return Err(LayoutError::NotLeaf);
        }
        if part.window.is_some() {
            return Err(LayoutError::AlreadyOccupied);
        }
        Ok(())
    }

    fn require_untiled(&self, window: Option<WindowId>) -> LayoutResult<()> {
        match window {
            Some(w) if self.contains_window(w) => Err(LayoutError::AlreadyTiled(w)),
            _ => Ok(()),
        }
    }

    /// Puts `window` into an empty leaf without splitting anything.
    pub fn place_window(&mut self, leaf: NodeId, window: WindowId) -> LayoutResult<()> {
        self.require_untiled(Some(window))?;
        self.require_empty_leaf(leaf)?;
        self.tree[leaf].window = Some(window);
        self.window_to_node.insert(window, leaf);
        Ok(())
    }

    pub fn take_window(&mut self, leaf: NodeId) -> Option<WindowId> {
        let window = self.tree.get_mut(leaf)?.window.take()?;
        self.window_to_node.remove(&window);
        Some(window)
    }

    /// Exchanges the windows held by two leaves. Either may be empty.
    pub fn swap_windows(&mut self, a: NodeId, b: NodeId) {
        let wa = self.tree[a].window.take();
        let wb = self.tree[b].window.take();
        self.tree[a].window = wb;
        self.tree[b].window = wa;
        if let Some(w) = wa {
            self.window_to_node.insert(w, b);
        }
        if let Some(w) = wb {
            self.window_to_node.insert(w, a);
        }
    }

    /// Turns `leaf` into a proportional split with two leaf children.
    ///
    /// The leaf's window moves to child 0 and `window` goes to child 1. The
    /// returned pair lists the child holding `window` first, or child 0 first
    /// when no window was given.
    pub fn split(
        &mut self,
        leaf: NodeId,
        axis: SplitAxis,
        ratio: f64,
        window: Option<WindowId>,
    ) -> LayoutResult<(NodeId, NodeId)> {
        let ratio = self.clamp_ratio(ratio)?;
        self.require_untiled(window)?;
        self.node(leaf)?;
        if !self.tree.is_leaf(leaf) {
            return Err(LayoutError::NotLeaf);
        }

        let descriptor = SplitDescriptor::proportional(axis, ratio);
        let (first, second) = self.split_into(leaf, descriptor, window);
        trace!(?leaf, ?axis, ratio, "split partition");
        Ok(if window.is_some() { (second, first) } else { (first, second) })
    }

    fn split_into(
        &mut self,
        leaf: NodeId,
        descriptor: SplitDescriptor,
        window: Option<WindowId>,
    ) -> (NodeId, NodeId) {
        let parent = &mut self.tree[leaf];
        let dims = parent.dims;
        let scheme = parent.scheme;
        let existing = parent.window.take();
        parent.split = Some(descriptor);

        let first = self
            .tree
            .push_child(leaf, Partition::new(dims.child_rect(&descriptor, 0), existing, scheme));
        let second = self
            .tree
            .push_child(leaf, Partition::new(dims.child_rect(&descriptor, 1), window, scheme));
        if let Some(w) = existing {
            self.window_to_node.insert(w, first);
        }
        if let Some(w) = window {
            self.window_to_node.insert(w, second);
        }
        (first, second)
    }

    /// Adds an equal-share sibling next to `leaf` for `window`.
    ///
    /// When `leaf`'s parent is already split along `orientation`, the parent
    /// becomes (or grows) an equal split and every sibling is resized.
    /// Otherwise `leaf` itself starts an equal split of two. Returns the new
    /// leaf.
    pub fn multi_split(
        &mut self,
        leaf: NodeId,
        orientation: Orientation,
        window: Option<WindowId>,
    ) -> LayoutResult<NodeId> {
        self.require_untiled(window)?;
        self.node(leaf)?;
        if !self.tree.is_leaf(leaf) {
            return Err(LayoutError::NotLeaf);
        }
        let axis = SplitAxis::from(orientation);

        let extendable = self
            .parent(leaf)
            .filter(|&p| self.split_of(p).is_some_and(|s| s.axis == axis));
        let Some(parent) = extendable else {
            let (_, second) = self.split_into(leaf, SplitDescriptor::equal(axis, 2), window);
            return Ok(second);
        };

        let count = self.children(parent).len() + 1;
        let scheme = self.tree[leaf].scheme;
        let new_leaf = self
            .tree
            .push_child(parent, Partition::new(self.dims(parent), window, scheme));
        if let Some(w) = window {
            self.window_to_node.insert(w, new_leaf);
        }
        self.tree[parent].split = Some(SplitDescriptor::equal(axis, count));
        self.resize_subtree(parent);
        debug!(?parent, count, "grew equal split");
        Ok(new_leaf)
    }

    /// Recomputes `node`'s rect from its parent's rect and split.
    pub fn resize_from_parent(&mut self, node: NodeId) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        let Some(split) = self.tree[parent].split else {
            return;
        };
        let index = self.index_of(node);
        self.tree[node].dims = self.tree[parent].dims.child_rect(&split, index);
    }

    /// Recomputes the rect of every node strictly below `node`, parents
    /// before children.
    pub fn resize_subtree(&mut self, node: NodeId) {
        let mut stack = self.children(node).to_vec();
        while let Some(id) = stack.pop() {
            self.resize_from_parent(id);
            stack.extend_from_slice(self.tree.children(id));
        }
    }

    /// Replaces the root rect and reflows the whole tree.
    pub fn set_root_dims(&mut self, dims: Rect) {
        let root = self.root;
        self.tree[root].dims = dims;
        self.resize_subtree(root);
    }

    /// Flips the axis of `node`'s parent split.
    ///
    /// Horizontal becomes vertical with the same child order; vertical
    /// becomes horizontal with the children reversed and the ratio mirrored,
    /// so four rotations restore the original layout.
    pub fn rotate(&mut self, node: NodeId) -> LayoutResult<NodeId> {
        self.node(node)?;
        let parent = self.parent(node).ok_or(LayoutError::NoParent)?;
        let split = self.split_of(parent).ok_or(LayoutError::NotSplit)?;
        let Some(orientation) = split.axis.orientation() else {
            return Err(LayoutError::Stacked);
        };

        let mut rotated = SplitDescriptor { axis: orientation.flip().into(), ..split };
        if orientation == Orientation::Vertical {
            self.tree.reverse_children(parent);
            if let SplitKind::Proportional { ratio } = split.kind {
                rotated.kind = SplitKind::Proportional { ratio: 1.0 - ratio };
            }
        }
        self.tree[parent].split = Some(rotated);
        self.resize_subtree(parent);
        trace!(?parent, ?rotated, "rotated split");
        Ok(parent)
    }

    /// Changes the ratio of `node`'s proportional split.
    pub fn resplit(&mut self, node: NodeId, ratio: f64) -> LayoutResult<f64> {
        let split = self
            .node(node)?
            .split
            .filter(|s| !s.is_equal())
            .ok_or(LayoutError::NotSplit)?;
        let ratio = self.clamp_ratio(ratio)?;
        self.tree[node].split = Some(SplitDescriptor::proportional(split.axis, ratio));
        self.resize_subtree(node);
        Ok(ratio)
    }

    /// Detaches a leaf from its parent.
    ///
    /// If a single sibling is left, the parent takes over that sibling's
    /// window, split and children in place, so ancestors keep their ids.
    /// Rects are not recomputed here; callers finish with
    /// [`resize_subtree`](Self::resize_subtree) on `Removed::parent`.
    pub fn remove_leaf(&mut self, leaf: NodeId) -> LayoutResult<Removed> {
        self.node(leaf)?;
        if !self.tree.is_leaf(leaf) {
            return Err(LayoutError::NotLeaf);
        }
        let parent = self.parent(leaf).ok_or(LayoutError::NoParent)?;

        let window = self.take_window(leaf);
        let index = self.tree.detach(leaf).unwrap_or(0);
        let Some(removed) = self.tree.remove_node(leaf) else {
            return Err(LayoutError::UnknownNode);
        };

        let remaining = self.children(parent).to_vec();
        let mut absorbed = None;
        let mut preceding = None;
        match remaining.as_slice() {
            [] => self.tree[parent].split = None,
            [only] => {
                self.absorb(parent, *only);
                absorbed = Some(*only);
            }
            _ => preceding = Some(remaining[index.saturating_sub(1)]),
        }

        Ok(Removed {
            dims: removed.dims,
            window,
            scheme: removed.scheme,
            parent,
            absorbed,
            preceding,
        })
    }

    fn absorb(&mut self, parent: NodeId, child: NodeId) {
        let window = self.take_window(child);
        let split = self.tree[child].split;
        self.tree.adopt_children(child, parent);
        self.tree.remove_node(child);
        let node = &mut self.tree[parent];
        node.split = split;
        node.window = window;
        if let Some(w) = window {
            self.window_to_node.insert(w, parent);
        }
    }

    /// Brings an equal split's share count back in line with its children.
    pub fn sync_equal_count(&mut self, node: NodeId) {
        let len = self.children(node).len();
        if let Some(SplitDescriptor { kind: SplitKind::Equal { count }, .. }) =
            self.tree.get_mut(node).and_then(|p| p.split.as_mut())
        {
            if *count != len {
                trace!(?node, from = *count, to = len, "equal split count resynced");
                *count = len;
            }
        }
    }

    /// Decrements an equal split's share count, never below one.
    pub fn shrink_equal_count(&mut self, node: NodeId) {
        if let Some(SplitDescriptor { kind: SplitKind::Equal { count }, .. }) =
            self.tree.get_mut(node).and_then(|p| p.split.as_mut())
        {
            *count = count.saturating_sub(1).max(1);
        }
    }

    /// Hands every node of `node`'s subtree to `scheme`.
    pub fn assign_scheme(&mut self, node: NodeId, scheme: SchemeId) {
        let ids: Vec<_> = self.tree.preorder(node).collect();
        for id in ids {
            self.tree[id].scheme = scheme;
        }
    }

    pub fn set_scheme(&mut self, node: NodeId, scheme: SchemeId) { self.tree[node].scheme = scheme; }

    pub fn schemes_in_use(&self) -> impl Iterator<Item = SchemeId> + '_ {
        self.tree.preorder(self.root).map(|id| self.tree[id].scheme)
    }

    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        for id in self.tree.preorder(self.root) {
            let part = &self.tree[id];
            let children = self.tree.children(id);
            if children.is_empty() {
                assert!(part.split.is_none(), "leaf {id:?} carries a split");
            } else {
                assert!(part.window.is_none(), "internal node {id:?} holds a window");
                let split = part.split.expect("internal node without split");
                match split.kind {
                    SplitKind::Proportional { ratio } => {
                        assert_eq!(children.len(), 2);
                        assert!(ratio >= self.min_ratio && ratio <= 1.0 - self.min_ratio);
                    }
                    SplitKind::Equal { count } => assert_eq!(count, children.len()),
                }
                for (i, &c) in children.iter().enumerate() {
                    assert_eq!(self.tree[c].dims, part.dims.child_rect(&split, i));
                }
                if split.axis != SplitAxis::None {
                    let area: i64 = children.iter().map(|&c| self.tree[c].dims.area()).sum();
                    assert_eq!(area, part.dims.area());
                }
            }
            if let Some(w) = part.window {
                assert_eq!(self.window_to_node.get(&w), Some(&id));
            }
        }
        assert_eq!(
            self.window_to_node.len(),
            self.tree.preorder(self.root).filter(|&id| self.tree[id].window.is_some()).count()
        );
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn scheme() -> SchemeId { SchemeId::default() }

    fn tree() -> PartitionTree { PartitionTree::new(Rect::new(0, 0, 400, 225), scheme(), 0.05) }

    fn w(raw: u64) -> WindowId { WindowId::new(raw) }

    #[test]
    fn split_moves_existing_window_to_first_child() {
        let mut t = tree();
        let root = t.root();
        t.place_window(root, w(1)).unwrap();
        let (new, old) = t.split(root, SplitAxis::Horizontal, 0.5, Some(w(2))).unwrap();
        assert_eq!(t.window(old), Some(w(1)));
        assert_eq!(t.window(new), Some(w(2)));
        assert_eq!(t.index_of(old), 0);
        assert_eq!(t.dims(old), Rect::new(0, 0, 200, 225));
        assert_eq!(t.dims(new), Rect::new(200, 0, 200, 225));
        assert_eq!(t.leaf_of_window(w(1)), Some(old));
        t.assert_invariants();
    }

    #[test]
    fn split_rejects_internal_nodes_and_tiled_windows() {
        let mut t = tree();
        let root = t.root();
        let (a, _) = t.split(root, SplitAxis::Vertical, 0.5, Some(w(1))).unwrap();
        assert_eq!(t.split(root, SplitAxis::Vertical, 0.5, None), Err(LayoutError::NotLeaf));
        assert_eq!(
            t.split(a, SplitAxis::Vertical, 0.5, Some(w(1))),
            Err(LayoutError::AlreadyTiled(w(1)))
        );
        assert_eq!(t.split(a, SplitAxis::Vertical, 1.5, None), Err(LayoutError::InvalidRatio(1.5)));
    }

    #[test]
    fn split_then_remove_restores_leaf() {
        let mut t = tree();
        let root = t.root();
        t.place_window(root, w(1)).unwrap();
        let before = t.dims(root);
        let (new, _) = t.split(root, SplitAxis::Horizontal, 0.5, Some(w(2))).unwrap();
        let removed = t.remove_leaf(new).unwrap();
        t.resize_subtree(removed.parent);
        assert_eq!(removed.window, Some(w(2)));
        assert_eq!(removed.dims, Rect::new(200, 0, 200, 225));
        assert!(t.is_leaf(root));
        assert_eq!(t.dims(root), before);
        assert_eq!(t.window(root), Some(w(1)));
        assert_eq!(t.leaf_of_window(w(1)), Some(root));
        assert!(t.split_of(root).is_none());
        t.assert_invariants();
    }

    #[test]
    fn removing_leaf_absorbs_internal_sibling() {
        let mut t = tree();
        let root = t.root();
        let (left, right) = t.split(root, SplitAxis::Horizontal, 0.5, None).unwrap();
        let (top, bottom) = t.split(right, SplitAxis::Vertical, 0.5, None).unwrap();
        let removed = t.remove_leaf(left).unwrap();
        t.resize_subtree(removed.parent);
        assert_eq!(removed.absorbed, Some(right));
        assert_eq!(t.children(root), &[top, bottom]);
        assert_eq!(t.split_of(root).map(|s| s.axis), Some(SplitAxis::Vertical));
        assert_eq!(t.dims(top), Rect::new(0, 0, 400, 112));
        t.assert_invariants();
    }

    #[test]
    fn remove_root_is_rejected() {
        let mut t = tree();
        let root = t.root();
        assert_eq!(t.remove_leaf(root), Err(LayoutError::NoParent));
    }

    #[test]
    fn multi_split_grows_equal_columns() {
        let mut t = tree();
        let root = t.root();
        let b = t.multi_split(root, Orientation::Horizontal, Some(w(1))).unwrap();
        let c = t.multi_split(b, Orientation::Horizontal, Some(w(2))).unwrap();
        let d = t.multi_split(c, Orientation::Horizontal, None).unwrap();
        assert_eq!(t.children(root).len(), 4);
        assert_eq!(t.split_of(root), Some(SplitDescriptor::equal(SplitAxis::Horizontal, 4)));
        let widths: Vec<_> = t.leaves(root).map(|l| t.dims(l).w).collect();
        assert_eq!(widths, vec![100, 100, 100, 100]);
        assert_eq!(t.dims(d).x, 300);
        assert_eq!(t.resplit(root, 0.5), Err(LayoutError::NotSplit));
        t.assert_invariants();
    }

    #[test]
    fn multi_split_under_perpendicular_parent_starts_new_group() {
        let mut t = tree();
        let root = t.root();
        let (_, bottom) = t.split(root, SplitAxis::Vertical, 0.5, None).unwrap();
        let new = t.multi_split(bottom, Orientation::Horizontal, None).unwrap();
        assert_eq!(t.parent(new), Some(bottom));
        assert_eq!(t.split_of(root).map(|s| s.axis), Some(SplitAxis::Vertical));
        assert_eq!(t.dims(new), Rect::new(200, 112, 200, 113));
        t.assert_invariants();
    }

    #[test]
    fn rotate_four_times_is_identity() {
        let mut t = tree();
        let root = t.root();
        let (a, b) = t.split(root, SplitAxis::Horizontal, 0.3, None).unwrap();
        let original: Vec<_> = t.leaves(root).map(|l| (l, t.dims(l))).collect();

        t.rotate(a).unwrap();
        assert_eq!(t.split_of(root).map(|s| s.axis), Some(SplitAxis::Vertical));
        assert_eq!(t.children(root), &[a, b]);
        t.rotate(a).unwrap();
        assert_eq!(t.children(root), &[b, a]);
        assert_eq!(t.dims(b).x, 0);
        t.rotate(a).unwrap();
        t.rotate(a).unwrap();

        let restored: Vec<_> = t.leaves(root).map(|l| (l, t.dims(l))).collect();
        assert_eq!(restored, original);
        t.assert_invariants();
    }

    #[test]
    fn resize_from_parent_refreshes_a_single_node() {
        let mut t = tree();
        let root = t.root();
        let (left, right) = t.split(root, SplitAxis::Horizontal, 0.5, None).unwrap();
        let (_, low) = t.split(right, SplitAxis::Vertical, 0.5, None).unwrap();
        assert_eq!(t.dims(low), Rect::new(200, 112, 200, 113));

        t.tree[root].split = Some(SplitDescriptor::proportional(SplitAxis::Horizontal, 0.25));
        t.resize_from_parent(right);
        assert_eq!(t.dims(right), Rect::new(100, 0, 300, 225));
        assert_eq!(t.dims(left), Rect::new(0, 0, 200, 225));
        assert_eq!(t.dims(low), Rect::new(200, 112, 200, 113));

        // The root has no parent to derive from.
        t.resize_from_parent(root);
        assert_eq!(t.dims(root), Rect::new(0, 0, 400, 225));

        t.resize_subtree(root);
        assert_eq!(t.dims(left), Rect::new(0, 0, 100, 225));
        assert_eq!(t.dims(low), Rect::new(100, 112, 300, 113));
        t.assert_invariants();
    }

    #[test]
    fn resplit_clamps_and_cascades() {
        let mut t = tree();
        let root = t.root();
        let (_, right) = t.split(root, SplitAxis::Horizontal, 0.5, None).unwrap();
        let (_, low) = t.split(right, SplitAxis::Vertical, 0.5, None).unwrap();
        assert_eq!(t.resplit(root, 0.01), Ok(0.05));
        assert_eq!(t.dims(right), Rect::new(20, 0, 380, 225));
        assert_eq!(t.dims(low).x, 20);
        assert_eq!(t.resplit(low, 0.5), Err(LayoutError::NotSplit));
        assert!(t.resplit(root, f64::NAN).is_err());
        t.assert_invariants();
    }
}

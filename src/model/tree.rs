//! Arena-backed ordered tree.
//!
//! Nodes live in a [`SlotMap`] and refer to each other by [`NodeId`], so a
//! parent link is a plain key lookup rather than a shared pointer. A node's
//! sibling index is its position in the parent's child list.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};

new_key_type! { pub struct NodeId; }

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Node<T> {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    pub data: T,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Tree<T> {
    map: SlotMap<NodeId, Node<T>>,
}

impl<T> Default for Tree<T> {
    fn default() -> Self { Self { map: SlotMap::with_key() } }
}

impl<T> Tree<T> {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.map.len() }

    pub fn is_empty(&self) -> bool { self.map.is_empty() }

    pub fn contains(&self, id: NodeId) -> bool { self.map.contains_key(id) }

    pub fn get(&self, id: NodeId) -> Option<&T> { self.map.get(id).map(|n| &n.data) }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.map.get_mut(id).map(|n| &mut n.data)
    }

    /// Inserts a node with no parent.
    pub fn insert_root(&mut self, data: T) -> NodeId {
        self.map.insert(Node { parent: None, children: Vec::new(), data })
    }

    /// Appends a new node as the last child of `parent`.
    pub fn push_child(&mut self, parent: NodeId, data: T) -> NodeId {
        let id = self.map.insert(Node {
            parent: Some(parent),
            children: Vec::new(),
            data,
        });
        self.map[parent].children.push(id);
        id
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> { self.map.get(id).and_then(|n| n.parent) }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.map.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn is_leaf(&self, id: NodeId) -> bool { self.children(id).is_empty() }

    /// Position of `id` among its siblings; the root reports 0.
    pub fn index_in_parent(&self, id: NodeId) -> usize {
        self.parent(id)
            .and_then(|p| self.children(p).iter().position(|&c| c == id))
            .unwrap_or(0)
    }

    /// Unlinks `id` from its parent and returns the index it occupied.
    pub fn detach(&mut self, id: NodeId) -> Option<usize> {
        let parent = self.map.get_mut(id)?.parent.take()?;
        let siblings = &mut self.map[parent].children;
        let index = siblings.iter().position(|&c| c == id)?;
        siblings.remove(index);
        Some(index)
    }

    /// Moves every child of `from` to the end of `to`'s child list.
    pub fn adopt_children(&mut self, from: NodeId, to: NodeId) {
        let moved = std::mem::take(&mut self.map[from].children);
        for &child in &moved {
            self.map[child].parent = Some(to);
        }
        self.map[to].children.extend(moved);
    }

    pub fn reverse_children(&mut self, id: NodeId) { self.map[id].children.reverse(); }

    /// Removes a single node that no longer has children.
    pub fn remove_node(&mut self, id: NodeId) -> Option<T> {
        debug_assert!(self.is_leaf(id), "removing a node that still owns children");
        self.detach(id);
        self.map.remove(id).map(|n| n.data)
    }

    /// Removes `id` and everything below it, returning the data of `id`.
    pub fn remove_subtree(&mut self, id: NodeId) -> Option<T> {
        if !self.contains(id) {
            return None;
        }
        self.detach(id);
        let descendants: Vec<_> = self.preorder(id).skip(1).collect();
        for node in descendants {
            self.map.remove(node);
        }
        self.map.remove(id).map(|n| n.data)
    }

    /// Depth-first, left-to-right leaves of the subtree rooted at `root`.
    pub fn leaves(&self, root: NodeId) -> Leaves<'_, T> {
        Leaves { inner: self.preorder(root) }
    }

    /// Every node of the subtree rooted at `root`, parents before children.
    pub fn preorder(&self, root: NodeId) -> Preorder<'_, T> {
        let stack = if self.contains(root) { vec![root] } else { Vec::new() };
        Preorder { tree: self, stack }
    }

    /// `id` followed by each of its ancestors up to the root.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_, T> {
        Ancestors {
            tree: self,
            next: self.contains(id).then_some(id),
        }
    }

    pub fn depth(&self, id: NodeId) -> usize { self.ancestors(id).count().saturating_sub(1) }
}

impl<T> Index<NodeId> for Tree<T> {
    type Output = T;

    fn index(&self, id: NodeId) -> &T { &self.map[id].data }
}

impl<T> IndexMut<NodeId> for Tree<T> {
    fn index_mut(&mut self, id: NodeId) -> &mut T { &mut self.map[id].data }
}

pub struct Preorder<'a, T> {
    tree: &'a Tree<T>,
    stack: Vec<NodeId>,
}

impl<T> Iterator for Preorder<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack.extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}

pub struct Leaves<'a, T> {
    inner: Preorder<'a, T>,
}

impl<T> Iterator for Leaves<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let tree = self.inner.tree;
        self.inner.by_ref().find(|&id| tree.is_leaf(id))
    }
}

pub struct Ancestors<'a, T> {
    tree: &'a Tree<T>,
    next: Option<NodeId>,
}

impl<T> Iterator for Ancestors<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.tree.parent(id);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample() -> (Tree<&'static str>, [NodeId; 5]) {
        let mut tree = Tree::new();
        let root = tree.insert_root("root");
        let a = tree.push_child(root, "a");
        let b = tree.push_child(root, "b");
        let b1 = tree.push_child(b, "b1");
        let b2 = tree.push_child(b, "b2");
        (tree, [root, a, b, b1, b2])
    }

    #[test]
    fn leaves_are_depth_first_left_to_right() {
        let (tree, [root, a, b, b1, b2]) = sample();
        assert_eq!(tree.leaves(root).collect::<Vec<_>>(), vec![a, b1, b2]);
        assert_eq!(tree.leaves(b).collect::<Vec<_>>(), vec![b1, b2]);
        assert_eq!(tree.leaves(a).collect::<Vec<_>>(), vec![a]);
    }

    #[test]
    fn ancestors_include_self_and_end_at_root() {
        let (tree, [root, _, b, b1, _]) = sample();
        assert_eq!(tree.ancestors(b1).collect::<Vec<_>>(), vec![b1, b, root]);
        assert_eq!(tree.depth(b1), 2);
        assert_eq!(tree.depth(root), 0);
    }

    #[test]
    fn detach_renumbers_siblings() {
        let (mut tree, [root, a, b, _, _]) = sample();
        assert_eq!(tree.index_in_parent(b), 1);
        assert_eq!(tree.detach(a), Some(0));
        assert_eq!(tree.index_in_parent(b), 0);
        assert_eq!(tree.children(root), &[b]);
        assert_eq!(tree.parent(a), None);
    }

    #[test]
    fn adopt_children_moves_parent_links() {
        let (mut tree, [root, a, b, b1, b2]) = sample();
        tree.adopt_children(b, a);
        assert_eq!(tree.children(a), &[b1, b2]);
        assert!(tree.is_leaf(b));
        assert_eq!(tree.parent(b2), Some(a));
        assert_eq!(tree.leaves(root).collect::<Vec<_>>(), vec![b1, b2, b]);
    }

    #[test]
    fn remove_subtree_drops_descendants() {
        let (mut tree, [root, a, b, b1, b2]) = sample();
        assert_eq!(tree.remove_subtree(b), Some("b"));
        assert_eq!(tree.len(), 2);
        assert!(!tree.contains(b1) && !tree.contains(b2));
        assert_eq!(tree.children(root), &[a]);
    }
}

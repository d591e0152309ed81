//! Directional focus and swap within a workspace.
//!
//! Candidates are the leaves under the outermost ancestor split along the
//! direction of travel that share an edge with the current leaf. They are
//! sorted along that axis together with the current leaf, and a move steps
//! one place through that ordering. Of the leaves at or beyond that place,
//! the one closest to the current leaf's leading corner wins.

use tracing::{debug, trace};

use crate::common::collections::HashSet;
use crate::layout_engine::error::{LayoutError, LayoutResult};
use crate::layout_engine::graph::{Direction, Orientation, SplitAxis};
use crate::layout_engine::workspace::{CommandOutcome, Workspace};
use crate::model::tree::NodeId;

impl Workspace {
    /// The current leaf and its edge neighbors along `orientation`, sorted
    /// by position on that axis.
    pub fn find_neighbors(&self, orientation: Orientation) -> Vec<NodeId> {
        let tree = self.tree();
        let current = self.current();
        let dims = tree.dims(current);
        let axis = SplitAxis::from(orientation);
        let slack = self.settings().adjacency_slack;

        // Every lower matching ancestor's leaves are a subset of the
        // outermost one's.
        let outermost = tree
            .ancestors(current)
            .filter(|&a| tree.split_of(a).is_some_and(|s| s.axis == axis))
            .last();

        let mut seen = HashSet::default();
        let mut neighbors: Vec<NodeId> = outermost
            .into_iter()
            .flat_map(|a| tree.leaves(a))
            .filter(|&leaf| tree.dims(leaf).adjacency_check(&dims, orientation, slack))
            .filter(|&leaf| seen.insert(leaf))
            .collect();
        if seen.insert(current) {
            neighbors.push(current);
        }
        neighbors.sort_by_key(|&leaf| tree.dims(leaf).start(orientation));
        neighbors
    }

    /// Leaves reachable by stepping `n` places in `direction` through the
    /// neighbor ordering, then every `n`th one beyond. Empty at the edge.
    pub fn find_valid_moves(&self, direction: Direction, n: usize) -> Vec<NodeId> {
        let neighbors = self.find_neighbors(direction.orientation());
        valid_moves(&neighbors, self.current(), direction, n)
    }

    /// The leaf a single step in `direction` lands on.
    pub fn find_move(&self, direction: Direction) -> LayoutResult<NodeId> {
        let tree = self.tree();
        let current = self.current();
        let moves = self.find_valid_moves(direction, 1);

        let here = tree.dims(current);
        let use_far_edge =
            (direction.sign() < 0) != (direction.orientation() == Orientation::Vertical);
        let anchor_y = if use_far_edge { here.bottom() } else { here.y };

        let Some(target) =
            moves.into_iter().min_by_key(|&leaf| tree.dims(leaf).distance_to(here.x, anchor_y))
        else {
            return self.cycle_stacked(direction);
        };
        trace!(?current, ?target, ?direction, "found move");
        Ok(target)
    }

    /// Inside a stacked group there is no geometric neighbor; step through
    /// the group's leaves instead, wrapping at either end.
    fn cycle_stacked(&self, direction: Direction) -> LayoutResult<NodeId> {
        let tree = self.tree();
        let current = self.current();
        let group = tree
            .ancestors(current)
            .skip(1)
            .find(|&a| tree.split_of(a).is_some_and(|s| s.axis == SplitAxis::None))
            .ok_or(LayoutError::NoNeighbor)?;
        let leaves: Vec<NodeId> = tree.leaves(group).collect();
        let pos = leaves
            .iter()
            .position(|&l| l == current)
            .ok_or(LayoutError::NoNeighbor)?;
        let next = (pos as isize + direction.sign()).rem_euclid(leaves.len() as isize) as usize;
        match leaves[next] {
            l if l == current => Err(LayoutError::NoNeighbor),
            l => Ok(l),
        }
    }

    pub fn move_focus(&mut self, direction: Direction) -> LayoutResult<CommandOutcome> {
        let target = self.find_move(direction)?;
        self.select(target)?;
        debug!(?target, ?direction, "moved focus");
        Ok(CommandOutcome {
            changed: Vec::new(),
            current: target,
            released: None,
        })
    }

    /// Exchanges the current leaf's window with the neighbor's; the cursor
    /// follows the window.
    pub fn swap(&mut self, direction: Direction) -> LayoutResult<CommandOutcome> {
        let current = self.current();
        let target = self.find_move(direction)?;
        let (_, outcome) = self.apply(|ws| {
            ws.tree_mut().swap_windows(current, target);
            ws.select(target)
        })?;
        debug!(?current, ?target, ?direction, "swapped windows");
        Ok(outcome)
    }
}

fn valid_moves(
    neighbors: &[NodeId],
    current: NodeId,
    direction: Direction,
    n: usize,
) -> Vec<NodeId> {
    let Some(index) = neighbors.iter().position(|&l| l == current) else {
        return Vec::new();
    };
    let step = n.max(1);
    if direction.sign() > 0 {
        neighbors[index..].iter().skip(step).step_by(step).copied().collect()
    } else {
        neighbors[..=index].iter().rev().skip(step).step_by(step).copied().collect()
    }
}

use serde::Serialize;
use thiserror::Error;

use crate::model::window::WindowId;

/// Reasons a layout command was turned down.
///
/// None of these are faults: the tree is left exactly as it was and the host
/// decides what to do (beep, ignore, ...).
#[derive(Debug, Error, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutError {
    #[error("partition has no parent")]
    NoParent,
    #[error("no neighbor in that direction")]
    NoNeighbor,
    #[error("partition is not split")]
    NotSplit,
    #[error("partition is already occupied")]
    AlreadyOccupied,
    #[error("window {0} is already tiled")]
    AlreadyTiled(WindowId),
    #[error("invalid split ratio {0}")]
    InvalidRatio(f64),
    #[error("partition is not a leaf")]
    NotLeaf,
    #[error("cannot split inside a stacked group")]
    Stacked,
    #[error("unknown partition")]
    UnknownNode,
}

pub type LayoutResult<T> = Result<T, LayoutError>;

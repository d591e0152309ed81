use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn flip(self) -> Self {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn orientation(self) -> Orientation {
        match self {
            Direction::Left | Direction::Right => Orientation::Horizontal,
            Direction::Up | Direction::Down => Orientation::Vertical,
        }
    }

    /// -1 towards the origin (left/up), +1 away from it.
    pub fn sign(self) -> isize {
        match self {
            Direction::Left | Direction::Up => -1,
            Direction::Right | Direction::Down => 1,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

/// Axis a partition was divided along. `None` stacks every child on top of
/// the full parent rect (monocle).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SplitAxis {
    Horizontal,
    Vertical,
    None,
}

impl SplitAxis {
    pub fn orientation(self) -> Option<Orientation> {
        match self {
            SplitAxis::Horizontal => Some(Orientation::Horizontal),
            SplitAxis::Vertical => Some(Orientation::Vertical),
            SplitAxis::None => None,
        }
    }
}

impl From<Orientation> for SplitAxis {
    fn from(orientation: Orientation) -> Self {
        match orientation {
            Orientation::Horizontal => SplitAxis::Horizontal,
            Orientation::Vertical => SplitAxis::Vertical,
        }
    }
}

/// How the children of a split partition share its rect.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SplitKind {
    /// Two children; the first takes `floor(extent * ratio)`.
    Proportional { ratio: f64 },
    /// `count` equal shares; the last child absorbs the remainder.
    Equal { count: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SplitDescriptor {
    pub axis: SplitAxis,
    #[serde(flatten)]
    pub kind: SplitKind,
}

impl SplitDescriptor {
    pub fn proportional(axis: SplitAxis, ratio: f64) -> Self {
        Self { axis, kind: SplitKind::Proportional { ratio } }
    }

    pub fn equal(axis: SplitAxis, count: usize) -> Self {
        Self { axis, kind: SplitKind::Equal { count } }
    }

    pub fn ratio(&self) -> Option<f64> {
        match self.kind {
            SplitKind::Proportional { ratio } => Some(ratio),
            SplitKind::Equal { .. } => None,
        }
    }

    pub fn is_equal(&self) -> bool { matches!(self.kind, SplitKind::Equal { .. }) }
}

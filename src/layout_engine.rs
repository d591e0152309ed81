pub mod engine;
mod error;
pub mod geometry;
pub(crate) mod graph;
mod navigation;
pub mod partition;
pub mod schemes;
pub mod workspace;

pub use engine::{EventResponse, LayoutCommand, LayoutEngine, LayoutEvent};
pub use error::{LayoutError, LayoutResult};
pub use geometry::Rect;
pub use graph::{Direction, Orientation, SplitAxis, SplitDescriptor, SplitKind};
pub use partition::{Partition, PartitionTree, Removed};
pub use schemes::{
    DefaultTilingScheme, HorizontalTilingScheme, ManualTilingScheme, SchemeChoice, SchemeId,
    SchemeKind, TilingScheme,
};
pub use workspace::{CommandOutcome, LeafLayout, Released, Workspace};

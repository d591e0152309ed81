pub mod tree;
pub mod window;

pub use tree::NodeId;
pub use window::WindowId;

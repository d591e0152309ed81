use serde::{Deserialize, Serialize};

/// Opaque handle for a host window.
///
/// The layout core only stores and compares these; moving, hiding and
/// focusing the real window is left to whoever owns the handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub u64);

impl WindowId {
    pub fn new(raw: u64) -> Self { Self(raw) }
}

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

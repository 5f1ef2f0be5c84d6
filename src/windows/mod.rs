//! The window layer as seen from the store owner. Actual windows are created by a
//! [`WindowHost`]; the [`WindowRegistry`] keeps at most one per group.

pub mod memory;
pub mod registry;

use anyhow::Result;

use crate::models::WindowBounds;

pub use memory::{MemoryHost, MemoryWindow};
pub use registry::{OpenOutcome, WindowRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowOptions {
    pub bounds: WindowBounds,
    pub always_on_top: bool,
}

/// Native window operations. Implementations must tolerate calls on windows that
/// were already closed.
pub trait WindowHost: Send + Sync {
    fn create(&self, group_id: &str, options: &WindowOptions) -> Result<WindowId>;
    fn is_alive(&self, window: WindowId) -> bool;
    fn focus(&self, window: WindowId);
    fn close(&self, window: WindowId);
    fn set_always_on_top(&self, window: WindowId, always_on_top: bool);
    fn bounds(&self, window: WindowId) -> Option<WindowBounds>;
    fn set_bounds(&self, window: WindowId, bounds: WindowBounds);
}

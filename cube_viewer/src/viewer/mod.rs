//! Windowed presentation layer: wgpu pipelines over the pure scene state.

mod shaders;
pub mod state;

pub use state::ViewerState;

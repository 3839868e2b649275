// VIEW: GPU setup, meshes and drawing
pub mod gpu_init;
pub mod mesh;
pub mod render;

pub use gpu_init::{GpuContext, GpuInitError};
pub use render::{Renderer, UiFrame};

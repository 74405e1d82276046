pub mod bloom;
pub mod common;
pub mod renderer;
mod shared;

pub use bloom::BloomPipeline;
pub use common::{bloom_weights, lerp_bloom_factor, SceneUniform};
pub use renderer::{Renderer, SurfaceAction};

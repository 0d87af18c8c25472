//! GPU rendering of the panorama scene to an offscreen target.

mod compositor;

pub use compositor::{Compositor, ViewParams, TARGET_HEIGHT, TARGET_WIDTH};

use std::sync::Arc;

/// Shared handle to an uploaded frame texture. Cloning is cheap, so the cache,
/// slices, and particles can all hold the same upload.
pub type SliceTexture = Arc<wgpu::TextureView>;

/// Vertex format for quad rendering.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2],
    };
}

/// Unit quad centered on the origin, two triangles. UVs map v=0 to the quad's
/// top edge in the y-down scene space.
pub fn unit_quad() -> [Vertex; 6] {
    [
        Vertex { position: [-0.5, -0.5], uv: [0.0, 0.0] },
        Vertex { position: [0.5, -0.5], uv: [1.0, 0.0] },
        Vertex { position: [0.5, 0.5], uv: [1.0, 1.0] },
        Vertex { position: [-0.5, -0.5], uv: [0.0, 0.0] },
        Vertex { position: [0.5, 0.5], uv: [1.0, 1.0] },
        Vertex { position: [-0.5, 0.5], uv: [0.0, 1.0] },
    ]
}

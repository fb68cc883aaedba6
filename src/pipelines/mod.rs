//! Render pipelines and their shaders.
//!
//! - `basic` builds the lit, textured pipeline and the shared pipeline helper
//! - `flat` builds unlit colour pipelines for triangles and lines
//! - `light` holds the light uniform and its GPU resources

pub mod basic;
pub mod flat;
pub mod light;

#[derive(Debug)]
pub struct Pipelines {
    pub standard: wgpu::RenderPipeline,
    pub flat: wgpu::RenderPipeline,
    pub lines: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
        light_bind_group_layout: &wgpu::BindGroupLayout,
        material_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        Self {
            standard: basic::mk_standard_pipeline(
                device,
                color_format,
                camera_bind_group_layout,
                light_bind_group_layout,
                material_bind_group_layout,
            ),
            flat: flat::mk_flat_pipeline(
                device,
                color_format,
                camera_bind_group_layout,
                wgpu::PrimitiveTopology::TriangleList,
            ),
            lines: flat::mk_flat_pipeline(
                device,
                color_format,
                camera_bind_group_layout,
                wgpu::PrimitiveTopology::LineList,
            ),
        }
    }
}

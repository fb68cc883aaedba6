use crate::{
    data_structures::{
        instance::InstanceRaw,
        model::{ColourVertex, Vertex},
        texture::Texture,
    },
    pipelines::basic::mk_render_pipeline,
};

/// Unlit per-vertex colour; only the camera is bound (0).
///
/// `topology` picks between filled shapes (the cube) and line lists (gizmos).
pub fn mk_flat_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    topology: wgpu::PrimitiveTopology,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Flat Pipeline Layout"),
        bind_group_layouts: &[camera_bind_group_layout],
        push_constant_ranges: &[],
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Flat Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("flat.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        &layout,
        color_format,
        Some(wgpu::BlendState {
            alpha: wgpu::BlendComponent::REPLACE,
            color: wgpu::BlendComponent::REPLACE,
        }),
        Some(Texture::DEPTH_FORMAT),
        &[ColourVertex::desc(), InstanceRaw::desc()],
        topology,
        shader,
    )
}

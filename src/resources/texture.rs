use anyhow::Context as _;

use crate::{
    config::MaterialMaps,
    data_structures::{model, texture},
    resources::load_binary,
};

/// Bind group layout of a lit surface: colour, occlusion, normal and
/// roughness maps (0..=3) sharing one filtering sampler (4).
pub fn material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let map = |binding: u32| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
        },
        count: None,
    };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            map(0),
            map(1),
            map(2),
            map(3),
            wgpu::BindGroupLayoutEntry {
                binding: 4,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("material_bind_group_layout"),
    })
}

pub async fn load_texture(
    asset_root: &str,
    file_name: &str,
    is_linear: bool,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<texture::Texture> {
    let data = load_binary(asset_root, file_name).await?;
    texture::Texture::from_bytes(device, queue, &data, file_name, is_linear)
}

/// A configured map, or the neutral solid standing in for it.
async fn load_map(
    asset_root: &str,
    path: Option<&str>,
    fallback: [u8; 4],
    label: &str,
    is_linear: bool,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<texture::Texture> {
    match path {
        Some(path) => load_texture(asset_root, path, is_linear, device, queue)
            .await
            .with_context(|| format!("failed to load {} map '{}'", label, path)),
        None => Ok(texture::Texture::create_solid(
            device, queue, fallback, label, is_linear,
        )),
    }
}

/// Load the four maps of a surface concurrently and bind them.
pub async fn load_material(
    asset_root: &str,
    name: &str,
    maps: &MaterialMaps,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    sampler: &wgpu::Sampler,
    layout: &wgpu::BindGroupLayout,
) -> anyhow::Result<model::Material> {
    let (colour, occlusion, normal, roughness) = futures::try_join!(
        load_map(asset_root, maps.colour.as_deref(), [255; 4], "colour", false, device, queue),
        load_map(
            asset_root,
            maps.ambient_occlusion.as_deref(),
            [255; 4],
            "ambient occlusion",
            true,
            device,
            queue,
        ),
        // The blue/purple-ish colour that represents the default for normal maps
        load_map(
            asset_root,
            maps.normal.as_deref(),
            [127, 127, 255, 255],
            "normal",
            true,
            device,
            queue,
        ),
        load_map(asset_root, maps.roughness.as_deref(), [255; 4], "roughness", true, device, queue),
    )?;
    log::debug!("loaded material '{}'", name);
    Ok(model::Material::new(
        device, name, colour, occlusion, normal, roughness, sampler, layout,
    ))
}

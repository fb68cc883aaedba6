use cgmath::{InnerSpace, Vector3};
use wgpu::util::DeviceExt;

use crate::data_structures::scene_graph::{Light, Scene};

/// Ambient term plus one rectangular area light, as the standard shader reads them.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    /// rgb: colour x intensity
    pub ambient: [f32; 4],
    /// xyz: centre of the rectangle
    pub position: [f32; 4],
    /// xyz: emission direction
    pub normal: [f32; 4],
    /// xyz: unit right axis, w: half width
    pub right: [f32; 4],
    /// xyz: unit up axis, w: half height
    pub up: [f32; 4],
    /// rgb: colour x intensity, w: 1 when the area light exists
    pub colour: [f32; 4],
}

impl LightUniform {
    /// No light at all: everything lit surfaces show is black.
    pub fn dark() -> Self {
        Self {
            ambient: [0.0; 4],
            position: [0.0; 4],
            normal: [0.0, 0.0, -1.0, 0.0],
            right: [1.0, 0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0, 0.0],
            colour: [0.0; 4],
        }
    }

    /// Collect the scene's lights. Ambient lights add up; the first area
    /// light wins.
    pub fn from_scene(scene: &Scene) -> Self {
        let mut uniform = Self::dark();
        let mut has_area_light = false;
        for (id, light) in scene.lights() {
            match light {
                Light::Ambient { colour, intensity } => {
                    for (acc, c) in uniform.ambient.iter_mut().zip(colour) {
                        *acc += c * intensity;
                    }
                }
                Light::RectArea {
                    colour,
                    intensity,
                    width,
                    height,
                } => {
                    if has_area_light {
                        log::warn!(
                            "only one area light is supported, ignoring '{}'",
                            scene.node(id).name
                        );
                        continue;
                    }
                    has_area_light = true;
                    let world = scene.world_transform(id);
                    let normal: Vector3<f32> = (world.rotation * -Vector3::unit_z()).normalize();
                    let right: Vector3<f32> = (world.rotation * Vector3::unit_x()).normalize();
                    let up: Vector3<f32> = (world.rotation * Vector3::unit_y()).normalize();
                    uniform.position = world.position.extend(1.0).into();
                    uniform.normal = normal.extend(0.0).into();
                    uniform.right = right.extend(width * world.scale.x / 2.0).into();
                    uniform.up = up.extend(height * world.scale.y / 2.0).into();
                    uniform.colour = [
                        colour[0] * intensity,
                        colour[1] * intensity,
                        colour[2] * intensity,
                        1.0,
                    ];
                }
            }
        }
        uniform
    }
}

#[derive(Debug)]
pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(uniform: LightUniform, device: &wgpu::Device) -> Self {
        let buffer = mk_buffer(device, uniform);
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer);
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn write(&mut self, queue: &wgpu::Queue, uniform: LightUniform) {
        self.uniform = uniform;
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Uniform Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("light_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: light_buffer.as_entire_binding(),
        }],
        label: Some("light_bind_group"),
    })
}

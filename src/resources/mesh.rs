use wgpu::util::DeviceExt;

use crate::data_structures::model::{self, ColourVertex, ModelVertex};

/// Vertex and index data before upload.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshData<V> {
    pub vertices: Vec<V>,
    pub indices: Vec<u32>,
}

impl<V: bytemuck::Pod> MeshData<V> {
    pub fn upload(&self, device: &wgpu::Device, name: &str) -> model::Mesh {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", name)),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", name)),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        model::Mesh {
            name: name.to_string(),
            vertex_buffer,
            index_buffer,
            num_elements: self.indices.len() as u32,
        }
    }
}

/// Normal, texture-u axis and texture-v axis of each box face, with u x v = normal.
const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
    ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
    ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
    ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
    ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
];

/// A box centred on the origin; each face carries the full texture.
pub fn cuboid(width: f32, height: f32, depth: f32) -> MeshData<ModelVertex> {
    let half = [width / 2.0, height / 2.0, depth / 2.0];
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (normal, u, v) in FACES {
        let base = vertices.len() as u32;
        // counter-clockwise seen from outside, starting bottom left
        for (su, sv, tex_coords) in [
            (-1.0, -1.0, [0.0, 1.0]),
            (1.0, -1.0, [1.0, 1.0]),
            (1.0, 1.0, [1.0, 0.0]),
            (-1.0, 1.0, [0.0, 0.0]),
        ] {
            let position = std::array::from_fn(|i| (normal[i] + u[i] * su + v[i] * sv) * half[i]);
            vertices.push(ModelVertex {
                position,
                tex_coords,
                normal,
                // We'll calculate these later
                tangent: [0.0; 3],
                bitangent: [0.0; 3],
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    compute_tangents(&mut vertices, &indices);
    MeshData { vertices, indices }
}

/// The same box in a single flat colour.
pub fn coloured_cuboid(
    width: f32,
    height: f32,
    depth: f32,
    colour: [f32; 3],
) -> MeshData<ColourVertex> {
    let MeshData { vertices, indices } = cuboid(width, height, depth);
    MeshData {
        vertices: vertices
            .into_iter()
            .map(|v| ColourVertex {
                position: v.position,
                colour,
            })
            .collect(),
        indices,
    }
}

/// Line list of the three coordinate axes: X red, Y green, Z blue.
pub fn axes(size: f32) -> MeshData<ColourVertex> {
    let mut vertices = Vec::with_capacity(6);
    for axis in 0..3 {
        let mut colour = [0.0; 3];
        colour[axis] = 1.0;
        let mut end = [0.0; 3];
        end[axis] = size;
        vertices.push(ColourVertex {
            position: [0.0; 3],
            colour,
        });
        vertices.push(ColourVertex {
            position: end,
            colour,
        });
    }
    MeshData {
        vertices,
        indices: (0..6).collect(),
    }
}

/// Line list outlining a `width` x `height` rectangle in the local XY plane.
pub fn rect_outline(width: f32, height: f32, colour: [f32; 3]) -> MeshData<ColourVertex> {
    let (w, h) = (width / 2.0, height / 2.0);
    let vertices = [[-w, -h], [w, -h], [w, h], [-w, h]]
        .into_iter()
        .map(|[x, y]| ColourVertex {
            position: [x, y, 0.0],
            colour,
        })
        .collect();
    MeshData {
        vertices,
        indices: vec![0, 1, 1, 2, 2, 3, 3, 0],
    }
}

/**
 * Generated faces only come with normals, so tangents and bitangents have to be
 * calculated for normal maps to work correctly.
 */
pub fn compute_tangents(vertices: &mut [ModelVertex], indices: &[u32]) {
    let mut triangles_included = vec![0; vertices.len()];

    // Calculate tangents and bitangets. We're going to
    // use the triangles, so we need to loop through the
    // indices in chunks of 3
    for c in indices.chunks_exact(3) {
        let v0 = vertices[c[0] as usize];
        let v1 = vertices[c[1] as usize];
        let v2 = vertices[c[2] as usize];

        let pos0: cgmath::Vector3<_> = v0.position.into();
        let pos1: cgmath::Vector3<_> = v1.position.into();
        let pos2: cgmath::Vector3<_> = v2.position.into();

        let uv0: cgmath::Vector2<_> = v0.tex_coords.into();
        let uv1: cgmath::Vector2<_> = v1.tex_coords.into();
        let uv2: cgmath::Vector2<_> = v2.tex_coords.into();

        // Calculate the edges of the triangle
        let delta_pos1 = pos1 - pos0;
        let delta_pos2 = pos2 - pos0;

        // This will give us a direction to calculate the
        // tangent and bitangent
        let delta_uv1 = uv1 - uv0;
        let delta_uv2 = uv2 - uv0;

        // Solving the following system of equations will
        // give us the tangent and bitangent.
        //     delta_pos1 = delta_uv1.x * T + delta_u.y * B
        //     delta_pos2 = delta_uv2.x * T + delta_uv2.y * B
        let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
        if det.abs() < f32::EPSILON {
            continue;
        }
        let r = 1.0 / det;
        let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) * r;
        // We flip the bitangent to enable right-handed normal
        // maps with wgpu texture coordinate system
        let bitangent = (delta_pos2 * delta_uv1.x - delta_pos1 * delta_uv2.x) * -r;

        // We'll use the same tangent/bitangent for each vertex in the triangle
        for &i in c {
            let v = &mut vertices[i as usize];
            v.tangent = (tangent + cgmath::Vector3::from(v.tangent)).into();
            v.bitangent = (bitangent + cgmath::Vector3::from(v.bitangent)).into();
            // Used to average the tangents/bitangents
            triangles_included[i as usize] += 1;
        }
    }

    // Average the tangents/bitangents
    for (i, n) in triangles_included.into_iter().enumerate() {
        if n == 0 {
            continue;
        }
        let denom = 1.0 / n as f32;
        let v = &mut vertices[i];
        v.tangent = (cgmath::Vector3::from(v.tangent) * denom).into();
        v.bitangent = (cgmath::Vector3::from(v.bitangent) * denom).into();
    }
}

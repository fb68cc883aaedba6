//! Render composition and pipeline batching.
//!
//! Scene drawables describe themselves as a [`Render`]; the stage sorts the
//! renders into one batch per pipeline so each pipeline is bound once per
//! frame.

use crate::{
    context::Context,
    data_structures::model::{DrawModel, Material, Mesh},
};

/// A mesh, its one-element instance buffer and, for lit surfaces, the material.
#[derive(Clone, Copy)]
pub struct Instanced<'a> {
    pub instance: &'a wgpu::Buffer,
    pub mesh: &'a Mesh,
    pub material: Option<&'a Material>,
    pub amount: usize,
}

/// How a drawable wants to be drawn.
///
/// - `None` renders nothing
/// - `Standard` renders a lit, textured surface
/// - `Flat` renders an unlit coloured shape
/// - `Lines` renders an unlit line list
/// - `Composed` recursively renders a composition of renders
pub enum Render<'a> {
    None,
    Standard(Instanced<'a>),
    Flat(Instanced<'a>),
    Lines(Instanced<'a>),
    Composed(Vec<Render<'a>>),
}

#[derive(Default)]
pub struct Batches<'a> {
    pub standard: Vec<Instanced<'a>>,
    pub flat: Vec<Instanced<'a>>,
    pub lines: Vec<Instanced<'a>>,
}

impl<'a> Render<'a> {
    pub fn set_pipelines(self, batches: &mut Batches<'a>) {
        match self {
            Render::Standard(instanced) => batches.standard.push(instanced),
            Render::Flat(instanced) => batches.flat.push(instanced),
            Render::Lines(instanced) => batches.lines.push(instanced),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.set_pipelines(batches)),
            Render::None => (),
        }
    }
}

impl<'a> Batches<'a> {
    pub fn len(&self) -> usize {
        self.standard.len() + self.flat.len() + self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record every batch into `render_pass`.
    pub fn draw(self, ctx: &Context, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_pipeline(&ctx.pipelines.standard);
        for instanced in self.standard {
            let Some(material) = instanced.material else {
                log::warn!("lit mesh '{}' has no material, skipping it", instanced.mesh.name);
                continue;
            };
            render_pass.set_vertex_buffer(1, instanced.instance.slice(..));
            render_pass.draw_mesh_instanced(
                instanced.mesh,
                material,
                0..instanced.amount as u32,
                &ctx.camera.bind_group,
                &ctx.light.bind_group,
            );
        }

        for (pipeline, batch) in [
            (&ctx.pipelines.flat, self.flat),
            (&ctx.pipelines.lines, self.lines),
        ] {
            render_pass.set_pipeline(pipeline);
            for instanced in batch {
                render_pass.set_vertex_buffer(1, instanced.instance.slice(..));
                render_pass.draw_flat_instanced(
                    instanced.mesh,
                    0..instanced.amount as u32,
                    &ctx.camera.bind_group,
                );
            }
        }
    }
}

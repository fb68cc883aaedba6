use std::path::{Path, PathBuf};

use cube_stage::{config::MaterialMaps, viewport::Viewport};

/// A scratch directory under the system temp dir, removed on drop.
pub struct AssetDir {
    root: PathBuf,
}

impl AssetDir {
    pub fn new(name: &str) -> Self {
        let root = std::env::temp_dir().join(format!("cube-stage-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&root).expect("temp asset dir");
        Self { root }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn root(&self) -> String {
        self.root.to_string_lossy().into_owned()
    }

    /// Write four small solid-colour jpgs in the `<dir>/<map>.jpg` layout and
    /// return the maps pointing at them.
    pub fn write_maps(&self, dir: &str, colour: [u8; 3]) -> MaterialMaps {
        let maps = MaterialMaps::in_dir(dir);
        std::fs::create_dir_all(self.root.join(dir)).expect("map dir");
        let solids = [colour, [255, 255, 255], [127, 127, 255], [255, 200, 255]];
        for (path, rgb) in maps.paths().zip(solids) {
            image::RgbImage::from_pixel(8, 8, image::Rgb(rgb))
                .save(self.root.join(path))
                .expect("write test map");
        }
        maps
    }
}

impl Drop for AssetDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

pub fn viewport(width: u32, height: u32) -> Viewport {
    Viewport::new(width, height, 1.0, 2.0)
}

/// Linear colour as the sRGB bytes the offscreen target stores.
pub fn to_srgb8(linear: f32) -> u8 {
    let c = linear.clamp(0.0, 1.0);
    let encoded = if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    };
    (encoded * 255.0).round() as u8
}

#[cfg(feature = "integration-tests")]
pub fn headless_stage(
    settings: cube_stage::StageSettings,
    width: u32,
    height: u32,
) -> anyhow::Result<(tokio::runtime::Runtime, cube_stage::Stage)> {
    use cube_stage::{Stage, context::Context};

    let runtime = tokio::runtime::Runtime::new()?;
    let stage = runtime.block_on(async {
        let ctx = Context::headless(width, height).await?;
        Stage::new(ctx, settings, viewport(width, height)).await
    })?;
    Ok((runtime, stage))
}

//! Opens a window with the cube or the room.
//!
//! ```text
//! cargo run -- room [asset-dir]
//! ```

use cube_stage::{SceneMode, StageSettings};

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let mode: SceneMode = match args.next() {
        Some(mode) => mode.parse()?,
        None => SceneMode::default(),
    };
    let mut settings = StageSettings::default().with_mode(mode);
    if let Some(root) = args.next() {
        settings = settings.with_asset_root(root);
    }
    if let Err(e) = cube_stage::run(settings) {
        log::error!("{:#}", e);
        return Err(e);
    }
    Ok(())
}

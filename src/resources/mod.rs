/**
 * Everything loaded or generated before it reaches the GPU: image files from
 * the asset root and the procedural meshes of the scene.
 */
pub mod mesh;
pub mod texture;

use anyhow::Context as _;

#[cfg(target_arch = "wasm32")]
fn format_url(asset_root: &str, file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().context("no global window")?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow::anyhow!("page origin is not readable"))?;
    let base = reqwest::Url::parse(&format!("{}/{}/", origin, asset_root.trim_matches('/')))?;
    Ok(base.join(file_name)?)
}

pub async fn load_binary(asset_root: &str, file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(asset_root, file_name)?;
        reqwest::get(url.clone())
            .await
            .and_then(|response| response.error_for_status())
            .with_context(|| format!("failed to fetch {}", url))?
            .bytes()
            .await?
            .to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = std::path::Path::new(asset_root).join(file_name);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?
    };

    Ok(data)
}

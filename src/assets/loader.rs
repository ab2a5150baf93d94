/// Asset fetching and decoding
///
/// Downloads go through the review API; decoding runs on tokio's blocking
/// pool because image decoding is CPU-bound.

use std::io::Cursor;

use iced::widget::{image as iced_image, svg};
use iced::Color;
use image::ImageReader;
use tokio::task;

use crate::api::{ApiError, ReviewApi};
use crate::state::bitmap::Bitmap;
use crate::ui::svg_preview;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("download failed: {0}")]
    Fetch(#[from] ApiError),

    #[error("decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("response is not an SVG document")]
    NotSvg,

    #[error("task join error: {0}")]
    Join(#[from] task::JoinError),
}

/// Source photograph with its natural size
#[derive(Debug, Clone)]
pub struct Photo {
    pub handle: iced_image::Handle,
    pub width: u32,
    pub height: u32,
}

/// Fetch the source photo and read its natural dimensions
pub async fn load_photo(api: ReviewApi, url: String) -> Result<Photo, String> {
    load_photo_inner(&api, &url).await.map_err(|e| e.to_string())
}

async fn load_photo_inner(api: &ReviewApi, url: &str) -> Result<Photo, AssetError> {
    let bytes = api.fetch_bytes(url).await?;

    let (bytes, (width, height)) = task::spawn_blocking(move || {
        let dimensions = ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()
            .map_err(image::ImageError::from)?
            .into_dimensions()?;
        Ok::<_, image::ImageError>((bytes, dimensions))
    })
    .await??;

    Ok(Photo {
        handle: iced_image::Handle::from_bytes(bytes),
        width,
        height,
    })
}

/// Fetch the pipeline preview and sample it into a bitmap (before overrides)
pub async fn load_preview(api: ReviewApi, url: String) -> Result<Bitmap, String> {
    load_preview_inner(&api, &url).await.map_err(|e| e.to_string())
}

async fn load_preview_inner(api: &ReviewApi, url: &str) -> Result<Bitmap, AssetError> {
    let bytes = api.fetch_bytes(url).await?;

    let bitmap = task::spawn_blocking(move || {
        let preview = image::load_from_memory(&bytes)?;
        Ok::<_, image::ImageError>(Bitmap::from_preview(&preview))
    })
    .await??;

    Ok(bitmap)
}

/// Fetch the vector output and recolor it for the current theme
pub async fn load_svg(api: ReviewApi, url: String, foreground: Color) -> Result<svg::Handle, String> {
    load_svg_inner(&api, &url, foreground).await.map_err(|e| e.to_string())
}

async fn load_svg_inner(api: &ReviewApi, url: &str, foreground: Color) -> Result<svg::Handle, AssetError> {
    let bytes = api.fetch_bytes(url).await?;
    let text = String::from_utf8_lossy(&bytes);

    if !svg_preview::is_svg(&text) {
        return Err(AssetError::NotSvg);
    }

    let recolored = svg_preview::recolor(&text, foreground);
    Ok(svg::Handle::from_memory(recolored.into_bytes()))
}

//! PNG cards composed as SVG and rasterized with resvg.
//!
//! Every card is a fixed 1000×520 canvas. Artwork is decoded with `image`,
//! resized, and embedded as data URIs; text goes through the mixed-script
//! writer so kanji and latin glyphs come from their own fonts.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::warn;

use ikabot_core::config::PathSettings;

mod fonts;
mod gear_collage;
mod salmon_card;
mod stage_card;
mod svg;
pub mod text;

pub use fonts::FontSet;

pub(crate) const CARD_W: u32 = 1000;
pub(crate) const CARD_H: u32 = 520;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("nothing to render")]
    Empty,

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to decode {}: {source}", path.display())]
    Asset {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to parse SVG: {0}")]
    Svg(String),

    #[error("failed to create pixmap")]
    Pixmap,

    #[error("failed to encode PNG: {0}")]
    Encode(String),
}

/// Inputs of a stage card: rule header plus two stage panels.
#[derive(Debug, Clone)]
pub struct StageCard {
    pub rule: String,
    pub rule_icon: Option<PathBuf>,
    pub stages: [StagePanel; 2],
}

#[derive(Debug, Clone)]
pub struct StagePanel {
    pub name: String,
    pub image: Option<PathBuf>,
}

/// Inputs of a salmon run card. `weapon_icons` are already resolved.
#[derive(Debug, Clone)]
pub struct SalmonCard {
    pub stage_image: Option<PathBuf>,
    pub weapon_icons: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct GearCell {
    pub label: String,
    /// Downloaded thumbnail bytes
    pub thumbnail: Option<Vec<u8>>,
    pub brand_logo: Option<PathBuf>,
    pub nameplate: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct GearCollage {
    pub title: String,
    pub cells: Vec<GearCell>,
}

/// Renders cards on the blocking pool. Failures come back as `None`.
#[derive(Debug, Clone)]
pub struct Renderer {
    fonts: Arc<FontSet>,
}

impl Renderer {
    pub fn new(fonts: FontSet) -> Self {
        Self {
            fonts: Arc::new(fonts),
        }
    }

    pub fn from_settings(paths: &PathSettings) -> Self {
        Self::new(FontSet::load(
            &paths.resolve(&paths.latin_font),
            &paths.resolve(&paths.kanji_font),
        ))
    }

    pub fn fonts(&self) -> &FontSet {
        &self.fonts
    }

    pub async fn stage_card(&self, card: StageCard) -> Option<Vec<u8>> {
        self.run("stage", move |fonts| stage_card::render(&card, fonts))
            .await
    }

    pub async fn salmon_card(&self, card: SalmonCard) -> Option<Vec<u8>> {
        self.run("salmon", move |fonts| salmon_card::render(&card, fonts))
            .await
    }

    pub async fn gear_collage(&self, collage: GearCollage) -> Option<Vec<u8>> {
        self.run("gear", move |fonts| gear_collage::render(&collage, fonts))
            .await
    }

    async fn run<F>(&self, kind: &'static str, job: F) -> Option<Vec<u8>>
    where
        F: FnOnce(&FontSet) -> Result<Vec<u8>, RenderError> + Send + 'static,
    {
        let fonts = Arc::clone(&self.fonts);
        match tokio::task::spawn_blocking(move || job(&fonts)).await {
            Ok(Ok(png)) => Some(png),
            Ok(Err(RenderError::Empty)) => None,
            Ok(Err(err)) => {
                warn!("render: {kind} card failed: {err}");
                None
            }
            Err(err) => {
                warn!("render: {kind} card task failed: {err}");
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::path::Path;

    use image::{DynamicImage, Rgba, RgbaImage};

    use super::*;

    /// Write a solid-color PNG fixture.
    pub(crate) fn write_png(path: &Path, w: u32, h: u32) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        let img = RgbaImage::from_pixel(w, h, Rgba([200, 80, 40, 255]));
        DynamicImage::ImageRgba8(img).save(path).unwrap();
    }

    pub(crate) fn png_size(png: &[u8]) -> (u32, u32) {
        let img = image::load_from_memory(png).unwrap();
        (img.width(), img.height())
    }

    #[tokio::test]
    async fn test_renderer_salmon_without_icons_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let stage = dir.path().join("stage.png");
        write_png(&stage, 64, 32);

        let renderer = Renderer::new(FontSet::system());
        let card = SalmonCard {
            stage_image: Some(stage),
            weapon_icons: Vec::new(),
        };
        assert!(renderer.salmon_card(card).await.is_none());
    }

    #[tokio::test]
    async fn test_renderer_stage_card_size() {
        let renderer = Renderer::new(FontSet::system());
        let card = StageCard {
            rule: "ガチエリア".to_string(),
            rule_icon: None,
            stages: [
                StagePanel {
                    name: "ユノハナ大渓谷".to_string(),
                    image: None,
                },
                StagePanel {
                    name: "不明".to_string(),
                    image: None,
                },
            ],
        };
        let png = renderer.stage_card(card).await.unwrap();
        assert_eq!(png_size(&png), (CARD_W, CARD_H));
    }
}

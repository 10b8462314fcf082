//! SVG assembly and rasterization helpers shared by the card renderers.

use std::fmt::Write;
use std::io::Cursor;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use resvg::tiny_skia;
use resvg::usvg;

use super::RenderError;

pub(crate) fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Root element of a card of `w`×`h` pixels.
pub(crate) fn open_svg(s: &mut String, w: u32, h: u32) {
    let _ = write!(
        s,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
    );
}

pub(crate) fn rasterize(svg: &str, options: &usvg::Options<'_>) -> Result<Vec<u8>, RenderError> {
    let tree =
        usvg::Tree::from_data(svg.as_bytes(), options).map_err(|e| RenderError::Svg(e.to_string()))?;

    let size = tree.size().to_int_size();
    let mut pixmap =
        tiny_skia::Pixmap::new(size.width(), size.height()).ok_or(RenderError::Pixmap)?;

    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    pixmap
        .encode_png()
        .map_err(|e| RenderError::Encode(e.to_string()))
}

pub(crate) fn open_image(path: &Path) -> Result<DynamicImage, RenderError> {
    image::open(path).map_err(|source| RenderError::Asset {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn decode_image(bytes: &[u8]) -> Result<DynamicImage, RenderError> {
    Ok(image::load_from_memory(bytes)?)
}

/// Scale to fill `w`×`h` and crop the overflow around the center.
pub(crate) fn cover(img: &DynamicImage, w: u32, h: u32) -> DynamicImage {
    img.resize_to_fill(w.max(1), h.max(1), FilterType::Lanczos3)
}

/// Scale to fit inside `w`×`h`, keeping the aspect ratio.
pub(crate) fn contain(img: &DynamicImage, w: u32, h: u32) -> DynamicImage {
    img.resize(w.max(1), h.max(1), FilterType::Lanczos3)
}

/// Scale down (never up) to fit inside `w`×`h`.
pub(crate) fn shrink_to_fit(img: &DynamicImage, w: u32, h: u32) -> DynamicImage {
    if img.width() <= w && img.height() <= h {
        img.clone()
    } else {
        contain(img, w, h)
    }
}

pub(crate) fn png_data_uri(img: &DynamicImage) -> Result<String, RenderError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(&buf)))
}

/// Data URI of an icon file. SVG icons are embedded as-is.
pub(crate) fn icon_data_uri(path: &Path, size: u32) -> Result<String, RenderError> {
    let is_svg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));
    if is_svg {
        let bytes = std::fs::read(path).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        return Ok(format!("data:image/svg+xml;base64,{}", STANDARD.encode(&bytes)));
    }
    png_data_uri(&contain(&open_image(path)?, size, size))
}

/// `<image>` element at an exact box.
pub(crate) fn write_image(s: &mut String, x: f32, y: f32, w: f32, h: f32, href: &str, extra: &str) {
    let _ = write!(
        s,
        r#"<image x="{x}" y="{y}" width="{w}" height="{h}" preserveAspectRatio="none" xlink:href="{href}"{extra}/>"#,
    );
}

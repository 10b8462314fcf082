//! Titled 3-column grid of gear thumbnails with nameplate labels.

use std::fmt::Write;
use std::path::Path;

use image::DynamicImage;
use tracing::debug;

use super::fonts::FontSet;
use super::svg::{
    contain, cover, decode_image, open_image, open_svg, png_data_uri, rasterize, write_image,
};
use super::text::{Anchor, TextStyle, centered_baseline, fit_label, write_text};
use super::{CARD_H, CARD_W, GearCell, GearCollage, RenderError};

const COLS: u32 = 3;
const PAD: u32 = 24;
const GAP: u32 = 16;
const HEADER_H: u32 = 60;
const TITLE_SIZE: f32 = 28.0;

/// Height of the dark strip used when no nameplate is available.
const STRIP_H: u32 = 34;
const LABEL_SIZE: f32 = 20.0;
const LOGO_RATIO: f32 = 0.22;
const LOGO_PAD: u32 = 10;

struct Plate {
    href: Option<String>,
    x: u32,
    w: u32,
    h: u32,
}

pub(super) fn render(collage: &GearCollage, fonts: &FontSet) -> Result<Vec<u8>, RenderError> {
    if collage.cells.is_empty() {
        return Err(RenderError::Empty);
    }

    let count = collage.cells.len() as u32;
    let rows = count.div_ceil(COLS);
    let cell_w = (CARD_W - PAD * 2 - GAP * (COLS - 1)) / COLS;
    let cell_h = (CARD_H - PAD * 2 - HEADER_H)
        .saturating_sub(GAP * (rows - 1))
        .checked_div(rows)
        .unwrap_or(0)
        .max(1);

    let mut s = String::new();
    open_svg(&mut s, CARD_W, CARD_H);
    let _ = write!(s, r#"<rect width="{CARD_W}" height="{CARD_H}" fill="rgb(20,24,34)"/>"#);
    write_text(
        &mut s,
        fonts,
        PAD as f32,
        centered_baseline((PAD + 6) as f32 + TITLE_SIZE / 2.0, TITLE_SIZE),
        &collage.title,
        TextStyle {
            size: TITLE_SIZE,
            fill: "white",
            anchor: Anchor::Start,
            stroke: None,
        },
    );

    for (idx, cell) in collage.cells.iter().enumerate() {
        let idx = idx as u32;
        let x = PAD + (idx % COLS) * (cell_w + GAP);
        let y = PAD + HEADER_H + (idx / COLS) * (cell_h + GAP);
        write_cell(&mut s, fonts, cell, x, y, cell_w, cell_h)?;
    }

    s.push_str("</svg>");
    rasterize(&s, fonts.options())
}

fn write_cell(
    s: &mut String,
    fonts: &FontSet,
    cell: &GearCell,
    x: u32,
    y: u32,
    cell_w: u32,
    cell_h: u32,
) -> Result<(), RenderError> {
    let _ = write!(
        s,
        r#"<rect x="{x}" y="{y}" width="{cell_w}" height="{cell_h}" fill="rgb(10,12,18)"/>"#,
    );

    let plate = cell
        .nameplate
        .as_deref()
        .and_then(|path| load_plate(path, cell_w, cell_h))
        .unwrap_or(Plate {
            href: None,
            x: 0,
            w: cell_w,
            h: STRIP_H.min(cell_h),
        });
    let image_h = cell_h.saturating_sub(plate.h).max(1);
    let label_y = y + image_h;

    if let Some(thumb) = cell.thumbnail.as_deref().and_then(|bytes| {
        decode_image(bytes)
            .inspect_err(|e| debug!("render: gear thumbnail unusable: {e}"))
            .ok()
    }) {
        let img = cover(&thumb, cell_w, image_h);
        write_image(
            s,
            x as f32,
            y as f32,
            cell_w as f32,
            image_h as f32,
            &png_data_uri(&img)?,
            "",
        );
    }

    if let Some(logo) = cell.brand_logo.as_deref().and_then(|path| {
        open_image(path)
            .inspect_err(|e| debug!("render: brand logo unusable: {e}"))
            .ok()
    }) {
        write_logo(s, &logo, x, y, cell_w, cell_h)?;
    }

    match &plate.href {
        Some(href) => write_image(
            s,
            (x + plate.x) as f32,
            label_y as f32,
            plate.w as f32,
            plate.h as f32,
            href,
            "",
        ),
        None => {
            let _ = write!(
                s,
                r#"<rect x="{}" y="{label_y}" width="{}" height="{}" fill="black" fill-opacity="0.63"/>"#,
                x + plate.x,
                plate.w,
                plate.h
            );
        }
    }

    let max_w = plate.w.saturating_sub(12).max(10) as f32;
    let label = fit_label(&cell.label, LABEL_SIZE, max_w, fonts);
    write_text(
        s,
        fonts,
        (x + plate.x) as f32 + plate.w as f32 / 2.0,
        centered_baseline(label_y as f32 + plate.h as f32 / 2.0, label.size),
        &label.text,
        TextStyle {
            size: label.size,
            fill: "rgb(20,20,20)",
            anchor: Anchor::Middle,
            stroke: Some(("white", 0.86, 2.0)),
        },
    );
    Ok(())
}

/// Nameplate scaled down to fit the cell and centered on its bottom edge.
fn load_plate(path: &Path, cell_w: u32, cell_h: u32) -> Option<Plate> {
    let img = open_image(path)
        .inspect_err(|e| debug!("render: nameplate unusable: {e}"))
        .ok()?;
    let (pw, ph) = (img.width().max(1), img.height().max(1));
    let scale = (cell_w as f32 / pw as f32)
        .min(cell_h as f32 / ph as f32)
        .min(1.0);
    let img = if scale < 1.0 {
        let w = ((pw as f32 * scale) as u32).max(1);
        let h = ((ph as f32 * scale) as u32).max(1);
        contain(&img, w, h)
    } else {
        img
    };
    let href = png_data_uri(&img).ok()?;
    Some(Plate {
        href: Some(href),
        x: cell_w.saturating_sub(img.width()) / 2,
        w: img.width(),
        h: img.height(),
    })
}

fn write_logo(
    s: &mut String,
    logo: &DynamicImage,
    x: u32,
    y: u32,
    cell_w: u32,
    cell_h: u32,
) -> Result<(), RenderError> {
    let max_size = (cell_w.min(cell_h) as f32 * LOGO_RATIO) as u32;
    if max_size == 0 {
        return Ok(());
    }
    let logo = contain(logo, max_size, max_size);
    write_image(
        s,
        (x + cell_w - logo.width() - LOGO_PAD) as f32,
        (y + LOGO_PAD) as f32,
        logo.width() as f32,
        logo.height() as f32,
        &png_data_uri(&logo)?,
        "",
    );
    Ok(())
}

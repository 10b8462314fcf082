//! Salmon run stage with the weapon lineup on a bottom bar.

use std::fmt::Write;

use tracing::warn;

use super::fonts::FontSet;
use super::svg::{contain, cover, open_image, open_svg, png_data_uri, rasterize, write_image};
use super::{CARD_H, CARD_W, RenderError, SalmonCard};

const BAR_H: u32 = 150;
const MAX_ICONS: usize = 4;
const ICON_SIZE: u32 = 110;
const ICON_GAP: u32 = 18;

pub(super) fn render(card: &SalmonCard, fonts: &FontSet) -> Result<Vec<u8>, RenderError> {
    let Some(stage_path) = &card.stage_image else {
        return Err(RenderError::Empty);
    };
    if card.weapon_icons.is_empty() {
        return Err(RenderError::Empty);
    }

    let stage = cover(&open_image(stage_path)?, CARD_W, CARD_H);

    let mut s = String::new();
    open_svg(&mut s, CARD_W, CARD_H);
    let _ = write!(s, r#"<rect width="{CARD_W}" height="{CARD_H}" fill="black"/>"#);
    write_image(
        &mut s,
        0.0,
        0.0,
        CARD_W as f32,
        CARD_H as f32,
        &png_data_uri(&stage)?,
        "",
    );

    let bar_y = CARD_H - BAR_H;
    let _ = write!(
        s,
        r#"<rect x="0" y="{bar_y}" width="{CARD_W}" height="{BAR_H}" fill="black" fill-opacity="0.65"/>"#,
    );

    let icons = &card.weapon_icons[..card.weapon_icons.len().min(MAX_ICONS)];
    let count = icons.len() as u32;
    let total_w = count * ICON_SIZE + (count - 1) * ICON_GAP;
    let start_x = (CARD_W - total_w) / 2;
    let slot_y = bar_y + (BAR_H - ICON_SIZE) / 2;

    for (idx, path) in icons.iter().enumerate() {
        let icon = match open_image(path) {
            Ok(img) => contain(&img, ICON_SIZE, ICON_SIZE),
            Err(err) => {
                warn!("render: skipping weapon icon: {err}");
                continue;
            }
        };
        let (w, h) = (icon.width(), icon.height());
        let x = start_x + idx as u32 * (ICON_SIZE + ICON_GAP) + (ICON_SIZE - w) / 2;
        let y = slot_y + (ICON_SIZE - h) / 2;
        write_image(
            &mut s,
            x as f32,
            y as f32,
            w as f32,
            h as f32,
            &png_data_uri(&icon)?,
            "",
        );
    }

    s.push_str("</svg>");
    rasterize(&s, fonts.options())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tests::{png_size, write_png};

    #[test]
    fn test_salmon_card_with_weapons() {
        let dir = tempfile::tempdir().unwrap();
        let stage = dir.path().join("シェケナダム.png");
        write_png(&stage, 800, 450);
        let weapons: Vec<_> = (0..5)
            .map(|i| {
                let path = dir.path().join(format!("w{i}.png"));
                write_png(&path, 96, 64);
                path
            })
            .collect();

        let card = SalmonCard {
            stage_image: Some(stage),
            weapon_icons: weapons,
        };
        let png = render(&card, &FontSet::system()).unwrap();
        assert_eq!(png_size(&png), (CARD_W, CARD_H));
    }

    #[test]
    fn test_missing_stage_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let weapon = dir.path().join("w.png");
        write_png(&weapon, 32, 32);

        let card = SalmonCard {
            stage_image: None,
            weapon_icons: vec![weapon],
        };
        assert!(matches!(
            render(&card, &FontSet::system()),
            Err(RenderError::Empty)
        ));
    }

    #[test]
    fn test_broken_weapon_icon_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let stage = dir.path().join("stage.png");
        write_png(&stage, 100, 100);
        let broken = dir.path().join("broken.png");
        std::fs::write(&broken, b"garbage").unwrap();

        let card = SalmonCard {
            stage_image: Some(stage),
            weapon_icons: vec![broken],
        };
        assert!(render(&card, &FontSet::system()).is_ok());
    }
}

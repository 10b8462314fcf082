//! Rule header over two stage panels.

use std::fmt::Write;

use tracing::debug;

use ikabot_core::schedule::UNKNOWN;

use super::fonts::FontSet;
use super::svg::{cover, icon_data_uri, open_image, open_svg, png_data_uri, rasterize, write_image};
use super::text::{Anchor, TextStyle, centered_baseline, fit_label, write_text};
use super::{CARD_H, CARD_W, RenderError, StageCard};

const PAD: u32 = 20;
const GAP: u32 = 16;
const HEADER_H: u32 = 64;
const CORNER_R: u32 = 18;

const ICON_SIZE: u32 = 40;
const TITLE_SIZE: f32 = 30.0;

const LABEL_H: u32 = 46;
const LABEL_BOTTOM: u32 = 8;
const LABEL_SIZE: f32 = 26.0;

pub(super) fn render(card: &StageCard, fonts: &FontSet) -> Result<Vec<u8>, RenderError> {
    let panel_top = PAD + HEADER_H;
    let panel_h = CARD_H - panel_top - PAD;
    let panel_w = (CARD_W - PAD * 2 - GAP) / 2;

    let mut s = String::new();
    open_svg(&mut s, CARD_W, CARD_H);
    s.push_str("<defs>");
    s.push_str(
        r#"<filter id="shadow" x="-20%" y="-20%" width="140%" height="140%"><feGaussianBlur stdDeviation="2"/></filter>"#,
    );
    for i in 0..2 {
        let x = PAD + i * (panel_w + GAP);
        let _ = write!(
            s,
            r#"<clipPath id="panel{i}"><rect x="{x}" y="{panel_top}" width="{panel_w}" height="{panel_h}" rx="{CORNER_R}"/></clipPath>"#,
        );
    }
    s.push_str("</defs>");
    let _ = write!(
        s,
        r#"<rect width="{CARD_W}" height="{CARD_H}" fill="rgb(25,32,44)"/>"#
    );

    // Header
    let icon_x = PAD as f32;
    let icon_y = (PAD + 6) as f32;
    let size = ICON_SIZE as f32;
    let icon = card.rule_icon.as_deref().and_then(|path| {
        icon_data_uri(path, ICON_SIZE)
            .inspect_err(|e| debug!("render: rule icon unusable: {e}"))
            .ok()
    });
    match icon {
        Some(href) => {
            write_image(
                &mut s,
                icon_x + 1.0,
                icon_y + 2.0,
                size,
                size,
                &href,
                r#" filter="url(#shadow)""#,
            );
            write_image(&mut s, icon_x, icon_y, size, size, &href, "");
        }
        None => {
            let r = size / 2.0;
            let _ = write!(
                s,
                r##"<circle cx="{}" cy="{}" r="{r}" fill="#FFC400"/>"##,
                icon_x + r,
                icon_y + r
            );
        }
    }
    write_text(
        &mut s,
        fonts,
        icon_x + size + 14.0,
        centered_baseline(icon_y + size / 2.0, TITLE_SIZE),
        &card.rule,
        TextStyle {
            size: TITLE_SIZE,
            fill: "white",
            anchor: Anchor::Start,
            stroke: None,
        },
    );

    // Stage panels
    for (i, stage) in card.stages.iter().enumerate() {
        let x = PAD + i as u32 * (panel_w + GAP);
        let _ = write!(
            s,
            r#"<rect x="{x}" y="{panel_top}" width="{panel_w}" height="{panel_h}" rx="{CORNER_R}" fill="rgb(18,24,33)"/>"#,
        );
        if let Some(path) = &stage.image {
            let img = cover(&open_image(path)?, panel_w, panel_h);
            let href = png_data_uri(&img)?;
            let clip = format!(r#" clip-path="url(#panel{i})""#);
            write_image(
                &mut s,
                x as f32,
                panel_top as f32,
                panel_w as f32,
                panel_h as f32,
                &href,
                &clip,
            );
        }

        if stage.name.is_empty() || stage.name == UNKNOWN {
            continue;
        }
        let label_y = panel_top + panel_h - LABEL_H - LABEL_BOTTOM;
        let _ = write!(
            s,
            r#"<rect x="{x}" y="{label_y}" width="{panel_w}" height="{LABEL_H}" rx="12" fill="black" fill-opacity="0.47"/>"#,
        );
        let label = fit_label(&stage.name, LABEL_SIZE, (panel_w - 24) as f32, fonts);
        write_text(
            &mut s,
            fonts,
            x as f32 + panel_w as f32 / 2.0,
            centered_baseline(label_y as f32 + LABEL_H as f32 / 2.0, label.size),
            &label.text,
            TextStyle {
                size: label.size,
                fill: "white",
                anchor: Anchor::Middle,
                stroke: None,
            },
        );
    }

    s.push_str("</svg>");
    rasterize(&s, fonts.options())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::StagePanel;
    use crate::render::tests::{png_size, write_png};

    #[test]
    fn test_stage_card_with_artwork() {
        let dir = tempfile::tempdir().unwrap();
        let icon = dir.path().join("ガチヤグラ.png");
        let left = dir.path().join("left.png");
        let right = dir.path().join("right.png");
        write_png(&icon, 64, 64);
        write_png(&left, 640, 360);
        write_png(&right, 300, 500);

        let card = StageCard {
            rule: "ガチヤグラ".to_string(),
            rule_icon: Some(icon),
            stages: [
                StagePanel {
                    name: "ナメロウ金属".to_string(),
                    image: Some(left),
                },
                StagePanel {
                    name: "Mahi-Mahi Resort".to_string(),
                    image: Some(right),
                },
            ],
        };

        let png = render(&card, &FontSet::system()).unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
        assert_eq!(png_size(&png), (CARD_W, CARD_H));
    }

    #[test]
    fn test_unreadable_stage_image_fails() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.png");
        std::fs::write(&broken, b"not an image").unwrap();

        let card = StageCard {
            rule: UNKNOWN.to_string(),
            rule_icon: None,
            stages: [
                StagePanel {
                    name: "a".to_string(),
                    image: Some(broken),
                },
                StagePanel {
                    name: "b".to_string(),
                    image: None,
                },
            ],
        };

        assert!(matches!(
            render(&card, &FontSet::system()),
            Err(RenderError::Asset { .. })
        ));
    }
}

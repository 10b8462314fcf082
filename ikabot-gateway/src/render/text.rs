//! Mixed-script text: kanji runs use the kanji font, everything else the
//! latin font.

use std::fmt::Write;

use super::fonts::FontSet;
use super::svg::xml_escape;

/// Smallest size a label is shrunk to before it gets truncated.
pub const MIN_LABEL_SIZE: f32 = 12.0;
const LABEL_SIZE_STEP: f32 = 2.0;
const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Latin,
    Kanji,
}

/// CJK unified ideographs (extensions A to F) and compatibility ideographs.
pub fn is_kanji(ch: char) -> bool {
    matches!(
        ch as u32,
        0x4E00..=0x9FFF
            | 0x3400..=0x4DBF
            | 0xF900..=0xFAFF
            | 0x20000..=0x2A6DF
            | 0x2A700..=0x2B73F
            | 0x2B740..=0x2B81F
            | 0x2B820..=0x2CEAF
    )
}

fn script_of(ch: char) -> Script {
    if is_kanji(ch) {
        Script::Kanji
    } else {
        Script::Latin
    }
}

/// Split `text` into maximal runs of one script.
pub fn script_runs(text: &str) -> Vec<(Script, &str)> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut current: Option<Script> = None;

    for (idx, ch) in text.char_indices() {
        let script = script_of(ch);
        match current {
            Some(prev) if prev != script => {
                runs.push((prev, &text[start..idx]));
                start = idx;
                current = Some(script);
            }
            None => current = Some(script),
            _ => {}
        }
    }
    if let Some(script) = current {
        runs.push((script, &text[start..]));
    }
    runs
}

/// Width of rendered text in pixels.
pub trait TextMeasurer {
    fn width(&self, text: &str, size: f32) -> f32;
}

/// Fixed per-character advances: full width for non-ASCII, 0.6 em for ASCII.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicMeasurer;

impl TextMeasurer for HeuristicMeasurer {
    fn width(&self, text: &str, size: f32) -> f32 {
        text.chars()
            .map(|ch| if ch.is_ascii() { 0.6 } else { 1.0 })
            .sum::<f32>()
            * size
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FittedLabel {
    pub text: String,
    pub size: f32,
}

/// Shrink `text` in 2 px steps from `base` down to [`MIN_LABEL_SIZE`], then
/// truncate with `...` until it fits `max_width`.
pub fn fit_label(text: &str, base: f32, max_width: f32, measurer: &dyn TextMeasurer) -> FittedLabel {
    let mut size = base;
    loop {
        if measurer.width(text, size) <= max_width {
            return FittedLabel {
                text: text.to_string(),
                size,
            };
        }
        if size - LABEL_SIZE_STEP < MIN_LABEL_SIZE {
            break;
        }
        size -= LABEL_SIZE_STEP;
    }

    let chars: Vec<char> = text.chars().collect();
    for keep in (0..chars.len()).rev() {
        let mut candidate: String = chars[..keep].iter().collect();
        candidate.push_str(ELLIPSIS);
        if measurer.width(&candidate, size) <= max_width {
            return FittedLabel {
                text: candidate,
                size,
            };
        }
    }

    FittedLabel {
        text: ELLIPSIS.to_string(),
        size,
    }
}

/// Horizontal alignment of a text element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
}

impl Anchor {
    fn as_str(self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
        }
    }
}

/// Paint of a text element. `stroke` is drawn under the fill.
#[derive(Debug, Clone, Copy)]
pub struct TextStyle<'a> {
    pub size: f32,
    pub fill: &'a str,
    pub anchor: Anchor,
    pub stroke: Option<(&'a str, f32, f32)>,
}

/// Write a `<text>` element whose script runs are separate `tspan`s.
///
/// `baseline` is the y coordinate of the alphabetic baseline.
pub fn write_text(s: &mut String, fonts: &FontSet, x: f32, baseline: f32, text: &str, style: TextStyle<'_>) {
    let TextStyle {
        size,
        fill,
        anchor,
        stroke,
    } = style;
    let _ = write!(
        s,
        r#"<text x="{x}" y="{baseline}" font-size="{size}" fill="{fill}" text-anchor="{}" xml:space="preserve""#,
        anchor.as_str()
    );
    if let Some((color, opacity, width)) = stroke {
        let _ = write!(
            s,
            r#" stroke="{color}" stroke-opacity="{opacity}" stroke-width="{width}" stroke-linejoin="round" paint-order="stroke""#,
        );
    }
    s.push('>');
    for (script, run) in script_runs(text) {
        let _ = write!(
            s,
            r#"<tspan font-family="{}">{}</tspan>"#,
            xml_escape(&fonts.family_list(script)),
            xml_escape(run)
        );
    }
    s.push_str("</text>");
}

/// Baseline that vertically centers text of `size` on `center_y`.
pub fn centered_baseline(center_y: f32, size: f32) -> f32 {
    center_y + size * 0.35
}

use std::path::Path;

use resvg::usvg;
use resvg::usvg::fontdb;
use tracing::{info, warn};

use super::svg::xml_escape;
use super::text::{HeuristicMeasurer, Script, TextMeasurer};

/// Font database plus the families used for latin and kanji runs.
///
/// Loading scans every system font, which can take seconds. Build it once at
/// startup from a blocking context.
pub struct FontSet {
    options: usvg::Options<'static>,
    latin_family: Option<String>,
    kanji_family: Option<String>,
}

impl std::fmt::Debug for FontSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontSet")
            .field("latin_family", &self.latin_family)
            .field("kanji_family", &self.kanji_family)
            .finish_non_exhaustive()
    }
}

impl FontSet {
    /// Register the configured font files on top of the system fonts.
    ///
    /// A missing kanji font falls back to the latin font, a missing latin
    /// font to the system sans-serif.
    pub fn load(latin_font: &Path, kanji_font: &Path) -> Self {
        let mut options = usvg::Options::default();
        let db = options.fontdb_mut();
        db.load_system_fonts();

        let latin_family = load_family(db, latin_font);
        let kanji_family = load_family(db, kanji_font).or_else(|| latin_family.clone());
        if let Some(family) = &latin_family {
            db.set_sans_serif_family(family.clone());
        }

        info!(
            "fonts: {} faces loaded (latin={:?}, kanji={:?})",
            db.len(),
            latin_family,
            kanji_family
        );

        Self {
            options,
            latin_family,
            kanji_family,
        }
    }

    /// System fonts only.
    pub fn system() -> Self {
        let mut options = usvg::Options::default();
        options.fontdb_mut().load_system_fonts();
        Self {
            options,
            latin_family: None,
            kanji_family: None,
        }
    }

    pub fn options(&self) -> &usvg::Options<'static> {
        &self.options
    }

    /// CSS font-family list for a run of `script`.
    pub fn family_list(&self, script: Script) -> String {
        let family = match script {
            Script::Latin => self.latin_family.as_deref(),
            Script::Kanji => self.kanji_family.as_deref(),
        };
        match family {
            Some(name) => format!("'{name}', sans-serif"),
            None => "sans-serif".to_string(),
        }
    }

    fn layout_width(&self, text: &str, size: f32) -> Option<f32> {
        let mut s = String::with_capacity(256);
        let height = (size * 2.0).ceil();
        let width = (size * text.chars().count() as f32 * 2.0).ceil().max(1.0);
        s.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}">"#
        ));
        s.push_str(&format!(r#"<text x="0" y="{size}" font-size="{size}" xml:space="preserve">"#));
        for (script, run) in super::text::script_runs(text) {
            s.push_str(&format!(
                r#"<tspan font-family="{}">{}</tspan>"#,
                xml_escape(&self.family_list(script)),
                xml_escape(run)
            ));
        }
        s.push_str("</text></svg>");

        let tree = usvg::Tree::from_data(s.as_bytes(), &self.options).ok()?;
        if !tree.root().has_children() {
            return None;
        }
        Some(tree.root().abs_bounding_box().width())
    }
}

impl TextMeasurer for FontSet {
    /// Laid-out ink width; the heuristic covers text usvg cannot shape.
    fn width(&self, text: &str, size: f32) -> f32 {
        if text.is_empty() {
            return 0.0;
        }
        self.layout_width(text, size)
            .unwrap_or_else(|| HeuristicMeasurer.width(text, size))
    }
}

fn load_family(db: &mut fontdb::Database, path: &Path) -> Option<String> {
    if !path.is_file() {
        warn!("fonts: {} not found, using system fonts", path.display());
        return None;
    }
    let before = db.len();
    if let Err(e) = db.load_font_file(path) {
        warn!("fonts: failed to load {}: {}", path.display(), e);
        return None;
    }
    db.faces()
        .skip(before)
        .find_map(|face| face.families.first().map(|(name, _)| name.clone()))
}

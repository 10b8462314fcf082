//! Local artwork lookup.
//!
//! Stage, boss, rule and mode images live in the image directory and are
//! found by their Japanese display name plus one of a few extensions.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use rand::seq::SliceRandom;
use sha2::{Digest, Sha256};

use ikabot_core::config::PathSettings;
use ikabot_core::schedule::{MatchMode, UNKNOWN};

const IMAGE_EXTS: [&str; 5] = ["webp", "png", "jpg", "jpeg", "gif"];
const WEAPON_EXTS: [&str; 5] = ["png", "webp", "jpg", "jpeg", "gif"];
const ICON_EXTS: [&str; 6] = ["png", "webp", "jpg", "jpeg", "gif", "svg"];
const NAMEPLATE_EXTS: [&str; 4] = ["png", "webp", "jpg", "jpeg"];

/// Weapon name upstream uses for random-weapon rotations.
pub const RANDOM_WEAPON: &str = "ランダム";

/// Hex characters of the SHA-256 digest kept in attachment names.
const NAME_HASH_LEN: usize = 32;

#[derive(Debug)]
pub struct Assets {
    image_dir: PathBuf,
    weapon_dir: PathBuf,
    nameplate_dir: PathBuf,
    brand_dir: PathBuf,
    nameplates: OnceLock<Vec<PathBuf>>,
}

impl Assets {
    pub fn new(
        image_dir: PathBuf,
        weapon_dir: PathBuf,
        nameplate_dir: PathBuf,
        brand_dir: PathBuf,
    ) -> Self {
        Self {
            image_dir,
            weapon_dir,
            nameplate_dir,
            brand_dir,
            nameplates: OnceLock::new(),
        }
    }

    pub fn from_settings(paths: &PathSettings) -> Self {
        Self::new(
            paths.resolve(&paths.image_dir),
            paths.resolve(&paths.weapon_dir),
            paths.resolve(&paths.nameplate_dir),
            paths.resolve(&paths.brand_dir),
        )
    }

    /// Stage, boss or icon image named `name`.
    pub fn image(&self, name: &str) -> Option<PathBuf> {
        find_named(&self.image_dir, name, &IMAGE_EXTS)
    }

    pub fn weapon(&self, name: &str) -> Option<PathBuf> {
        find_named(&self.weapon_dir, name, &WEAPON_EXTS)
    }

    /// Rule icon; SVG icons are accepted here.
    pub fn rule_icon(&self, rule: &str) -> Option<PathBuf> {
        find_named(&self.image_dir, rule, &ICON_EXTS)
    }

    pub fn mode_icon(&self, mode: MatchMode) -> Option<PathBuf> {
        self.image(mode.icon_name())
    }

    /// Directory of brand logos, `<brand name>.png`.
    pub fn brand_dir(&self) -> &Path {
        &self.brand_dir
    }

    /// Nameplate backgrounds for gear labels, listed once.
    pub fn nameplates(&self) -> &[PathBuf] {
        self.nameplates
            .get_or_init(|| list_with_exts(&self.nameplate_dir, &NAMEPLATE_EXTS))
    }

    pub fn random_nameplate(&self) -> Option<PathBuf> {
        self.nameplates().choose(&mut rand::thread_rng()).cloned()
    }
}

fn find_named(dir: &Path, name: &str, exts: &[&str]) -> Option<PathBuf> {
    if name.is_empty() || name == UNKNOWN {
        return None;
    }
    exts.iter()
        .map(|ext| dir.join(format!("{name}.{ext}")))
        .find(|path| path.is_file())
}

fn list_with_exts(dir: &Path, exts: &[&str]) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| exts.contains(&e.to_ascii_lowercase().as_str()))
        })
        .collect();
    paths.sort();
    paths
}

fn short_digest(bytes: &[u8]) -> String {
    let mut digest = hex::encode(Sha256::digest(bytes));
    digest.truncate(NAME_HASH_LEN);
    digest
}

/// `<prefix>_<hash of path><ext>` for a local file attachment.
pub fn attachment_name(path: &Path, prefix: &str) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    let digest = short_digest(path.to_string_lossy().as_bytes());
    format!("{prefix}_{digest}{ext}")
}

/// `<prefix>_<hash of bytes>.png` for a generated card.
pub fn card_name(prefix: &str, png: &[u8]) -> String {
    format!("{prefix}_{}.png", short_digest(png))
}

//! Platform-neutral message payloads.
//!
//! Builders turn upstream documents into [`Payload`]s: embeds plus the
//! files they reference. The Discord layer converts them to serenity
//! builders; tests inspect them directly.

use std::collections::HashSet;
use std::path::Path;

use tracing::warn;

use ikabot_core::schedule::DisplayZone;

use crate::api::ScheduleSource;
use crate::assets::{Assets, attachment_name, card_name};
use crate::render::Renderer;

pub mod event;
pub mod fest;
pub mod gear;
pub mod help;
pub mod salmon;
pub mod stages;
pub mod xrank;

/// User-facing reasons a command has nothing to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("データの取得に失敗しました。")]
    FetchFailed,
    #[error("ステージ情報がありません。")]
    NoStages,
    #[error("サーモンランの情報がありません。")]
    NoSalmon,
    #[error("バイトチームコンテストの予定がありません。")]
    NoTeamContest,
    #[error("イベントマッチの情報がありません。")]
    NoEvent,
    #[error("現在開催中のフェスはありません。")]
    NoCurrentFest,
    #[error("フェス情報がありません。")]
    NoFest,
    #[error("ゲソタウンの情報がありません。")]
    NoGear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// A file carried in the same payload
    Attachment(String),
    Url(String),
}

impl ImageRef {
    pub fn url(&self) -> String {
        match self {
            ImageRef::Attachment(name) => format!("attachment://{name}"),
            ImageRef::Url(url) => url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footer {
    pub text: String,
    pub icon: Option<ImageRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedSpec {
    pub title: String,
    pub color: u32,
    pub description: Option<String>,
    pub fields: Vec<Field>,
    pub thumbnail: Option<ImageRef>,
    pub image: Option<ImageRef>,
    pub footer: Option<Footer>,
}

impl EmbedSpec {
    pub fn new(title: impl Into<String>, color: u32) -> Self {
        Self {
            title: title.into(),
            color,
            description: None,
            fields: Vec::new(),
            thumbnail: None,
            image: None,
            footer: None,
        }
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(Field {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn thumbnail(mut self, image: Option<ImageRef>) -> Self {
        if image.is_some() {
            self.thumbnail = image;
        }
        self
    }

    pub fn image(mut self, image: Option<ImageRef>) -> Self {
        if image.is_some() {
            self.image = image;
        }
        self
    }

    pub fn footer(mut self, text: impl Into<String>, icon: Option<ImageRef>) -> Self {
        self.footer = Some(Footer {
            text: text.into(),
            icon,
        });
        self
    }

    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Embeds and the files they reference, sent as one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    pub embeds: Vec<EmbedSpec>,
    pub attachments: Vec<Attachment>,
}

impl Payload {
    pub fn attachment(&self, filename: &str) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.filename == filename)
    }

    /// Append `other`, skipping attachments already carried.
    pub fn merge(&mut self, other: Payload) {
        self.embeds.extend(other.embeds);
        for attachment in other.attachments {
            if self.attachment(&attachment.filename).is_none() {
                self.attachments.push(attachment);
            }
        }
    }
}

/// Collects attachments by filename while embeds are assembled.
#[derive(Debug, Default)]
pub struct PayloadBuilder {
    payload: Payload,
    names: HashSet<String>,
}

impl PayloadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a local file as `<prefix>_<hash><ext>`.
    ///
    /// An unreadable file is logged and leaves the embed without the image.
    pub async fn attach_file(&mut self, path: &Path, prefix: &str) -> Option<ImageRef> {
        let filename = attachment_name(path, prefix);
        if self.names.contains(&filename) {
            return Some(ImageRef::Attachment(filename));
        }
        match tokio::fs::read(path).await {
            Ok(bytes) => Some(self.attach_bytes(filename, bytes)),
            Err(err) => {
                warn!("payload: cannot attach {}: {err}", path.display());
                None
            }
        }
    }

    /// Attach a rendered card as `<prefix>_<hash>.png`.
    pub fn attach_card(&mut self, prefix: &str, png: Vec<u8>) -> ImageRef {
        self.attach_bytes(card_name(prefix, &png), png)
    }

    pub fn attach_bytes(&mut self, filename: String, bytes: Vec<u8>) -> ImageRef {
        if self.names.insert(filename.clone()) {
            self.payload.attachments.push(Attachment {
                filename: filename.clone(),
                bytes,
            });
        }
        ImageRef::Attachment(filename)
    }

    pub fn embed(&mut self, embed: EmbedSpec) {
        self.payload.embeds.push(embed);
    }

    pub fn build(self) -> Payload {
        self.payload
    }
}

/// What the builders need besides the upstream document.
#[derive(Clone, Copy)]
pub struct PayloadContext<'a> {
    pub source: &'a dyn ScheduleSource,
    pub assets: &'a Assets,
    pub renderer: &'a Renderer,
    pub zone: DisplayZone,
    pub xrank_top_n: usize,
}

/// `1. a\n2. b`
pub(crate) fn stage_lines(first: &str, second: &str) -> String {
    format!("1. {first}\n2. {second}")
}

/// `- a\n- b`
pub(crate) fn bullet_lines<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", item.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

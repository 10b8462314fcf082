use std::sync::Arc;

use serenity::builder::{
    CreateAttachment, CreateEmbed, CreateEmbedFooter, CreateInteractionResponse,
    CreateInteractionResponseFollowup, CreateInteractionResponseMessage, CreateMessage,
};
use serenity::http::Http;
use serenity::model::application::CommandInteraction;
use serenity::model::id::{ChannelId, MessageId};
use serenity::prelude::*;

use crate::notify::{MessageSink, SinkError};
use crate::payload::{EmbedSpec, Payload};

fn create_embed(source: &EmbedSpec) -> CreateEmbed {
    let mut embed = CreateEmbed::new().title(source.title.as_str()).color(source.color);
    if let Some(description) = &source.description {
        embed = embed.description(description.as_str());
    }
    for field in &source.fields {
        embed = embed.field(field.name.as_str(), field.value.as_str(), field.inline);
    }
    if let Some(thumbnail) = &source.thumbnail {
        embed = embed.thumbnail(thumbnail.url());
    }
    if let Some(image) = &source.image {
        embed = embed.image(image.url());
    }
    if let Some(footer) = &source.footer {
        let mut builder = CreateEmbedFooter::new(footer.text.as_str());
        if let Some(icon) = &footer.icon {
            builder = builder.icon_url(icon.url());
        }
        embed = embed.footer(builder);
    }
    embed
}

fn embeds(payload: &Payload) -> Vec<CreateEmbed> {
    payload.embeds.iter().map(create_embed).collect()
}

fn files(payload: &Payload) -> Vec<CreateAttachment> {
    payload
        .attachments
        .iter()
        .map(|file| CreateAttachment::bytes(file.bytes.clone(), file.filename.clone()))
        .collect()
}

pub(super) fn message(payload: &Payload) -> CreateMessage {
    CreateMessage::new()
        .embeds(embeds(payload))
        .add_files(files(payload))
}

/// Answer a command that has not been deferred.
pub(super) async fn respond(
    ctx: &Context,
    command: &CommandInteraction,
    payload: &Payload,
    ephemeral: bool,
) -> serenity::Result<()> {
    let message = CreateInteractionResponseMessage::new()
        .embeds(embeds(payload))
        .add_files(files(payload))
        .ephemeral(ephemeral);
    command
        .create_response(&ctx.http, CreateInteractionResponse::Message(message))
        .await
}

/// Plain ephemeral text as the initial response.
pub(super) async fn respond_text(
    ctx: &Context,
    command: &CommandInteraction,
    text: &str,
) -> serenity::Result<()> {
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(text)
                    .ephemeral(true),
            ),
        )
        .await
}

/// Follow-up to a deferred command.
pub(super) async fn followup(
    ctx: &Context,
    command: &CommandInteraction,
    payload: &Payload,
    ephemeral: bool,
) -> serenity::Result<()> {
    let message = CreateInteractionResponseFollowup::new()
        .embeds(embeds(payload))
        .add_files(files(payload))
        .ephemeral(ephemeral);
    command.create_followup(&ctx.http, message).await?;
    Ok(())
}

pub(super) async fn followup_text(
    ctx: &Context,
    command: &CommandInteraction,
    text: &str,
) -> serenity::Result<()> {
    let message = CreateInteractionResponseFollowup::new()
        .content(text)
        .ephemeral(true);
    command.create_followup(&ctx.http, message).await?;
    Ok(())
}

/// [`MessageSink`] backed by the Discord REST client.
pub struct HttpSink {
    http: Arc<Http>,
}

impl HttpSink {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait::async_trait]
impl MessageSink for HttpSink {
    async fn send(&self, channel_id: u64, payload: &Payload) -> Result<u64, SinkError> {
        let sent = ChannelId::new(channel_id)
            .send_message(&self.http, message(payload))
            .await
            .map_err(|e| SinkError::Discord(e.to_string()))?;
        Ok(sent.id.get())
    }

    async fn delete(&self, channel_id: u64, message_id: u64) -> Result<(), SinkError> {
        ChannelId::new(channel_id)
            .delete_message(&self.http, MessageId::new(message_id))
            .await
            .map_err(|e| SinkError::Discord(e.to_string()))
    }
}

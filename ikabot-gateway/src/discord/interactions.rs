use chrono::Utc;
use serenity::model::application::{CommandInteraction, Interaction};
use serenity::prelude::*;
use tracing::{info, warn};

use ikabot_core::Feature;

use crate::commands::BotCommand;
use crate::payload::{self, Payload, PayloadError};

use super::bot::Bot;
use super::send::{followup, followup_text, respond, respond_text};

/// Extend `Bot` with the `interaction_create` handler.
///
/// Serenity requires a single `EventHandler` impl, so this file provides
/// the body as a method on `Bot` that `bot.rs` delegates to.
impl Bot {
    pub(super) async fn handle_interaction(&self, ctx: Context, interaction: Interaction) {
        let Some(command) = interaction.as_command() else {
            return;
        };
        let name = command.data.name.as_str();
        let Some(bot_command) = BotCommand::parse(name) else {
            warn!("Unknown slash command /{name}");
            return;
        };

        info!("Slash command /{name} from {}", command.user.name);
        if let Err(e) = self.run_command(&ctx, command, bot_command).await {
            warn!("Failed to answer /{name}: {e}");
        }
    }

    async fn run_command(
        &self,
        ctx: &Context,
        command: &CommandInteraction,
        bot_command: BotCommand,
    ) -> serenity::Result<()> {
        let cx = self.state.payload_context();
        match bot_command {
            BotCommand::Now => reply(ctx, command, payload::stages::at_index(&cx, 0).await).await,
            BotCommand::Next => reply(ctx, command, payload::stages::at_index(&cx, 1).await).await,
            BotCommand::Salmon => reply(ctx, command, payload::salmon::current_salmon(&cx).await).await,
            BotCommand::TeamContest => {
                reply(ctx, command, payload::salmon::team_contest(&cx).await).await
            }
            BotCommand::Event => reply(ctx, command, payload::event::current(&cx, Utc::now()).await).await,
            BotCommand::Fest => reply(ctx, command, payload::fest::current(&cx, Utc::now()).await).await,
            BotCommand::MonthlyGear => {
                reply(ctx, command, payload::gear::current_monthly(&cx).await).await
            }
            BotCommand::XRank => reply(ctx, command, payload::xrank::current(&cx).await).await,
            BotCommand::Help => respond(ctx, command, &payload::help::build(), true).await,

            BotCommand::AllNext => {
                command.defer_ephemeral(&ctx.http).await?;
                reply_all(ctx, command, payload::stages::all(&cx).await).await
            }
            BotCommand::AllSalmon => {
                command.defer_ephemeral(&ctx.http).await?;
                reply_all(ctx, command, payload::salmon::all_salmon(&cx).await).await
            }
            BotCommand::AllEvent => {
                command.defer_ephemeral(&ctx.http).await?;
                reply_all(ctx, command, payload::event::all(&cx).await).await
            }
            BotCommand::AllFest => {
                command.defer_ephemeral(&ctx.http).await?;
                reply_all(ctx, command, payload::fest::all(&cx).await).await
            }

            // Collages take a while to render.
            BotCommand::Gear => {
                command.defer(&ctx.http).await?;
                match payload::gear::gesotown(&cx).await {
                    Ok(payload) => followup(ctx, command, &payload, false).await,
                    Err(e) => followup_text(ctx, command, &e.to_string()).await,
                }
            }

            BotCommand::NotifyHere(feature) => self.set_notify_channel(ctx, command, feature).await,
        }
    }

    async fn set_notify_channel(
        &self,
        ctx: &Context,
        command: &CommandInteraction,
        feature: Feature,
    ) -> serenity::Result<()> {
        let channel_id = command.channel_id.get();
        let saved = self
            .state
            .store
            .update(|state| state.entry(feature).channel_id = Some(channel_id))
            .await;

        let reply = match saved {
            Ok(()) => {
                info!(
                    "{} notifications routed to channel {channel_id}",
                    feature.as_str()
                );
                format!(
                    "このチャンネルを{}自動通知の送信先に設定しました。",
                    feature.label()
                )
            }
            Err(e) => {
                warn!("Failed to save {} channel: {e}", feature.as_str());
                "送信先の保存に失敗しました。".to_string()
            }
        };
        respond_text(ctx, command, &reply).await
    }
}

async fn reply(
    ctx: &Context,
    command: &CommandInteraction,
    result: Result<Payload, PayloadError>,
) -> serenity::Result<()> {
    match result {
        Ok(payload) => respond(ctx, command, &payload, false).await,
        Err(e) => respond_text(ctx, command, &e.to_string()).await,
    }
}

/// One ephemeral follow-up per rotation of a deferred "all" command.
async fn reply_all(
    ctx: &Context,
    command: &CommandInteraction,
    result: Result<Vec<Payload>, PayloadError>,
) -> serenity::Result<()> {
    let payloads = match result {
        Ok(payloads) => payloads,
        Err(e) => return followup_text(ctx, command, &e.to_string()).await,
    };
    for payload in payloads.iter().filter(|p| !p.embeds.is_empty()) {
        followup(ctx, command, payload, true).await?;
    }
    Ok(())
}

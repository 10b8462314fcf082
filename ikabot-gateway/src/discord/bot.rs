use std::sync::Arc;

use serenity::async_trait;
use serenity::builder::CreateCommand;
use serenity::gateway::ActivityData;
use serenity::model::application::{Command, Interaction};
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use tracing::{error, info, warn};

use crate::commands::BotCommand;
use crate::notify::{Notifier, start_notify_runners};
use crate::payload;
use crate::state::AppState;

use super::send::{HttpSink, message};

/// Discord bot handler
///
/// Commands are answered from the payload builders; background
/// notifications are started once the gateway session is ready.
pub struct Bot {
    pub(super) state: Arc<AppState>,
}

impl Bot {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// `/now` and `/next` typed as plain messages.
    async fn handle_text_command(&self, ctx: &Context, msg: &Message, command: BotCommand) {
        let index = match command {
            BotCommand::Next => 1,
            _ => 0,
        };
        info!("Text command /{} from {}", command.name(), msg.author.name);

        let cx = self.state.payload_context();
        let sent = match payload::stages::at_index(&cx, index).await {
            Ok(payload) => msg
                .channel_id
                .send_message(&ctx.http, message(&payload))
                .await
                .map(|_| ()),
            Err(e) => msg.channel_id.say(&ctx.http, e.to_string()).await.map(|_| ()),
        };
        if let Err(e) = sent {
            warn!("Failed to answer text command /{}: {e}", command.name());
        }
    }

    async fn register_commands(&self, ctx: &Context) {
        if !self.state.claim_command_registration() {
            return;
        }
        let commands: Vec<CreateCommand> = BotCommand::all()
            .map(|command| CreateCommand::new(command.name()).description(command.description()))
            .collect();

        match Command::set_global_commands(&ctx.http, commands).await {
            Ok(registered) => info!("Registered {} slash commands", registered.len()),
            Err(e) => {
                error!("Failed to register slash commands: {}", e);
                self.state.release_command_registration();
            }
        }
    }
}

#[async_trait]
impl EventHandler for Bot {
    async fn message(&self, ctx: Context, msg: Message) {
        // Ignore messages from bots (including ourselves)
        if msg.author.bot {
            return;
        }
        if let Some(command) = BotCommand::parse_text(&msg.content) {
            self.handle_text_command(&ctx, &msg, command).await;
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        self.handle_interaction(ctx, interaction).await;
    }

    /// Bot is ready: register slash commands and start the notifiers
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("Discord bot connected as {}", ready.user.name);

        ctx.set_activity(Some(ActivityData::playing(
            self.state.notify_env.activity_name.clone(),
        )));
        self.register_commands(&ctx).await;

        if self.state.claim_runner_start() {
            let sink = Arc::new(HttpSink::new(Arc::clone(&ctx.http)));
            let notifier = Arc::new(Notifier::new(Arc::clone(&self.state), sink));
            start_notify_runners(notifier);
        }
    }
}

pub mod commands;
pub mod interaction;
pub mod message;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use serenity::{
    async_trait,
    client::{Context, EventHandler},
    model::{
        application::{Command, Interaction},
        channel::Message,
        gateway::Ready,
        id::{ChannelId as DiscordChannelId, GuildId as DiscordGuildId},
        user::User,
    },
};

use shelf_core::{
    domain::{ChannelId, GuildId, UserId},
    messaging::types::{Invoker, Origin},
};

use crate::router::AppState;

pub struct Handler {
    state: Arc<AppState>,
    sweeps_started: AtomicBool,
}

impl Handler {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            state,
            sweeps_started: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        tracing::info!("logged in as {}", ready.user.tag());

        match Command::set_global_commands(&ctx.http, commands::definitions()).await {
            Ok(registered) => tracing::info!(count = registered.len(), "slash commands registered"),
            Err(e) => tracing::error!(error = ?e, "error registering slash commands"),
        }

        // `ready` fires again after a reconnect; the scheduler starts once.
        if !self.sweeps_started.swap(true, Ordering::SeqCst) {
            self.state.scheduler.start().await;
        }
    }

    async fn interaction_create(&self, ctx: Context, event: Interaction) {
        match &event {
            Interaction::Command(cmd) => {
                interaction::handle_command(&ctx, &self.state, cmd).await
            }
            Interaction::Autocomplete(cmd) => {
                interaction::handle_autocomplete(&ctx, &self.state, cmd).await
            }
            Interaction::Component(component) => {
                interaction::handle_component(&ctx, &self.state, component).await
            }
            _ => {}
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        message::handle_message(&ctx, &self.state, &msg).await;
    }
}

pub(crate) fn invoker(user: &User, role_names: Option<Vec<String>>) -> Invoker {
    Invoker {
        user_id: UserId(user.id.get().to_string()),
        username: user.name.clone(),
        tag: user.tag(),
        role_names,
        is_bot: user.bot,
    }
}

/// Channel names are only known for guild channels.
pub(crate) async fn origin(
    ctx: &Context,
    guild_id: Option<DiscordGuildId>,
    channel_id: DiscordChannelId,
) -> Origin {
    let channel_name = match guild_id {
        Some(_) => match channel_id.to_channel(ctx).await {
            Ok(channel) => channel.guild().map(|c| c.name),
            Err(e) => {
                tracing::warn!(channel = %channel_id, error = ?e, "could not resolve channel");
                None
            }
        },
        None => None,
    };

    Origin {
        guild_id: guild_id.map(|g| GuildId(g.get().to_string())),
        channel_id: ChannelId(channel_id.get().to_string()),
        channel_name,
    }
}

//! Slash commands, autocomplete and button presses.
//!
//! Replies are deferred first: the door service may take several seconds and
//! an interaction has to be acknowledged within three.

use chrono::Local;
use serenity::{
    builder::{
        CreateAutocompleteResponse, CreateInteractionResponse, CreateInteractionResponseFollowup,
        CreateInteractionResponseMessage, EditInteractionResponse,
    },
    client::Context,
    model::{
        application::{CommandInteraction, ComponentInteraction, ResolvedValue},
        guild::Member,
        id::GuildId as DiscordGuildId,
        user::User,
    },
};

use shelf_core::{
    dispatch::Outcome,
    messaging::types::{
        AutocompleteQuery, ButtonPress, Choice, CommandArgs, IncomingEvent, OutgoingMessage,
        SlashCommand,
    },
};

use super::{commands, invoker, origin};
use crate::{button_rows, fetch_attachments, router::AppState};

pub async fn handle_command(ctx: &Context, state: &AppState, cmd: &CommandInteraction) {
    let pending = Pending::Command(cmd);
    pending.defer(ctx).await;

    let roles = member_roles(ctx, cmd.guild_id, cmd.member.as_deref()).await;
    let event = IncomingEvent::Command(SlashCommand {
        invoker: invoker(&cmd.user, roles),
        origin: origin(ctx, cmd.guild_id, cmd.channel_id).await,
        name: cmd.data.name.clone(),
        args: command_args(cmd),
    });

    let outcome = state
        .dispatcher
        .handle(event, Local::now().date_naive())
        .await;
    pending.finish(ctx, outcome).await;
}

pub async fn handle_autocomplete(ctx: &Context, state: &AppState, cmd: &CommandInteraction) {
    let Some(focused) = cmd.data.autocomplete() else {
        return;
    };
    let query = AutocompleteQuery {
        origin: origin(ctx, cmd.guild_id, cmd.channel_id).await,
        command: cmd.data.name.clone(),
        focused: focused.value.to_string(),
    };

    let Outcome::Choices(choices) = state
        .dispatcher
        .handle(IncomingEvent::Autocomplete(query), Local::now().date_naive())
        .await
    else {
        return;
    };

    let response = CreateInteractionResponse::Autocomplete(autocomplete_response(choices));
    if let Err(e) = cmd.create_response(&ctx.http, response).await {
        tracing::warn!(error = ?e, "autocomplete response failed");
    }
}

pub async fn handle_component(ctx: &Context, state: &AppState, component: &ComponentInteraction) {
    let pending = Pending::Component(component);
    pending.defer(ctx).await;

    let roles = member_roles(ctx, component.guild_id, component.member.as_ref()).await;
    let event = IncomingEvent::Button(ButtonPress {
        invoker: invoker(&component.user, roles),
        origin: origin(ctx, component.guild_id, component.channel_id).await,
        custom_id: component.data.custom_id.clone(),
    });

    let outcome = state
        .dispatcher
        .handle(event, Local::now().date_naive())
        .await;
    pending.finish(ctx, outcome).await;
}

fn autocomplete_response(choices: Vec<Choice>) -> CreateAutocompleteResponse {
    choices
        .into_iter()
        .fold(CreateAutocompleteResponse::new(), |resp, c| {
            resp.add_string_choice(c.name, c.value)
        })
}

fn command_args(cmd: &CommandInteraction) -> CommandArgs {
    let mut args = CommandArgs::default();
    for opt in cmd.data.options() {
        match (opt.name, opt.value) {
            (commands::TITLE_OPTION, ResolvedValue::String(s)) => args.title = Some(s.to_string()),
            (commands::DAYS_OPTION, ResolvedValue::Integer(n)) => args.days = Some(n),
            (commands::IMAGE_OPTION, ResolvedValue::Attachment(a)) => {
                args.image_url = Some(a.url.clone())
            }
            _ => {}
        }
    }
    args
}

/// Role names of the member, or `None` outside a guild / when roles cannot be resolved.
async fn member_roles(
    ctx: &Context,
    guild_id: Option<DiscordGuildId>,
    member: Option<&Member>,
) -> Option<Vec<String>> {
    let (guild_id, member) = (guild_id?, member?);

    let cached = ctx.cache.guild(guild_id).map(|guild| {
        member
            .roles
            .iter()
            .filter_map(|id| guild.roles.get(id).map(|r| r.name.clone()))
            .collect::<Vec<_>>()
    });
    if let Some(names) = cached {
        return Some(names);
    }

    match guild_id.roles(&ctx.http).await {
        Ok(all) => Some(
            member
                .roles
                .iter()
                .filter_map(|id| all.get(id).map(|r| r.name.clone()))
                .collect(),
        ),
        Err(e) => {
            tracing::warn!(guild = %guild_id, error = ?e, "could not fetch guild roles");
            None
        }
    }
}

/// The interaction being answered; both kinds share the defer/edit/follow-up flow.
enum Pending<'a> {
    Command(&'a CommandInteraction),
    Component(&'a ComponentInteraction),
}

impl Pending<'_> {
    fn user(&self) -> &User {
        match self {
            Pending::Command(c) => &c.user,
            Pending::Component(c) => &c.user,
        }
    }

    /// Deferred channel message: the final reply is a new message, also for buttons.
    async fn defer(&self, ctx: &Context) {
        let response = CreateInteractionResponse::Defer(CreateInteractionResponseMessage::new());
        let res = match self {
            Pending::Command(c) => c.create_response(&ctx.http, response).await,
            Pending::Component(c) => c.create_response(&ctx.http, response).await,
        };
        if let Err(e) = res {
            tracing::debug!(user = %self.user().name, error = ?e, "defer failed (already acknowledged?)");
        }
    }

    async fn finish(&self, ctx: &Context, outcome: Outcome) {
        match outcome {
            Outcome::Reply(msg) if msg.ephemeral => self.follow_up_ephemeral(ctx, msg).await,
            Outcome::Reply(msg) => self.edit(ctx, msg).await,
            Outcome::Choices(_) | Outcome::Ignore => self.delete(ctx).await,
        }
    }

    async fn edit(&self, ctx: &Context, msg: OutgoingMessage) {
        let mut builder = EditInteractionResponse::new()
            .content(msg.content)
            .components(button_rows(&msg.buttons));
        match fetch_attachments(&ctx.http, &msg.attachment_urls).await {
            Ok(files) => {
                for f in files {
                    builder = builder.new_attachment(f);
                }
            }
            Err(e) => tracing::warn!("sending reply without image: {e}"),
        }

        let res = match self {
            Pending::Command(c) => c.edit_response(&ctx.http, builder).await.map(|_| ()),
            Pending::Component(c) => c.edit_response(&ctx.http, builder).await.map(|_| ()),
        };
        if let Err(e) = res {
            tracing::error!(user = %self.user().name, error = ?e, "edit_response failed");
        }
    }

    /// A deferred public reply cannot turn ephemeral: drop it and follow up privately.
    async fn follow_up_ephemeral(&self, ctx: &Context, msg: OutgoingMessage) {
        self.delete(ctx).await;

        let builder = CreateInteractionResponseFollowup::new()
            .content(msg.content)
            .ephemeral(true);
        let res = match self {
            Pending::Command(c) => c.create_followup(&ctx.http, builder).await.map(|_| ()),
            Pending::Component(c) => c.create_followup(&ctx.http, builder).await.map(|_| ()),
        };
        if let Err(e) = res {
            tracing::error!(user = %self.user().name, error = ?e, "ephemeral follow-up failed");
        }
    }

    async fn delete(&self, ctx: &Context) {
        let res = match self {
            Pending::Command(c) => c.delete_response(&ctx.http).await,
            Pending::Component(c) => c.delete_response(&ctx.http).await,
        };
        if let Err(e) = res {
            tracing::debug!(error = ?e, "delete_response failed");
        }
    }
}

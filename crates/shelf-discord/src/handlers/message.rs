use chrono::Local;
use serenity::{builder::CreateMessage, client::Context, model::channel::Message};

use shelf_core::{
    dispatch::Outcome,
    messaging::types::{IncomingEvent, TextMessage},
};

use super::{invoker, origin};
use crate::{button_rows, fetch_attachments, router::AppState};

/// `!ping` / `!book` text commands; every other message is ignored.
pub async fn handle_message(ctx: &Context, state: &AppState, msg: &Message) {
    if msg.author.bot {
        return;
    }
    if !msg.content.starts_with('!') {
        return;
    }

    let event = IncomingEvent::Text(TextMessage {
        invoker: invoker(&msg.author, None),
        origin: origin(ctx, msg.guild_id, msg.channel_id).await,
        content: msg.content.clone(),
        attachment_urls: msg.attachments.iter().map(|a| a.url.clone()).collect(),
    });

    let Outcome::Reply(reply) = state
        .dispatcher
        .handle(event, Local::now().date_naive())
        .await
    else {
        return;
    };

    let mut builder = CreateMessage::new()
        .content(reply.content)
        .components(button_rows(&reply.buttons))
        .reference_message(msg);
    match fetch_attachments(&ctx.http, &reply.attachment_urls).await {
        Ok(files) => {
            for f in files {
                builder = builder.add_file(f);
            }
        }
        Err(e) => tracing::warn!("sending reply without image: {e}"),
    }

    if let Err(e) = msg.channel_id.send_message(&ctx.http, builder).await {
        tracing::error!(channel = %msg.channel_id, error = ?e, "legacy reply failed");
    }
}

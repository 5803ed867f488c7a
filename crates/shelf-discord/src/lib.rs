//! Discord adapter (serenity).
//!
//! This crate implements the `shelf-core` MessagingPort over the Discord API
//! and turns gateway events into core `IncomingEvent`s.

use std::sync::Arc;

use async_trait::async_trait;

use serenity::{
    builder::{CreateActionRow, CreateAttachment, CreateButton, CreateMessage},
    http::Http,
    model::application::ButtonStyle as DiscordButtonStyle,
};

pub mod handlers;
pub mod router;

use shelf_core::{
    domain::ChannelId,
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{Button, ButtonStyle, OutgoingMessage},
    },
    Result,
};

#[derive(Clone)]
pub struct DiscordMessenger {
    http: Arc<Http>,
}

impl DiscordMessenger {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    fn map_err(e: serenity::Error) -> Error {
        Error::Platform(format!("discord error: {e}"))
    }
}

#[async_trait]
impl MessagingPort for DiscordMessenger {
    async fn send_message(&self, channel: &ChannelId, msg: OutgoingMessage) -> Result<()> {
        let channel_id = discord_channel(channel)?;

        let mut builder = CreateMessage::new()
            .content(msg.content)
            .components(button_rows(&msg.buttons));
        for att in fetch_attachments(&self.http, &msg.attachment_urls).await? {
            builder = builder.add_file(att);
        }

        channel_id
            .send_message(&*self.http, builder)
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }
}

/// Stored channel ids are decimal snowflakes; anything else cannot be addressed.
pub fn discord_channel(channel: &ChannelId) -> Result<serenity::model::id::ChannelId> {
    match channel.0.trim().parse::<u64>() {
        Ok(id) if id != 0 => Ok(serenity::model::id::ChannelId::new(id)),
        _ => Err(Error::Platform(format!("invalid channel id: {:?}", channel.0))),
    }
}

pub(crate) fn button_style(style: ButtonStyle) -> DiscordButtonStyle {
    match style {
        ButtonStyle::Primary => DiscordButtonStyle::Primary,
        ButtonStyle::Secondary => DiscordButtonStyle::Secondary,
    }
}

/// All buttons go into one action row (none when there are no buttons).
pub(crate) fn button_rows(buttons: &[Button]) -> Vec<CreateActionRow> {
    if buttons.is_empty() {
        return Vec::new();
    }
    let row = buttons
        .iter()
        .map(|b| {
            CreateButton::new(b.custom_id.clone())
                .label(b.label.clone())
                .style(button_style(b.style))
        })
        .collect();
    vec![CreateActionRow::Buttons(row)]
}

/// Re-upload remote images (Discord CDN links) as message files.
pub(crate) async fn fetch_attachments(http: &Http, urls: &[String]) -> Result<Vec<CreateAttachment>> {
    let mut out = Vec::with_capacity(urls.len());
    for url in urls {
        let att = CreateAttachment::url(http, url)
            .await
            .map_err(|e| Error::Platform(format!("attachment fetch failed ({url}): {e}")))?;
        out.push(att);
    }
    Ok(out)
}

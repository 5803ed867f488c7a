use crate::domain::{ChannelId, GuildId, UserId};

/// Platform-agnostic inbound event, built by the adapter.
#[derive(Clone, Debug)]
pub enum IncomingEvent {
    Command(SlashCommand),
    Autocomplete(AutocompleteQuery),
    Button(ButtonPress),
    Text(TextMessage),
}

/// Who triggered an event.
#[derive(Clone, Debug)]
pub struct Invoker {
    pub user_id: UserId,
    pub username: String,
    /// `name#discriminator` or the plain name, for logs.
    pub tag: String,
    /// Role names when the event came from a guild member; `None` otherwise.
    pub role_names: Option<Vec<String>>,
    pub is_bot: bool,
}

/// Where an event happened.
#[derive(Clone, Debug)]
pub struct Origin {
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    /// Channel name when it is a named guild channel.
    pub channel_name: Option<String>,
}

impl Origin {
    pub fn in_guild(&self) -> bool {
        self.guild_id.is_some()
    }
}

/// Argument values of a slash command, already resolved by the adapter.
#[derive(Clone, Debug, Default)]
pub struct CommandArgs {
    pub title: Option<String>,
    pub days: Option<i64>,
    /// URL of the attached image option.
    pub image_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct SlashCommand {
    pub invoker: Invoker,
    pub origin: Origin,
    pub name: String,
    pub args: CommandArgs,
}

#[derive(Clone, Debug)]
pub struct AutocompleteQuery {
    pub origin: Origin,
    pub command: String,
    pub focused: String,
}

#[derive(Clone, Debug)]
pub struct ButtonPress {
    pub invoker: Invoker,
    pub origin: Origin,
    pub custom_id: String,
}

#[derive(Clone, Debug)]
pub struct TextMessage {
    pub invoker: Invoker,
    pub origin: Origin,
    pub content: String,
    /// URLs of attachments, in message order.
    pub attachment_urls: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonStyle {
    Primary,
    Secondary,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Button {
    pub custom_id: String,
    pub label: String,
    pub style: ButtonStyle,
}

/// A message (or interaction reply) to render on the platform.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub content: String,
    pub attachment_urls: Vec<String>,
    /// Rendered as one action row.
    pub buttons: Vec<Button>,
    /// Only visible to the invoker (interaction replies only).
    pub ephemeral: bool,
}

impl OutgoingMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: true,
            ..Self::default()
        }
    }

    pub fn with_attachment(mut self, url: impl Into<String>) -> Self {
        self.attachment_urls.push(url.into());
        self
    }

    pub fn with_buttons(mut self, buttons: Vec<Button>) -> Self {
        self.buttons = buttons;
        self
    }
}

/// Autocomplete choice (name shown, value submitted).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Choice {
    pub name: String,
    pub value: String,
}

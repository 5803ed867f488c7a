//! Routes platform events to the library, door and health-check handlers.
//!
//! The dispatcher never talks to the platform itself: it returns an `Outcome`
//! that the adapter renders (reply, autocomplete answer, or nothing).

use std::sync::Arc;

use chrono::{Days, NaiveDate};

use crate::{
    config::Config,
    domain::BorrowRecord,
    door::{door_buttons, DoorAction, DoorRelay},
    legacy::{self, LegacyCommand},
    messaging::types::{
        AutocompleteQuery, ButtonPress, Choice, IncomingEvent, Invoker, OutgoingMessage, Origin,
        SlashCommand, TextMessage,
    },
    security::{check_roles, in_named_channel, RoleCheck},
    store::BorrowStore,
    suggest::SuggestionCatalog,
};

pub const PING_COMMAND: &str = "ping";
pub const BOOK_COMMAND: &str = "book";
pub const MIN_BORROW_DAYS: i64 = 1;
pub const MAX_BORROW_DAYS: i64 = 30;

const BOOK_ERROR: &str = "An error occurred while processing the book command.";
const LEGACY_BOOK_USAGE: &str = "Please use the correct format: !book \"name of the book\" numberOfDays and attach an image of the book, or try the /book slash command with autocomplete!";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Reply(OutgoingMessage),
    Choices(Vec<Choice>),
    Ignore,
}

pub struct Dispatcher {
    cfg: Arc<Config>,
    store: Arc<BorrowStore>,
    relay: Arc<dyn DoorRelay>,
    catalog: SuggestionCatalog,
}

/// Validated input for recording a loan.
struct Loan<'a> {
    invoker: &'a Invoker,
    origin: &'a Origin,
    title: String,
    days: u64,
    image_url: String,
}

impl Dispatcher {
    pub fn new(cfg: Arc<Config>, store: Arc<BorrowStore>, relay: Arc<dyn DoorRelay>) -> Self {
        let catalog = SuggestionCatalog::new(cfg.book_suggestions.clone());
        Self {
            cfg,
            store,
            relay,
            catalog,
        }
    }

    pub fn store(&self) -> &Arc<BorrowStore> {
        &self.store
    }

    pub async fn handle(&self, event: IncomingEvent, today: NaiveDate) -> Outcome {
        match event {
            IncomingEvent::Command(cmd) => self.handle_command(cmd, today).await,
            IncomingEvent::Autocomplete(q) => match self.autocomplete(&q) {
                Some(choices) => Outcome::Choices(choices),
                None => Outcome::Ignore,
            },
            IncomingEvent::Button(press) => self.handle_button(press).await,
            IncomingEvent::Text(msg) => match self.handle_text(&msg, today).await {
                Some(reply) => Outcome::Reply(reply),
                None => Outcome::Ignore,
            },
        }
    }

    async fn handle_command(&self, cmd: SlashCommand, today: NaiveDate) -> Outcome {
        if cmd.name == PING_COMMAND {
            return Outcome::Reply(ping());
        }
        if cmd.name == BOOK_COMMAND {
            return Outcome::Reply(self.borrow(&cmd, today).await);
        }
        match DoorAction::from_command_name(&cmd.name) {
            Some(action) => Outcome::Reply(self.door(action, &cmd.invoker, &cmd.origin).await),
            None => Outcome::Ignore,
        }
    }

    async fn handle_button(&self, press: ButtonPress) -> Outcome {
        match DoorAction::from_button_id(&press.custom_id) {
            Some(action) => Outcome::Reply(self.door(action, &press.invoker, &press.origin).await),
            None => Outcome::Ignore,
        }
    }

    // ============== Library ==============

    /// `/book title days image`
    pub async fn borrow(&self, cmd: &SlashCommand, today: NaiveDate) -> OutgoingMessage {
        if !in_named_channel(&cmd.origin, &self.cfg.borrow_channel) {
            return OutgoingMessage::text(format!(
                "The /book command can only be used in the #{} channel.",
                self.cfg.borrow_channel
            ));
        }

        let title = cmd
            .args
            .title
            .as_deref()
            .filter(|t| !t.trim().is_empty());
        let (Some(title), Some(days)) = (title, cmd.args.days) else {
            return OutgoingMessage::text("Please provide both a book title and number of days!");
        };
        let Some(image_url) = cmd.args.image_url.clone() else {
            return OutgoingMessage::text("Please provide a book image!");
        };
        if !(MIN_BORROW_DAYS..=MAX_BORROW_DAYS).contains(&days) {
            return OutgoingMessage::text(format!(
                "Please choose between {MIN_BORROW_DAYS} and {MAX_BORROW_DAYS} days."
            ));
        }

        self.record_loan(
            Loan {
                invoker: &cmd.invoker,
                origin: &cmd.origin,
                title: title.to_string(),
                days: days as u64,
                image_url,
            },
            today,
        )
        .await
    }

    /// Suggestions for `/book title:`; `None` means "do not answer".
    pub fn autocomplete(&self, q: &AutocompleteQuery) -> Option<Vec<Choice>> {
        if !in_named_channel(&q.origin, &self.cfg.borrow_channel) {
            return None;
        }
        if q.command != BOOK_COMMAND {
            return None;
        }
        Some(self.catalog.filter(&q.focused))
    }

    /// `!ping` / `!book "<title>" <days>`; `None` means "stay silent".
    pub async fn handle_text(&self, msg: &TextMessage, today: NaiveDate) -> Option<OutgoingMessage> {
        if msg.invoker.is_bot {
            return None;
        }

        match legacy::parse(&msg.content)? {
            LegacyCommand::Ping => Some(ping()),
            _ if !in_named_channel(&msg.origin, &self.cfg.borrow_channel) => {
                Some(OutgoingMessage::text(format!(
                    "The `!book` command can only be used in the #{} channel.",
                    self.cfg.borrow_channel
                )))
            }
            LegacyCommand::MalformedBook => Some(OutgoingMessage::text(LEGACY_BOOK_USAGE)),
            LegacyCommand::Book { title, days } => {
                let Some(image_url) = msg.attachment_urls.first().cloned() else {
                    return Some(OutgoingMessage::text("Please attach an image of the book!"));
                };
                let loan = Loan {
                    invoker: &msg.invoker,
                    origin: &msg.origin,
                    title,
                    days: u64::from(days),
                    image_url,
                };
                Some(self.record_loan(loan, today).await)
            }
        }
    }

    async fn record_loan(&self, loan: Loan<'_>, today: NaiveDate) -> OutgoingMessage {
        let Some(due_date) = today.checked_add_days(Days::new(loan.days)) else {
            tracing::error!(days = loan.days, "due date out of range");
            return OutgoingMessage::ephemeral(BOOK_ERROR);
        };

        let record = BorrowRecord {
            user_id: loan.invoker.user_id.0.clone(),
            username: loan.invoker.username.clone(),
            book_title: loan.title.clone(),
            borrow_date: today,
            due_date,
            channel_id: loan.origin.channel_id.0.clone(),
            guild_id: loan
                .origin
                .guild_id
                .as_ref()
                .map(|g| g.0.clone())
                .unwrap_or_default(),
            image_url: loan.image_url.clone(),
        };
        self.store.append(record).await;

        tracing::info!(
            user = %loan.invoker.tag,
            title = %loan.title,
            due = %due_date,
            "borrowing recorded"
        );

        OutgoingMessage::text(format!(
            "📚 Your borrowing of \"{}\" has been recorded. You will be notified on {} when it is due to be returned.",
            loan.title, due_date
        ))
        .with_attachment(loan.image_url)
    }

    // ============== Door ==============

    /// Shared flow for `/opendoor`, `/lockdoor` and the door buttons.
    pub async fn door(
        &self,
        action: DoorAction,
        invoker: &Invoker,
        origin: &Origin,
    ) -> OutgoingMessage {
        if !in_named_channel(origin, &self.cfg.door_channel) {
            return OutgoingMessage::text(format!(
                "This action can only be performed in the #{} channel.",
                self.cfg.door_channel
            ));
        }

        match check_roles(invoker, &self.cfg.door_allowed_roles) {
            RoleCheck::Allowed => {}
            RoleCheck::Unknown => {
                return OutgoingMessage::text("Could not determine your roles.");
            }
            RoleCheck::Denied => {
                return OutgoingMessage::text(format!(
                    "You do not have the required role to {} the door.",
                    action.verb()
                ));
            }
        }

        tracing::info!(
            user = %invoker.tag,
            channel = %origin.channel_name.as_deref().unwrap_or_default(),
            "door {} initiated",
            action.gerund()
        );

        match self.relay.trigger(action).await {
            Ok(outcome) if outcome.is_success() => {
                tracing::info!("door {} request sent successfully", action.gerund());
                OutgoingMessage::text(format!(
                    "Door {} request sent successfully by {}. ✅",
                    action.gerund(),
                    invoker.username
                ))
                .with_buttons(door_buttons())
            }
            Ok(outcome) => {
                tracing::error!(
                    status = outcome.status,
                    "door {} request failed",
                    action.gerund()
                );
                OutgoingMessage::text(format!(
                    "Failed to send door {} request (status: {}). Please try again or contact an admin.",
                    action.gerund(),
                    outcome.status
                ))
            }
            Err(e) => {
                tracing::error!("error handling {} interaction: {e}", action.command_name());
                OutgoingMessage::ephemeral(format!(
                    "An error occurred while processing the {} door command.",
                    action.verb()
                ))
            }
        }
    }
}

pub fn ping() -> OutgoingMessage {
    OutgoingMessage::text("Pong!")
}

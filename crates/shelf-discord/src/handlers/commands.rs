use serenity::{
    builder::{CreateCommand, CreateCommandOption},
    model::application::CommandOptionType,
};

use shelf_core::{
    dispatch::{BOOK_COMMAND, MAX_BORROW_DAYS, MIN_BORROW_DAYS, PING_COMMAND},
    door::DoorAction,
};

/// Option names of `/book`.
pub const TITLE_OPTION: &str = "title";
pub const DAYS_OPTION: &str = "days";
pub const IMAGE_OPTION: &str = "image";

/// Application commands registered globally on ready.
pub fn definitions() -> Vec<CreateCommand> {
    let mut out = vec![
        CreateCommand::new(PING_COMMAND).description("Replies with Pong!"),
        book(),
    ];
    for action in DoorAction::ALL {
        out.push(CreateCommand::new(action.command_name()).description(action.description()));
    }
    out
}

fn book() -> CreateCommand {
    CreateCommand::new(BOOK_COMMAND)
        .description("Record a book borrowing")
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::String,
                TITLE_OPTION,
                "The title of the book",
            )
            .required(true)
            .set_autocomplete(true),
        )
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::Integer,
                DAYS_OPTION,
                "Number of days to borrow",
            )
            .required(true)
            .min_int_value(MIN_BORROW_DAYS as u64)
            .max_int_value(MAX_BORROW_DAYS as u64),
        )
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::Attachment,
                IMAGE_OPTION,
                "Image of the book",
            )
            .required(true),
        )
}

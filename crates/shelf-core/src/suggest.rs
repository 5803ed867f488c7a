use crate::messaging::types::Choice;

/// Platform cap on autocomplete choices.
pub const MAX_CHOICES: usize = 25;

pub const DEFAULT_BOOKS: [&str; 10] = [
    "1984",
    "To Kill a Mockingbird",
    "The Great Gatsby",
    "Pride and Prejudice",
    "The Catcher in the Rye",
    "Harry Potter and the Sorcerer's Stone",
    "The Lord of the Rings",
    "The Hobbit",
    "The Hunger Games",
    "The Alchemist",
];

/// Fixed list of titles offered while typing `/book title:`.
#[derive(Clone, Debug)]
pub struct SuggestionCatalog {
    titles: Vec<String>,
}

impl Default for SuggestionCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_BOOKS.iter().map(|s| s.to_string()).collect())
    }
}

impl SuggestionCatalog {
    pub fn new(titles: Vec<String>) -> Self {
        Self { titles }
    }

    /// Case-insensitive substring match, catalog order, at most `MAX_CHOICES`.
    pub fn filter(&self, query: &str) -> Vec<Choice> {
        let needle = query.to_lowercase();
        self.titles
            .iter()
            .filter(|t| t.to_lowercase().contains(&needle))
            .take(MAX_CHOICES)
            .map(|t| Choice {
                name: t.clone(),
                value: t.clone(),
            })
            .collect()
    }
}

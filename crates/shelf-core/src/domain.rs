use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Platform user id (opaque; Discord snowflakes arrive as decimal strings).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub String);

/// Platform channel id (opaque).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChannelId(pub String);

/// Platform guild id (opaque).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GuildId(pub String);

/// One persisted book loan plus the routing data needed for its reminder.
///
/// Field names on disk are camelCase (`userId`, `bookTitle`, ...) and dates are
/// plain `YYYY-MM-DD`. Records have no key: two identical entries are two loans.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRecord {
    pub user_id: String,
    pub username: String,
    pub book_title: String,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
    pub channel_id: String,
    pub guild_id: String,
    #[serde(default)]
    pub image_url: String,
}

impl BorrowRecord {
    pub fn channel(&self) -> ChannelId {
        ChannelId(self.channel_id.clone())
    }

    /// Stored image, if the borrower attached one.
    pub fn image(&self) -> Option<&str> {
        let url = self.image_url.trim();
        if url.is_empty() {
            None
        } else {
            Some(url)
        }
    }

    /// Reminder text posted on the due date; mentions the borrower.
    pub fn reminder_text(&self) -> String {
        format!(
            "<@{}>, your book \"{}\" is due today!",
            self.user_id, self.book_title
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> BorrowRecord {
        BorrowRecord {
            user_id: "42".to_string(),
            username: "reader".to_string(),
            book_title: "Dune".to_string(),
            borrow_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
            channel_id: "100".to_string(),
            guild_id: "7".to_string(),
            image_url: String::new(),
        }
    }

    #[test]
    fn serializes_with_camel_case_names_and_plain_dates() {
        let v = serde_json::to_value(record()).unwrap();
        assert_eq!(v["userId"], "42");
        assert_eq!(v["bookTitle"], "Dune");
        assert_eq!(v["borrowDate"], "2024-01-01");
        assert_eq!(v["dueDate"], "2024-01-04");
        assert_eq!(v["channelId"], "100");
        assert_eq!(v["guildId"], "7");
        assert_eq!(v["imageUrl"], "");
    }

    #[test]
    fn missing_image_url_reads_as_empty() {
        let raw = r#"{
          "userId": "1", "username": "u", "bookTitle": "t",
          "borrowDate": "2024-02-01", "dueDate": "2024-02-02",
          "channelId": "c", "guildId": ""
        }"#;
        let rec: BorrowRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(rec.image(), None);
        assert_eq!(rec.guild_id, "");
    }

    #[test]
    fn reminder_mentions_borrower() {
        assert_eq!(
            record().reminder_text(),
            "<@42>, your book \"Dune\" is due today!"
        );
    }
}

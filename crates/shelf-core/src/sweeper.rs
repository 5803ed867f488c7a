//! Due-date sweep: remind borrowers whose book is due and prune the store.

use std::{str::FromStr, sync::Arc};

use chrono::NaiveDate;

use crate::{
    domain::BorrowRecord,
    messaging::{port::MessagingPort, types::OutgoingMessage},
    store::BorrowStore,
    Error,
};

/// What to do with records whose due date is already behind us
/// (e.g. the bot was down on the due day, or delivery failed then).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverduePolicy {
    /// Drop without notifying. Matches the historical behaviour of the bot.
    #[default]
    Drop,
    /// Treat `due <= today` as due: remind, then drop on success.
    Notify,
}

impl FromStr for OverduePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "drop" => Ok(OverduePolicy::Drop),
            "notify" => Ok(OverduePolicy::Notify),
            other => Err(Error::Config(format!(
                "unknown overdue policy: {other} (expected drop or notify)"
            ))),
        }
    }
}

/// Records grouped by how the sweep treats them. Each bucket keeps file order.
#[derive(Debug, Default)]
pub struct Partition {
    /// Indexed by original position so survivors can be re-merged in order.
    pub due: Vec<(usize, BorrowRecord)>,
    pub upcoming: Vec<(usize, BorrowRecord)>,
    pub dropped: Vec<BorrowRecord>,
}

pub fn partition(records: Vec<BorrowRecord>, today: NaiveDate, policy: OverduePolicy) -> Partition {
    let mut out = Partition::default();
    for (idx, rec) in records.into_iter().enumerate() {
        if rec.due_date == today {
            out.due.push((idx, rec));
        } else if rec.due_date > today {
            out.upcoming.push((idx, rec));
        } else {
            match policy {
                OverduePolicy::Drop => out.dropped.push(rec),
                OverduePolicy::Notify => out.due.push((idx, rec)),
            }
        }
    }
    out
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub delivered: usize,
    /// Due records kept because the reminder could not be sent.
    pub failed: usize,
    pub upcoming: usize,
    pub dropped: usize,
}

pub struct DueSweeper {
    store: Arc<BorrowStore>,
    messenger: Arc<dyn MessagingPort>,
    policy: OverduePolicy,
}

impl DueSweeper {
    pub fn new(
        store: Arc<BorrowStore>,
        messenger: Arc<dyn MessagingPort>,
        policy: OverduePolicy,
    ) -> Self {
        Self {
            store,
            messenger,
            policy,
        }
    }

    /// Run one sweep against `today`.
    ///
    /// The store stays locked for the whole pass so borrows recorded while
    /// reminders are in flight are not overwritten by the final save.
    pub async fn sweep(&self, today: NaiveDate) -> SweepReport {
        tracing::info!(%today, "starting check for due books");

        let guard = self.store.lock().await;
        let records = guard.load().await;
        let Partition {
            due,
            upcoming,
            dropped,
        } = partition(records, today, self.policy);

        let mut report = SweepReport {
            upcoming: upcoming.len(),
            dropped: dropped.len(),
            ..SweepReport::default()
        };

        let mut survivors = upcoming;
        for (idx, rec) in due {
            if self.deliver(&rec).await {
                report.delivered += 1;
            } else {
                report.failed += 1;
                survivors.push((idx, rec));
            }
        }

        for rec in &dropped {
            tracing::debug!(
                user = %rec.username,
                title = %rec.book_title,
                due = %rec.due_date,
                "dropping overdue borrowing"
            );
        }

        survivors.sort_by_key(|(idx, _)| *idx);
        let survivors: Vec<BorrowRecord> = survivors.into_iter().map(|(_, r)| r).collect();
        guard.save(&survivors).await;

        tracing::info!(
            delivered = report.delivered,
            failed = report.failed,
            upcoming = report.upcoming,
            dropped = report.dropped,
            "due book check finished"
        );
        report
    }

    async fn deliver(&self, rec: &BorrowRecord) -> bool {
        let mut msg = OutgoingMessage::text(rec.reminder_text());
        if let Some(url) = rec.image() {
            msg = msg.with_attachment(url);
        }

        match self.messenger.send_message(&rec.channel(), msg).await {
            Ok(()) => {
                tracing::info!(
                    user = %rec.username,
                    title = %rec.book_title,
                    "sent due notification"
                );
                true
            }
            Err(e) => {
                tracing::warn!(
                    user = %rec.username,
                    title = %rec.book_title,
                    channel = %rec.channel_id,
                    "error sending due notification: {e}"
                );
                false
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::ChannelId;
    use crate::store::tests::{record, tmp_file};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Records every send; fails for channels listed in `failing`.
    #[derive(Default)]
    pub(crate) struct FakeMessenger {
        pub(crate) sent: Mutex<Vec<(ChannelId, OutgoingMessage)>>,
        pub(crate) failing: Mutex<HashSet<String>>,
    }

    impl FakeMessenger {
        pub(crate) fn sent(&self) -> Vec<(ChannelId, OutgoingMessage)> {
            self.sent.lock().unwrap().clone()
        }

        fn fail_channel(&self, id: &str) {
            self.failing.lock().unwrap().insert(id.to_string());
        }
    }

    #[async_trait]
    impl MessagingPort for FakeMessenger {
        async fn send_message(
            &self,
            channel: &ChannelId,
            msg: OutgoingMessage,
        ) -> crate::Result<()> {
            if self.failing.lock().unwrap().contains(&channel.0) {
                return Err(Error::Platform("Unknown Channel".to_string()));
            }
            self.sent.lock().unwrap().push((channel.clone(), msg));
            Ok(())
        }
    }

    /// Holds every send for `delay` before succeeding.
    struct SlowMessenger {
        delay: std::time::Duration,
    }

    #[async_trait]
    impl MessagingPort for SlowMessenger {
        async fn send_message(&self, _: &ChannelId, _: OutgoingMessage) -> crate::Result<()> {
            tokio::time::sleep(self.delay).await;
            Ok(())
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup(prefix: &str, policy: OverduePolicy) -> (Arc<BorrowStore>, Arc<FakeMessenger>, DueSweeper) {
        let store = Arc::new(BorrowStore::new(tmp_file(prefix)));
        let messenger = Arc::new(FakeMessenger::default());
        let sweeper = DueSweeper::new(store.clone(), messenger.clone(), policy);
        (store, messenger, sweeper)
    }

    fn cleanup(store: &BorrowStore) {
        let _ = std::fs::remove_dir_all(store.path().parent().unwrap());
    }

    #[test]
    fn partition_splits_by_due_date() {
        let today = date(2024, 3, 10);
        let records = vec![
            record("past", date(2024, 3, 9)),
            record("today", today),
            record("future", date(2024, 3, 11)),
        ];

        let p = partition(records.clone(), today, OverduePolicy::Drop);
        assert_eq!(p.due.len(), 1);
        assert_eq!(p.due[0].1.book_title, "today");
        assert_eq!(p.upcoming[0].1.book_title, "future");
        assert_eq!(p.dropped[0].book_title, "past");

        let p = partition(records, today, OverduePolicy::Notify);
        assert_eq!(p.due.len(), 2);
        assert!(p.dropped.is_empty());
    }

    #[test]
    fn overdue_policy_parses() {
        assert_eq!("drop".parse::<OverduePolicy>().unwrap(), OverduePolicy::Drop);
        assert_eq!(" Notify ".parse::<OverduePolicy>().unwrap(), OverduePolicy::Notify);
        assert!("sometimes".parse::<OverduePolicy>().is_err());
    }

    #[tokio::test]
    async fn sweep_delivers_today_keeps_future_and_drops_past() {
        let (store, messenger, sweeper) = setup("shelf-sweep-partition", OverduePolicy::Drop);
        let today = date(2024, 3, 10);
        let tomorrow = record("tomorrow", date(2024, 3, 11));
        store
            .save(&[
                record("yesterday", date(2024, 3, 9)),
                record("today", today),
                tomorrow.clone(),
            ])
            .await;

        let report = sweeper.sweep(today).await;

        assert_eq!(
            report,
            SweepReport {
                delivered: 1,
                failed: 0,
                upcoming: 1,
                dropped: 1
            }
        );
        let sent = messenger.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, ChannelId("100".to_string()));
        assert_eq!(sent[0].1.content, "<@42>, your book \"today\" is due today!");
        assert_eq!(
            sent[0].1.attachment_urls,
            vec!["https://cdn.example/cover.png".to_string()]
        );
        assert_eq!(store.load().await, vec![tomorrow]);

        cleanup(&store);
    }

    #[tokio::test]
    async fn failed_delivery_is_retained_in_original_order() {
        let (store, messenger, sweeper) = setup("shelf-sweep-retain", OverduePolicy::Drop);
        let today = date(2024, 3, 10);
        let mut unreachable = record("unreachable", today);
        unreachable.channel_id = "404".to_string();
        let later = record("later", date(2024, 4, 1));
        store.save(&[unreachable.clone(), later.clone()]).await;
        messenger.fail_channel("404");

        let report = sweeper.sweep(today).await;

        assert_eq!(report.failed, 1);
        assert_eq!(report.delivered, 0);
        assert_eq!(store.load().await, vec![unreachable, later]);

        cleanup(&store);
    }

    #[tokio::test]
    async fn retained_record_is_dropped_the_next_day_under_drop_policy() {
        let (store, messenger, sweeper) = setup("shelf-sweep-nextday", OverduePolicy::Drop);
        let mut rec = record("flaky", date(2024, 3, 10));
        rec.channel_id = "404".to_string();
        store.save(&[rec]).await;

        messenger.fail_channel("404");
        sweeper.sweep(date(2024, 3, 10)).await;
        assert_eq!(store.load().await.len(), 1);

        messenger.failing.lock().unwrap().clear();
        let report = sweeper.sweep(date(2024, 3, 11)).await;
        assert_eq!(report.dropped, 1);
        assert!(messenger.sent().is_empty());
        assert!(store.load().await.is_empty());

        cleanup(&store);
    }

    #[tokio::test]
    async fn notify_policy_reminds_overdue_records() {
        let (store, messenger, sweeper) = setup("shelf-sweep-notify", OverduePolicy::Notify);
        store.save(&[record("late", date(2024, 3, 1))]).await;

        let report = sweeper.sweep(date(2024, 3, 10)).await;

        assert_eq!(report.delivered, 1);
        assert_eq!(messenger.sent().len(), 1);
        assert!(store.load().await.is_empty());

        cleanup(&store);
    }

    #[tokio::test]
    async fn record_without_image_sends_text_only() {
        let (store, messenger, sweeper) = setup("shelf-sweep-noimage", OverduePolicy::Drop);
        let today = date(2024, 3, 10);
        let mut rec = record("plain", today);
        rec.image_url = String::new();
        store.save(&[rec]).await;

        sweeper.sweep(today).await;

        assert!(messenger.sent()[0].1.attachment_urls.is_empty());
        cleanup(&store);
    }

    #[tokio::test]
    async fn borrow_recorded_during_a_sweep_survives_its_save() {
        let store = Arc::new(BorrowStore::new(tmp_file("shelf-sweep-inflight")));
        let today = date(2024, 3, 10);
        store.save(&[record("due", today)]).await;

        let sweeper = Arc::new(DueSweeper::new(
            store.clone(),
            Arc::new(SlowMessenger {
                delay: std::time::Duration::from_millis(200),
            }),
            OverduePolicy::Drop,
        ));
        let sweep = {
            let sweeper = sweeper.clone();
            tokio::spawn(async move { sweeper.sweep(today).await })
        };

        // The reminder is still in flight; this append waits for the sweep's save.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        store.append(record("new", date(2024, 3, 20))).await;

        let report = sweep.await.unwrap();
        assert_eq!(report.delivered, 1);
        let titles: Vec<String> = store
            .load()
            .await
            .into_iter()
            .map(|r| r.book_title)
            .collect();
        assert_eq!(titles, vec!["new".to_string()]);

        cleanup(&store);
    }
}

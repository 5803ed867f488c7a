//! Daily sweep scheduler.
//!
//! - Runs one sweep immediately on start
//! - Then sweeps whenever the configured 5-field cron expression fires
//!   (min hour dom mon dow, local time; default `0 8 * * *`)
//! - Stops cleanly via a cancellation token

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Datelike, Local, Timelike};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::{sweeper::DueSweeper, Error, Result};

#[derive(Clone)]
pub struct SweepScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    sweeper: Arc<DueSweeper>,
    expr: CronExpr,
    cancel: CancellationToken,
    job: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl SweepScheduler {
    /// Fails when `cron` is not a valid 5-field expression.
    pub fn new(sweeper: Arc<DueSweeper>, cron: &str) -> Result<Self> {
        let expr = CronExpr::parse(cron)?;
        Ok(Self {
            inner: Arc::new(SchedulerInner {
                sweeper,
                expr,
                cancel: CancellationToken::new(),
                job: tokio::sync::Mutex::new(None),
            }),
        })
    }

    /// Sweep once now, then start the daily job (idempotent).
    pub async fn start(&self) {
        self.run_now().await;

        let mut job = self.inner.job.lock().await;
        if job.is_some() {
            return;
        }

        let scheduler = self.clone();
        *job = Some(tokio::spawn(async move {
            scheduler.job_loop().await;
        }));

        if let Some(next) = self.next_run() {
            tracing::info!(next = %next.format("%Y-%m-%d %H:%M"), "sweep scheduled");
        }
    }

    pub async fn stop(&self) {
        self.inner.cancel.cancel();
        if let Some(handle) = self.inner.job.lock().await.take() {
            let _ = handle.await;
        }
    }

    pub fn next_run(&self) -> Option<DateTime<Local>> {
        self.inner.expr.next_after(Local::now())
    }

    async fn run_now(&self) {
        let today = Local::now().date_naive();
        self.inner.sweeper.sweep(today).await;
    }

    async fn job_loop(&self) {
        loop {
            let Some(next) = self.inner.expr.next_after(Local::now()) else {
                tracing::error!("sweep schedule has no next run (stopping)");
                break;
            };

            let dur = (next - Local::now())
                .to_std()
                .unwrap_or(Duration::from_secs(0));

            tokio::select! {
              _ = self.inner.cancel.cancelled() => break,
              _ = sleep(dur) => {
                tracing::info!("running scheduled check for due books");
                self.run_now().await;
              }
            }
        }
    }
}

// === Cron expression engine ===

#[derive(Clone, Debug)]
pub(crate) struct CronExpr {
    min: Field,
    hour: Field,
    dom: Field,
    mon: Field,
    dow: Field,
}

#[derive(Clone, Debug)]
struct Field {
    min: u32,
    max: u32,
    any: bool,
    allowed: Vec<bool>, // index = value
}

impl CronExpr {
    pub(crate) fn parse(expr: &str) -> Result<Self> {
        let parts = expr.split_whitespace().collect::<Vec<_>>();
        if parts.len() != 5 {
            return Err(Error::Config(format!(
                "invalid cron expression {expr:?}: expected 5 fields, got {}",
                parts.len()
            )));
        }

        Ok(Self {
            min: Field::parse(parts[0], 0, 59, false)?,
            hour: Field::parse(parts[1], 0, 23, false)?,
            dom: Field::parse(parts[2], 1, 31, false)?,
            mon: Field::parse(parts[3], 1, 12, false)?,
            dow: Field::parse(parts[4], 0, 6, true)?,
        })
    }

    fn matches(&self, dt: DateTime<Local>) -> bool {
        if !self.min.contains(dt.minute())
            || !self.hour.contains(dt.hour())
            || !self.mon.contains(dt.month())
        {
            return false;
        }

        // If both DOM and DOW are restricted, match when EITHER matches.
        let dom_match = self.dom.contains(dt.day());
        let dow_match = self.dow.contains(dt.weekday().num_days_from_sunday());

        match (self.dom.any, self.dow.any) {
            (true, true) => true,
            (true, false) => dow_match,
            (false, true) => dom_match,
            (false, false) => dom_match || dow_match,
        }
    }

    pub(crate) fn next_after(&self, now: DateTime<Local>) -> Option<DateTime<Local>> {
        let mut t = now + chrono::Duration::minutes(1);
        t = t.with_second(0)?.with_nanosecond(0)?;

        // Impossible expressions (e.g. Feb 31) give up after a year.
        let max_iters = 366usize * 24 * 60;
        for _ in 0..max_iters {
            if self.matches(t) {
                return Some(t);
            }
            t += chrono::Duration::minutes(1);
        }
        None
    }
}

impl Field {
    /// `max` is the largest canonical value. Day-of-week also accepts 7 as
    /// Sunday; it is folded into 0 once the field is expanded.
    fn parse(raw: &str, min: u32, max: u32, sunday_as_7: bool) -> Result<Self> {
        let raw = raw.trim();
        let upper = if sunday_as_7 { 7 } else { max };
        let mut allowed = vec![false; (upper + 1) as usize];

        for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (base, step) = match part.split_once('/') {
                Some((a, b)) => {
                    let step: u32 = b
                        .trim()
                        .parse()
                        .map_err(|_| Error::Config(format!("invalid cron step: {b}")))?;
                    if step == 0 {
                        return Err(Error::Config("cron step must be > 0".to_string()));
                    }
                    (a.trim(), Some(step))
                }
                None => (part, None),
            };

            let (start, end) = if base == "*" {
                (min, max)
            } else if let Some((a, b)) = base.split_once('-') {
                (parse_u32(a.trim())?, parse_u32(b.trim())?)
            } else {
                let a = parse_u32(base)?;
                if step.is_some() {
                    (a, max)
                } else {
                    (a, a)
                }
            };

            if start < min || end > upper || start > end {
                return Err(Error::Config(format!(
                    "invalid cron range: {base} (allowed {min}-{upper})"
                )));
            }

            let step = step.unwrap_or(1);
            let mut v = start;
            while v <= end {
                allowed[v as usize] = true;
                v = v.saturating_add(step);
            }
        }

        if sunday_as_7 && allowed[7] {
            allowed[0] = true;
        }
        allowed.truncate((max + 1) as usize);

        let any = (min..=max).all(|v| allowed[v as usize]);
        Ok(Self {
            min,
            max,
            any,
            allowed,
        })
    }

    fn contains(&self, v: u32) -> bool {
        if v < self.min || v > self.max {
            return false;
        }
        self.allowed.get(v as usize).copied().unwrap_or(false)
    }
}

fn parse_u32(s: &str) -> Result<u32> {
    s.parse()
        .map_err(|_| Error::Config(format!("invalid cron number: {s}")))
}

// === Tests ===

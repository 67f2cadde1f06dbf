//! Periodic reminder scan.
//!
//! The [`ReminderScheduler`] fires once a minute, finds tasks whose
//! reminder window (`reminder_at` within the next five minutes) has opened
//! and that have not yet been notified, sends one reminder per task, and
//! marks each task notified after its send succeeds.
//!
//! Delivery semantics: `is_notified` is persisted only after a successful
//! send, so a crash between the send and the write can duplicate one email
//! on restart. A failed send is retried on later ticks for as long as the
//! reminder is still inside the window; once the window passes, the
//! reminder is permanently missed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::clock::Clock;
use crate::notify::Notifier;
use crate::store::{StoreError, TaskStore};

/// Default scan period: one tick per minute.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(60);

/// Default look-ahead window for due reminders, in minutes.
pub const DEFAULT_WINDOW_MINS: i64 = 5;

/// Recurring scan-and-notify driver.
///
/// Starts disabled; the process bootstrap calls [`ReminderScheduler::start`]
/// once storage is ready. Ticks run sequentially: a scan that outlasts the
/// period delays the next tick rather than overlapping it.
pub struct ReminderScheduler {
    store: Arc<dyn TaskStore>,
    notifier: Arc<Notifier>,
    clock: Arc<dyn Clock>,
    period: Duration,
    window: chrono::Duration,
}

impl ReminderScheduler {
    /// Creates a scheduler with the default one-minute period and
    /// five-minute window.
    #[must_use]
    pub fn new(store: Arc<dyn TaskStore>, notifier: Arc<Notifier>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            notifier,
            clock,
            period: DEFAULT_PERIOD,
            window: chrono::Duration::minutes(DEFAULT_WINDOW_MINS),
        }
    }

    /// Overrides the scan period and look-ahead window.
    #[must_use]
    pub const fn with_timing(mut self, period: Duration, window: chrono::Duration) -> Self {
        self.period = period;
        self.window = window;
        self
    }

    /// Spawns the recurring scan loop and returns a handle controlling it.
    ///
    /// The first scan fires one full period after start. Tick failures are
    /// logged; the loop always fires again on the next period.
    #[must_use]
    pub fn start(self: Arc<Self>) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let scheduler = self;
        let task = tokio::spawn(async move {
            let first = tokio::time::Instant::now() + scheduler.period;
            let mut ticker = tokio::time::interval_at(first, scheduler.period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = scheduler.tick().await {
                            tracing::error!(error = %e, "reminder scan failed");
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        tracing::info!("reminder scheduler stopping");
                        break;
                    }
                }
            }
        });
        SchedulerHandle {
            shutdown: shutdown_tx,
            task,
        }
    }

    /// Runs one scan-and-notify pass.
    ///
    /// Each matched task is handled independently: a send or persist
    /// failure is logged and the pass moves on to the next task.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] only when the scan query itself fails.
    pub async fn tick(&self) -> Result<(), StoreError> {
        let now = self.clock.now();
        let due = self.store.due_reminders(now, now + self.window).await?;
        if due.is_empty() {
            return Ok(());
        }

        tracing::info!(count = due.len(), "processing due reminders");
        for mut task in due {
            let task_id = task.id;
            match self.notifier.send_reminder(&task).await {
                Ok(()) => {
                    task.is_notified = true;
                    // A crash here, after the send but before this write,
                    // re-sends this reminder once on restart.
                    if let Err(e) = self.store.update(task).await {
                        tracing::error!(
                            task_id = %task_id,
                            error = %e,
                            "failed to persist notified flag"
                        );
                    } else {
                        tracing::info!(task_id = %task_id, "reminder sent and marked notified");
                    }
                }
                Err(e) => {
                    tracing::warn!(task_id = %task_id, error = %e, "failed to send reminder");
                }
            }
        }
        Ok(())
    }
}

/// Handle to a running scheduler loop.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signals shutdown and waits for the loop to exit.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }

    /// Whether the loop has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

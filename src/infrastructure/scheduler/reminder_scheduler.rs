use chrono::{Duration as ChronoDuration, Local, NaiveDateTime, Timelike};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::application::services::notification_service::NotificationService;
use crate::domain::entities::task::{NotificationChannel, Task};
use crate::domain::repositories::task_repository::TaskRepository;
use crate::domain::value_objects::deadline::DeadlineCodec;

/// The reminder control loop.
///
/// One serial tick per interval: ticks never overlap, so two scans can never
/// race each other inside one process. Across processes the conditional
/// `try_mark_notified` update is the only guard, which is a bare minimum, not
/// a lock. A task fires once `now >= deadline - lead`, compared at minute
/// granularity; combined with the one-shot flag, a delayed tick delivers late
/// instead of never, and never twice.
pub struct ReminderScheduler {
    task_repo: Arc<dyn TaskRepository>,
    notification_service: Arc<NotificationService>,
    tick_interval: Duration,
}

impl ReminderScheduler {
    pub fn new(
        task_repo: Arc<dyn TaskRepository>,
        notification_service: Arc<NotificationService>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            task_repo,
            notification_service,
            tick_interval,
        }
    }

    /// Spawn the polling loop. On shutdown the current tick is finished and
    /// no further tick starts.
    pub fn start(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(interval_secs = self.tick_interval.as_secs(), "Reminder scheduler started");
            loop {
                self.run_tick(Local::now().naive_local()).await;

                tokio::select! {
                    _ = sleep(self.tick_interval) => {}
                    _ = shutdown.changed() => {
                        info!("Reminder scheduler stopping");
                        break;
                    }
                }
            }
        })
    }

    /// One scan over every channel's unnotified tasks. Per-task failures are
    /// logged and isolated; nothing in here may take the loop down.
    pub async fn run_tick(&self, now: NaiveDateTime) {
        let now_minute = truncate_to_minute(now);

        for channel in NotificationChannel::ALL {
            let tasks = match self.task_repo.find_pending(channel).await {
                Ok(tasks) => tasks,
                Err(err) => {
                    error!(%channel, %err, "Pending-task query failed, skipping channel this tick");
                    continue;
                }
            };

            for task in &tasks {
                self.process_task(task, now_minute).await;
            }
        }
    }

    async fn process_task(&self, task: &Task, now_minute: NaiveDateTime) {
        // Stored deadlines should always be canonical thanks to the write
        // gate; a row that is not gets skipped this tick and retried next.
        let deadline = match DeadlineCodec::parse_wall_clock(&task.deadline) {
            Ok(deadline) => deadline,
            Err(_) => {
                warn!(
                    task_id = task.id,
                    deadline = %task.deadline,
                    "Skipping task with malformed deadline"
                );
                return;
            }
        };

        let fire_minute = truncate_to_minute(
            deadline - ChronoDuration::minutes(task.notification_lead_minutes as i64),
        );
        if now_minute < fire_minute {
            return;
        }

        let Some(address) = task.notify_address() else {
            warn!(
                task_id = task.id,
                channel = %task.channel,
                "Task is due but has no destination address"
            );
            return;
        };

        // Claim before sending: the conditional update decides who notifies.
        match self.task_repo.try_mark_notified(task.id).await {
            Ok(true) => {}
            Ok(false) => return, // someone else already won
            Err(err) => {
                error!(task_id = task.id, %err, "Failed to claim task for notification");
                return;
            }
        }

        match self.notification_service.send_reminder(task, address).await {
            Ok(()) => {
                info!(task_id = task.id, channel = %task.channel, "Reminder sent");
            }
            Err(err) => {
                // The claim stands: this reminder is lost rather than risking
                // a duplicate or a retry storm.
                error!(task_id = task.id, channel = %task.channel, %err, "Failed to send reminder");
            }
        }
    }
}

fn truncate_to_minute(value: NaiveDateTime) -> NaiveDateTime {
    value
        .with_second(0)
        .and_then(|v| v.with_nanosecond(0))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::task::Priority;
    use crate::domain::notifier::{Notifier, NotifyError};
    use crate::infrastructure::repositories::memory_task_repository::MemoryTaskRepository;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    struct CountingNotifier {
        sends: AtomicUsize,
        sent_to: Mutex<Vec<String>>,
        fail: bool,
    }

    impl CountingNotifier {
        fn new() -> Self {
            Self {
                sends: AtomicUsize::new(0),
                sent_to: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }

        fn count(&self) -> usize {
            self.sends.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Notifier for CountingNotifier {
        async fn send(
            &self,
            _channel: NotificationChannel,
            address: &str,
            _subject: &str,
            _body: &str,
        ) -> Result<(), NotifyError> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            self.sent_to.lock().await.push(address.to_string());
            if self.fail {
                return Err(NotifyError::Send("transport down".to_string()));
            }
            Ok(())
        }
    }

    fn task(deadline: &str, lead_minutes: u32) -> Task {
        Task {
            id: 0,
            user_id: 7,
            title: "Ship report".to_string(),
            description: "Quarterly numbers".to_string(),
            deadline: deadline.to_string(),
            priority: Priority::High,
            channel: NotificationChannel::Email,
            notification_email: Some("user@example.com".to_string()),
            notification_whatsapp: None,
            notification_lead_minutes: lead_minutes,
            notified: false,
            created_at: Utc::now(),
        }
    }

    fn wall_clock(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M").unwrap()
    }

    fn scheduler(
        repo: Arc<MemoryTaskRepository>,
        notifier: Arc<CountingNotifier>,
    ) -> ReminderScheduler {
        let service = Arc::new(NotificationService::new(
            notifier,
            Duration::from_secs(5),
        ));
        ReminderScheduler::new(repo, service, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn end_to_end_fires_exactly_once_at_the_fire_minute() {
        let repo = Arc::new(MemoryTaskRepository::new());
        let notifier = Arc::new(CountingNotifier::new());
        let scheduler = scheduler(repo.clone(), notifier.clone());

        // deadline 11:30, lead 10 -> fire instant 11:20
        repo.add_task(task("2025-08-10T11:30", 10)).await.unwrap();

        scheduler.run_tick(wall_clock("2025-08-10T11:19")).await;
        assert_eq!(notifier.count(), 0, "one minute early must not fire");

        scheduler.run_tick(wall_clock("2025-08-10T11:20")).await;
        assert_eq!(notifier.count(), 1);
        assert_eq!(notifier.sent_to.lock().await[0], "user@example.com");
        assert!(repo.list_all().await.unwrap()[0].notified);

        scheduler.run_tick(wall_clock("2025-08-10T11:21")).await;
        assert_eq!(notifier.count(), 1, "notified task must never fire again");
    }

    #[tokio::test]
    async fn repeated_scans_of_the_same_minute_send_once() {
        let repo = Arc::new(MemoryTaskRepository::new());
        let notifier = Arc::new(CountingNotifier::new());
        let scheduler = scheduler(repo.clone(), notifier.clone());

        repo.add_task(task("2025-08-10T11:30", 10)).await.unwrap();

        let now = wall_clock("2025-08-10T11:20");
        scheduler.run_tick(now).await;
        scheduler.run_tick(now).await;
        scheduler.run_tick(now).await;
        assert_eq!(notifier.count(), 1);
    }

    #[tokio::test]
    async fn concurrent_scans_send_once() {
        let repo = Arc::new(MemoryTaskRepository::new());
        let notifier = Arc::new(CountingNotifier::new());
        let scheduler = Arc::new(scheduler(repo.clone(), notifier.clone()));

        repo.add_task(task("2025-08-10T11:30", 0)).await.unwrap();

        let now = wall_clock("2025-08-10T11:30");
        let a = scheduler.clone();
        let b = scheduler.clone();
        tokio::join!(a.run_tick(now), b.run_tick(now));
        assert_eq!(notifier.count(), 1);
    }

    #[tokio::test]
    async fn delayed_tick_fires_late_instead_of_never() {
        let repo = Arc::new(MemoryTaskRepository::new());
        let notifier = Arc::new(CountingNotifier::new());
        let scheduler = scheduler(repo.clone(), notifier.clone());

        repo.add_task(task("2025-08-10T11:30", 10)).await.unwrap();

        // the 11:20 tick never happened; the next scan is at 11:23
        scheduler.run_tick(wall_clock("2025-08-10T11:23")).await;
        assert_eq!(notifier.count(), 1);
        scheduler.run_tick(wall_clock("2025-08-10T11:24")).await;
        assert_eq!(notifier.count(), 1);
    }

    #[tokio::test]
    async fn zero_lead_time_fires_at_the_deadline_minute() {
        let repo = Arc::new(MemoryTaskRepository::new());
        let notifier = Arc::new(CountingNotifier::new());
        let scheduler = scheduler(repo.clone(), notifier.clone());

        repo.add_task(task("2025-08-10T11:30", 0)).await.unwrap();

        scheduler.run_tick(wall_clock("2025-08-10T11:29")).await;
        assert_eq!(notifier.count(), 0);
        scheduler.run_tick(wall_clock("2025-08-10T11:30")).await;
        assert_eq!(notifier.count(), 1);
    }

    #[tokio::test]
    async fn malformed_deadline_is_skipped_and_left_pending() {
        let repo = Arc::new(MemoryTaskRepository::new());
        let notifier = Arc::new(CountingNotifier::new());
        let scheduler = scheduler(repo.clone(), notifier.clone());

        repo.add_task(task("10/08/2025 oops", 0)).await.unwrap();
        repo.add_task(task("2025-08-10T11:30", 10)).await.unwrap();

        scheduler.run_tick(wall_clock("2025-08-10T11:20")).await;

        // the good task fired, the malformed one neither crashed the loop
        // nor got consumed
        assert_eq!(notifier.count(), 1);
        let all = repo.list_all().await.unwrap();
        assert!(!all[0].notified, "malformed task stays pending for repair");
        assert!(all[1].notified);
    }

    #[tokio::test]
    async fn missing_address_blocks_send_and_claim() {
        let repo = Arc::new(MemoryTaskRepository::new());
        let notifier = Arc::new(CountingNotifier::new());
        let scheduler = scheduler(repo.clone(), notifier.clone());

        let mut no_address = task("2025-08-10T11:30", 0);
        no_address.notification_email = Some("  ".to_string());
        repo.add_task(no_address).await.unwrap();

        scheduler.run_tick(wall_clock("2025-08-10T11:30")).await;
        assert_eq!(notifier.count(), 0);
        assert!(!repo.list_all().await.unwrap()[0].notified);
    }

    #[tokio::test]
    async fn send_failure_keeps_the_claim_no_retry() {
        let repo = Arc::new(MemoryTaskRepository::new());
        let notifier = Arc::new(CountingNotifier::failing());
        let scheduler = scheduler(repo.clone(), notifier.clone());

        repo.add_task(task("2025-08-10T11:30", 0)).await.unwrap();

        scheduler.run_tick(wall_clock("2025-08-10T11:30")).await;
        assert_eq!(notifier.count(), 1);
        assert!(repo.list_all().await.unwrap()[0].notified);

        // next tick does not retry the failed send
        scheduler.run_tick(wall_clock("2025-08-10T11:31")).await;
        assert_eq!(notifier.count(), 1);
    }

    #[tokio::test]
    async fn both_channels_are_scanned() {
        let repo = Arc::new(MemoryTaskRepository::new());
        let notifier = Arc::new(CountingNotifier::new());
        let scheduler = scheduler(repo.clone(), notifier.clone());

        repo.add_task(task("2025-08-10T11:30", 0)).await.unwrap();
        let mut wa = task("2025-08-10T11:30", 0);
        wa.channel = NotificationChannel::WhatsApp;
        wa.notification_whatsapp = Some("+555123".to_string());
        repo.add_task(wa).await.unwrap();

        scheduler.run_tick(wall_clock("2025-08-10T11:30")).await;
        assert_eq!(notifier.count(), 2);
        let sent_to = notifier.sent_to.lock().await;
        assert!(sent_to.contains(&"user@example.com".to_string()));
        assert!(sent_to.contains(&"+555123".to_string()));
    }

    #[tokio::test]
    async fn seconds_in_the_tick_timestamp_are_ignored() {
        let repo = Arc::new(MemoryTaskRepository::new());
        let notifier = Arc::new(CountingNotifier::new());
        let scheduler = scheduler(repo.clone(), notifier.clone());

        repo.add_task(task("2025-08-10T11:30", 0)).await.unwrap();

        let now = NaiveDateTime::parse_from_str("2025-08-10T11:30:47", "%Y-%m-%dT%H:%M:%S").unwrap();
        scheduler.run_tick(now).await;
        assert_eq!(notifier.count(), 1);
    }
}

// src/reminder_scheduler.rs - Reminder scheduler module
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, error, info};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration};

use crate::{Note, NoteStore, NotebookError, Result};

/// A reminder that became due
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueReminder {
    pub note_id: String,
    pub title: String,
    pub at: DateTime<Utc>,
}

/// Reminder timestamps already announced, per note id.
///
/// A note fires again only when its reminder moves past the last announced
/// time.
#[derive(Debug, Clone, Default)]
pub struct NotifiedReminders {
    last: HashMap<String, DateTime<Utc>>,
}

impl NotifiedReminders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the reminders due at `now` that were not announced yet, and
    /// marks them as announced.
    pub fn take_due(&mut self, notes: &[Note], now: DateTime<Utc>) -> Vec<DueReminder> {
        let mut due = Vec::new();
        for note in notes {
            let Some(at) = note.reminder else {
                continue;
            };
            if at > now {
                continue;
            }
            if self.last.get(&note.id).is_some_and(|seen| *seen >= at) {
                continue;
            }
            self.last.insert(note.id.clone(), at);
            due.push(DueReminder {
                note_id: note.id.clone(),
                title: note.title.clone(),
                at,
            });
        }
        due
    }
}

#[derive(Debug, Clone)]
pub struct ReminderSchedulerStatus {
    /// Whether the scheduler is running
    pub is_running: bool,
    /// The time of the last check
    pub last_check_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub enum ReminderCommand {
    /// Check reminders immediately
    CheckNow,
    /// Stop the reminder scheduler
    Stop,
}

pub struct ReminderScheduler {
    /// Time between two checks
    check_interval: Duration,

    /// Channel to send commands to the scheduler task
    command_tx: Option<mpsc::Sender<ReminderCommand>>,

    /// Handle to the scheduler task
    scheduler_task: Option<JoinHandle<()>>,

    /// Current status of the scheduler, also updated by the scheduler task
    status: Arc<Mutex<ReminderSchedulerStatus>>,

    /// Notes being watched
    store: Arc<Mutex<NoteStore>>,
}

impl ReminderScheduler {
    /// Create a new reminder scheduler watching `store`
    pub fn new(store: Arc<Mutex<NoteStore>>, check_interval: Duration) -> Self {
        info!(
            "Initializing reminder scheduler, checking every {:?}",
            check_interval
        );

        Self {
            check_interval,
            command_tx: None,
            scheduler_task: None,
            status: Arc::new(Mutex::new(ReminderSchedulerStatus {
                is_running: false,
                last_check_time: None,
            })),
            store,
        }
    }

    /// Start the scheduler; due reminders are sent on the returned channel
    pub fn start(&mut self) -> Result<mpsc::Receiver<DueReminder>> {
        if self.scheduler_task.is_some() {
            return Err(NotebookError::ApplicationError {
                message: "Reminder scheduler is already running".to_string(),
            });
        }
        info!("Starting reminder scheduler...");

        let (command_tx, mut command_rx) = mpsc::channel(10);
        let (due_tx, due_rx) = mpsc::channel(32);
        self.command_tx = Some(command_tx);

        let check_interval = self.check_interval;
        // No task holds the status yet, so this never contends.
        if let Ok(mut status) = self.status.try_lock() {
            status.is_running = true;
            status.last_check_time = None;
        }
        let store = Arc::clone(&self.store);
        let status = Arc::clone(&self.status);

        let task = tokio::spawn(async move {
            let mut notified = NotifiedReminders::new();
            let mut interval = time::interval(check_interval);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if !check_reminders(&store, &status, &mut notified, &due_tx).await {
                            break;
                        }
                    }
                    Some(cmd) = command_rx.recv() => match cmd {
                        ReminderCommand::CheckNow => {
                            if !check_reminders(&store, &status, &mut notified, &due_tx).await {
                                break;
                            }
                        }
                        ReminderCommand::Stop => {
                            info!("Reminder scheduler stopping...");
                            break;
                        }
                    }
                }
            }
        });

        self.scheduler_task = Some(task);

        Ok(due_rx)
    }

    /// Stop the reminder scheduler if it's running
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.scheduler_task.take() {
            if let Some(command_tx) = self.command_tx.take() {
                if let Err(e) = command_tx.send(ReminderCommand::Stop).await {
                    // The task already exited on its own.
                    debug!("Failed to send stop command to reminder scheduler: {}", e);
                }
            }

            if let Err(e) = task.await {
                let error_msg = format!("Failed to stop reminder scheduler: {}", e);
                error!("{}", error_msg);
                return Err(NotebookError::ApplicationError { message: error_msg });
            }

            self.status.lock().await.is_running = false;
            info!("Reminder scheduler stopped");
        } else {
            debug!("Reminder scheduler is not running");
        }

        Ok(())
    }

    /// Check reminders immediately, regardless of the schedule
    pub async fn check_now(&mut self) -> Result<()> {
        let Some(command_tx) = &self.command_tx else {
            return Err(NotebookError::ApplicationError {
                message: "Reminder scheduler is not running".to_string(),
            });
        };

        command_tx
            .send(ReminderCommand::CheckNow)
            .await
            .map_err(|e| NotebookError::ApplicationError {
                message: format!("Failed to send check command: {}", e),
            })?;

        Ok(())
    }

    /// Get the current status of the reminder scheduler
    pub async fn get_status(&self) -> ReminderSchedulerStatus {
        self.status.lock().await.clone()
    }
}

/// Sends newly due reminders; returns false once nobody is listening.
async fn check_reminders(
    store: &Arc<Mutex<NoteStore>>,
    status: &Arc<Mutex<ReminderSchedulerStatus>>,
    notified: &mut NotifiedReminders,
    due_tx: &mpsc::Sender<DueReminder>,
) -> bool {
    let now = Utc::now();
    let due = {
        let store = store.lock().await;
        notified.take_due(store.list(), now)
    };
    status.lock().await.last_check_time = Some(now);

    for reminder in due {
        debug!("Reminder due for note {}", reminder.note_id);
        if due_tx.send(reminder).await.is_err() {
            debug!("Reminder receiver dropped, stopping checks");
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;

    use super::*;

    fn note_with_reminder(at: Option<DateTime<Utc>>) -> Note {
        let mut note = Note::new("Call back", "");
        note.reminder = at;
        note
    }

    #[test]
    fn due_reminders_fire_once() {
        let now = Utc::now();
        let notes = vec![
            note_with_reminder(Some(now - ChronoDuration::minutes(1))),
            note_with_reminder(Some(now + ChronoDuration::minutes(1))),
            note_with_reminder(None),
        ];
        let mut notified = NotifiedReminders::new();

        let due = notified.take_due(&notes, now);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].note_id, notes[0].id);
        assert!(notified.take_due(&notes, now).is_empty());

        let later = now + ChronoDuration::minutes(2);
        let due = notified.take_due(&notes, later);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].note_id, notes[1].id);
    }

    #[test]
    fn moved_reminder_fires_again() {
        let now = Utc::now();
        let mut notes = vec![note_with_reminder(Some(now - ChronoDuration::hours(1)))];
        let mut notified = NotifiedReminders::new();
        assert_eq!(notified.take_due(&notes, now).len(), 1);

        notes[0].reminder = Some(now - ChronoDuration::minutes(5));
        assert_eq!(notified.take_due(&notes, now).len(), 1);
    }

    #[tokio::test]
    async fn scheduler_sends_due_reminders_and_stops() {
        let mut store = NoteStore::new();
        let id = store.create().id;
        store.set_reminder(&id, Utc::now() - ChronoDuration::seconds(1));
        let store = Arc::new(Mutex::new(store));

        let mut scheduler = ReminderScheduler::new(Arc::clone(&store), Duration::from_millis(20));
        let mut due_rx = scheduler.start().unwrap();
        assert!(scheduler.get_status().await.is_running);
        assert!(scheduler.start().is_err());

        let reminder = time::timeout(Duration::from_secs(2), due_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reminder.note_id, id);
        assert!(scheduler.get_status().await.last_check_time.is_some());

        scheduler.check_now().await.unwrap();
        scheduler.stop().await.unwrap();
        assert!(!scheduler.get_status().await.is_running);
        assert!(scheduler.check_now().await.is_err());
    }
}

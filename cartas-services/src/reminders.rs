//! Reminder service: CRUD against the backend plus the local due check.
//!
//! A due reminder is notified once per reminder, day and time. The marker
//! `notified_<id>_<date>_<time>` is written to local storage before the
//! notification is shown, so a crash never produces a duplicate.

use chrono::{NaiveDate, NaiveDateTime};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use cartas_api::ApiClient;
use cartas_core::error::{CtError, CtResult};
use cartas_models::{Reminder, Scope, Storage};

use crate::auth::CurrentUser;
use crate::event_bus::{AppEvent, EventBus};
use crate::notification::NotificationService;
use crate::service::{Service, ServiceState};

/// A reminder that fired during a due check.
#[derive(Debug, Clone)]
pub struct DueReminder {
    pub reminder: Reminder,
    pub date: NaiveDate,
    /// Whether a desktop notification was shown.
    pub notified: bool,
}

pub struct ReminderService {
    state: ServiceState,
    api: ApiClient,
    user: CurrentUser,
    storage: Storage,
    event_bus: EventBus,
    notifier: NotificationService,
    cache: RwLock<Vec<Reminder>>,
}

impl ReminderService {
    pub fn new(
        api: ApiClient,
        user: CurrentUser,
        storage: Storage,
        event_bus: EventBus,
        notifier: NotificationService,
    ) -> Self {
        Self {
            state: ServiceState::Created,
            api,
            user,
            storage,
            event_bus,
            notifier,
            cache: RwLock::new(Vec::new()),
        }
    }

    pub async fn refresh(&self) -> CtResult<Vec<Reminder>> {
        self.user.require().await?;
        let reminders = self.api.get_reminders().await?;
        info!("loaded {} reminder(s)", reminders.len());
        *self.cache.write().await = reminders.clone();
        self.emit_count().await;
        Ok(reminders)
    }

    pub async fn list(&self) -> Vec<Reminder> {
        self.cache.read().await.clone()
    }

    pub async fn create(&self, reminder: Reminder) -> CtResult<Reminder> {
        validate(&reminder)?;
        self.user.require().await?;
        let created = self.api.create_reminder(&reminder).await?;
        self.cache.write().await.push(created.clone());
        self.emit_count().await;
        Ok(created)
    }

    pub async fn update(&self, id: &str, reminder: Reminder) -> CtResult<Reminder> {
        validate(&reminder)?;
        let updated = self.api.update_reminder(id, &reminder).await?;
        {
            let mut cache = self.cache.write().await;
            match cache.iter_mut().find(|r| r.id.as_deref() == Some(id)) {
                Some(slot) => *slot = updated.clone(),
                None => cache.push(updated.clone()),
            }
        }
        self.emit_count().await;
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> CtResult<()> {
        self.api.delete_reminder(id).await?;
        self.cache
            .write()
            .await
            .retain(|r| r.id.as_deref() != Some(id));
        self.emit_count().await;
        Ok(())
    }

    /// Reminders with an occurrence between `today` and `today + days`,
    /// soonest first.
    pub async fn upcoming(&self, today: NaiveDate, days: i64) -> Vec<(NaiveDate, Reminder)> {
        let horizon = today + chrono::Duration::days(days);
        let mut out: Vec<_> = self
            .cache
            .read()
            .await
            .iter()
            .filter_map(|r| r.next_occurrence(today).map(|d| (d, r.clone())))
            .filter(|(d, _)| *d <= horizon)
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.time.cmp(&b.1.time)));
        out
    }

    /// Fire every cached reminder that is due at `now` and not yet notified.
    pub async fn check_due(&self, now: NaiveDateTime) -> CtResult<Vec<DueReminder>> {
        let reminders = self.cache.read().await.clone();
        let mut fired = Vec::new();

        for reminder in reminders {
            let Some(date) = reminder.due_occurrence(now) else {
                continue;
            };
            let key = reminder.notification_key(date);
            if self.storage.get(Scope::Local, &key)?.is_some() {
                continue;
            }
            self.storage.set(Scope::Local, &key, &now.and_utc().timestamp_millis().to_string())?;

            let body = reminder
                .notes
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| format!("Hoy a las {}", reminder.time.trim()));
            let notified = match self.notifier.notify_reminder(&reminder.title, &body) {
                Ok(shown) => shown,
                Err(e) => {
                    warn!("could not show reminder notification: {e}");
                    false
                }
            };

            debug!("reminder due: {key}");
            self.event_bus.emit(AppEvent::ReminderDue {
                reminder_id: reminder.id.clone(),
                title: reminder.title.clone(),
                date: date.format("%Y-%m-%d").to_string(),
            });
            fired.push(DueReminder {
                reminder,
                date,
                notified,
            });
        }

        if !fired.is_empty() {
            info!("{} reminder(s) due", fired.len());
        }
        Ok(fired)
    }

    async fn emit_count(&self) {
        let count = self.cache.read().await.len();
        self.event_bus.emit(AppEvent::RemindersUpdated { count });
    }
}

fn validate(reminder: &Reminder) -> CtResult<()> {
    let mut errors = Vec::new();
    if reminder.title.trim().is_empty() {
        errors.push("El recordatorio necesita un título.".to_string());
    }
    if reminder.time_of_day().is_none() {
        errors.push("La hora debe tener el formato HH:MM.".to_string());
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(CtError::Validation(errors))
    }
}

impl Service for ReminderService {
    fn name(&self) -> &str {
        "reminder"
    }
    fn state(&self) -> ServiceState {
        self.state
    }
    fn init(&mut self) -> CtResult<()> {
        self.state = ServiceState::Running;
        Ok(())
    }
    fn shutdown(&mut self) -> CtResult<()> {
        self.state = ServiceState::Stopped;
        Ok(())
    }
}

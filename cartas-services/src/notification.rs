//! Desktop notifications for due reminders.

use tracing::{debug, info};

use cartas_core::error::CtResult;

use crate::service::{Service, ServiceState};

pub struct NotificationService {
    state: ServiceState,
    enabled: bool,
}

impl NotificationService {
    pub fn new(enabled: bool) -> Self {
        Self {
            state: ServiceState::Created,
            enabled,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        debug!("notifications {}", if enabled { "enabled" } else { "disabled" });
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Show a reminder notification. Returns whether one was shown.
    pub fn notify_reminder(&self, title: &str, body: &str) -> CtResult<bool> {
        if !self.enabled {
            return Ok(false);
        }
        self.show(&format!("Recordatorio: {title}"), body)?;
        info!("reminder notification: {title}");
        Ok(true)
    }

    fn show(&self, summary: &str, body: &str) -> CtResult<()> {
        #[cfg(not(test))]
        {
            notify_rust::Notification::new()
                .summary(summary)
                .body(body)
                .appname(cartas_core::constants::APP_NAME)
                .show()
                .map_err(|e| cartas_core::error::CtError::Notification(e.to_string()))?;
        }

        let _ = (summary, body);
        Ok(())
    }
}

impl Service for NotificationService {
    fn name(&self) -> &str {
        "notification"
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

//! Reminder endpoints (`/api/reminders`).

use cartas_core::constants::paths;
use cartas_core::error::CtResult;
use cartas_models::Reminder;

use crate::client::ApiClient;

impl ApiClient {
    pub async fn get_reminders(&self) -> CtResult<Vec<Reminder>> {
        self.get_list(paths::REMINDERS).await
    }

    pub async fn create_reminder(&self, reminder: &Reminder) -> CtResult<Reminder> {
        self.post_json(paths::REMINDERS, reminder).await
    }

    pub async fn update_reminder(&self, id: &str, reminder: &Reminder) -> CtResult<Reminder> {
        self.put_json(&format!("{}/{id}", paths::REMINDERS), reminder).await
    }

    pub async fn delete_reminder(&self, id: &str) -> CtResult<()> {
        self.delete(&format!("{}/{id}", paths::REMINDERS)).await
    }
}

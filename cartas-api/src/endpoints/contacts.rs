//! Contact endpoints (`/api/contacts`).

use cartas_core::constants::paths;
use cartas_core::error::CtResult;
use cartas_models::Contact;

use crate::client::ApiClient;

impl ApiClient {
    /// All contacts of the current user.
    pub async fn get_contacts(&self) -> CtResult<Vec<Contact>> {
        self.get_list(paths::CONTACTS).await
    }

    /// Create a contact; returns it with its server id.
    pub async fn create_contact(&self, contact: &Contact) -> CtResult<Contact> {
        self.post_json(paths::CONTACTS, contact).await
    }

    /// Replace a contact.
    pub async fn update_contact(&self, id: &str, contact: &Contact) -> CtResult<Contact> {
        self.put_json(&format!("{}/{id}", paths::CONTACTS), contact).await
    }

    /// Delete a contact.
    pub async fn delete_contact(&self, id: &str) -> CtResult<()> {
        self.delete(&format!("{}/{id}", paths::CONTACTS)).await
    }
}

//! Favorite endpoints (`/api/favorites`).

use cartas_core::constants::paths;
use cartas_core::error::CtResult;
use cartas_models::FavoriteItem;

use crate::client::ApiClient;

impl ApiClient {
    /// All saved messages.
    pub async fn get_favorites(&self) -> CtResult<Vec<FavoriteItem>> {
        self.get_list(paths::FAVORITES).await
    }

    /// Save a message.
    pub async fn add_favorite(&self, item: &FavoriteItem) -> CtResult<FavoriteItem> {
        self.post_json(paths::FAVORITES, item).await
    }

    /// Remove a saved message.
    pub async fn remove_favorite(&self, id: &str) -> CtResult<()> {
        self.delete(&format!("{}/{id}", paths::FAVORITES)).await
    }
}

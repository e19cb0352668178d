//! Saved (favorited) generated message.

use serde::{Deserialize, Serialize};

use super::catalog::{Occasion, Tone};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteItem {
    #[serde(default)]
    pub id: Option<String>,
    pub content: String,
    #[serde(default)]
    pub occasion: Option<Occasion>,
    #[serde(default)]
    pub tone: Option<Tone>,
    #[serde(default, rename = "contactId", alias = "contact_id")]
    pub contact_id: Option<String>,
    #[serde(default, rename = "createdAt", alias = "created_at")]
    pub created_at: Option<String>,
}

impl FavoriteItem {
    pub fn new(content: impl Into<String>, occasion: Option<Occasion>, tone: Option<Tone>) -> Self {
        Self {
            id: None,
            content: content.into(),
            occasion,
            tone,
            contact_id: None,
            created_at: None,
        }
    }

    /// Whether this favorite holds the same text as `content`, ignoring
    /// surrounding whitespace.
    pub fn same_content(&self, content: &str) -> bool {
        self.content.trim() == content.trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_favorite_from_json() {
        let json = r#"{"id":"f1","content":"Te quiero","occasion":"amor","tone":"romantico","createdAt":"2026-02-14T10:00:00Z"}"#;
        let fav: FavoriteItem = serde_json::from_str(json).unwrap();
        assert_eq!(fav.occasion, Some(Occasion::Love));
        assert!(fav.same_content("  Te quiero\n"));
    }
}

//! Contact entity model.
//!
//! Contacts live on the backend. Besides identity they carry the history of
//! messages generated for them and the user's feedback on each, which the
//! Guardian prompt builder uses to personalise and to avoid repetition.

use serde::{Deserialize, Serialize};

use super::catalog::{Occasion, Relationship, Tone};

/// A person the user writes messages for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub relationship: Option<Relationship>,
    /// Birthday as `YYYY-MM-DD` or `MM-DD`.
    #[serde(default)]
    pub birthday: Option<String>,
    /// Free-form notes ("le encanta el café", "vive en Monterrey").
    #[serde(default)]
    pub notes: Option<String>,
    /// Previously generated messages, oldest first.
    #[serde(default, rename = "history", alias = "message_history")]
    pub message_history: Vec<HistoryEntry>,
}

/// One message previously generated for a contact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub content: String,
    #[serde(default)]
    pub occasion: Option<Occasion>,
    #[serde(default)]
    pub tone: Option<Tone>,
    #[serde(default)]
    pub feedback: Option<Feedback>,
}

/// User reaction to a generated message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Liked,
    Disliked,
}

impl Contact {
    /// Create a new, unsaved contact.
    pub fn new(name: impl Into<String>, relationship: Option<Relationship>) -> Self {
        Self {
            id: None,
            name: name.into(),
            relationship,
            birthday: None,
            notes: None,
            message_history: Vec::new(),
        }
    }

    /// Tones the user marked as liked, most recent first, deduplicated.
    pub fn liked_tones(&self) -> Vec<Tone> {
        self.tones_with(Feedback::Liked)
    }

    /// Tones the user marked as disliked, most recent first, deduplicated.
    pub fn disliked_tones(&self) -> Vec<Tone> {
        self.tones_with(Feedback::Disliked)
    }

    fn tones_with(&self, wanted: Feedback) -> Vec<Tone> {
        let mut tones = Vec::new();
        for entry in self.message_history.iter().rev() {
            if entry.feedback == Some(wanted) {
                if let Some(tone) = entry.tone {
                    if !tones.contains(&tone) {
                        tones.push(tone);
                    }
                }
            }
        }
        tones
    }

    /// Initials for compact listings.
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|w| w.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(tone: Tone, feedback: Option<Feedback>) -> HistoryEntry {
        HistoryEntry {
            content: "hola".into(),
            occasion: None,
            tone: Some(tone),
            feedback,
        }
    }

    #[test]
    fn test_contact_from_json() {
        let json = serde_json::json!({
            "id": "c-1",
            "name": "Mariana López",
            "relationship": "pareja",
            "history": [
                { "content": "Feliz cumple, amor", "occasion": "cumpleanos", "tone": "romantico", "feedback": "liked" }
            ]
        });
        let contact: Contact = serde_json::from_value(json).unwrap();
        assert_eq!(contact.relationship, Some(Relationship::Partner));
        assert_eq!(contact.message_history.len(), 1);
        assert_eq!(contact.initials(), "ML");
    }

    #[test]
    fn test_feedback_tones() {
        let mut c = Contact::new("Ana", Some(Relationship::Friend));
        c.message_history = vec![
            entry(Tone::Funny, Some(Feedback::Liked)),
            entry(Tone::Formal, Some(Feedback::Disliked)),
            entry(Tone::Heartfelt, Some(Feedback::Liked)),
            entry(Tone::Funny, Some(Feedback::Liked)),
            entry(Tone::Poetic, None),
        ];
        assert_eq!(c.liked_tones(), vec![Tone::Funny, Tone::Heartfelt]);
        assert_eq!(c.disliked_tones(), vec![Tone::Formal]);
    }
}

//! Fixed catalogs for the generation form: occasions, tones, relationships
//! and message formats.
//!
//! Ids are the stable strings the backend and client storage use
//! (`visited_occasion_<id>`, `visited_tone_<id>`); labels are Spanish.

use serde::{Deserialize, Serialize};

/// A message category driving the prompt templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Occasion {
    #[serde(rename = "cumpleanos")]
    Birthday,
    #[serde(rename = "aniversario")]
    Anniversary,
    #[serde(rename = "perdon")]
    Apology,
    #[serde(rename = "amor")]
    Love,
    #[serde(rename = "agradecimiento")]
    Gratitude,
    #[serde(rename = "amistad")]
    Friendship,
    #[serde(rename = "motivacion")]
    Motivation,
    #[serde(rename = "condolencias")]
    Condolences,
    #[serde(rename = "felicitaciones")]
    Congratulations,
    #[serde(rename = "navidad")]
    Christmas,
    #[serde(rename = "dia_madre")]
    MothersDay,
    #[serde(rename = "dia_padre")]
    FathersDay,
    #[serde(rename = "reflexion_diaria")]
    DailyReflection,
}

impl Occasion {
    pub const ALL: &'static [Occasion] = &[
        Occasion::Birthday,
        Occasion::Anniversary,
        Occasion::Apology,
        Occasion::Love,
        Occasion::Gratitude,
        Occasion::Friendship,
        Occasion::Motivation,
        Occasion::Condolences,
        Occasion::Congratulations,
        Occasion::Christmas,
        Occasion::MothersDay,
        Occasion::FathersDay,
        Occasion::DailyReflection,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Occasion::Birthday => "cumpleanos",
            Occasion::Anniversary => "aniversario",
            Occasion::Apology => "perdon",
            Occasion::Love => "amor",
            Occasion::Gratitude => "agradecimiento",
            Occasion::Friendship => "amistad",
            Occasion::Motivation => "motivacion",
            Occasion::Condolences => "condolencias",
            Occasion::Congratulations => "felicitaciones",
            Occasion::Christmas => "navidad",
            Occasion::MothersDay => "dia_madre",
            Occasion::FathersDay => "dia_padre",
            Occasion::DailyReflection => "reflexion_diaria",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Occasion::Birthday => "Cumpleaños",
            Occasion::Anniversary => "Aniversario",
            Occasion::Apology => "Pedir perdón",
            Occasion::Love => "Amor",
            Occasion::Gratitude => "Agradecimiento",
            Occasion::Friendship => "Amistad",
            Occasion::Motivation => "Motivación",
            Occasion::Condolences => "Condolencias",
            Occasion::Congratulations => "Felicitaciones",
            Occasion::Christmas => "Navidad",
            Occasion::MothersDay => "Día de la Madre",
            Occasion::FathersDay => "Día del Padre",
            Occasion::DailyReflection => "Reflexión diaria",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|o| o.id() == id)
    }

    /// The daily reflection is addressed to nobody in particular and uses its
    /// own structural template.
    pub fn is_daily_reflection(&self) -> bool {
        matches!(self, Occasion::DailyReflection)
    }

    /// Occasions only available on paid plans.
    pub fn is_premium(&self) -> bool {
        matches!(self, Occasion::Condolences | Occasion::DailyReflection)
    }
}

/// Emotional register of the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tone {
    #[serde(rename = "romantico")]
    Romantic,
    #[serde(rename = "divertido")]
    Funny,
    #[serde(rename = "formal")]
    Formal,
    #[serde(rename = "emotivo")]
    Heartfelt,
    #[serde(rename = "amistoso")]
    Friendly,
    #[serde(rename = "poetico")]
    Poetic,
    #[serde(rename = "sarcastico")]
    Sarcastic,
}

impl Tone {
    pub const ALL: &'static [Tone] = &[
        Tone::Romantic,
        Tone::Funny,
        Tone::Formal,
        Tone::Heartfelt,
        Tone::Friendly,
        Tone::Poetic,
        Tone::Sarcastic,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Tone::Romantic => "romantico",
            Tone::Funny => "divertido",
            Tone::Formal => "formal",
            Tone::Heartfelt => "emotivo",
            Tone::Friendly => "amistoso",
            Tone::Poetic => "poetico",
            Tone::Sarcastic => "sarcastico",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tone::Romantic => "Romántico",
            Tone::Funny => "Divertido",
            Tone::Formal => "Formal",
            Tone::Heartfelt => "Emotivo",
            Tone::Friendly => "Amistoso",
            Tone::Poetic => "Poético",
            Tone::Sarcastic => "Sarcástico",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.id() == id)
    }

    pub fn is_premium(&self) -> bool {
        matches!(self, Tone::Poetic | Tone::Sarcastic)
    }
}

/// Who the message is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relationship {
    #[serde(rename = "pareja")]
    Partner,
    #[serde(rename = "familia")]
    Family,
    #[serde(rename = "amigo")]
    Friend,
    #[serde(rename = "trabajo")]
    Coworker,
    #[serde(rename = "jefe")]
    Boss,
    #[serde(rename = "otro")]
    Other,
}

impl Relationship {
    pub const ALL: &'static [Relationship] = &[
        Relationship::Partner,
        Relationship::Family,
        Relationship::Friend,
        Relationship::Coworker,
        Relationship::Boss,
        Relationship::Other,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Relationship::Partner => "pareja",
            Relationship::Family => "familia",
            Relationship::Friend => "amigo",
            Relationship::Coworker => "trabajo",
            Relationship::Boss => "jefe",
            Relationship::Other => "otro",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Relationship::Partner => "Pareja",
            Relationship::Family => "Familia",
            Relationship::Friend => "Amistad",
            Relationship::Coworker => "Compañero de trabajo",
            Relationship::Boss => "Jefe o jefa",
            Relationship::Other => "Otra persona",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|r| r.id() == id)
    }
}

/// Output shape requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageFormat {
    /// Short chat message (WhatsApp-sized).
    #[serde(rename = "mensaje")]
    Message,
    /// Long-form letter.
    #[serde(rename = "carta")]
    Letter,
    /// Rhymed poem.
    #[serde(rename = "poema")]
    Poem,
    /// Social media caption.
    #[serde(rename = "publicacion")]
    SocialPost,
}

impl MessageFormat {
    pub const ALL: &'static [MessageFormat] = &[
        MessageFormat::Message,
        MessageFormat::Letter,
        MessageFormat::Poem,
        MessageFormat::SocialPost,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            MessageFormat::Message => "mensaje",
            MessageFormat::Letter => "carta",
            MessageFormat::Poem => "poema",
            MessageFormat::SocialPost => "publicacion",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MessageFormat::Message => "Mensaje corto",
            MessageFormat::Letter => "Carta",
            MessageFormat::Poem => "Poema",
            MessageFormat::SocialPost => "Publicación para redes",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.id() == id)
    }

    pub fn is_premium(&self) -> bool {
        matches!(self, MessageFormat::Letter | MessageFormat::Poem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_match_serde() {
        for o in Occasion::ALL {
            let json = serde_json::to_string(o).unwrap();
            assert_eq!(json, format!("\"{}\"", o.id()));
        }
        for t in Tone::ALL {
            let json = serde_json::to_string(t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.id()));
        }
        for r in Relationship::ALL {
            assert_eq!(serde_json::to_string(r).unwrap(), format!("\"{}\"", r.id()));
        }
        for f in MessageFormat::ALL {
            assert_eq!(serde_json::to_string(f).unwrap(), format!("\"{}\"", f.id()));
        }
    }

    #[test]
    fn test_from_id() {
        assert_eq!(Occasion::from_id("perdon"), Some(Occasion::Apology));
        assert_eq!(Tone::from_id("emotivo"), Some(Tone::Heartfelt));
        assert_eq!(MessageFormat::from_id("poema"), Some(MessageFormat::Poem));
        assert_eq!(Relationship::from_id("jefe"), Some(Relationship::Boss));
        assert_eq!(Occasion::from_id("unknown"), None);
    }

    #[test]
    fn test_daily_reflection_flag() {
        assert!(Occasion::DailyReflection.is_daily_reflection());
        assert!(!Occasion::Birthday.is_daily_reflection());
    }
}

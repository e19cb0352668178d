//! Offer banner and "new" badges.
//!
//! The dismissed banner id is kept for the session only, so the offer comes
//! back next time. Visited occasions and tones are remembered locally and
//! lose their "new" badge for good.

use tracing::debug;

use cartas_core::constants::keys;
use cartas_core::error::CtResult;
use cartas_models::{Occasion, PlanLevel, Scope, Storage, Tone};

use crate::event_bus::{AppEvent, EventBus};

/// Promotional banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offer {
    pub id: &'static str,
    pub headline: &'static str,
    pub body: &'static str,
    /// Plan the banner is shown to.
    pub audience: PlanLevel,
}

pub const OFFERS: &[Offer] = &[
    Offer {
        id: "signup_free",
        headline: "Crea tu cuenta gratis",
        body: "Guarda contactos y favoritos, y escribe hasta 10 mensajes al día.",
        audience: PlanLevel::Guest,
    },
    Offer {
        id: "premium_launch",
        headline: "Hazte Premium",
        body: "Mensajes ilimitados, cartas, poemas, ideas de regalo y frases de tu país.",
        audience: PlanLevel::Freemium,
    },
];

pub struct OfferService {
    storage: Storage,
    event_bus: EventBus,
}

impl OfferService {
    pub fn new(storage: Storage, event_bus: EventBus) -> Self {
        Self { storage, event_bus }
    }

    /// Banner to show for `plan`, unless dismissed this session.
    pub fn current_offer(&self, plan: PlanLevel) -> CtResult<Option<Offer>> {
        let dismissed = self
            .storage
            .get(Scope::Session, keys::OFFER_BANNER_DISMISSED_ID)?;
        Ok(OFFERS
            .iter()
            .find(|o| o.audience == plan && dismissed.as_deref() != Some(o.id))
            .copied())
    }

    pub fn dismiss(&self, offer_id: &str) -> CtResult<()> {
        self.storage
            .set(Scope::Session, keys::OFFER_BANNER_DISMISSED_ID, offer_id)?;
        debug!("offer dismissed: {offer_id}");
        self.event_bus.emit(AppEvent::OfferDismissed {
            offer_id: offer_id.to_string(),
        });
        Ok(())
    }

    pub fn mark_occasion_visited(&self, occasion: Occasion) -> CtResult<()> {
        self.storage.set(
            Scope::Local,
            &format!("{}{}", keys::VISITED_OCCASION_PREFIX, occasion.id()),
            "1",
        )
    }

    pub fn mark_tone_visited(&self, tone: Tone) -> CtResult<()> {
        self.storage.set(
            Scope::Local,
            &format!("{}{}", keys::VISITED_TONE_PREFIX, tone.id()),
            "1",
        )
    }

    /// Whether the occasion still shows its "new" badge.
    pub fn is_new_occasion(&self, occasion: Occasion) -> CtResult<bool> {
        Ok(self
            .storage
            .get(Scope::Local, &format!("{}{}", keys::VISITED_OCCASION_PREFIX, occasion.id()))?
            .is_none())
    }

    pub fn is_new_tone(&self, tone: Tone) -> CtResult<bool> {
        Ok(self
            .storage
            .get(Scope::Local, &format!("{}{}", keys::VISITED_TONE_PREFIX, tone.id()))?
            .is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> OfferService {
        OfferService::new(Storage::open_in_memory().unwrap(), EventBus::default())
    }

    #[test]
    fn test_offer_dismissed_for_session() {
        let svc = service();
        let offer = svc.current_offer(PlanLevel::Freemium).unwrap().unwrap();
        assert_eq!(offer.id, "premium_launch");
        svc.dismiss(offer.id).unwrap();
        assert!(svc.current_offer(PlanLevel::Freemium).unwrap().is_none());

        svc.storage.clear_scope(Scope::Session).unwrap();
        assert!(svc.current_offer(PlanLevel::Freemium).unwrap().is_some());
        assert!(svc.current_offer(PlanLevel::Premium).unwrap().is_none());
    }

    #[test]
    fn test_new_badges() {
        let svc = service();
        assert!(svc.is_new_occasion(Occasion::DailyReflection).unwrap());
        svc.mark_occasion_visited(Occasion::DailyReflection).unwrap();
        assert!(!svc.is_new_occasion(Occasion::DailyReflection).unwrap());
        assert!(svc.is_new_occasion(Occasion::Birthday).unwrap());

        svc.mark_tone_visited(Tone::Sarcastic).unwrap();
        assert!(!svc.is_new_tone(Tone::Sarcastic).unwrap());
        assert!(svc.is_new_tone(Tone::Poetic).unwrap());
    }
}

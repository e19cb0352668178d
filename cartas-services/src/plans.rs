//! Plan gating, usage counting and upsell triggers.
//!
//! Limits are enforced locally before a request goes out so the user sees
//! the upgrade prompt immediately; the backend enforces the same limits and
//! answers with an `upsell` key when the local view is stale.

use std::time::Duration;

use chrono::{Local, NaiveDate};
use tracing::{debug, info};

use cartas_core::config::GenerationConfig;
use cartas_core::constants::keys;
use cartas_core::error::{CtError, CtResult};
use cartas_models::{MessageFormat, Occasion, PlanLevel, Scope, Storage, Tone};

/// What a plan level allows. `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanLimits {
    pub daily_generations: Option<u64>,
    pub contacts: Option<usize>,
    pub favorites: Option<usize>,
    pub premium_occasions: bool,
    pub premium_tones: bool,
    pub premium_formats: bool,
    pub regional_adaptation: bool,
    pub gift_recommendations: bool,
}

impl PlanLimits {
    pub fn for_level(level: PlanLevel) -> Self {
        match level {
            PlanLevel::Guest => Self {
                daily_generations: Some(3),
                contacts: Some(0),
                favorites: Some(0),
                premium_occasions: false,
                premium_tones: false,
                premium_formats: false,
                regional_adaptation: false,
                gift_recommendations: false,
            },
            PlanLevel::Freemium => Self {
                daily_generations: Some(10),
                contacts: Some(3),
                favorites: Some(10),
                premium_occasions: false,
                premium_tones: false,
                premium_formats: false,
                regional_adaptation: false,
                gift_recommendations: false,
            },
            PlanLevel::Premium => Self {
                daily_generations: None,
                contacts: None,
                favorites: None,
                premium_occasions: true,
                premium_tones: true,
                premium_formats: true,
                regional_adaptation: true,
                gift_recommendations: true,
            },
        }
    }
}

/// Named reason for showing the upgrade prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpsellTrigger {
    /// A guest used up the anonymous generations.
    GuestLimit,
    DailyLimit,
    PremiumOccasion,
    PremiumTone,
    PremiumFormat,
    /// Contacts and favorites need an account.
    AccountRequired,
    ContactLimit,
    FavoriteLimit,
    RegionalAdaptation,
    GiftIdeas,
    Generic,
}

impl UpsellTrigger {
    pub const ALL: &'static [UpsellTrigger] = &[
        UpsellTrigger::GuestLimit,
        UpsellTrigger::DailyLimit,
        UpsellTrigger::PremiumOccasion,
        UpsellTrigger::PremiumTone,
        UpsellTrigger::PremiumFormat,
        UpsellTrigger::AccountRequired,
        UpsellTrigger::ContactLimit,
        UpsellTrigger::FavoriteLimit,
        UpsellTrigger::RegionalAdaptation,
        UpsellTrigger::GiftIdeas,
        UpsellTrigger::Generic,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            UpsellTrigger::GuestLimit => "guest_limit",
            UpsellTrigger::DailyLimit => "daily_limit",
            UpsellTrigger::PremiumOccasion => "premium_occasion",
            UpsellTrigger::PremiumTone => "premium_tone",
            UpsellTrigger::PremiumFormat => "premium_format",
            UpsellTrigger::AccountRequired => "account_required",
            UpsellTrigger::ContactLimit => "contact_limit",
            UpsellTrigger::FavoriteLimit => "favorite_limit",
            UpsellTrigger::RegionalAdaptation => "regional",
            UpsellTrigger::GiftIdeas => "gift_recommendations",
            UpsellTrigger::Generic => "generic",
        }
    }

    /// Map a backend key; unknown keys become `Generic`.
    pub fn from_key(key: &str) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.key() == key.trim())
            .unwrap_or(UpsellTrigger::Generic)
    }

    /// Marketing copy for the upgrade modal.
    pub fn message(&self) -> &'static str {
        match self {
            UpsellTrigger::GuestLimit => {
                "Ya usaste tus mensajes gratis de hoy. Crea una cuenta y sigue escribiendo sin pagar nada."
            }
            UpsellTrigger::DailyLimit => {
                "Llegaste al límite diario de tu plan. Con Premium escribes todos los mensajes que quieras."
            }
            UpsellTrigger::PremiumOccasion => {
                "Esta ocasión es exclusiva de Premium. Hazte Premium para desbloquearla."
            }
            UpsellTrigger::PremiumTone => {
                "Los tonos poético y sarcástico son exclusivos de Premium."
            }
            UpsellTrigger::PremiumFormat => {
                "Las cartas y los poemas son exclusivos de Premium."
            }
            UpsellTrigger::AccountRequired => {
                "Crea una cuenta gratis para guardar contactos y mensajes favoritos."
            }
            UpsellTrigger::ContactLimit => {
                "Alcanzaste el máximo de contactos de tu plan. Con Premium no hay límite."
            }
            UpsellTrigger::FavoriteLimit => {
                "Alcanzaste el máximo de favoritos de tu plan. Con Premium no hay límite."
            }
            UpsellTrigger::RegionalAdaptation => {
                "Con Premium tus mensajes suenan como en tu país, con expresiones locales."
            }
            UpsellTrigger::GiftIdeas => {
                "Con Premium recibes ideas de regalo junto a cada mensaje."
            }
            UpsellTrigger::Generic => "Desbloquea todo con Premium.",
        }
    }

    pub fn into_error(self) -> CtError {
        CtError::LimitReached {
            trigger: self.key().to_string(),
        }
    }
}

impl std::fmt::Display for UpsellTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Stateless checks against [`PlanLimits`].
pub struct PlanGate;

impl PlanGate {
    /// Whether a generation with these parameters is allowed, given how many
    /// generations were already made today.
    pub fn check_generation(
        level: PlanLevel,
        occasion: Occasion,
        tone: Tone,
        format: MessageFormat,
        today_count: u64,
    ) -> CtResult<()> {
        let limits = PlanLimits::for_level(level);

        if occasion.is_premium() && !limits.premium_occasions {
            return Err(UpsellTrigger::PremiumOccasion.into_error());
        }
        if tone.is_premium() && !limits.premium_tones {
            return Err(UpsellTrigger::PremiumTone.into_error());
        }
        if format.is_premium() && !limits.premium_formats {
            return Err(UpsellTrigger::PremiumFormat.into_error());
        }
        if let Some(max) = limits.daily_generations {
            if today_count >= max {
                let trigger = if level == PlanLevel::Guest {
                    UpsellTrigger::GuestLimit
                } else {
                    UpsellTrigger::DailyLimit
                };
                return Err(trigger.into_error());
            }
        }
        Ok(())
    }

    /// Whether one more contact fits.
    pub fn check_contact_slot(level: PlanLevel, current: usize) -> CtResult<()> {
        Self::check_slot(level, current, PlanLimits::for_level(level).contacts, UpsellTrigger::ContactLimit)
    }

    /// Whether one more favorite fits.
    pub fn check_favorite_slot(level: PlanLevel, current: usize) -> CtResult<()> {
        Self::check_slot(level, current, PlanLimits::for_level(level).favorites, UpsellTrigger::FavoriteLimit)
    }

    fn check_slot(
        level: PlanLevel,
        current: usize,
        max: Option<usize>,
        trigger: UpsellTrigger,
    ) -> CtResult<()> {
        match max {
            Some(_) if level == PlanLevel::Guest => Err(UpsellTrigger::AccountRequired.into_error()),
            Some(max) if current >= max => Err(trigger.into_error()),
            _ => Ok(()),
        }
    }
}

/// Snapshot of the usage counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageSummary {
    pub today: u64,
    pub session: u64,
    pub daily_limit: Option<u64>,
}

impl UsageSummary {
    pub fn remaining(&self) -> Option<u64> {
        self.daily_limit.map(|max| max.saturating_sub(self.today))
    }
}

/// Usage counters kept in client storage.
#[derive(Clone)]
pub struct UsageTracker {
    storage: Storage,
    rapid_click_window_ms: u64,
    anonymous_delay_ms: u64,
}

impl UsageTracker {
    pub fn new(storage: Storage, config: &GenerationConfig) -> Self {
        Self {
            storage,
            rapid_click_window_ms: config.rapid_click_window_ms,
            anonymous_delay_ms: config.anonymous_delay_ms,
        }
    }

    pub fn daily_key(date: NaiveDate) -> String {
        format!("{}{}", keys::USAGE_DAILY_PREFIX, date.format("%Y-%m-%d"))
    }

    /// Generations made on `date`.
    pub fn count_on(&self, date: NaiveDate) -> CtResult<u64> {
        self.storage.get_u64(Scope::Local, &Self::daily_key(date))
    }

    /// Generations made today (local time).
    pub fn today_count(&self) -> CtResult<u64> {
        self.count_on(Local::now().date_naive())
    }

    /// Generations made in the current session.
    pub fn session_count(&self) -> CtResult<u64> {
        self.storage.get_u64(Scope::Session, keys::USAGE_SESSION_COUNT)
    }

    /// Count one request made on `date` at `now_ms` (epoch ms). Returns the
    /// new daily count.
    pub fn record_request_at(&self, date: NaiveDate, now_ms: i64) -> CtResult<u64> {
        let today = self.storage.increment(Scope::Local, &Self::daily_key(date))?;
        let session = self.storage.increment(Scope::Session, keys::USAGE_SESSION_COUNT)?;
        self.storage
            .set(Scope::Local, keys::LAST_REQUEST_TIME, &now_ms.to_string())?;
        debug!("usage recorded: today={today} session={session}");
        Ok(today)
    }

    pub fn record_request(&self) -> CtResult<u64> {
        let now = Local::now();
        self.record_request_at(now.date_naive(), now.timestamp_millis())
    }

    /// Epoch ms of the previous request, if any.
    pub fn last_request_time(&self) -> CtResult<Option<i64>> {
        Ok(self
            .storage
            .get(Scope::Local, keys::LAST_REQUEST_TIME)?
            .and_then(|v| v.trim().parse().ok()))
    }

    /// The artificial delay owed by a guest who clicks again within the
    /// rapid-click window. Applied once per request, never retried.
    pub fn rapid_click_delay(&self, level: PlanLevel, now_ms: i64) -> CtResult<Option<Duration>> {
        if level != PlanLevel::Guest {
            return Ok(None);
        }
        let Some(last) = self.last_request_time()? else {
            return Ok(None);
        };
        let elapsed = now_ms.saturating_sub(last);
        if elapsed >= 0 && (elapsed as u64) < self.rapid_click_window_ms {
            debug!("rapid click by guest ({elapsed} ms since last request)");
            return Ok(Some(Duration::from_millis(self.anonymous_delay_ms)));
        }
        Ok(None)
    }

    pub fn summary(&self, level: PlanLevel) -> CtResult<UsageSummary> {
        Ok(UsageSummary {
            today: self.today_count()?,
            session: self.session_count()?,
            daily_limit: PlanLimits::for_level(level).daily_generations,
        })
    }

    /// Drop daily counters for days other than `today`.
    pub fn prune_old_days(&self, today: NaiveDate) -> CtResult<usize> {
        let keep = Self::daily_key(today);
        let mut removed = 0;
        for key in self.storage.keys_with_prefix(Scope::Local, keys::USAGE_DAILY_PREFIX)? {
            if key != keep && self.storage.remove(Scope::Local, &key)? {
                removed += 1;
            }
        }
        if removed > 0 {
            info!("pruned {removed} old usage counter(s)");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> UsageTracker {
        let storage = Storage::open_in_memory().unwrap();
        UsageTracker::new(storage, &GenerationConfig::default())
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_limits_by_level() {
        assert_eq!(PlanLimits::for_level(PlanLevel::Guest).daily_generations, Some(3));
        assert_eq!(PlanLimits::for_level(PlanLevel::Freemium).contacts, Some(3));
        let premium = PlanLimits::for_level(PlanLevel::Premium);
        assert!(premium.daily_generations.is_none());
        assert!(premium.gift_recommendations);
    }

    #[test]
    fn test_upsell_keys_roundtrip_and_unknown() {
        for t in UpsellTrigger::ALL {
            assert_eq!(UpsellTrigger::from_key(t.key()), *t);
            assert!(!t.message().is_empty());
        }
        assert_eq!(UpsellTrigger::from_key("something_new"), UpsellTrigger::Generic);
    }

    #[test]
    fn test_generation_gate() {
        let ok = PlanGate::check_generation(
            PlanLevel::Freemium,
            Occasion::Birthday,
            Tone::Friendly,
            MessageFormat::Message,
            9,
        );
        assert!(ok.is_ok());

        let err = PlanGate::check_generation(
            PlanLevel::Freemium,
            Occasion::Birthday,
            Tone::Poetic,
            MessageFormat::Message,
            0,
        )
        .unwrap_err();
        assert_eq!(err.upsell_trigger(), Some("premium_tone"));

        let err = PlanGate::check_generation(
            PlanLevel::Guest,
            Occasion::Birthday,
            Tone::Friendly,
            MessageFormat::Message,
            3,
        )
        .unwrap_err();
        assert_eq!(err.upsell_trigger(), Some("guest_limit"));

        assert!(PlanGate::check_generation(
            PlanLevel::Premium,
            Occasion::DailyReflection,
            Tone::Sarcastic,
            MessageFormat::Poem,
            500,
        )
        .is_ok());
    }

    #[test]
    fn test_slots() {
        let err = PlanGate::check_contact_slot(PlanLevel::Guest, 0).unwrap_err();
        assert_eq!(err.upsell_trigger(), Some("account_required"));
        assert!(PlanGate::check_contact_slot(PlanLevel::Freemium, 2).is_ok());
        let err = PlanGate::check_contact_slot(PlanLevel::Freemium, 3).unwrap_err();
        assert_eq!(err.upsell_trigger(), Some("contact_limit"));
        assert!(PlanGate::check_favorite_slot(PlanLevel::Premium, 10_000).is_ok());
    }

    #[test]
    fn test_record_and_count() {
        let t = tracker();
        let day = date("2026-03-01");
        assert_eq!(t.record_request_at(day, 1_000).unwrap(), 1);
        assert_eq!(t.record_request_at(day, 2_000).unwrap(), 2);
        assert_eq!(t.count_on(day).unwrap(), 2);
        assert_eq!(t.count_on(date("2026-03-02")).unwrap(), 0);
        assert_eq!(t.session_count().unwrap(), 2);
        assert_eq!(t.last_request_time().unwrap(), Some(2_000));
    }

    #[test]
    fn test_rapid_click_delay_guest_only() {
        let t = tracker();
        t.record_request_at(date("2026-03-01"), 10_000).unwrap();

        assert_eq!(
            t.rapid_click_delay(PlanLevel::Guest, 10_500).unwrap(),
            Some(Duration::from_millis(1_000))
        );
        assert_eq!(t.rapid_click_delay(PlanLevel::Guest, 12_500).unwrap(), None);
        assert_eq!(t.rapid_click_delay(PlanLevel::Freemium, 10_500).unwrap(), None);
    }

    #[test]
    fn test_no_delay_on_first_request() {
        let t = tracker();
        assert_eq!(t.rapid_click_delay(PlanLevel::Guest, 0).unwrap(), None);
    }

    #[test]
    fn test_prune_old_days() {
        let t = tracker();
        t.record_request_at(date("2026-02-27"), 1).unwrap();
        t.record_request_at(date("2026-02-28"), 2).unwrap();
        t.record_request_at(date("2026-03-01"), 3).unwrap();
        assert_eq!(t.prune_old_days(date("2026-03-01")).unwrap(), 2);
        assert_eq!(t.count_on(date("2026-03-01")).unwrap(), 1);
    }

    #[test]
    fn test_summary_remaining() {
        let s = UsageSummary { today: 2, session: 2, daily_limit: Some(3) };
        assert_eq!(s.remaining(), Some(1));
        let s = UsageSummary { today: 20, session: 1, daily_limit: None };
        assert_eq!(s.remaining(), None);
    }
}

//! Client storage integration tests.
//!
//! Tests what survives a restart: local keys persist, the session scope is
//! dropped once it has been idle longer than the configured timeout, and the
//! services built on top (usage, onboarding, offers) behave accordingly.

mod common;

use cartas_core::config::{GenerationConfig, StorageConfig};
use cartas_core::constants::keys;
use cartas_models::{Occasion, PlanLevel, Scope, Storage};
use cartas_services::offers::OfferService;
use cartas_services::onboarding::OnboardingService;
use cartas_services::plans::UsageTracker;
use cartas_services::registry::ServiceRegistry;
use cartas_services::service::ServiceState;

/// Pretend the last session activity happened `minutes` ago.
fn age_session(storage: &Storage, minutes: i64) {
    let now = chrono::Utc::now().timestamp_millis();
    let conn = storage.conn().unwrap();
    conn.execute(
        "UPDATE storage_items SET value = ?1 WHERE scope = 'session' AND key = ?2",
        [(now - minutes * 60_000).to_string(), keys::SESSION_LAST_SEEN.to_string()],
    )
    .unwrap();
}

#[test]
fn idle_session_is_dropped_on_reopen_but_local_survives() {
    let (storage, dir) = common::create_test_storage();
    let path = dir.path().join("cartas.db");
    let config = StorageConfig::default();

    let usage = UsageTracker::new(storage.clone(), &GenerationConfig::default());
    usage.record_request().unwrap();
    usage.record_request().unwrap();
    let onboarding = OnboardingService::new(storage.clone());
    onboarding.start("generator", false).unwrap();
    onboarding.advance().unwrap();
    onboarding.complete("contacts").unwrap();
    let offers = OfferService::new(storage.clone(), common::create_test_event_bus());
    offers.dismiss("signup_free").unwrap();
    offers.mark_occasion_visited(Occasion::Love).unwrap();

    age_session(&storage, config.session_idle_minutes as i64 + 5);
    drop((usage, onboarding, offers, storage));

    let reopened = Storage::open(&path, &config).unwrap();
    let usage = UsageTracker::new(reopened.clone(), &GenerationConfig::default());
    let onboarding = OnboardingService::new(reopened.clone());
    let offers = OfferService::new(reopened.clone(), common::create_test_event_bus());

    // Session scope is gone.
    assert_eq!(usage.session_count().unwrap(), 0);
    assert!(onboarding.active().unwrap().is_none());
    assert!(offers.current_offer(PlanLevel::Guest).unwrap().is_some());

    // Local scope survived.
    assert_eq!(usage.today_count().unwrap(), 2);
    assert!(onboarding.is_completed("contacts").unwrap());
    assert!(!offers.is_new_occasion(Occasion::Love).unwrap());
}

#[test]
fn active_session_survives_reopen() {
    let (storage, dir) = common::create_test_storage();
    let path = dir.path().join("cartas.db");

    let onboarding = OnboardingService::new(storage.clone());
    onboarding.start("reminders", false).unwrap();
    onboarding.advance().unwrap();
    age_session(&storage, 1);
    drop((onboarding, storage));

    let reopened = Storage::open(&path, &StorageConfig::default()).unwrap();
    let progress = OnboardingService::new(reopened).active().unwrap().unwrap();
    assert_eq!(progress.tour.id, "reminders");
    assert_eq!(progress.step, 1);
}

#[test]
fn old_usage_days_are_pruned() {
    let (storage, _dir) = common::create_test_storage();
    let usage = UsageTracker::new(storage.clone(), &GenerationConfig::default());
    let today = chrono::NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
    let yesterday = today.pred_opt().unwrap();

    usage.record_request_at(yesterday, 0).unwrap();
    usage.record_request_at(today, 1).unwrap();
    usage.record_request_at(today, 2).unwrap();

    assert_eq!(usage.prune_old_days(today).unwrap(), 1);
    assert_eq!(usage.count_on(today).unwrap(), 2);
    assert_eq!(usage.count_on(yesterday).unwrap(), 0);
    assert_eq!(usage.last_request_time().unwrap(), Some(2));
    assert!(storage
        .get(Scope::Local, &UsageTracker::daily_key(yesterday))
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn registry_over_file_storage_initializes_every_service() {
    let (storage, _dir) = common::create_test_storage();
    let registry = ServiceRegistry::with_storage(common::create_test_config(), storage).unwrap();

    registry.init_all().await.unwrap();
    let health = registry.health_check().await;
    let names: Vec<_> = health.iter().map(|(n, _, _)| n.as_str()).collect();
    assert_eq!(names, vec!["auth", "contact", "favorite", "reminder", "onboarding"]);
    assert!(health.iter().all(|(_, s, ok)| *s == ServiceState::Running && *ok));

    // No stored token: nobody is logged in and the plan is guest.
    assert!(registry.auth.read().await.restore().await.unwrap().is_none());
    assert_eq!(registry.user.plan().await, PlanLevel::Guest);

    registry.shutdown_all().await;
}

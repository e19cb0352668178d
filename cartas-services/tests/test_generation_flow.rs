//! End-to-end generation flow integration tests.
//!
//! Tests the pipeline: form -> plan gate -> usage counters -> streamed
//! chunks -> progressive display -> final extraction -> AppEvents, plus
//! the guest rapid-click delay and failure reporting.

mod common;

use std::time::{Duration, Instant};

use cartas_core::config::GenerationConfig;
use cartas_core::constants::{NETWORK_ERROR_MESSAGE, TYPING_PLACEHOLDER};
use cartas_core::error::CtError;
use cartas_models::{MessageFormat, Occasion, PlanLevel, Tone};
use cartas_services::event_bus::AppEvent;
use cartas_services::generator::{GenerationForm, MessageStatus, Role};
use cartas_services::plans::UsageTracker;

use common::FakeBackend;

fn birthday_form() -> GenerationForm {
    GenerationForm {
        occasion: Some(Occasion::Birthday),
        tone: Tone::Friendly,
        recipient_name: "Lucía".into(),
        ..GenerationForm::default()
    }
}

// ---- Full streaming pipeline ----

#[tokio::test]
async fn e2e_generation_emits_events_in_chunk_order() {
    let (storage, _dir) = common::create_test_storage();
    let bus = common::create_test_event_bus();
    let mut rx = bus.subscribe();
    let payload = common::sample_payload();
    let chars: Vec<char> = payload.chars().collect();
    let chunks: Vec<String> = chars.chunks(17).map(|c| c.iter().collect()).collect();
    assert_eq!(chunks.concat(), payload);

    let generator = common::create_generator(
        FakeBackend::new(chunks.clone()),
        storage.clone(),
        bus,
        PlanLevel::Freemium,
        &common::no_delay_generation_config(),
    );
    let msg = generator.generate(&birthday_form(), |_| {}).await.unwrap();

    // 1. Started, then one progress event per chunk, then finished
    let started = rx.recv().await.unwrap();
    let message_id = match started {
        AppEvent::GenerationStarted { message_id } => message_id,
        other => panic!("expected GenerationStarted, got {other:?}"),
    };
    for expected_index in 1..=chunks.len() {
        match rx.recv().await.unwrap() {
            AppEvent::GenerationProgress {
                message_id: id,
                chunk_index,
                ..
            } => {
                assert_eq!(id, message_id);
                assert_eq!(chunk_index, expected_index);
            }
            other => panic!("expected GenerationProgress, got {other:?}"),
        }
    }
    match rx.recv().await.unwrap() {
        AppEvent::GenerationFinished { message_id: id, content } => {
            assert_eq!(id, message_id);
            assert_eq!(content, msg.content);
        }
        other => panic!("expected GenerationFinished, got {other:?}"),
    }

    // 2. The freemium plan gets the standard variant and no gifts
    assert_eq!(msg.content, "¡Feliz cumpleaños, Lucía!\nQue este año te traiga risas.");
    assert_eq!(msg.status, MessageStatus::Done);
    assert!(msg.gift_recommendations.is_empty());
    assert!(msg.guardian_insight.is_some());

    // 3. Usage was counted once
    let usage = UsageTracker::new(storage, &GenerationConfig::default());
    assert_eq!(usage.today_count().unwrap(), 1);
    assert_eq!(usage.session_count().unwrap(), 1);
}

#[tokio::test]
async fn e2e_display_waits_for_closed_value_and_never_shows_raw_json() {
    let (storage, _dir) = common::create_test_storage();
    let generator = common::create_generator(
        FakeBackend::char_by_char(&common::sample_payload()),
        storage,
        common::create_test_event_bus(),
        PlanLevel::Freemium,
        &common::no_delay_generation_config(),
    );

    let mut shown: Vec<String> = Vec::new();
    generator
        .generate(&birthday_form(), |m| shown.push(m.content.clone()))
        .await
        .unwrap();

    let standard = "¡Feliz cumpleaños, Lucía!\nQue este año te traiga risas.";
    assert_eq!(shown.first().map(String::as_str), Some(TYPING_PLACEHOLDER));
    assert!(shown.iter().all(|s| !s.trim_start().starts_with('{')));
    // No partial value: the placeholder holds until the string closes.
    assert!(shown.iter().all(|s| s == TYPING_PLACEHOLDER || s == standard));

    let first_value = shown.iter().position(|s| s == standard).unwrap();
    assert!(first_value > 1);
    assert!(shown[..first_value].iter().all(|s| s == TYPING_PLACEHOLDER));
    assert!(shown[first_value..].iter().all(|s| s == standard));
}

#[tokio::test]
async fn e2e_three_chunk_stream_shows_placeholder_before_last_chunk() {
    let chunks = vec![
        r#"{"selected_strategy":"x","gen"#.to_string(),
        r#"erated_messages":[{"tone":"t","content":"Hola \n mundo""#.to_string(),
        r#"}]}"#.to_string(),
    ];
    let (storage, _dir) = common::create_test_storage();
    let generator = common::create_generator(
        FakeBackend::new(chunks),
        storage,
        common::create_test_event_bus(),
        PlanLevel::Guest,
        &common::no_delay_generation_config(),
    );

    let mut shown: Vec<String> = Vec::new();
    let msg = generator
        .generate(&birthday_form(), |m| shown.push(m.content.clone()))
        .await
        .unwrap();

    // One update per chunk, then the final message.
    assert_eq!(shown.len(), 4);
    assert_eq!(shown[0], TYPING_PLACEHOLDER);
    assert_eq!(shown[1], TYPING_PLACEHOLDER);
    assert_eq!(shown[2], "Hola \n mundo");
    assert_eq!(msg.content, "Hola \n mundo");
    assert_eq!(msg.status, MessageStatus::Done);
}

#[tokio::test]
async fn e2e_one_chunk_and_char_by_char_agree() {
    let payload = common::sample_payload();
    let mut results = Vec::new();
    for backend in [FakeBackend::whole(&payload), FakeBackend::char_by_char(&payload)] {
        let (storage, _dir) = common::create_test_storage();
        let generator = common::create_generator(
            backend,
            storage,
            common::create_test_event_bus(),
            PlanLevel::Premium,
            &common::no_delay_generation_config(),
        );
        let msg = generator.generate(&birthday_form(), |_| {}).await.unwrap();
        results.push((msg.content, msg.gift_recommendations, msg.guardian_insight));
    }
    assert_eq!(results[0], results[1]);
    assert_eq!(results[0].0, "Lucía, hoy celebramos tu luz.");
    assert_eq!(results[0].1.len(), 1);
}

#[tokio::test]
async fn e2e_plain_text_reply_is_kept_verbatim() {
    let (storage, _dir) = common::create_test_storage();
    let generator = common::create_generator(
        FakeBackend::new(vec!["Feliz cumple, ".into(), "amiga.".into()]),
        storage,
        common::create_test_event_bus(),
        PlanLevel::Freemium,
        &common::no_delay_generation_config(),
    );
    let msg = generator.generate(&birthday_form(), |_| {}).await.unwrap();
    assert_eq!(msg.content, "Feliz cumple, amiga.");
}

// ---- Plan gating ----

#[tokio::test]
async fn e2e_guest_daily_limit_triggers_upsell() {
    let (storage, _dir) = common::create_test_storage();
    let bus = common::create_test_event_bus();
    let generator = common::create_generator(
        FakeBackend::whole(&common::sample_payload()),
        storage,
        bus.clone(),
        PlanLevel::Guest,
        &common::no_delay_generation_config(),
    );

    for _ in 0..3 {
        generator.generate(&birthday_form(), |_| {}).await.unwrap();
    }

    let mut rx = bus.subscribe();
    let err = generator.generate(&birthday_form(), |_| {}).await.unwrap_err();
    assert!(matches!(&err, CtError::LimitReached { trigger } if trigger == "guest_limit"));

    match rx.recv().await.unwrap() {
        AppEvent::UpsellTriggered { trigger, message } => {
            assert_eq!(trigger, "guest_limit");
            assert!(!message.is_empty());
        }
        other => panic!("expected UpsellTriggered, got {other:?}"),
    }
    // The rejected attempt left no transcript entries behind.
    assert_eq!(generator.messages().len(), 6);
}

#[tokio::test]
async fn e2e_premium_options_blocked_for_freemium() {
    let (storage, _dir) = common::create_test_storage();
    let generator = common::create_generator(
        FakeBackend::whole(&common::sample_payload()),
        storage.clone(),
        common::create_test_event_bus(),
        PlanLevel::Freemium,
        &common::no_delay_generation_config(),
    );

    let poem = GenerationForm {
        format: MessageFormat::Poem,
        ..birthday_form()
    };
    let err = generator.generate(&poem, |_| {}).await.unwrap_err();
    assert_eq!(err.upsell_trigger(), Some("premium_format"));

    let sarcastic = GenerationForm {
        tone: Tone::Sarcastic,
        ..birthday_form()
    };
    let err = generator.generate(&sarcastic, |_| {}).await.unwrap_err();
    assert_eq!(err.upsell_trigger(), Some("premium_tone"));

    // Blocked attempts are not counted.
    let usage = UsageTracker::new(storage, &GenerationConfig::default());
    assert_eq!(usage.today_count().unwrap(), 0);
}

// ---- Guest rapid-click delay ----

#[tokio::test]
async fn e2e_guest_rapid_click_is_delayed_once() {
    let (storage, _dir) = common::create_test_storage();
    let config = GenerationConfig {
        rapid_click_window_ms: 60_000,
        anonymous_delay_ms: 150,
        ..GenerationConfig::default()
    };
    let generator = common::create_generator(
        FakeBackend::whole(&common::sample_payload()),
        storage,
        common::create_test_event_bus(),
        PlanLevel::Guest,
        &config,
    );

    let first = Instant::now();
    generator.generate(&birthday_form(), |_| {}).await.unwrap();
    assert!(first.elapsed() < Duration::from_millis(150));

    let second = Instant::now();
    generator.generate(&birthday_form(), |_| {}).await.unwrap();
    assert!(second.elapsed() >= Duration::from_millis(150));
}

// ---- Failure reporting ----

#[tokio::test]
async fn e2e_network_failure_marks_message_and_emits_failed() {
    let (storage, _dir) = common::create_test_storage();
    let bus = common::create_test_event_bus();
    let mut rx = bus.subscribe();
    let mut backend = FakeBackend::new(vec![r#"{"generated_messages":[{"content":"Hol"#.into()]);
    backend.fail_with = Some(|| CtError::Http("connection reset".into()));

    let generator = common::create_generator(
        backend,
        storage,
        bus,
        PlanLevel::Freemium,
        &common::no_delay_generation_config(),
    );
    let err = generator.generate(&birthday_form(), |_| {}).await.unwrap_err();
    assert!(err.is_network());
    assert!(!generator.is_loading());

    let transcript = generator.messages();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].role, Role::User);
    assert_eq!(transcript[1].status, MessageStatus::Error);
    assert_eq!(transcript[1].content, NETWORK_ERROR_MESSAGE);

    let mut saw_failed = false;
    while let Ok(event) = rx.try_recv() {
        if let AppEvent::GenerationFailed { error, .. } = event {
            assert!(error.contains("connection reset"));
            saw_failed = true;
        }
    }
    assert!(saw_failed);
}

#[tokio::test]
async fn e2e_backend_upsell_is_forwarded() {
    let (storage, _dir) = common::create_test_storage();
    let bus = common::create_test_event_bus();
    let mut rx = bus.subscribe();
    let mut backend = FakeBackend::new(Vec::new());
    backend.fail_with = Some(|| CtError::Api {
        status: 403,
        message: "Límite diario alcanzado".into(),
        upsell: Some("daily_limit".into()),
    });

    let generator = common::create_generator(
        backend,
        storage,
        bus,
        PlanLevel::Freemium,
        &common::no_delay_generation_config(),
    );
    generator.generate(&birthday_form(), |_| {}).await.unwrap_err();

    let mut triggers = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let AppEvent::UpsellTriggered { trigger, .. } = event {
            triggers.push(trigger);
        }
    }
    assert_eq!(triggers, vec!["daily_limit"]);
}

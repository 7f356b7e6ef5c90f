//! UI automation tests using egui_kittest and AccessKit
//!
//! The real window is driven through its accessibility tree with scripted
//! chat and speech backends behind the controller.

mod common;

use common::{fixture, wait_for_requests, Fixture, ScriptedTransport};
use egui_kittest::kittest::Queryable;
use egui_kittest::Harness;
use hovor::conversation::GENERIC_ERROR_MESSAGE;
use hovor::error::TransportError;
use hovor::messages::Role;
use hovor::ui::components::{LISTEN_LABEL, SEND_LABEL, STOP_LISTENING_LABEL, TYPING_INDICATOR};
use hovor::ui::{HovorApp, Theme};
use std::time::{Duration, Instant};

fn harness(f: Fixture) -> Harness<'static, HovorApp> {
    let app = HovorApp::with_theme(f.controller, Theme::dark());
    Harness::builder()
        .with_size(egui::Vec2::new(600.0, 500.0))
        .build_state(|ctx, app: &mut HovorApp| app.ui(ctx), app)
}

fn type_draft(harness: &mut Harness<'_, HovorApp>, text: &str) {
    harness.get_by_label("Message input").focus();
    harness.run();
    harness.get_by_label("Message input").type_text(text);
    harness.run();
}

/// Run frames until the in-flight request resolves
fn run_until_idle(harness: &mut Harness<'_, HovorApp>) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while harness.state().controller().state().is_loading {
        assert!(Instant::now() < deadline, "request never resolved");
        std::thread::sleep(Duration::from_millis(10));
        harness.run();
    }
    harness.run();
}

#[test]
fn test_controls_exist() {
    let mut harness = harness(fixture(ScriptedTransport::replying("unused")));
    harness.run();

    let _input = harness.get_by_label("Message input");
    let _send = harness.get_by_label(SEND_LABEL);
    let _voice = harness.get_by_label(LISTEN_LABEL);
}

#[test]
fn test_typing_updates_draft() {
    let mut harness = harness(fixture(ScriptedTransport::replying("unused")));
    harness.run();

    type_draft(&mut harness, "Ahoj");
    assert_eq!(harness.state().controller().state().draft_input, "Ahoj");
}

#[test]
fn test_submit_shows_both_sides_of_the_turn() {
    let mut harness = harness(fixture(ScriptedTransport::replying("Dobrý den")));
    harness.run();

    type_draft(&mut harness, "Ahoj");
    harness.get_by_label(SEND_LABEL).click();
    harness.run();

    assert!(harness.state().controller().state().draft_input.is_empty());
    run_until_idle(&mut harness);

    let _user = harness.get_by_label("Vy: Ahoj");
    let _assistant = harness.get_by_label("GPT: Dobrý den");

    let roles: Vec<Role> = harness
        .state()
        .controller()
        .state()
        .messages
        .iter()
        .map(|m| m.role())
        .collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant]);
}

#[test]
fn test_whitespace_draft_is_not_sent() {
    let mut harness = harness(fixture(ScriptedTransport::replying("unused")));
    harness.run();

    type_draft(&mut harness, "   ");
    harness.get_by_label(SEND_LABEL).click();
    harness.run();

    let state = harness.state().controller().state();
    assert!(state.messages.is_empty());
    assert!(!state.is_loading);
}

#[test]
fn test_failure_renders_system_message() {
    let mut harness = harness(fixture(ScriptedTransport::failing(TransportError::Api {
        status: 429,
        message: "rate limited".into(),
    })));
    harness.run();

    type_draft(&mut harness, "Ahoj");
    harness.get_by_label(SEND_LABEL).click();
    run_until_idle(&mut harness);

    let _system = harness.get_by_label(&format!("Systém: {}", GENERIC_ERROR_MESSAGE));
    assert!(harness
        .state()
        .controller()
        .state()
        .messages
        .iter()
        .all(|m| !m.content().contains("rate limited")));
}

#[test]
fn test_typing_indicator_while_loading() {
    let (transport, release) = ScriptedTransport::replying("Hotovo").gated();
    let mut harness = harness(fixture(transport));
    harness.run();

    type_draft(&mut harness, "Ahoj");
    harness.get_by_label(SEND_LABEL).click();
    harness.run();

    assert!(harness.state().controller().state().is_loading);
    let _indicator = harness.get_by_label(TYPING_INDICATOR);

    release.send(()).unwrap();
    run_until_idle(&mut harness);
    assert!(harness.query_by_label(TYPING_INDICATOR).is_none());
}

#[test]
fn test_send_is_ignored_while_a_reply_is_pending() {
    let (transport, release) = ScriptedTransport::replying("Hotovo").gated();
    let f = fixture(transport);
    let transport = f.transport.clone();
    let mut harness = harness(f);
    harness.run();

    type_draft(&mut harness, "Ahoj");
    harness.get_by_label(SEND_LABEL).click();
    harness.run();
    wait_for_requests(&transport, 1);

    type_draft(&mut harness, "Jste tam?");
    harness.get_by_label(SEND_LABEL).click();
    harness.run();

    {
        let state = harness.state().controller().state();
        assert!(state.is_loading);
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.draft_input, "Jste tam?");
    }
    assert_eq!(transport.requests.lock().len(), 1);

    release.send(()).unwrap();
    run_until_idle(&mut harness);
    assert_eq!(harness.state().controller().state().messages.len(), 2);
    assert_eq!(transport.requests.lock().len(), 1);
}

#[test]
fn test_enter_submits_the_draft() {
    let mut harness = harness(fixture(ScriptedTransport::replying("Dobrý den")));
    harness.run();

    type_draft(&mut harness, "Ahoj");
    harness.input_mut().events.push(egui::Event::Key {
        key: egui::Key::Enter,
        physical_key: None,
        pressed: true,
        repeat: false,
        modifiers: egui::Modifiers::NONE,
    });
    harness.run();

    assert!(harness.state().controller().state().draft_input.is_empty());
    run_until_idle(&mut harness);

    let _user = harness.get_by_label("Vy: Ahoj");
    let _assistant = harness.get_by_label("GPT: Dobrý den");
}

#[test]
fn test_voice_toggle_label_follows_listening() {
    let mut harness = harness(fixture(ScriptedTransport::replying("unused")));
    harness.run();

    harness.get_by_label(LISTEN_LABEL).click();
    harness.run();
    assert!(harness.state().controller().state().is_listening);
    let _stop = harness.get_by_label(STOP_LISTENING_LABEL);

    harness.get_by_label(STOP_LISTENING_LABEL).click();
    harness.run();
    assert!(!harness.state().controller().state().is_listening);
    let _listen = harness.get_by_label(LISTEN_LABEL);
}

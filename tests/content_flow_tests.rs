use astrocast_lib::config::{self, Config, Placement, SettingsStore};
use astrocast_lib::zodiac::ZodiacSign;
use astrocast_lib::{
    ContentCategory, ContentOrchestrator, ContentSink, GeminiClient, LoadOutcome, RenderState,
    RenderTarget,
};
use chrono::{NaiveDate, NaiveDateTime};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Mutex;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

#[derive(Default)]
struct RecordingSink {
    renders: Mutex<Vec<(RenderTarget, RenderState)>>,
}

impl ContentSink for RecordingSink {
    fn render(&self, target: RenderTarget, state: RenderState) {
        self.renders.lock().unwrap().push((target, state));
    }
}

fn full_moon_evening() -> NaiveDateTime {
    // 2024-01-25 is fourteen days after the reference new moon.
    NaiveDate::from_ymd_opt(2024, 1, 25)
        .unwrap()
        .and_hms_opt(21, 0, 0)
        .unwrap()
}

fn settings(dir: &TempDir, server: &MockServer, sun_sign: &str) -> SettingsStore {
    let config = Config {
        api_key: "test-key".to_string(),
        sun_sign: sun_sign.to_string(),
        api_base: server.uri(),
        ..Config::default()
    };
    let path = dir.path().join("config.json");
    config::save_to(&path, &config).unwrap();
    SettingsStore::open(&path).unwrap()
}

async fn mount_reply(server: &MockServer, text: &str) {
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn moon_tab_sends_calculated_phase_and_renders_markup() {
    let server = MockServer::start().await;
    mount_reply(&server, "## Full Moon Magic\n\n**Release** what no longer serves you.").await;
    let dir = TempDir::new().unwrap();
    let store = settings(&dir, &server, "");
    let client = GeminiClient::from_config(store.config());
    let orch = ContentOrchestrator::new(store, client, RecordingSink::default())
        .with_clock(full_moon_evening);

    let outcome = orch.switch_to(ContentCategory::Moon).await;

    let expected = RenderState::Rendered(
        "<p><h3>Full Moon Magic</h3></p><p><strong>Release</strong> what no longer serves you.</p>"
            .to_string(),
    );
    assert_eq!(outcome, Some(LoadOutcome::Rendered(expected.clone())));
    assert_eq!(
        *orch.sink().renders.lock().unwrap(),
        vec![
            (RenderTarget::MoonDescription, RenderState::Loading),
            (RenderTarget::MoonDescription, expected),
        ]
    );

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("Thursday, January 25, 2024"));
    assert!(prompt.contains("current Full Moon moon phase"));
}

#[tokio::test]
async fn feature_card_title_maps_to_its_prompt() {
    let server = MockServer::start().await;
    mount_reply(&server, "Lucky color: *violet*").await;
    let dir = TempDir::new().unwrap();
    let store = settings(&dir, &server, "pisces");
    let client = GeminiClient::from_config(store.config());
    let orch = ContentOrchestrator::new(store, client, RecordingSink::default())
        .with_clock(full_moon_evening);

    let category = ContentCategory::from_card_title("lucky elements").unwrap();
    let outcome = orch.load(category).await;

    assert_eq!(
        outcome,
        LoadOutcome::Rendered(RenderState::Rendered(
            "<p>Lucky color: <em>violet</em></p>".to_string()
        ))
    );
    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("lucky elements for Pisces"));
}

#[tokio::test]
async fn remote_rejection_is_shown_in_place_of_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "message": "Resource has been exhausted" }
        })))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let store = settings(&dir, &server, "aries");
    let client = GeminiClient::from_config(store.config());
    let orch = ContentOrchestrator::new(store, client, RecordingSink::default())
        .with_clock(full_moon_evening);

    let outcome = orch.load(ContentCategory::Horoscope).await;

    let expected = format!(
        "Error: Resource has been exhausted<br><br>Endpoint: {}{}",
        server.uri(),
        GENERATE_PATH
    );
    assert_eq!(outcome, LoadOutcome::Rendered(RenderState::Error(expected)));
}

#[tokio::test]
async fn sign_selection_persists_across_restarts() {
    let server = MockServer::start().await;
    mount_reply(&server, "Steady progress.").await;
    let dir = TempDir::new().unwrap();
    let store = settings(&dir, &server, "");
    let path = store.path().to_path_buf();
    let client = GeminiClient::from_config(store.config());
    let orch = ContentOrchestrator::new(store, client, RecordingSink::default())
        .with_clock(full_moon_evening);

    orch.select_sign(Placement::Moon, Some(ZodiacSign::Cancer))
        .await
        .unwrap();
    let outcome = orch
        .select_sign(Placement::Sun, Some(ZodiacSign::Capricorn))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        Some(LoadOutcome::Rendered(RenderState::Rendered(
            "<p>Steady progress.</p>".to_string()
        )))
    );

    let reopened = SettingsStore::open(&path).unwrap();
    assert_eq!(reopened.config().sun_sign(), Some(ZodiacSign::Capricorn));
    assert_eq!(reopened.config().moon_sign(), Some(ZodiacSign::Cancer));
    assert_eq!(reopened.config().api_key, "test-key");
}

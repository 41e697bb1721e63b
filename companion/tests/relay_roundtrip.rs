//! Companion against a live relay on an ephemeral port

use std::time::Duration;

use animator_core::Expression;
use avatar_companion::{AppConfig, CompanionApp, Message, RelayClient, APOLOGY};
use chat_relay::{RelayConfig, RelayServer};
use pretty_assertions::assert_eq;

/// Serve a relay in the background and return its base URL
async fn spawn_relay(config: RelayConfig) -> String {
    let router = RelayServer::new(config).unwrap().router();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn demo_relay_config() -> RelayConfig {
    let mut config = RelayConfig::default();
    config.persona.name = "Mika".to_string();
    config
}

/// Relay whose upstream points at a port nothing listens on
async fn broken_relay_config() -> RelayConfig {
    let dead = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let mut config = demo_relay_config();
    config.upstream.api_key = Some("sk-test".to_string());
    config.upstream.api_url = format!("http://{dead}/v1/chat/completions");
    config
}

fn client(base_url: &str) -> RelayClient {
    RelayClient::new(base_url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_health_reports_persona() {
    let url = spawn_relay(demo_relay_config()).await;
    let health = client(&url).health().await.unwrap();

    assert_eq!(health.status, "ok");
    assert_eq!(health.character, "Mika");
}

#[tokio::test]
async fn test_chat_demo_reply() {
    let url = spawn_relay(demo_relay_config()).await;
    let reply = client(&url)
        .chat(&[Message::user("hello")])
        .await
        .unwrap();

    assert!(reply.contains("Mika"));
}

#[tokio::test]
async fn test_chat_error_status() {
    let url = spawn_relay(broken_relay_config().await).await;
    let err = client(&url)
        .chat(&[Message::user("hello")])
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "API error: 500");
}

#[tokio::test]
async fn test_app_round_trip() {
    let url = spawn_relay(demo_relay_config()).await;
    let config = AppConfig {
        seed: Some(7),
        ..AppConfig::default()
    };
    let mut app = CompanionApp::new(client(&url), &config, Vec::new());

    assert!(app.connect().await);
    assert_eq!(app.persona(), "Mika");

    app.run(&b"hello\n"[..]).await.unwrap();

    let output = String::from_utf8(app.output().clone()).unwrap();
    assert!(output.starts_with("Mika> Hi! I'm Mika!"), "{output}");

    let history = app.session().history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0], Message::user("hello"));
    assert!(!app.session().is_in_flight());

    // Leaving the loop clears the talking smile
    assert_eq!(
        app.rig().unwrap().expression(Expression::Happy),
        Some(0.0)
    );
}

#[tokio::test]
async fn test_app_apologises_on_failure() {
    let url = spawn_relay(broken_relay_config().await).await;
    let mut app = CompanionApp::new(client(&url), &AppConfig::default(), Vec::new());
    app.connect().await;

    app.run(&b"hello\n"[..]).await.unwrap();

    let output = String::from_utf8(app.output().clone()).unwrap();
    assert_eq!(output, format!("Mika> {APOLOGY}\n"));
    assert_eq!(app.session().history(), &[Message::user("hello")]);
}

#[tokio::test]
async fn test_app_without_relay_still_runs() {
    let mut app = CompanionApp::new(
        client("http://127.0.0.1:9"),
        &AppConfig {
            avatar: false,
            ..AppConfig::default()
        },
        Vec::new(),
    );

    assert!(!app.connect().await);
    assert_eq!(app.persona(), "Avatar");

    app.run(&b"/wave\n/quit\nnever sent\n"[..]).await.unwrap();
    let output = String::from_utf8(app.output().clone()).unwrap();
    assert_eq!(output, "(no avatar loaded)\n");
    assert!(app.session().history().is_empty());
}

//! Integration test: start the relay on a free port with no provider credentials,
//! exercise health, validation, and the degrade paths. No external API is contacted.

use lib::config::Config;
use lib::gateway;
use std::time::Duration;

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    listener.local_addr().expect("local_addr").port()
}

async fn spawn_relay(config: Config) -> String {
    let port = config.server.port;
    tokio::spawn(async move {
        let _ = gateway::run_gateway(config).await;
    });

    let base_url = format!("http://127.0.0.1:{}", port);
    let health = format!("{}/health", base_url);
    let client = reqwest::Client::new();
    for _ in 0..100 {
        if let Ok(resp) = client.get(&health).send().await {
            if resp.status().is_success() {
                return base_url;
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("relay did not answer on {} within 5s", health);
}

fn unconfigured_relay() -> Config {
    let mut config = Config::default();
    config.server.port = free_port();
    config
}

#[tokio::test]
async fn health_responds_with_ok_and_timestamp() {
    let base_url = spawn_relay(unconfigured_relay()).await;
    let json: serde_json::Value = reqwest::get(format!("{}/health", base_url))
        .await
        .expect("GET /health")
        .json()
        .await
        .expect("parse JSON");
    assert_eq!(json.get("ok").and_then(|v| v.as_bool()), Some(true));
    assert!(json.get("timestamp").and_then(|v| v.as_str()).is_some());
}

#[tokio::test]
async fn unconfigured_chat_returns_placeholder_without_alert() {
    let base_url = spawn_relay(unconfigured_relay()).await;
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/api/chat", base_url))
        .json(&serde_json::json!({ "message": "Hola, quiero info" }))
        .send()
        .await
        .expect("POST /api/chat");
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.expect("parse JSON");
    assert_eq!(
        json.get("reply").and_then(|v| v.as_str()),
        Some("Gracias por tu mensaje. Un asesor se comunicará contigo pronto.")
    );
    assert_eq!(json.get("sentAlert").and_then(|v| v.as_bool()), Some(false));
    assert!(json.get("sid").expect("sid present").is_null());
    assert!(json.get("timestamp").and_then(|v| v.as_str()).is_some());
}

#[tokio::test]
async fn chat_without_message_is_rejected() {
    let base_url = spawn_relay(unconfigured_relay()).await;
    let client = reqwest::Client::new();

    for body in [
        serde_json::json!({}),
        serde_json::json!({ "message": "" }),
        serde_json::json!({ "message": 42 }),
    ] {
        let resp = client
            .post(format!("{}/api/chat", base_url))
            .json(&body)
            .send()
            .await
            .expect("POST /api/chat");
        assert_eq!(resp.status(), 400, "body: {}", body);
        let json: serde_json::Value = resp.json().await.expect("parse JSON");
        assert_eq!(
            json.get("error").and_then(|v| v.as_str()),
            Some("El campo \"message\" es obligatorio.")
        );
    }
}

#[tokio::test]
async fn lead_without_required_fields_is_rejected() {
    let base_url = spawn_relay(unconfigured_relay()).await;
    let client = reqwest::Client::new();

    for body in [
        serde_json::json!({ "message": "Interesado" }),
        serde_json::json!({ "email": "a@b.com" }),
    ] {
        let resp = client
            .post(format!("{}/api/leads", base_url))
            .json(&body)
            .send()
            .await
            .expect("POST /api/leads");
        assert_eq!(resp.status(), 400, "body: {}", body);
        let json: serde_json::Value = resp.json().await.expect("parse JSON");
        assert_eq!(
            json.get("error").and_then(|v| v.as_str()),
            Some("Email y mensaje son obligatorios.")
        );
    }
}

#[tokio::test]
async fn unconfigured_lead_capture_still_succeeds() {
    let base_url = spawn_relay(unconfigured_relay()).await;
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/api/leads", base_url))
        .json(&serde_json::json!({ "email": "a@b.com", "message": "Interesado" }))
        .send()
        .await
        .expect("POST /api/leads");
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.expect("parse JSON");
    assert_eq!(json.get("success").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(json.get("sentAlert").and_then(|v| v.as_bool()), Some(false));
    assert!(json.get("sid").expect("sid present").is_null());
}

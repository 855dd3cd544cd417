use offer_store::DocumentStore;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;

async fn spawn_server(data_dir: &Path) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let app = offer_cli::router(DocumentStore::new(data_dir));
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}")
}

async fn get_json(url: &str) -> (u16, Value) {
    let response = reqwest::get(url).await.expect("request");
    let status = response.status().as_u16();
    let body = response.json::<Value>().await.expect("json body");
    (status, body)
}

fn write(path: &Path, value: Value) {
    std::fs::write(path, serde_json::to_vec(&value).unwrap()).unwrap();
}

#[tokio::test]
async fn collections_are_served_as_stored() {
    let temp = TempDir::new().expect("tempdir");
    let offers = json!([
        {"id": "offer_1", "title": "T", "description": "D", "categories": ["Tech"]}
    ]);
    let base = json!([
        {"offerId": "offer_1", "type": "CPA", "cpaAmount": 2.5, "cpaCountryOverrides": {"US": 3}}
    ]);
    let custom = json!([
        {"offerId": "offer_1", "influencerId": "INF_1", "type": "FIXED", "fixedAmount": 10}
    ]);
    write(&temp.path().join("offers.json"), offers.clone());
    write(&temp.path().join("offerPayouts.json"), base.clone());
    write(&temp.path().join("influencerCustomPayouts.json"), custom.clone());

    let base_url = spawn_server(temp.path()).await;

    assert_eq!(get_json(&format!("{base_url}/offers")).await, (200, offers));
    assert_eq!(get_json(&format!("{base_url}/offerPayouts")).await, (200, base));
    assert_eq!(
        get_json(&format!("{base_url}/influencerCustomPayouts")).await,
        (200, custom.clone())
    );
    assert_eq!(get_json(&format!("{base_url}/customPayouts")).await, (200, custom));
}

#[tokio::test]
async fn missing_files_are_empty_arrays() {
    let temp = TempDir::new().expect("tempdir");
    let base_url = spawn_server(&temp.path().join("nothing-here")).await;

    assert_eq!(get_json(&format!("{base_url}/offers")).await, (200, json!([])));
    assert_eq!(
        get_json(&format!("{base_url}/offerPayouts")).await,
        (200, json!([]))
    );
}

#[tokio::test]
async fn malformed_file_returns_500_with_error() {
    let temp = TempDir::new().expect("tempdir");
    std::fs::write(temp.path().join("offers.json"), "[{ nope").unwrap();
    let base_url = spawn_server(temp.path()).await;

    let (status, body) = get_json(&format!("{base_url}/offers")).await;
    assert_eq!(status, 500);
    let message = body["error"].as_str().expect("error message");
    assert!(message.contains("offers.json"), "{message}");
}

#[tokio::test]
async fn health_and_cors_headers() {
    let temp = TempDir::new().expect("tempdir");
    let base_url = spawn_server(temp.path()).await;

    let (status, body) = get_json(&format!("{base_url}/health")).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["dataDir"], temp.path().display().to_string());

    let response = reqwest::Client::new()
        .get(format!("{base_url}/offers"))
        .header("Origin", "http://localhost:3000")
        .send()
        .await
        .expect("request");
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

mod common;

use reqwest::Client;
use uuid::Uuid;

use common::{minutes_ago, sample_json, spawn_app};

#[tokio::test]
async fn staged_samples_apply_on_drain() {
    let app = spawn_app().await;
    let client = Client::new();
    let user_id = Uuid::new_v4();
    let device = app.seed_device(user_id);
    let token = app.bearer_token(user_id);

    let response = client
        .post(format!("{}/sync/stage", app.address))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "deviceConfigId": device.id,
            "samples": [
                sample_json("heart_rate", 62.0, minutes_ago(30), minutes_ago(30)),
                sample_json("steps", 5000.0, minutes_ago(25), minutes_ago(25)),
                sample_json("weight", 74.0, minutes_ago(20), minutes_ago(20)),
            ]
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["processedCount"], 3);

    // Staged, not yet applied
    assert_eq!(app.store.sample_count(), 0);
    let status: serde_json::Value = client
        .get(format!("{}/sync/status/{}", app.address, device.id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["pendingCount"], 3);

    let drain: serde_json::Value = client
        .post(format!("{}/sync/drain", app.address))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "deviceConfigId": device.id }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(drain["processedCount"], 3);
    assert!(drain["errors"].as_array().unwrap().is_empty());

    assert_eq!(app.store.sample_count(), 3);
    let status: serde_json::Value = client
        .get(format!("{}/sync/status/{}", app.address, device.id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["pendingCount"], 0);
    assert!(!status["lastSyncAt"].is_null());
}

#[tokio::test]
async fn draining_an_empty_buffer_is_a_noop() {
    let app = spawn_app().await;
    let client = Client::new();
    let user_id = Uuid::new_v4();
    let device = app.seed_device(user_id);

    let drain: serde_json::Value = client
        .post(format!("{}/sync/drain", app.address))
        .bearer_auth(app.bearer_token(user_id))
        .json(&serde_json::json!({ "deviceConfigId": device.id }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(drain["processedCount"], 0);
    assert!(drain["errors"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_items_are_rejected_at_staging_time() {
    let app = spawn_app().await;
    let client = Client::new();
    let user_id = Uuid::new_v4();
    let device = app.seed_device(user_id);

    let response: serde_json::Value = client
        .post(format!("{}/sync/stage", app.address))
        .bearer_auth(app.bearer_token(user_id))
        .json(&serde_json::json!({
            "deviceConfigId": device.id,
            "samples": [
                sample_json("heart_rate", 900.0, minutes_ago(10), minutes_ago(10)),
                sample_json("heart_rate", 66.0, minutes_ago(9), minutes_ago(9)),
            ]
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(response["processedCount"], 1);
    let errors = response["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].as_str().unwrap().contains("outside allowed range"));
}

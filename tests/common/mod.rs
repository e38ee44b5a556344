use std::net::TcpListener;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use uuid::Uuid;

use vitalsync_backend::config::jwt::JwtSettings;
use vitalsync_backend::models::device::{DeviceConfig, SyncSettings};
use vitalsync_backend::run;
use vitalsync_backend::store::memory::InMemoryHealthStore;
use vitalsync_backend::telemetry::{get_subscriber, init_subscriber};

pub const TEST_JWT_SECRET: &str = "integration-test-jwt-secret";

// Ensure that the `tracing` stack is only initialised once using `once_cell`
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub struct TestApp {
    pub address: String,
    pub store: Arc<InMemoryHealthStore>,
}

/// Spin up the full HTTP server on a random port, backed by the in-memory
/// store double so tests need no database.
pub async fn spawn_app() -> TestApp {
    Lazy::force(&TRACING);

    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    // Get port assigned by the OS
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let store = Arc::new(InMemoryHealthStore::new());
    let jwt_settings = JwtSettings::new(TEST_JWT_SECRET.to_string(), 24);
    let server = run(listener, store.clone(), store.clone(), jwt_settings)
        .expect("Failed to bind address");
    // Launch the server as a background task
    let _ = tokio::spawn(server);

    TestApp { address, store }
}

impl TestApp {
    /// Register a device config for `user_id` and return it.
    pub fn seed_device(&self, user_id: Uuid) -> DeviceConfig {
        let config = DeviceConfig {
            id: Uuid::new_v4(),
            user_id,
            platform: "apple_health".to_string(),
            is_active: true,
            sync_settings: SyncSettings::default(),
            last_sync_at: None,
        };
        self.store.add_device_config(config.clone());
        config
    }

    /// Mint a bearer token the auth middleware accepts for `user_id`.
    pub fn bearer_token(&self, user_id: Uuid) -> String {
        #[derive(serde::Serialize)]
        struct Claims {
            sub: String,
            username: String,
            exp: usize,
        }

        let claims = Claims {
            sub: user_id.to_string(),
            username: "testuser".to_string(),
            exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
        };
        jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
        )
        .expect("Failed to sign test token")
    }
}

pub fn minutes_ago(minutes: i64) -> DateTime<Utc> {
    Utc::now() - Duration::minutes(minutes)
}

pub fn sample_json(
    vendor_type: &str,
    value: f64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> serde_json::Value {
    serde_json::json!({
        "type": vendor_type,
        "value": value,
        "unit": "native",
        "startDate": start.to_rfc3339(),
        "endDate": end.to_rfc3339(),
        "sourceName": "Vital Watch",
        "sourceVersion": "3.2.1"
    })
}

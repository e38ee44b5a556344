use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::sample::{CanonicalType, SampleValue};

/// One sample exactly as a vendor platform delivered it. Every field is
/// optional at the serde level so a single malformed item cannot abort
/// deserialization of the surrounding batch; the range validator enforces
/// presence per item and reports which field is missing.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawSample {
    #[serde(default, rename = "type")]
    pub sample_type: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub source_name: Option<String>,
    #[serde(default)]
    pub source_version: Option<String>,
    #[serde(default)]
    pub device: Option<serde_json::Value>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleBatchRequest {
    pub device_config_id: Uuid,
    /// When supplied, must match the platform the device config is
    /// registered for; a mismatch fails the whole batch.
    #[serde(default)]
    pub platform: Option<String>,
    pub samples: Vec<RawSample>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleBatchResponse {
    pub success: bool,
    pub processed_count: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingDrainRequest {
    pub device_config_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingDrainResponse {
    pub processed_count: usize,
    pub errors: Vec<String>,
}

/// Derived per-device sync view; never persisted as its own record.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub is_real_time_enabled: bool,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub sync_frequency_minutes: i32,
    pub pending_count: i64,
}

/// Heuristic grant/deny view derived from recent write activity. A type is
/// granted when at least one of its samples synced within the trailing seven
/// days; every other subscribed type is denied. This is an inference, not a
/// platform permission signal; no such signal exists in this design.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferredPermissionState {
    pub granted: Vec<CanonicalType>,
    pub denied: Vec<CanonicalType>,
}

/// The most recent stored sample of one type, keyed by start time.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LatestValue {
    pub value: SampleValue,
    pub unit: String,
    pub timestamp: DateTime<Utc>,
    pub source_app: String,
}

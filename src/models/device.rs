use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::sample::CanonicalType;

/// One user's registration of one vendor platform. Owned by the device
/// registry; the ingestion core reads it to scope a batch and writes
/// `last_sync_at` after applying samples.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DeviceConfig {
    pub id: Uuid,
    pub user_id: Uuid,
    pub platform: String,
    pub is_active: bool,
    pub sync_settings: SyncSettings,
    pub last_sync_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SyncSettings {
    pub auto_sync_enabled: bool,
    pub sync_frequency_minutes: i32,
    pub data_types: Vec<CanonicalType>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            auto_sync_enabled: true,
            sync_frequency_minutes: 60,
            data_types: CanonicalType::ALL.to_vec(),
        }
    }
}

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::device::DeviceConfig;
use crate::models::sample::{CanonicalSample, CanonicalType, NewPendingSample, PendingSample};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Read/update access to device-configuration records. The registry owns
/// them; the ingestion core only resolves a config to scope a batch and
/// refreshes its last-sync timestamp.
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    async fn find_device_config(&self, id: Uuid) -> Result<Option<DeviceConfig>, StoreError>;

    async fn update_last_sync(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError>;
}

/// Durable storage for canonical and pending samples, scoped by device and
/// type. Injected into the ingestion core so tests can substitute an
/// in-memory double; the core holds no global client reference.
#[async_trait]
pub trait SampleStore: Send + Sync {
    async fn find_canonical(
        &self,
        device_config_id: Uuid,
        data_type: CanonicalType,
        start_time: DateTime<Utc>,
    ) -> Result<Option<CanonicalSample>, StoreError>;

    async fn insert_canonical(&self, sample: &CanonicalSample) -> Result<(), StoreError>;

    async fn update_canonical(&self, sample: &CanonicalSample) -> Result<(), StoreError>;

    async fn latest_canonical(
        &self,
        device_config_id: Uuid,
        data_type: CanonicalType,
    ) -> Result<Option<CanonicalSample>, StoreError>;

    /// Distinct data types with at least one sample whose `synced_at` is at
    /// or after `since`. Feeds the inferred-permission heuristic.
    async fn data_types_synced_since(
        &self,
        device_config_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<CanonicalType>, StoreError>;

    async fn insert_pending(&self, pending: &NewPendingSample) -> Result<(), StoreError>;

    /// Unprocessed pending samples for one device, oldest arrival first,
    /// capped at `limit`.
    async fn unprocessed_pending(
        &self,
        device_config_id: Uuid,
        limit: i64,
    ) -> Result<Vec<PendingSample>, StoreError>;

    async fn mark_pending_processed(&self, id: Uuid) -> Result<(), StoreError>;

    async fn count_unprocessed(&self, device_config_id: Uuid) -> Result<i64, StoreError>;

    /// Devices that currently have unprocessed pending samples; drives the
    /// periodic drain job.
    async fn device_ids_with_unprocessed(&self) -> Result<Vec<Uuid>, StoreError>;
}

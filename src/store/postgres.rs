use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::device::{DeviceConfig, SyncSettings};
use crate::models::sample::{
    CanonicalSample, CanonicalType, NewPendingSample, PendingSample, PressureComponent,
    SampleValue,
};
use crate::store::{DeviceRegistry, SampleStore, StoreError};

/// Postgres-backed implementation of both store traits.
#[derive(Clone)]
pub struct PgHealthStore {
    pool: PgPool,
}

impl PgHealthStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct DeviceConfigRow {
    id: Uuid,
    user_id: Uuid,
    platform: String,
    is_active: bool,
    auto_sync_enabled: bool,
    sync_frequency_minutes: i32,
    data_types: serde_json::Value,
    last_sync_at: Option<DateTime<Utc>>,
}

impl TryFrom<DeviceConfigRow> for DeviceConfig {
    type Error = StoreError;

    fn try_from(row: DeviceConfigRow) -> Result<Self, Self::Error> {
        let data_types: Vec<CanonicalType> = serde_json::from_value(row.data_types)
            .map_err(|e| StoreError::Corrupt(format!("device config {}: {}", row.id, e)))?;
        Ok(DeviceConfig {
            id: row.id,
            user_id: row.user_id,
            platform: row.platform,
            is_active: row.is_active,
            sync_settings: SyncSettings {
                auto_sync_enabled: row.auto_sync_enabled,
                sync_frequency_minutes: row.sync_frequency_minutes,
                data_types,
            },
            last_sync_at: row.last_sync_at,
        })
    }
}

#[derive(FromRow)]
struct CanonicalSampleRow {
    id: Uuid,
    device_config_id: Uuid,
    data_type: String,
    value: serde_json::Value,
    unit: String,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    source_app: String,
    metadata: serde_json::Value,
    synced_at: DateTime<Utc>,
}

impl TryFrom<CanonicalSampleRow> for CanonicalSample {
    type Error = StoreError;

    fn try_from(row: CanonicalSampleRow) -> Result<Self, Self::Error> {
        let data_type: CanonicalType = row
            .data_type
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("sample {}: {}", row.id, e)))?;
        let value: SampleValue = serde_json::from_value(row.value)
            .map_err(|e| StoreError::Corrupt(format!("sample {}: {}", row.id, e)))?;
        Ok(CanonicalSample {
            id: row.id,
            device_config_id: row.device_config_id,
            data_type,
            value,
            unit: row.unit,
            start_time: row.start_time,
            end_time: row.end_time,
            source_app: row.source_app,
            metadata: row.metadata,
            synced_at: row.synced_at,
        })
    }
}

#[derive(FromRow)]
struct PendingSampleRow {
    id: Uuid,
    device_config_id: Uuid,
    data_type: String,
    component: Option<String>,
    value: f64,
    unit: Option<String>,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    source_app: String,
    metadata: serde_json::Value,
    processed: bool,
    arrival_seq: i64,
}

impl TryFrom<PendingSampleRow> for PendingSample {
    type Error = StoreError;

    fn try_from(row: PendingSampleRow) -> Result<Self, Self::Error> {
        let data_type: CanonicalType = row
            .data_type
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("pending sample {}: {}", row.id, e)))?;
        let component = row
            .component
            .as_deref()
            .map(str::parse::<PressureComponent>)
            .transpose()
            .map_err(|e| StoreError::Corrupt(format!("pending sample {}: {}", row.id, e)))?;
        Ok(PendingSample {
            id: row.id,
            device_config_id: row.device_config_id,
            data_type,
            component,
            value: row.value,
            unit: row.unit,
            start_time: row.start_time,
            end_time: row.end_time,
            source_app: row.source_app,
            metadata: row.metadata,
            processed: row.processed,
            arrival_seq: row.arrival_seq,
        })
    }
}

fn encode_value(value: &SampleValue) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(value).map_err(|e| StoreError::Corrupt(e.to_string()))
}

#[async_trait]
impl DeviceRegistry for PgHealthStore {
    async fn find_device_config(&self, id: Uuid) -> Result<Option<DeviceConfig>, StoreError> {
        let row = sqlx::query_as::<_, DeviceConfigRow>(
            r#"
            SELECT id, user_id, platform, is_active, auto_sync_enabled,
                   sync_frequency_minutes, data_types, last_sync_at
            FROM device_configs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(DeviceConfig::try_from).transpose()
    }

    async fn update_last_sync(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query("UPDATE device_configs SET last_sync_at = $1 WHERE id = $2")
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl SampleStore for PgHealthStore {
    async fn find_canonical(
        &self,
        device_config_id: Uuid,
        data_type: CanonicalType,
        start_time: DateTime<Utc>,
    ) -> Result<Option<CanonicalSample>, StoreError> {
        let row = sqlx::query_as::<_, CanonicalSampleRow>(
            r#"
            SELECT id, device_config_id, data_type, value, unit, start_time,
                   end_time, source_app, metadata, synced_at
            FROM canonical_samples
            WHERE device_config_id = $1 AND data_type = $2 AND start_time = $3
            "#,
        )
        .bind(device_config_id)
        .bind(data_type.as_str())
        .bind(start_time)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CanonicalSample::try_from).transpose()
    }

    #[tracing::instrument(
        name = "Insert canonical sample",
        skip(self, sample),
        fields(device_config_id = %sample.device_config_id, data_type = %sample.data_type)
    )]
    async fn insert_canonical(&self, sample: &CanonicalSample) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO canonical_samples (
                id, device_config_id, data_type, value, unit,
                start_time, end_time, source_app, metadata, synced_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(sample.id)
        .bind(sample.device_config_id)
        .bind(sample.data_type.as_str())
        .bind(encode_value(&sample.value)?)
        .bind(&sample.unit)
        .bind(sample.start_time)
        .bind(sample.end_time)
        .bind(&sample.source_app)
        .bind(&sample.metadata)
        .bind(sample.synced_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[tracing::instrument(
        name = "Amend canonical sample",
        skip(self, sample),
        fields(device_config_id = %sample.device_config_id, data_type = %sample.data_type)
    )]
    async fn update_canonical(&self, sample: &CanonicalSample) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE canonical_samples
            SET value = $1, unit = $2, end_time = $3,
                source_app = $4, metadata = $5, synced_at = $6
            WHERE id = $7
            "#,
        )
        .bind(encode_value(&sample.value)?)
        .bind(&sample.unit)
        .bind(sample.end_time)
        .bind(&sample.source_app)
        .bind(&sample.metadata)
        .bind(sample.synced_at)
        .bind(sample.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn latest_canonical(
        &self,
        device_config_id: Uuid,
        data_type: CanonicalType,
    ) -> Result<Option<CanonicalSample>, StoreError> {
        let row = sqlx::query_as::<_, CanonicalSampleRow>(
            r#"
            SELECT id, device_config_id, data_type, value, unit, start_time,
                   end_time, source_app, metadata, synced_at
            FROM canonical_samples
            WHERE device_config_id = $1 AND data_type = $2
            ORDER BY start_time DESC
            LIMIT 1
            "#,
        )
        .bind(device_config_id)
        .bind(data_type.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(CanonicalSample::try_from).transpose()
    }

    async fn data_types_synced_since(
        &self,
        device_config_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<CanonicalType>, StoreError> {
        let rows = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT data_type
            FROM canonical_samples
            WHERE device_config_id = $1 AND synced_at >= $2
            "#,
        )
        .bind(device_config_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|raw| {
                raw.parse()
                    .map_err(|e| StoreError::Corrupt(format!("data type `{}`: {}", raw, e)))
            })
            .collect()
    }

    #[tracing::instrument(
        name = "Stage pending sample",
        skip(self, pending),
        fields(device_config_id = %pending.device_config_id, data_type = %pending.data_type)
    )]
    async fn insert_pending(&self, pending: &NewPendingSample) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO pending_samples (
                id, device_config_id, data_type, component, value, unit,
                start_time, end_time, source_app, metadata, processed
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, FALSE)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(pending.device_config_id)
        .bind(pending.data_type.as_str())
        .bind(pending.component.map(|c| c.as_str()))
        .bind(pending.value)
        .bind(&pending.unit)
        .bind(pending.start_time)
        .bind(pending.end_time)
        .bind(&pending.source_app)
        .bind(&pending.metadata)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn unprocessed_pending(
        &self,
        device_config_id: Uuid,
        limit: i64,
    ) -> Result<Vec<PendingSample>, StoreError> {
        let rows = sqlx::query_as::<_, PendingSampleRow>(
            r#"
            SELECT id, device_config_id, data_type, component, value, unit,
                   start_time, end_time, source_app, metadata, processed, arrival_seq
            FROM pending_samples
            WHERE device_config_id = $1 AND processed = FALSE
            ORDER BY arrival_seq ASC
            LIMIT $2
            "#,
        )
        .bind(device_config_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PendingSample::try_from).collect()
    }

    async fn mark_pending_processed(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE pending_samples SET processed = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn count_unprocessed(&self, device_config_id: Uuid) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM pending_samples WHERE device_config_id = $1 AND processed = FALSE",
        )
        .bind(device_config_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn device_ids_with_unprocessed(&self) -> Result<Vec<Uuid>, StoreError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT DISTINCT device_config_id FROM pending_samples WHERE processed = FALSE",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::ingestion::catalog::{map_vendor_type, SupportedType};
use crate::ingestion::error::{IngestionError, ItemError};
use crate::ingestion::normalize::normalize;
use crate::ingestion::validation::{validate, ValidatedSample, ValidationFailure};
use crate::models::device::DeviceConfig;
use crate::models::sample::{
    CanonicalSample, CanonicalType, NewPendingSample, PendingSample, SampleValue,
};
use crate::models::sync::{InferredPermissionState, LatestValue, RawSample, SyncStatus};
use crate::store::{DeviceRegistry, SampleStore, StoreError};

/// Upper bound on pending samples applied by a single drain. The sole
/// backpressure mechanism: repeated drains converge on an arbitrarily deep
/// buffer while each invocation stays bounded.
pub const DRAIN_BATCH_LIMIT: i64 = 1_000;

/// Trailing window of write activity that counts as an inferred grant.
const PERMISSION_WINDOW_DAYS: i64 = 7;

/// Whether an upsert created a new record or amended an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Inserted,
    Updated,
}

/// Outcome of one batch (synchronous, staged, or drained): how many items
/// were applied and, verbatim, why each failed item was skipped.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub processed_count: usize,
    pub errors: Vec<String>,
}

/// The ingestion core. Stateless per invocation; every call resolves its own
/// device scope and shares nothing across calls beyond the injected stores,
/// so devices and users process concurrently without coordination.
#[derive(Clone)]
pub struct IngestionService {
    devices: Arc<dyn DeviceRegistry>,
    store: Arc<dyn SampleStore>,
}

impl IngestionService {
    pub fn new(devices: Arc<dyn DeviceRegistry>, store: Arc<dyn SampleStore>) -> Self {
        Self { devices, store }
    }

    /// Resolve a device config for a write batch. Any failure here is fatal
    /// for the whole batch, before a single item is touched.
    async fn authorize_for_ingest(
        &self,
        user_id: Uuid,
        device_config_id: Uuid,
        platform: Option<&str>,
    ) -> Result<DeviceConfig, IngestionError> {
        let config = self.resolve_owned(user_id, device_config_id).await?;
        if let Some(requested) = platform {
            if requested != config.platform {
                return Err(IngestionError::PlatformMismatch {
                    id: device_config_id,
                    expected: config.platform,
                    requested: requested.to_string(),
                });
            }
        }
        if !config.is_active {
            return Err(IngestionError::DeviceInactive(device_config_id));
        }
        Ok(config)
    }

    /// Resolve a device config owned by the caller. Read-only operations stop
    /// here; inactive devices still answer status queries.
    async fn resolve_owned(
        &self,
        user_id: Uuid,
        device_config_id: Uuid,
    ) -> Result<DeviceConfig, IngestionError> {
        let config = self
            .devices
            .find_device_config(device_config_id)
            .await?
            .ok_or(IngestionError::DeviceNotFound(device_config_id))?;
        if config.user_id != user_id {
            return Err(IngestionError::DeviceNotOwned(device_config_id));
        }
        Ok(config)
    }

    /// Synchronous path: validate → normalize → upsert each item in order.
    /// One item's failure is recorded and skipped; the rest still process.
    #[tracing::instrument(
        name = "Ingest sample batch",
        skip(self, samples),
        fields(device_config_id = %device_config_id, batch_size = samples.len())
    )]
    pub async fn ingest_batch(
        &self,
        user_id: Uuid,
        device_config_id: Uuid,
        platform: Option<&str>,
        samples: &[RawSample],
    ) -> Result<BatchOutcome, IngestionError> {
        let config = self
            .authorize_for_ingest(user_id, device_config_id, platform)
            .await?;

        let now = Utc::now();
        let mut outcome = BatchOutcome::default();
        for (index, raw) in samples.iter().enumerate() {
            match self.ingest_one(config.id, raw, now).await {
                Ok(applied) => {
                    tracing::debug!("item {} applied: {:?}", index, applied);
                    outcome.processed_count += 1;
                }
                Err(e) => {
                    tracing::warn!("item {} skipped: {}", index, e);
                    outcome.errors.push(format!("item {}: {}", index, e));
                }
            }
        }

        if outcome.processed_count > 0 {
            self.touch_last_sync(config.id, now).await;
        }
        tracing::info!(
            "batch done: {} applied, {} skipped",
            outcome.processed_count,
            outcome.errors.len()
        );
        Ok(outcome)
    }

    /// Buffered path: validate and map each item now, stage it as a pending
    /// sample, defer normalize→upsert to a later drain.
    #[tracing::instrument(
        name = "Stage sample batch",
        skip(self, samples),
        fields(device_config_id = %device_config_id, batch_size = samples.len())
    )]
    pub async fn stage_batch(
        &self,
        user_id: Uuid,
        device_config_id: Uuid,
        platform: Option<&str>,
        samples: &[RawSample],
    ) -> Result<BatchOutcome, IngestionError> {
        let config = self
            .authorize_for_ingest(user_id, device_config_id, platform)
            .await?;

        let now = Utc::now();
        let mut outcome = BatchOutcome::default();
        for (index, raw) in samples.iter().enumerate() {
            match self.stage_one(config.id, raw, now).await {
                Ok(()) => outcome.processed_count += 1,
                Err(e) => {
                    tracing::warn!("item {} not staged: {}", index, e);
                    outcome.errors.push(format!("item {}: {}", index, e));
                }
            }
        }
        Ok(outcome)
    }

    /// Drain up to [`DRAIN_BATCH_LIMIT`] pending samples for a device owned
    /// by the caller.
    pub async fn drain_pending(
        &self,
        user_id: Uuid,
        device_config_id: Uuid,
    ) -> Result<BatchOutcome, IngestionError> {
        let config = self.resolve_owned(user_id, device_config_id).await?;
        self.drain_for_config(&config).await
    }

    /// One bounded reconciler pass. Selects unprocessed pending samples
    /// oldest-arrival-first and applies each through the same upsert used by
    /// the synchronous path, flipping `processed` only on success. A failed
    /// item stays unprocessed for a future drain and never blocks later
    /// items in the same pass.
    #[tracing::instrument(
        name = "Drain pending samples",
        skip(self, config),
        fields(device_config_id = %config.id)
    )]
    pub async fn drain_for_config(
        &self,
        config: &DeviceConfig,
    ) -> Result<BatchOutcome, IngestionError> {
        let pending = self
            .store
            .unprocessed_pending(config.id, DRAIN_BATCH_LIMIT)
            .await?;
        tracing::info!("draining {} pending samples", pending.len());

        let now = Utc::now();
        let mut outcome = BatchOutcome::default();
        for item in &pending {
            match self.apply_pending(item, now).await {
                Ok(_) => outcome.processed_count += 1,
                Err(e) => {
                    tracing::warn!("pending sample {} left unprocessed: {}", item.id, e);
                    outcome.errors.push(format!("pending {}: {}", item.id, e));
                }
            }
        }

        if outcome.processed_count > 0 {
            self.touch_last_sync(config.id, now).await;
        }
        Ok(outcome)
    }

    /// Per-device sync view for status checks.
    pub async fn sync_status(
        &self,
        user_id: Uuid,
        device_config_id: Uuid,
    ) -> Result<SyncStatus, IngestionError> {
        let config = self.resolve_owned(user_id, device_config_id).await?;
        let pending_count = self.store.count_unprocessed(config.id).await?;
        Ok(SyncStatus {
            is_real_time_enabled: config.sync_settings.auto_sync_enabled,
            last_sync_at: config.last_sync_at,
            sync_frequency_minutes: config.sync_settings.sync_frequency_minutes,
            pending_count,
        })
    }

    /// Heuristic permission view: a type counts as granted when at least one
    /// of its samples synced within the trailing seven days, every other
    /// subscribed type as denied. No platform permission API exists in this
    /// design, so recent write activity is the only available signal.
    pub async fn inferred_permissions(
        &self,
        user_id: Uuid,
        device_config_id: Uuid,
    ) -> Result<InferredPermissionState, IngestionError> {
        let config = self.resolve_owned(user_id, device_config_id).await?;
        let since = Utc::now() - Duration::days(PERMISSION_WINDOW_DAYS);
        let mut granted = self.store.data_types_synced_since(config.id, since).await?;
        granted.sort();
        granted.dedup();
        let denied = config
            .sync_settings
            .data_types
            .iter()
            .copied()
            .filter(|data_type| !granted.contains(data_type))
            .collect();
        Ok(InferredPermissionState { granted, denied })
    }

    /// Most recent stored sample per requested type, keyed by start time.
    /// Types with no stored samples are absent from the map.
    pub async fn latest_values(
        &self,
        user_id: Uuid,
        device_config_id: Uuid,
        types: &[CanonicalType],
    ) -> Result<HashMap<CanonicalType, LatestValue>, IngestionError> {
        let config = self.resolve_owned(user_id, device_config_id).await?;
        let mut latest = HashMap::new();
        for &data_type in types {
            if let Some(sample) = self.store.latest_canonical(config.id, data_type).await? {
                latest.insert(
                    data_type,
                    LatestValue {
                        value: sample.value,
                        unit: sample.unit,
                        timestamp: sample.start_time,
                        source_app: sample.source_app,
                    },
                );
            }
        }
        Ok(latest)
    }

    /// Dedup/upsert step shared by both paths. Keyed by
    /// (device_config_id, data_type, start_time): absent key inserts, present
    /// key amends in place, treating a later delivery of the same logical
    /// sample as a vendor-side correction rather than an error. Concurrent
    /// writers on the same key resolve last-write-wins on `synced_at`; no
    /// extra locking.
    #[allow(clippy::too_many_arguments)]
    async fn apply(
        &self,
        device_config_id: Uuid,
        data_type: CanonicalType,
        start_time: DateTime<Utc>,
        value: SampleValue,
        unit: &str,
        end_time: Option<DateTime<Utc>>,
        source_app: &str,
        metadata: serde_json::Value,
        synced_at: DateTime<Utc>,
    ) -> Result<Applied, StoreError> {
        match self
            .store
            .find_canonical(device_config_id, data_type, start_time)
            .await?
        {
            None => {
                let sample = CanonicalSample {
                    id: Uuid::new_v4(),
                    device_config_id,
                    data_type,
                    value,
                    unit: unit.to_string(),
                    start_time,
                    end_time,
                    source_app: source_app.to_string(),
                    metadata,
                    synced_at,
                };
                self.store.insert_canonical(&sample).await?;
                Ok(Applied::Inserted)
            }
            Some(existing) => {
                let amended = CanonicalSample {
                    value: value.merged_into(&existing.value),
                    unit: unit.to_string(),
                    end_time,
                    source_app: source_app.to_string(),
                    metadata,
                    synced_at,
                    ..existing
                };
                self.store.update_canonical(&amended).await?;
                Ok(Applied::Updated)
            }
        }
    }

    async fn ingest_one(
        &self,
        device_config_id: Uuid,
        raw: &RawSample,
        now: DateTime<Utc>,
    ) -> Result<Applied, ItemError> {
        let (mapping, validated) = check_item(raw, now)?;
        let (value, unit) = normalize(mapping.canonical_type, mapping.component, validated.value);
        let end_time =
            (validated.end_time != validated.start_time).then_some(validated.end_time);
        let applied = self
            .apply(
                device_config_id,
                mapping.canonical_type,
                validated.start_time,
                value,
                unit,
                end_time,
                &source_app(raw),
                build_metadata(mapping, raw),
                now,
            )
            .await?;
        Ok(applied)
    }

    async fn stage_one(
        &self,
        device_config_id: Uuid,
        raw: &RawSample,
        now: DateTime<Utc>,
    ) -> Result<(), ItemError> {
        let (mapping, validated) = check_item(raw, now)?;
        let pending = NewPendingSample {
            device_config_id,
            data_type: mapping.canonical_type,
            component: mapping.component,
            value: validated.value,
            unit: raw.unit.clone(),
            start_time: validated.start_time,
            end_time: (validated.end_time != validated.start_time).then_some(validated.end_time),
            source_app: source_app(raw),
            metadata: build_metadata(mapping, raw),
        };
        self.store.insert_pending(&pending).await?;
        Ok(())
    }

    async fn apply_pending(
        &self,
        item: &PendingSample,
        now: DateTime<Utc>,
    ) -> Result<Applied, StoreError> {
        let (value, unit) = normalize(item.data_type, item.component, item.value);
        let applied = self
            .apply(
                item.device_config_id,
                item.data_type,
                item.start_time,
                value,
                unit,
                item.end_time,
                &item.source_app,
                item.metadata.clone(),
                now,
            )
            .await?;
        self.store.mark_pending_processed(item.id).await?;
        Ok(applied)
    }

    async fn touch_last_sync(&self, device_config_id: Uuid, at: DateTime<Utc>) {
        if let Err(e) = self.devices.update_last_sync(device_config_id, at).await {
            tracing::warn!(
                "failed to update last-sync time for device {}: {}",
                device_config_id,
                e
            );
        }
    }
}

/// Map and validate one raw item; the first failed rule wins.
fn check_item(
    raw: &RawSample,
    now: DateTime<Utc>,
) -> Result<(&'static SupportedType, ValidatedSample), ItemError> {
    let vendor_type = raw
        .sample_type
        .as_deref()
        .ok_or(ItemError::Validation(ValidationFailure::MissingField("type")))?;
    let mapping = map_vendor_type(vendor_type)
        .ok_or_else(|| ItemError::UnsupportedType(vendor_type.to_string()))?;
    let validated = validate(mapping, raw, now)?;
    Ok((mapping, validated))
}

fn source_app(raw: &RawSample) -> String {
    raw.source_name
        .clone()
        .unwrap_or_else(|| "unknown".to_string())
}

/// Vendor provenance carried on every canonical sample: the original type
/// identifier and unit, the app version and the device descriptor.
fn build_metadata(mapping: &SupportedType, raw: &RawSample) -> serde_json::Value {
    let mut metadata = serde_json::Map::new();
    metadata.insert("original_type".to_string(), json!(mapping.vendor_type));
    if let Some(unit) = &raw.unit {
        metadata.insert("original_unit".to_string(), json!(unit));
    }
    if let Some(version) = &raw.source_version {
        metadata.insert("source_version".to_string(), json!(version));
    }
    if let Some(device) = &raw.device {
        metadata.insert("device".to_string(), device.clone());
    }
    if let Some(extra) = &raw.metadata {
        metadata.insert("vendor_metadata".to_string(), extra.clone());
    }
    serde_json::Value::Object(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::device::SyncSettings;
    use crate::store::memory::InMemoryHealthStore;

    fn test_device(user_id: Uuid) -> DeviceConfig {
        DeviceConfig {
            id: Uuid::new_v4(),
            user_id,
            platform: "apple_health".to_string(),
            is_active: true,
            sync_settings: SyncSettings::default(),
            last_sync_at: None,
        }
    }

    fn service_with_device() -> (IngestionService, Arc<InMemoryHealthStore>, Uuid, DeviceConfig) {
        let store = Arc::new(InMemoryHealthStore::new());
        let user_id = Uuid::new_v4();
        let config = test_device(user_id);
        store.add_device_config(config.clone());
        let service = IngestionService::new(store.clone(), store.clone());
        (service, store, user_id, config)
    }

    fn minutes_ago(minutes: i64) -> DateTime<Utc> {
        Utc::now() - Duration::minutes(minutes)
    }

    fn raw_at(vendor_type: &str, value: f64, start: DateTime<Utc>, end: DateTime<Utc>) -> RawSample {
        RawSample {
            sample_type: Some(vendor_type.to_string()),
            value: Some(value),
            unit: None,
            start_date: Some(start.to_rfc3339()),
            end_date: Some(end.to_rfc3339()),
            source_name: Some("Vital Watch".to_string()),
            source_version: Some("3.2.1".to_string()),
            device: None,
            metadata: None,
        }
    }

    fn raw(vendor_type: &str, value: f64) -> RawSample {
        let at = minutes_ago(10);
        raw_at(vendor_type, value, at, at)
    }

    #[tokio::test]
    async fn duplicate_delivery_amends_in_place() {
        let (service, store, user_id, config) = service_with_device();
        let at = minutes_ago(30);

        let first = service
            .ingest_batch(user_id, config.id, None, &[raw_at("heart_rate", 72.0, at, at)])
            .await
            .unwrap();
        assert_eq!(first.processed_count, 1);

        let second = service
            .ingest_batch(user_id, config.id, None, &[raw_at("heart_rate", 75.0, at, at)])
            .await
            .unwrap();
        assert_eq!(second.processed_count, 1);
        assert!(second.errors.is_empty());

        let samples = store.canonical_samples(config.id);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value, SampleValue::Scalar(75.0));
        assert_eq!(samples[0].unit, "bpm");
        // start == end, so no end time is stored
        assert!(samples[0].end_time.is_none());
    }

    #[tokio::test]
    async fn identical_redelivery_keeps_exactly_one_record() {
        let (service, store, user_id, config) = service_with_device();
        let at = minutes_ago(15);
        let sample = raw_at("steps", 4200.0, at, at);

        for _ in 0..2 {
            let outcome = service
                .ingest_batch(user_id, config.id, None, &[sample.clone()])
                .await
                .unwrap();
            assert_eq!(outcome.processed_count, 1);
        }
        assert_eq!(store.sample_count(), 1);
    }

    #[tokio::test]
    async fn one_invalid_item_does_not_block_the_rest() {
        let (service, store, user_id, config) = service_with_device();
        let start = minutes_ago(20);
        let batch = [
            raw_at("heart_rate", 70.0, start, start),
            // end precedes start
            raw_at("steps", 900.0, start, start - Duration::minutes(5)),
            raw_at("weight", 81.5, minutes_ago(19), minutes_ago(19)),
        ];

        let outcome = service
            .ingest_batch(user_id, config.id, None, &batch)
            .await
            .unwrap();
        assert_eq!(outcome.processed_count, 2);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].starts_with("item 1:"));
        assert!(outcome.errors[0].contains("precedes"));
        assert_eq!(store.sample_count(), 2);
    }

    #[tokio::test]
    async fn unsupported_vendor_type_is_recorded_and_skipped() {
        let (service, _, user_id, config) = service_with_device();
        let outcome = service
            .ingest_batch(
                user_id,
                config.id,
                None,
                &[raw("vo2_max", 48.0), raw("heart_rate", 64.0)],
            )
            .await
            .unwrap();
        assert_eq!(outcome.processed_count, 1);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].contains("unsupported vendor type `vo2_max`"));
    }

    #[tokio::test]
    async fn pressure_components_merge_into_one_structured_sample() {
        let (service, store, user_id, config) = service_with_device();
        let at = minutes_ago(45);
        let batch = [
            raw_at("blood_pressure_systolic", 121.0, at, at),
            raw_at("blood_pressure_diastolic", 79.0, at, at),
        ];

        let outcome = service
            .ingest_batch(user_id, config.id, None, &batch)
            .await
            .unwrap();
        assert_eq!(outcome.processed_count, 2);

        let samples = store.canonical_samples(config.id);
        assert_eq!(samples.len(), 1);
        assert_eq!(
            samples[0].value,
            SampleValue::Pressure {
                systolic: Some(121.0),
                diastolic: Some(79.0),
            }
        );
        assert_eq!(samples[0].unit, "mmHg");
    }

    #[tokio::test]
    async fn sleep_seconds_are_stored_as_minutes() {
        let (service, store, user_id, config) = service_with_device();
        let end = minutes_ago(5);
        let start = end - Duration::seconds(27_000);

        service
            .ingest_batch(user_id, config.id, None, &[raw_at("sleep", 27_000.0, start, end)])
            .await
            .unwrap();

        let samples = store.canonical_samples(config.id);
        assert_eq!(samples[0].value, SampleValue::Scalar(450.0));
        assert_eq!(samples[0].unit, "minutes");
        assert_eq!(samples[0].end_time, Some(end));
    }

    #[tokio::test]
    async fn config_errors_fail_the_whole_batch() {
        let (service, store, user_id, config) = service_with_device();

        let missing = service
            .ingest_batch(user_id, Uuid::new_v4(), None, &[raw("steps", 1.0)])
            .await;
        assert!(matches!(missing, Err(IngestionError::DeviceNotFound(_))));

        let stranger = Uuid::new_v4();
        let foreign = service
            .ingest_batch(stranger, config.id, None, &[raw("steps", 1.0)])
            .await;
        assert!(matches!(foreign, Err(IngestionError::DeviceNotOwned(_))));

        let mismatched = service
            .ingest_batch(user_id, config.id, Some("fitbit"), &[raw("steps", 1.0)])
            .await;
        assert!(matches!(
            mismatched,
            Err(IngestionError::PlatformMismatch { .. })
        ));

        let mut inactive = config.clone();
        inactive.is_active = false;
        store.add_device_config(inactive);
        let rejected = service
            .ingest_batch(user_id, config.id, None, &[raw("steps", 1.0)])
            .await;
        assert!(matches!(rejected, Err(IngestionError::DeviceInactive(_))));

        // Nothing was applied by any of the failed batches
        assert_eq!(store.sample_count(), 0);
    }

    #[tokio::test]
    async fn drain_is_bounded_and_converges_across_calls() {
        let (service, store, user_id, config) = service_with_device();
        let base = minutes_ago(2_000);
        let batch: Vec<RawSample> = (0..1_200i64)
            .map(|i| {
                let at = base + Duration::minutes(i);
                raw_at("steps", 100.0 + i as f64, at, at)
            })
            .collect();

        let staged = service
            .stage_batch(user_id, config.id, None, &batch)
            .await
            .unwrap();
        assert_eq!(staged.processed_count, 1_200);
        assert_eq!(store.count_unprocessed(config.id).await.unwrap(), 1_200);

        let first = service.drain_pending(user_id, config.id).await.unwrap();
        assert_eq!(first.processed_count, 1_000);
        assert_eq!(store.count_unprocessed(config.id).await.unwrap(), 200);

        let second = service.drain_pending(user_id, config.id).await.unwrap();
        assert_eq!(second.processed_count, 200);
        assert_eq!(store.count_unprocessed(config.id).await.unwrap(), 0);
        assert_eq!(store.sample_count(), 1_200);
    }

    #[tokio::test]
    async fn failed_drain_item_stays_unprocessed_and_retries() {
        let (service, store, user_id, config) = service_with_device();
        let poisoned = minutes_ago(90);
        let batch = [
            raw("heart_rate", 62.0),
            raw_at("weight", 74.0, poisoned, poisoned),
            raw("steps", 5_000.0),
        ];
        service
            .stage_batch(user_id, config.id, None, &batch)
            .await
            .unwrap();

        store.fail_writes_at(poisoned);
        let first = service.drain_pending(user_id, config.id).await.unwrap();
        assert_eq!(first.processed_count, 2);
        assert_eq!(first.errors.len(), 1);
        assert_eq!(store.count_unprocessed(config.id).await.unwrap(), 1);

        store.clear_write_failures();
        let second = service.drain_pending(user_id, config.id).await.unwrap();
        assert_eq!(second.processed_count, 1);
        assert!(second.errors.is_empty());
        assert_eq!(store.count_unprocessed(config.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn applying_samples_refreshes_last_sync() {
        let (service, store, user_id, config) = service_with_device();
        assert!(store.device_config(config.id).unwrap().last_sync_at.is_none());

        service
            .ingest_batch(user_id, config.id, None, &[raw("heart_rate", 58.0)])
            .await
            .unwrap();
        assert!(store.device_config(config.id).unwrap().last_sync_at.is_some());
    }

    #[tokio::test]
    async fn sync_status_reports_live_pending_count() {
        let (service, _, user_id, config) = service_with_device();
        service
            .stage_batch(
                user_id,
                config.id,
                None,
                &[raw("steps", 10.0), raw("steps", 20.0)],
            )
            .await
            .unwrap();

        let status = service.sync_status(user_id, config.id).await.unwrap();
        assert_eq!(status.pending_count, 2);
        assert!(status.is_real_time_enabled);
        assert_eq!(status.sync_frequency_minutes, 60);
    }

    #[tokio::test]
    async fn permissions_are_inferred_from_recent_writes() {
        let (service, _, user_id, config) = service_with_device();
        service
            .ingest_batch(user_id, config.id, None, &[raw("heart_rate", 66.0)])
            .await
            .unwrap();

        let permissions = service
            .inferred_permissions(user_id, config.id)
            .await
            .unwrap();
        assert_eq!(permissions.granted, vec![CanonicalType::HeartRate]);
        assert!(permissions.denied.contains(&CanonicalType::Steps));
        assert!(!permissions.denied.contains(&CanonicalType::HeartRate));
    }

    #[tokio::test]
    async fn latest_values_omit_types_with_no_samples() {
        let (service, _, user_id, config) = service_with_device();
        let older = minutes_ago(120);
        let newer = minutes_ago(60);
        service
            .ingest_batch(
                user_id,
                config.id,
                None,
                &[
                    raw_at("heart_rate", 61.0, older, older),
                    raw_at("heart_rate", 67.0, newer, newer),
                ],
            )
            .await
            .unwrap();

        let latest = service
            .latest_values(
                user_id,
                config.id,
                &[CanonicalType::HeartRate, CanonicalType::Steps],
            )
            .await
            .unwrap();
        assert_eq!(latest.len(), 1);
        let heart_rate = latest.get(&CanonicalType::HeartRate).unwrap();
        assert_eq!(heart_rate.value, SampleValue::Scalar(67.0));
        assert_eq!(heart_rate.timestamp, newer);
        assert!(!latest.contains_key(&CanonicalType::Steps));
    }
}

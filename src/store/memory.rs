use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::device::DeviceConfig;
use crate::models::sample::{CanonicalSample, CanonicalType, NewPendingSample, PendingSample};
use crate::store::{DeviceRegistry, SampleStore, StoreError};

/// In-memory implementation of both store traits. The test double the
/// ingestion core is written against; also handy for local experimentation
/// without a database.
#[derive(Default)]
pub struct InMemoryHealthStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    devices: HashMap<Uuid, DeviceConfig>,
    samples: HashMap<(Uuid, CanonicalType, DateTime<Utc>), CanonicalSample>,
    pending: Vec<PendingSample>,
    next_seq: i64,
    failing_starts: HashSet<DateTime<Utc>>,
}

impl InMemoryHealthStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("in-memory store mutex poisoned")
    }

    pub fn add_device_config(&self, config: DeviceConfig) {
        self.locked().devices.insert(config.id, config);
    }

    pub fn device_config(&self, id: Uuid) -> Option<DeviceConfig> {
        self.locked().devices.get(&id).cloned()
    }

    /// All canonical samples for a device, ordered by (type, start time).
    pub fn canonical_samples(&self, device_config_id: Uuid) -> Vec<CanonicalSample> {
        let inner = self.locked();
        let mut samples: Vec<CanonicalSample> = inner
            .samples
            .values()
            .filter(|s| s.device_config_id == device_config_id)
            .cloned()
            .collect();
        samples.sort_by_key(|s| (s.data_type, s.start_time));
        samples
    }

    pub fn sample_count(&self) -> usize {
        self.locked().samples.len()
    }

    /// Make every canonical write at this start time fail with a storage
    /// error, simulating a partial store outage.
    pub fn fail_writes_at(&self, start_time: DateTime<Utc>) {
        self.locked().failing_starts.insert(start_time);
    }

    pub fn clear_write_failures(&self) {
        self.locked().failing_starts.clear();
    }

    fn check_writable(inner: &Inner, start_time: DateTime<Utc>) -> Result<(), StoreError> {
        if inner.failing_starts.contains(&start_time) {
            return Err(StoreError::Unavailable(format!(
                "simulated write failure at {}",
                start_time
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceRegistry for InMemoryHealthStore {
    async fn find_device_config(&self, id: Uuid) -> Result<Option<DeviceConfig>, StoreError> {
        Ok(self.locked().devices.get(&id).cloned())
    }

    async fn update_last_sync(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut inner = self.locked();
        match inner.devices.get_mut(&id) {
            Some(config) => {
                config.last_sync_at = Some(at);
                Ok(())
            }
            None => Err(StoreError::Unavailable(format!(
                "device config {} not present",
                id
            ))),
        }
    }
}

#[async_trait]
impl SampleStore for InMemoryHealthStore {
    async fn find_canonical(
        &self,
        device_config_id: Uuid,
        data_type: CanonicalType,
        start_time: DateTime<Utc>,
    ) -> Result<Option<CanonicalSample>, StoreError> {
        let inner = self.locked();
        Ok(inner
            .samples
            .get(&(device_config_id, data_type, start_time))
            .cloned())
    }

    async fn insert_canonical(&self, sample: &CanonicalSample) -> Result<(), StoreError> {
        let mut inner = self.locked();
        Self::check_writable(&inner, sample.start_time)?;
        inner.samples.insert(
            (sample.device_config_id, sample.data_type, sample.start_time),
            sample.clone(),
        );
        Ok(())
    }

    async fn update_canonical(&self, sample: &CanonicalSample) -> Result<(), StoreError> {
        let mut inner = self.locked();
        Self::check_writable(&inner, sample.start_time)?;
        inner.samples.insert(
            (sample.device_config_id, sample.data_type, sample.start_time),
            sample.clone(),
        );
        Ok(())
    }

    async fn latest_canonical(
        &self,
        device_config_id: Uuid,
        data_type: CanonicalType,
    ) -> Result<Option<CanonicalSample>, StoreError> {
        let inner = self.locked();
        Ok(inner
            .samples
            .values()
            .filter(|s| s.device_config_id == device_config_id && s.data_type == data_type)
            .max_by_key(|s| s.start_time)
            .cloned())
    }

    async fn data_types_synced_since(
        &self,
        device_config_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<CanonicalType>, StoreError> {
        let inner = self.locked();
        let mut types: Vec<CanonicalType> = inner
            .samples
            .values()
            .filter(|s| s.device_config_id == device_config_id && s.synced_at >= since)
            .map(|s| s.data_type)
            .collect();
        types.sort();
        types.dedup();
        Ok(types)
    }

    async fn insert_pending(&self, pending: &NewPendingSample) -> Result<(), StoreError> {
        let mut inner = self.locked();
        inner.next_seq += 1;
        let arrival_seq = inner.next_seq;
        inner.pending.push(PendingSample {
            id: Uuid::new_v4(),
            device_config_id: pending.device_config_id,
            data_type: pending.data_type,
            component: pending.component,
            value: pending.value,
            unit: pending.unit.clone(),
            start_time: pending.start_time,
            end_time: pending.end_time,
            source_app: pending.source_app.clone(),
            metadata: pending.metadata.clone(),
            processed: false,
            arrival_seq,
        });
        Ok(())
    }

    async fn unprocessed_pending(
        &self,
        device_config_id: Uuid,
        limit: i64,
    ) -> Result<Vec<PendingSample>, StoreError> {
        let inner = self.locked();
        let mut items: Vec<PendingSample> = inner
            .pending
            .iter()
            .filter(|p| p.device_config_id == device_config_id && !p.processed)
            .cloned()
            .collect();
        items.sort_by_key(|p| p.arrival_seq);
        items.truncate(limit as usize);
        Ok(items)
    }

    async fn mark_pending_processed(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.locked();
        match inner.pending.iter_mut().find(|p| p.id == id) {
            Some(item) => {
                item.processed = true;
                Ok(())
            }
            None => Err(StoreError::Unavailable(format!(
                "pending sample {} not present",
                id
            ))),
        }
    }

    async fn count_unprocessed(&self, device_config_id: Uuid) -> Result<i64, StoreError> {
        let inner = self.locked();
        Ok(inner
            .pending
            .iter()
            .filter(|p| p.device_config_id == device_config_id && !p.processed)
            .count() as i64)
    }

    async fn device_ids_with_unprocessed(&self) -> Result<Vec<Uuid>, StoreError> {
        let inner = self.locked();
        let mut ids: Vec<Uuid> = inner
            .pending
            .iter()
            .filter(|p| !p.processed)
            .map(|p| p.device_config_id)
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }
}

use std::error::Error;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::ingestion::IngestionService;
use crate::store::{DeviceRegistry, SampleStore};

/// Background reconciler loop: once a minute, every device with unprocessed
/// pending samples gets one bounded drain pass. Devices that are inactive or
/// have auto-sync disabled are skipped; their buffers wait for an explicit
/// drain request.
pub struct DrainScheduler {
    scheduler: Arc<Mutex<JobScheduler>>,
    devices: Arc<dyn DeviceRegistry>,
    store: Arc<dyn SampleStore>,
}

impl DrainScheduler {
    pub async fn new(
        devices: Arc<dyn DeviceRegistry>,
        store: Arc<dyn SampleStore>,
    ) -> Result<Self, Box<dyn Error>> {
        let scheduler = JobScheduler::new().await?;
        Ok(Self {
            scheduler: Arc::new(Mutex::new(scheduler)),
            devices,
            store,
        })
    }

    pub async fn start(&self) -> Result<(), Box<dyn Error>> {
        let scheduler = self.scheduler.lock().await;

        let devices = self.devices.clone();
        let store = self.store.clone();
        let drain_job = Job::new_async("0 * * * * *", move |_uuid, _l| {
            let devices = devices.clone();
            let store = store.clone();
            Box::pin(async move {
                run_drain_cycle(devices, store).await;
            })
        })?;
        scheduler.add(drain_job).await?;

        scheduler.start().await?;
        tracing::info!("Drain scheduler started (every minute)");
        Ok(())
    }

    pub async fn stop(&self) -> Result<(), Box<dyn Error>> {
        let mut scheduler = self.scheduler.lock().await;
        scheduler.shutdown().await?;
        tracing::info!("Drain scheduler stopped");
        Ok(())
    }
}

async fn run_drain_cycle(devices: Arc<dyn DeviceRegistry>, store: Arc<dyn SampleStore>) {
    let service = IngestionService::new(devices.clone(), store.clone());

    let device_ids = match store.device_ids_with_unprocessed().await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::error!("Failed to list devices with pending samples: {}", e);
            return;
        }
    };
    if device_ids.is_empty() {
        return;
    }
    tracing::info!("Drain cycle: {} device(s) with pending samples", device_ids.len());

    for device_id in device_ids {
        let config = match devices.find_device_config(device_id).await {
            Ok(Some(config)) => config,
            Ok(None) => {
                tracing::warn!("Pending samples reference unknown device config {}", device_id);
                continue;
            }
            Err(e) => {
                tracing::error!("Failed to load device config {}: {}", device_id, e);
                continue;
            }
        };
        if !config.is_active || !config.sync_settings.auto_sync_enabled {
            continue;
        }

        match service.drain_for_config(&config).await {
            Ok(outcome) => {
                tracing::info!(
                    "Drained device {}: {} applied, {} failed",
                    device_id,
                    outcome.processed_count,
                    outcome.errors.len()
                );
            }
            Err(e) => {
                tracing::error!("Drain failed for device {}: {}", device_id, e);
            }
        }
    }
}

//! Repository over a `LocalDurableStore` with simulated network latency.
//!
//! # Invariants
//! - Every operation sleeps for the configured delay before touching storage.
//! - Mutations are read-modify-write of the whole collection.
//! - New records are prepended; ids are unique within the collection.
//! - A failed validation leaves the stored collection untouched.

use crate::config::StoreConfig;
use crate::model::patch::RecordPatch;
use crate::model::record::{now_timestamp, Record, RecordId};
use crate::model::schema::RecordSchema;
use crate::repo::{RecordFilter, RecordRepository, RepoResult};
use crate::storage::LocalDurableStore;
use log::{debug, info, warn};
use serde_json::Value;
use std::time::Duration;

/// Local repository borrowing the durable store it persists into.
pub struct LocalRecordRepository<'store> {
    store: &'store LocalDurableStore,
    schema: RecordSchema,
    delay: Duration,
}

impl<'store> LocalRecordRepository<'store> {
    /// Creates a repository with the default simulated delay.
    pub fn new(store: &'store LocalDurableStore, schema: RecordSchema) -> Self {
        Self {
            store,
            schema,
            delay: StoreConfig::default().simulated_delay(),
        }
    }

    pub fn from_config(
        store: &'store LocalDurableStore,
        schema: RecordSchema,
        config: &StoreConfig,
    ) -> Self {
        Self::new(store, schema).with_delay(config.simulated_delay())
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    async fn simulate_latency(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

impl RecordRepository for LocalRecordRepository<'_> {
    async fn list(&self) -> RepoResult<Vec<Record>> {
        self.simulate_latency().await;
        let records = self.store.read()?;
        debug!(
            "event=record_list module=repo status=ok key={} count={}",
            self.store.key(),
            records.len()
        );
        Ok(records)
    }

    async fn get_by_id(&self, id: &RecordId) -> RepoResult<Option<Record>> {
        self.simulate_latency().await;
        Ok(self
            .store
            .read()?
            .into_iter()
            .find(|record| &record.id == id))
    }

    async fn create(&self, payload: &Value) -> RepoResult<Record> {
        self.simulate_latency().await;
        let mut record = match self.schema.build_record(payload) {
            Ok(record) => record,
            Err(err) => {
                warn!(
                    "event=record_create module=repo status=rejected key={} error={}",
                    self.store.key(),
                    err
                );
                return Err(err.into());
            }
        };

        let mut records = self.store.read()?;
        while records.iter().any(|existing| existing.id == record.id) {
            record.id = RecordId::generate();
        }
        records.insert(0, record.clone());
        self.store.write(&records)?;

        info!(
            "event=record_create module=repo status=ok key={} id={} count={}",
            self.store.key(),
            record.id,
            records.len()
        );
        Ok(record)
    }

    async fn update(&self, id: &RecordId, patch: &RecordPatch) -> RepoResult<Option<Record>> {
        self.simulate_latency().await;
        let mut records = self.store.read()?;
        let Some(existing) = records.iter_mut().find(|record| &record.id == id) else {
            debug!(
                "event=record_update module=repo status=not_found key={} id={}",
                self.store.key(),
                id
            );
            return Ok(None);
        };

        patch.apply_to(existing);
        existing.updated_at = Some(now_timestamp());
        let updated = existing.clone();
        self.store.write(&records)?;

        info!(
            "event=record_update module=repo status=ok key={} id={}",
            self.store.key(),
            id
        );
        Ok(Some(updated))
    }

    async fn delete(&self, id: &RecordId) -> RepoResult<bool> {
        self.simulate_latency().await;
        let mut records = self.store.read()?;
        let Some(index) = records.iter().position(|record| &record.id == id) else {
            return Ok(false);
        };

        records.remove(index);
        self.store.write(&records)?;

        info!(
            "event=record_delete module=repo status=ok key={} id={} count={}",
            self.store.key(),
            id,
            records.len()
        );
        Ok(true)
    }

    async fn filter(&self, filter: &RecordFilter) -> RepoResult<Vec<Record>> {
        self.simulate_latency().await;
        if filter.normalized_query().is_none() {
            return Ok(Vec::new());
        }

        Ok(self
            .store
            .read()?
            .into_iter()
            .filter(|record| filter.matches(record, &self.schema))
            .collect())
    }
}

//! In-memory evidence store for tests and rehearsal runs.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::store::EvidenceStore;
use crate::error::{CaselockError, Result};
use crate::evidence::EvidenceRecord;

#[derive(Default)]
pub struct InMemoryEvidenceStore {
    objects: RwLock<BTreeMap<String, EvidenceRecord>>,
}

impl InMemoryEvidenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, address: &str) -> Option<EvidenceRecord> {
        self.objects.read().get(address).cloned()
    }

    /// Addresses under `prefix`, in key order.
    pub fn list(&self, prefix: &str) -> Vec<String> {
        self.objects
            .read()
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

#[async_trait]
impl EvidenceStore for InMemoryEvidenceStore {
    async fn put(&self, record: &EvidenceRecord) -> Result<String> {
        let mut objects = self.objects.write();
        if objects.contains_key(&record.address) {
            return Err(CaselockError::StoreFailure {
                address: record.address.clone(),
                message: "address already exists, records are write-once".to_string(),
            });
        }
        objects.insert(record.address.clone(), record.clone());
        Ok(self.locator(&record.address))
    }

    fn locator(&self, address: &str) -> String {
        format!("mem://{address}")
    }
}

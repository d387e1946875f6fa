//! Filesystem-backed evidence store for air-gapped or local evidence lockers.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use super::store::EvidenceStore;
use crate::error::{CaselockError, Result};
use crate::evidence::{EvidenceBody, EvidenceRecord};

/// One file per record under `root`, plus a `.meta.json` sidecar carrying the
/// record's tags so evidence stays attributable without parsing payloads.
pub struct FsEvidenceStore {
    root: PathBuf,
}

impl FsEvidenceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, address: &str) -> PathBuf {
        self.root.join(address)
    }

    async fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let tmp_path = path.with_extension("tmp");

        fs::write(&tmp_path, bytes).await?;

        // Sync in a blocking task so a crash cannot leave a renamed but
        // unsynced object behind.
        let tmp_path_clone = tmp_path.clone();
        let sync_result = tokio::task::spawn_blocking(move || {
            std::fs::File::open(&tmp_path_clone).and_then(|file| file.sync_all())
        })
        .await;

        if let Err(e) = sync_result {
            warn!(error = %e, "failed to sync evidence object to disk");
        } else if let Ok(Err(e)) = sync_result {
            warn!(error = %e, "failed to sync evidence object to disk");
        }

        fs::rename(&tmp_path, path).await?;
        Ok(())
    }
}

#[async_trait]
impl EvidenceStore for FsEvidenceStore {
    async fn put(&self, record: &EvidenceRecord) -> Result<String> {
        let path = self.object_path(&record.address);
        if path.exists() {
            return Err(CaselockError::StoreFailure {
                address: record.address.clone(),
                message: "address already exists, records are write-once".to_string(),
            });
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let bytes = match &record.body {
            EvidenceBody::Json(value) => serde_json::to_vec_pretty(value)?,
            EvidenceBody::Bytes(bytes) => bytes.clone(),
        };
        self.write_atomic(&path, &bytes).await?;

        let meta = serde_json::json!({
            "case_id": record.case_id,
            "target_id": record.target_id,
            "evidence_type": record.evidence_type,
            "timestamp": record.timestamp,
            "tags": record.tags,
        });
        let meta_path = self.object_path(&format!("{}.meta.json", record.address));
        self.write_atomic(&meta_path, &serde_json::to_vec_pretty(&meta)?)
            .await?;

        debug!(address = %record.address, "evidence record persisted");
        Ok(self.locator(&record.address))
    }

    fn locator(&self, address: &str) -> String {
        format!("file://{}", self.root.join(address).display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::CaseContext;
    use crate::evidence::EvidenceType;

    fn record(ctx: &CaseContext) -> EvidenceRecord {
        EvidenceRecord::json(
            ctx,
            EvidenceType::Containment,
            "20260101-120000",
            serde_json::json!({"state_before": "running"}),
        )
    }

    #[tokio::test]
    async fn test_put_writes_object_and_sidecar() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsEvidenceStore::new(dir.path());
        let ctx = CaseContext::new("i-0abc", Some("case-1".to_string()));

        let locator = store.put(&record(&ctx)).await.expect("put");
        assert!(locator.starts_with("file://"));

        let object = dir
            .path()
            .join("case-1/i-0abc/containment/stop-instance-20260101-120000.json");
        assert!(object.exists());
        assert!(object.with_file_name("stop-instance-20260101-120000.json.meta.json").exists());

        let body: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&object).expect("read")).expect("json");
        assert_eq!(body["state_before"], "running");
    }

    #[tokio::test]
    async fn test_put_refuses_existing_address() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsEvidenceStore::new(dir.path());
        let ctx = CaseContext::new("i-0abc", Some("case-1".to_string()));

        store.put(&record(&ctx)).await.expect("first put");
        let err = store.put(&record(&ctx)).await.expect_err("second put");
        assert!(matches!(err, CaselockError::StoreFailure { .. }));
    }
}

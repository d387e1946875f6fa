use async_trait::async_trait;

use crate::error::Result;
use crate::evidence::EvidenceRecord;

/// Write-once persistence for evidence records.
///
/// Callers compute a fresh, collision-free address per record (see
/// [`crate::evidence::address`]); the store never needs conditional or
/// overwrite logic and refuses an address it has already seen.
#[async_trait]
pub trait EvidenceStore: Send + Sync {
    /// Persists one record under its precomputed address and returns the full
    /// locator of the stored object.
    async fn put(&self, record: &EvidenceRecord) -> Result<String>;

    /// Full locator for an address (`s3://bucket/key`, `file:///…`, …), also
    /// usable as an upload destination inside remote command batches.
    fn locator(&self, address: &str) -> String;
}

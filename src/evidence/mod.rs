//! Evidence records and their deterministic addressing scheme.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::case::CaseContext;

/// Tag key identifying the owning engagement on stored records and snapshots.
pub const TAG_CASE_ID: &str = "CaseId";
/// Tag key marking an object as forensic evidence.
pub const TAG_PURPOSE: &str = "Purpose";
/// Fixed marker value: lets evidence be located and access-controlled
/// independently of the primary resource inventory.
pub const PURPOSE_FORENSICS: &str = "forensics-evidence";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceType {
    MemoryDump,
    EbsSnapshot,
    InstanceMetadata,
    Containment,
}

impl EvidenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MemoryDump => "memory_dump",
            Self::EbsSnapshot => "ebs_snapshot",
            Self::InstanceMetadata => "instance_metadata",
            Self::Containment => "containment",
        }
    }

    fn segment(&self) -> &'static str {
        match self {
            Self::MemoryDump => "memory",
            Self::EbsSnapshot => "ebs",
            Self::InstanceMetadata => "metadata",
            Self::Containment => "containment",
        }
    }

    fn artifact(&self) -> &'static str {
        match self {
            Self::MemoryDump => "dump",
            Self::EbsSnapshot => "snapshots",
            Self::InstanceMetadata => "instance-metadata",
            Self::Containment => "stop-instance",
        }
    }

    fn extension(&self) -> &'static str {
        match self {
            Self::MemoryDump => "lime",
            _ => "json",
        }
    }
}

impl fmt::Display for EvidenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage key for one evidence artifact.
///
/// Pure function of its inputs: deriving it twice yields the same key, two
/// distinct `(case, target, type, timestamp)` tuples never collide, and all
/// records for a case/target enumerate under the `{case_id}/{target_id}/`
/// prefix.
pub fn address(
    case_id: &str,
    target_id: &str,
    evidence_type: EvidenceType,
    timestamp: &str,
) -> String {
    format!(
        "{case_id}/{target_id}/{}/{}-{timestamp}.{}",
        evidence_type.segment(),
        evidence_type.artifact(),
        evidence_type.extension(),
    )
}

/// Payload of a persisted record: structured for reports, raw for images.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EvidenceBody {
    Json(Value),
    Bytes(Vec<u8>),
}

/// One immutable, addressed artifact tied to a case and target.
///
/// Created exclusively by the stage that produced the data; never updated,
/// only superseded by a new record with a new timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub case_id: String,
    pub target_id: String,
    pub evidence_type: EvidenceType,
    pub address: String,
    pub timestamp: String,
    pub body: EvidenceBody,
    pub tags: BTreeMap<String, String>,
}

impl EvidenceRecord {
    /// Builds a JSON record with the derived address and the baseline
    /// `CaseId`/`Purpose` tags.
    pub fn json(
        ctx: &CaseContext,
        evidence_type: EvidenceType,
        timestamp: &str,
        body: Value,
    ) -> Self {
        let mut tags = BTreeMap::new();
        tags.insert(TAG_CASE_ID.to_string(), ctx.case_id().to_string());
        tags.insert(TAG_PURPOSE.to_string(), PURPOSE_FORENSICS.to_string());

        Self {
            case_id: ctx.case_id().to_string(),
            target_id: ctx.target_id().to_string(),
            evidence_type,
            address: address(ctx.case_id(), ctx.target_id(), evidence_type, timestamp),
            timestamp: timestamp.to_string(),
            body: EvidenceBody::Json(body),
            tags,
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_is_deterministic() {
        let a = address("case-1", "i-0abc", EvidenceType::MemoryDump, "20260101-120000");
        let b = address("case-1", "i-0abc", EvidenceType::MemoryDump, "20260101-120000");
        assert_eq!(a, b);
        assert_eq!(a, "case-1/i-0abc/memory/dump-20260101-120000.lime");
    }

    #[test]
    fn test_addresses_never_collide_across_types() {
        let ts = "20260101-120000";
        let mut seen = std::collections::HashSet::new();
        for evidence_type in [
            EvidenceType::MemoryDump,
            EvidenceType::EbsSnapshot,
            EvidenceType::InstanceMetadata,
            EvidenceType::Containment,
        ] {
            assert!(seen.insert(address("case-1", "i-0abc", evidence_type, ts)));
        }
    }

    #[test]
    fn test_addresses_share_case_target_prefix() {
        let ts = "20260101-120000";
        for evidence_type in [
            EvidenceType::EbsSnapshot,
            EvidenceType::InstanceMetadata,
            EvidenceType::Containment,
        ] {
            let addr = address("case-9", "i-0def", evidence_type, ts);
            assert!(addr.starts_with("case-9/i-0def/"));
            assert!(addr.ends_with(".json"));
        }
    }

    #[test]
    fn test_json_record_carries_baseline_tags() {
        let ctx = CaseContext::new("i-0abc", Some("case-1".to_string()));
        let record = EvidenceRecord::json(
            &ctx,
            EvidenceType::Containment,
            "20260101-120000",
            serde_json::json!({"state_before": "running"}),
        );

        assert_eq!(record.tags.get(TAG_CASE_ID).map(String::as_str), Some("case-1"));
        assert_eq!(
            record.tags.get(TAG_PURPOSE).map(String::as_str),
            Some(PURPOSE_FORENSICS)
        );
        assert_eq!(
            record.address,
            "case-1/i-0abc/containment/stop-instance-20260101-120000.json"
        );
    }
}

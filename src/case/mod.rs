//! Engagement identity threaded through every stage and evidence record.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Identifies one forensic engagement.
///
/// `(case_id, target_id)` never mutates once built: every evidence record
/// produced during the engagement carries the same pair, which is what makes
/// records enumerable per case. Stage timestamps are generated fresh per
/// invocation and are the only varying part of an evidence address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseContext {
    case_id: String,
    target_id: String,
}

impl CaseContext {
    /// Builds the context for one engagement. A missing `case_id` is derived
    /// from the invocation time, so independently triggered stages of the
    /// same incident must be handed the same explicit id.
    pub fn new(target_id: impl Into<String>, case_id: Option<String>) -> Self {
        let case_id = case_id.unwrap_or_else(|| format!("case-{}", Utc::now().timestamp()));
        Self {
            case_id,
            target_id: target_id.into(),
        }
    }

    pub fn case_id(&self) -> &str {
        &self.case_id
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Capture-time marker used in evidence addressing, generated once per
    /// stage invocation. Second-granular: re-running the same stage for the
    /// same case within one second must be serialized by the caller.
    pub fn stage_timestamp(&self) -> String {
        Utc::now().format("%Y%m%d-%H%M%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supplied_case_id_is_kept() {
        let ctx = CaseContext::new("i-0abc", Some("case-incident-7".to_string()));
        assert_eq!(ctx.case_id(), "case-incident-7");
        assert_eq!(ctx.target_id(), "i-0abc");
    }

    #[test]
    fn test_generated_case_id_is_time_derived() {
        let ctx = CaseContext::new("i-0abc", None);
        let suffix = ctx.case_id().strip_prefix("case-").expect("case- prefix");
        assert!(suffix.parse::<i64>().is_ok());
    }

    #[test]
    fn test_stage_timestamp_format() {
        let ctx = CaseContext::new("i-0abc", None);
        let ts = ctx.stage_timestamp();
        // %Y%m%d-%H%M%S
        assert_eq!(ts.len(), 15);
        assert_eq!(&ts[8..9], "-");
        assert!(ts[..8].chars().all(|c| c.is_ascii_digit()));
        assert!(ts[9..].chars().all(|c| c.is_ascii_digit()));
    }
}

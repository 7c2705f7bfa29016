use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary lifecycle for a case, per spec.md §3.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SummaryStatus {
    Generating,
    Generated,
    Stale,
    Failed,
}

impl std::fmt::Display for SummaryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Generating => "generating",
            Self::Generated => "generated",
            Self::Stale => "stale",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for SummaryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "generating" => Ok(Self::Generating),
            "generated" => Ok(Self::Generated),
            "stale" => Ok(Self::Stale),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("unknown summary status: {s}")),
        }
    }
}

/// A top-level collection owned by a user; groups documents and one derived
/// summary (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Case {
    pub id: String,
    pub title: String,
    pub case_number: Option<String>,
    pub workspace_path: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub summary_status: Option<SummaryStatus>,
    pub summary_generated_at: Option<DateTime<Utc>>,
    pub summary_version: i64,
    pub summary_document_count: i64,
    pub narrative_updated_at: Option<DateTime<Utc>>,
    pub grounding_status: Option<String>,
}

impl Case {
    pub fn new(id: String, title: String, user_id: String, workspace_path: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            title,
            case_number: None,
            workspace_path,
            user_id,
            created_at: now,
            updated_at: now,
            summary_status: None,
            summary_generated_at: None,
            summary_version: 0,
            summary_document_count: 0,
            narrative_updated_at: None,
            grounding_status: None,
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_case_starts_with_no_summary() {
        let case = Case::new("c1".into(), "Smith v. Jones".into(), "u1".into(), "/ws/c1".into());
        assert!(case.summary_status.is_none());
        assert_eq!(case.summary_version, 0);
        assert_eq!(case.summary_document_count, 0);
    }

    #[test]
    fn ownership_check() {
        let case = Case::new("c1".into(), "t".into(), "u1".into(), "/ws/c1".into());
        assert!(case.is_owned_by("u1"));
        assert!(!case.is_owned_by("u2"));
    }

    #[test]
    fn summary_status_roundtrips_through_display_and_from_str() {
        for status in [
            SummaryStatus::Generating,
            SummaryStatus::Generated,
            SummaryStatus::Stale,
            SummaryStatus::Failed,
        ] {
            let s = status.to_string();
            let parsed: SummaryStatus = s.parse().unwrap();
            assert_eq!(parsed, status);
        }
    }
}

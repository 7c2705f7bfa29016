use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Case, SummaryStatus};

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStatusResponse {
    pub case_id: String,
    pub summary_status: Option<SummaryStatus>,
    pub summary_generated_at: Option<DateTime<Utc>>,
    pub summary_version: i64,
    pub summary_document_count: i64,
}

impl From<Case> for SummaryStatusResponse {
    fn from(case: Case) -> Self {
        Self {
            case_id: case.id,
            summary_status: case.summary_status,
            summary_generated_at: case.summary_generated_at,
            summary_version: case.summary_version,
            summary_document_count: case.summary_document_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummaryContentResponse {
    pub case_id: String,
    pub narrative: String,
}

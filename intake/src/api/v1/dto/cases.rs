use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Case, SummaryStatus};

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCaseRequest {
    pub title: String,
    #[serde(default)]
    pub case_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaseResponse {
    pub case_id: String,
    pub title: String,
    pub case_number: Option<String>,
    pub summary_status: Option<SummaryStatus>,
    pub summary_generated_at: Option<DateTime<Utc>>,
    pub summary_version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Case> for CaseResponse {
    fn from(case: Case) -> Self {
        Self {
            case_id: case.id,
            title: case.title,
            case_number: case.case_number,
            summary_status: case.summary_status,
            summary_generated_at: case.summary_generated_at,
            summary_version: case.summary_version,
            created_at: case.created_at,
            updated_at: case.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct DeleteCaseResponse {
    pub deleted: bool,
}

use chrono::{DateTime, Utc};
use libsql::{params, Connection};

use crate::db::traits::{summary_status_from_column, summary_status_to_column};
use crate::error::Result;
use crate::models::Case;

pub struct CaseRepository;

impl CaseRepository {
    pub async fn create(conn: &Connection, case: &Case) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO cases (
                id, title, case_number, workspace_path, user_id, created_at, updated_at,
                summary_status, summary_generated_at, summary_version, summary_document_count,
                narrative_updated_at, grounding_status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                case.id.clone(),
                case.title.clone(),
                case.case_number.clone(),
                case.workspace_path.clone(),
                case.user_id.clone(),
                case.created_at.to_rfc3339(),
                case.updated_at.to_rfc3339(),
                summary_status_to_column(case.summary_status),
                case.summary_generated_at.map(|t| t.to_rfc3339()),
                case.summary_version,
                case.summary_document_count,
                case.narrative_updated_at.map(|t| t.to_rfc3339()),
                case.grounding_status.clone(),
            ],
        )
        .await?;

        Ok(())
    }

    pub async fn get_by_id(conn: &Connection, id: &str) -> Result<Option<Case>> {
        let mut rows = conn
            .query("SELECT * FROM cases WHERE id = ?1", params![id])
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_case(&row)?))
        } else {
            Ok(None)
        }
    }

    pub async fn delete(conn: &Connection, id: &str) -> Result<bool> {
        let rows_affected = conn
            .execute("DELETE FROM cases WHERE id = ?1", params![id])
            .await?;

        Ok(rows_affected > 0)
    }

    /// Admission control for Summary Engine generation (spec.md §4.3):
    /// only flips `NULL|stale|failed -> generating`, never `generating`
    /// itself, so concurrent callers race on this single UPDATE and only
    /// one observes `rows_affected > 0`.
    pub async fn try_begin_summary_generation(conn: &Connection, case_id: &str) -> Result<bool> {
        let rows_affected = conn
            .execute(
                "UPDATE cases SET summary_status = 'generating' \
                 WHERE id = ?1 AND (summary_status IS NULL OR summary_status IN ('stale', 'failed', 'generated'))",
                params![case_id],
            )
            .await?;

        Ok(rows_affected > 0)
    }

    pub async fn complete_summary_generation(
        conn: &Connection,
        case_id: &str,
        document_count: i64,
    ) -> Result<()> {
        conn.execute(
            "UPDATE cases SET summary_status = 'generated', summary_generated_at = ?2, \
             summary_version = summary_version + 1, summary_document_count = ?3 WHERE id = ?1",
            params![case_id, Utc::now().to_rfc3339(), document_count],
        )
        .await?;

        Ok(())
    }

    pub async fn fail_summary_generation(conn: &Connection, case_id: &str) -> Result<()> {
        conn.execute(
            "UPDATE cases SET summary_status = 'failed' WHERE id = ?1",
            params![case_id],
        )
        .await?;

        Ok(())
    }

    pub async fn mark_summary_stale_if_generated(conn: &Connection, case_id: &str) -> Result<bool> {
        let rows_affected = conn
            .execute(
                "UPDATE cases SET summary_status = 'stale' WHERE id = ?1 AND summary_status = 'generated'",
                params![case_id],
            )
            .await?;

        Ok(rows_affected > 0)
    }

    fn row_to_case(row: &libsql::Row) -> Result<Case> {
        Ok(Case {
            id: row.get(0)?,
            title: row.get(1)?,
            case_number: row.get(2)?,
            workspace_path: row.get(3)?,
            user_id: row.get(4)?,
            created_at: DateTime::parse_from_rfc3339(&row.get::<String>(5)?)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            updated_at: DateTime::parse_from_rfc3339(&row.get::<String>(6)?)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            summary_status: summary_status_from_column(row.get::<Option<String>>(7)?)?,
            summary_generated_at: row
                .get::<Option<String>>(8)?
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            summary_version: row.get(9)?,
            summary_document_count: row.get(10)?,
            narrative_updated_at: row
                .get::<Option<String>>(11)?
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            grounding_status: row.get(12)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::init_schema;

    async fn setup_test_db() -> Connection {
        let db = libsql::Builder::new_local(":memory:").build().await.unwrap();
        let conn = db.connect().unwrap();
        init_schema(&conn).await.unwrap();
        conn
    }

    #[tokio::test]
    async fn create_and_get_by_id_roundtrips() {
        let conn = setup_test_db().await;
        let case = Case::new("c1".into(), "Smith v. Jones".into(), "u1".into(), "/ws/c1".into());
        CaseRepository::create(&conn, &case).await.unwrap();

        let fetched = CaseRepository::get_by_id(&conn, "c1").await.unwrap().unwrap();
        assert_eq!(fetched.title, "Smith v. Jones");
        assert!(fetched.summary_status.is_none());
    }

    #[tokio::test]
    async fn try_begin_summary_generation_succeeds_when_idle() {
        let conn = setup_test_db().await;
        let case = Case::new("c1".into(), "t".into(), "u1".into(), "/ws/c1".into());
        CaseRepository::create(&conn, &case).await.unwrap();

        let began = CaseRepository::try_begin_summary_generation(&conn, "c1").await.unwrap();
        assert!(began);

        let fetched = CaseRepository::get_by_id(&conn, "c1").await.unwrap().unwrap();
        assert_eq!(fetched.summary_status, Some(crate::models::SummaryStatus::Generating));
    }

    #[tokio::test]
    async fn try_begin_summary_generation_fails_when_already_generating() {
        let conn = setup_test_db().await;
        let case = Case::new("c1".into(), "t".into(), "u1".into(), "/ws/c1".into());
        CaseRepository::create(&conn, &case).await.unwrap();

        assert!(CaseRepository::try_begin_summary_generation(&conn, "c1").await.unwrap());
        let second = CaseRepository::try_begin_summary_generation(&conn, "c1").await.unwrap();
        assert!(!second);
    }

    #[tokio::test]
    async fn complete_summary_generation_increments_version() {
        let conn = setup_test_db().await;
        let case = Case::new("c1".into(), "t".into(), "u1".into(), "/ws/c1".into());
        CaseRepository::create(&conn, &case).await.unwrap();
        CaseRepository::try_begin_summary_generation(&conn, "c1").await.unwrap();

        CaseRepository::complete_summary_generation(&conn, "c1", 7).await.unwrap();

        let fetched = CaseRepository::get_by_id(&conn, "c1").await.unwrap().unwrap();
        assert_eq!(fetched.summary_status, Some(crate::models::SummaryStatus::Generated));
        assert_eq!(fetched.summary_version, 1);
        assert_eq!(fetched.summary_document_count, 7);
        assert!(fetched.summary_generated_at.is_some());
    }

    #[tokio::test]
    async fn mark_summary_stale_if_generated_is_a_no_op_otherwise() {
        let conn = setup_test_db().await;
        let case = Case::new("c1".into(), "t".into(), "u1".into(), "/ws/c1".into());
        CaseRepository::create(&conn, &case).await.unwrap();

        let changed = CaseRepository::mark_summary_stale_if_generated(&conn, "c1").await.unwrap();
        assert!(!changed);

        CaseRepository::try_begin_summary_generation(&conn, "c1").await.unwrap();
        CaseRepository::complete_summary_generation(&conn, "c1", 1).await.unwrap();

        let changed = CaseRepository::mark_summary_stale_if_generated(&conn, "c1").await.unwrap();
        assert!(changed);

        let fetched = CaseRepository::get_by_id(&conn, "c1").await.unwrap().unwrap();
        assert_eq!(fetched.summary_status, Some(crate::models::SummaryStatus::Stale));
    }

    #[tokio::test]
    async fn delete_returns_false_for_missing_case() {
        let conn = setup_test_db().await;
        assert!(!CaseRepository::delete(&conn, "missing").await.unwrap());
    }
}

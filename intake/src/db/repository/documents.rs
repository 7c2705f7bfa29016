use chrono::{DateTime, Utc};
use libsql::{params, Connection};

use crate::db::traits::DocumentStats;
use crate::error::Result;
use crate::models::{Document, DocumentClassification, FileType, ProcessingStatus};

pub struct DocumentRepository;

impl DocumentRepository {
    pub async fn create(conn: &Connection, doc: &Document) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO documents (
                id, case_id, filename, folder_name, document_type, file_type,
                page_count, word_count, processing_status, has_text_extraction,
                has_metadata, rag_indexed, file_search_store_id, retrieval_file_uri,
                blob_key, blob_bucket, blob_version_id, blob_uploaded_at,
                content_type, file_size_bytes, error_message, uploaded_at, processed_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23
            )
            "#,
            params![
                doc.id.clone(),
                doc.case_id.clone(),
                doc.filename.clone(),
                doc.folder_name.clone(),
                doc.document_type.map(|t| t.to_string()),
                doc.file_type.to_string(),
                doc.page_count,
                doc.word_count,
                doc.processing_status.to_string(),
                doc.has_text_extraction as i64,
                doc.has_metadata as i64,
                doc.rag_indexed as i64,
                doc.file_search_store_id.clone(),
                doc.retrieval_file_uri.clone(),
                doc.blob_key.clone(),
                doc.blob_bucket.clone(),
                doc.blob_version_id.clone(),
                doc.blob_uploaded_at.map(|t| t.to_rfc3339()),
                doc.content_type.clone(),
                doc.file_size_bytes,
                doc.error_message.clone(),
                doc.uploaded_at.to_rfc3339(),
                doc.processed_at.map(|t| t.to_rfc3339()),
            ],
        )
        .await?;

        Ok(())
    }

    pub async fn get_by_id(conn: &Connection, id: &str) -> Result<Option<Document>> {
        let mut rows = conn
            .query("SELECT * FROM documents WHERE id = ?1", params![id])
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_document(&row)?))
        } else {
            Ok(None)
        }
    }

    pub async fn list_for_case(conn: &Connection, case_id: &str) -> Result<Vec<Document>> {
        let mut rows = conn
            .query(
                "SELECT * FROM documents WHERE case_id = ?1 ORDER BY uploaded_at ASC",
                params![case_id],
            )
            .await?;

        let mut docs = Vec::new();
        while let Some(row) = rows.next().await? {
            docs.push(Self::row_to_document(&row)?);
        }
        Ok(docs)
    }

    pub async fn list_for_case_uploaded_after(
        conn: &Connection,
        case_id: &str,
        after: DateTime<Utc>,
    ) -> Result<Vec<Document>> {
        let mut rows = conn
            .query(
                "SELECT * FROM documents WHERE case_id = ?1 AND uploaded_at > ?2 ORDER BY uploaded_at ASC",
                params![case_id, after.to_rfc3339()],
            )
            .await?;

        let mut docs = Vec::new();
        while let Some(row) = rows.next().await? {
            docs.push(Self::row_to_document(&row)?);
        }
        Ok(docs)
    }

    pub async fn list_complete_for_case(conn: &Connection, case_id: &str) -> Result<Vec<Document>> {
        let mut rows = conn
            .query(
                "SELECT * FROM documents WHERE case_id = ?1 AND processing_status = 'complete' ORDER BY uploaded_at ASC",
                params![case_id],
            )
            .await?;

        let mut docs = Vec::new();
        while let Some(row) = rows.next().await? {
            docs.push(Self::row_to_document(&row)?);
        }
        Ok(docs)
    }

    pub async fn get_in_flight(conn: &Connection) -> Result<Vec<Document>> {
        let mut rows = conn
            .query(
                "SELECT * FROM documents WHERE processing_status NOT IN ('complete', 'failed') ORDER BY uploaded_at ASC",
                (),
            )
            .await?;

        let mut docs = Vec::new();
        while let Some(row) = rows.next().await? {
            docs.push(Self::row_to_document(&row)?);
        }
        Ok(docs)
    }

    pub async fn update(conn: &Connection, doc: &Document) -> Result<()> {
        conn.execute(
            r#"
            UPDATE documents SET
                document_type = ?2,
                page_count = ?3,
                word_count = ?4,
                processing_status = ?5,
                has_text_extraction = ?6,
                has_metadata = ?7,
                rag_indexed = ?8,
                file_search_store_id = ?9,
                retrieval_file_uri = ?10,
                blob_key = ?11,
                blob_bucket = ?12,
                blob_version_id = ?13,
                blob_uploaded_at = ?14,
                content_type = ?15,
                file_size_bytes = ?16,
                error_message = ?17,
                processed_at = ?18
            WHERE id = ?1
            "#,
            params![
                doc.id.clone(),
                doc.document_type.map(|t| t.to_string()),
                doc.page_count,
                doc.word_count,
                doc.processing_status.to_string(),
                doc.has_text_extraction as i64,
                doc.has_metadata as i64,
                doc.rag_indexed as i64,
                doc.file_search_store_id.clone(),
                doc.retrieval_file_uri.clone(),
                doc.blob_key.clone(),
                doc.blob_bucket.clone(),
                doc.blob_version_id.clone(),
                doc.blob_uploaded_at.map(|t| t.to_rfc3339()),
                doc.content_type.clone(),
                doc.file_size_bytes,
                doc.error_message.clone(),
                doc.processed_at.map(|t| t.to_rfc3339()),
            ],
        )
        .await?;

        Ok(())
    }

    pub async fn update_status(
        conn: &Connection,
        id: &str,
        status: ProcessingStatus,
        error: Option<&str>,
    ) -> Result<()> {
        conn.execute(
            "UPDATE documents SET processing_status = ?2, error_message = ?3 WHERE id = ?1",
            params![id, status.to_string(), error],
        )
        .await?;

        Ok(())
    }

    pub async fn delete(conn: &Connection, id: &str) -> Result<bool> {
        let rows_affected = conn
            .execute("DELETE FROM documents WHERE id = ?1", params![id])
            .await?;

        Ok(rows_affected > 0)
    }

    pub async fn stats_for_case(conn: &Connection, case_id: &str) -> Result<DocumentStats> {
        let mut rows = conn
            .query(
                "SELECT processing_status, COUNT(*) FROM documents WHERE case_id = ?1 GROUP BY processing_status",
                params![case_id],
            )
            .await?;

        let mut stats = DocumentStats::default();
        while let Some(row) = rows.next().await? {
            let status: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            let count = count as u64;
            stats.total += count;
            match status.as_str() {
                "pending" => stats.pending = count,
                "extracting" => stats.extracting = count,
                "analyzing" => stats.analyzing = count,
                "indexing" => stats.indexing = count,
                "complete" => stats.complete = count,
                "failed" => stats.failed = count,
                _ => {}
            }
        }
        Ok(stats)
    }

    fn row_to_document(row: &libsql::Row) -> Result<Document> {
        Ok(Document {
            id: row.get(0)?,
            case_id: row.get(1)?,
            filename: row.get(2)?,
            folder_name: row.get(3)?,
            document_type: row
                .get::<Option<String>>(4)?
                .and_then(|s| s.parse::<DocumentClassification>().ok()),
            file_type: row
                .get::<String>(5)?
                .parse()
                .unwrap_or(FileType::Unknown),
            page_count: row.get(6)?,
            word_count: row.get(7)?,
            processing_status: row
                .get::<String>(8)?
                .parse()
                .unwrap_or(ProcessingStatus::Pending),
            has_text_extraction: row.get::<i64>(9)? != 0,
            has_metadata: row.get::<i64>(10)? != 0,
            rag_indexed: row.get::<i64>(11)? != 0,
            file_search_store_id: row.get(12)?,
            retrieval_file_uri: row.get(13)?,
            blob_key: row.get(14)?,
            blob_bucket: row.get(15)?,
            blob_version_id: row.get(16)?,
            blob_uploaded_at: row
                .get::<Option<String>>(17)?
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            content_type: row.get(18)?,
            file_size_bytes: row.get(19)?,
            error_message: row.get(20)?,
            uploaded_at: DateTime::parse_from_rfc3339(&row.get::<String>(21)?)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            processed_at: row
                .get::<Option<String>>(22)?
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
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

    fn make_doc(id: &str, case_id: &str) -> Document {
        Document::new(
            id.to_string(),
            case_id.to_string(),
            "file.pdf".to_string(),
            "file".to_string(),
            FileType::Pdf,
        )
    }

    #[tokio::test]
    async fn create_and_get_by_id_roundtrips() {
        let conn = setup_test_db().await;
        let doc = make_doc("d1", "c1");
        DocumentRepository::create(&conn, &doc).await.unwrap();

        let fetched = DocumentRepository::get_by_id(&conn, "d1").await.unwrap().unwrap();
        assert_eq!(fetched.id, "d1");
        assert_eq!(fetched.case_id, "c1");
        assert_eq!(fetched.processing_status, ProcessingStatus::Pending);
    }

    #[tokio::test]
    async fn list_for_case_filters_by_case_id() {
        let conn = setup_test_db().await;
        DocumentRepository::create(&conn, &make_doc("d1", "c1")).await.unwrap();
        DocumentRepository::create(&conn, &make_doc("d2", "c2")).await.unwrap();
        DocumentRepository::create(&conn, &make_doc("d3", "c1")).await.unwrap();

        let docs = DocumentRepository::list_for_case(&conn, "c1").await.unwrap();
        assert_eq!(docs.len(), 2);
    }

    #[tokio::test]
    async fn update_status_sets_error_message_on_failure() {
        let conn = setup_test_db().await;
        DocumentRepository::create(&conn, &make_doc("d1", "c1")).await.unwrap();

        DocumentRepository::update_status(&conn, "d1", ProcessingStatus::Failed, Some("boom"))
            .await
            .unwrap();

        let doc = DocumentRepository::get_by_id(&conn, "d1").await.unwrap().unwrap();
        assert_eq!(doc.processing_status, ProcessingStatus::Failed);
        assert_eq!(doc.error_message.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn stats_for_case_counts_by_status() {
        let conn = setup_test_db().await;
        let mut d1 = make_doc("d1", "c1");
        d1.processing_status = ProcessingStatus::Complete;
        let mut d2 = make_doc("d2", "c1");
        d2.processing_status = ProcessingStatus::Failed;
        let d3 = make_doc("d3", "c1");

        DocumentRepository::create(&conn, &d1).await.unwrap();
        DocumentRepository::create(&conn, &d2).await.unwrap();
        DocumentRepository::create(&conn, &d3).await.unwrap();

        let stats = DocumentRepository::stats_for_case(&conn, "c1").await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.complete, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.pending, 1);
    }

    #[tokio::test]
    async fn delete_returns_false_for_missing_document() {
        let conn = setup_test_db().await;
        let deleted = DocumentRepository::delete(&conn, "missing").await.unwrap();
        assert!(!deleted);
    }

    #[tokio::test]
    async fn get_in_flight_excludes_terminal_states() {
        let conn = setup_test_db().await;
        let mut complete = make_doc("d1", "c1");
        complete.processing_status = ProcessingStatus::Complete;
        let mut failed = make_doc("d2", "c1");
        failed.processing_status = ProcessingStatus::Failed;
        let extracting = {
            let mut d = make_doc("d3", "c1");
            d.processing_status = ProcessingStatus::Extracting;
            d
        };

        DocumentRepository::create(&conn, &complete).await.unwrap();
        DocumentRepository::create(&conn, &failed).await.unwrap();
        DocumentRepository::create(&conn, &extracting).await.unwrap();

        let in_flight = DocumentRepository::get_in_flight(&conn).await.unwrap();
        assert_eq!(in_flight.len(), 1);
        assert_eq!(in_flight[0].id, "d3");
    }
}

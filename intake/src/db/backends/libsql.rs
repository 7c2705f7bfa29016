use async_trait::async_trait;

use crate::db::connection::Database;
use crate::db::repository::{CaseRepository, DocumentRepository};
use crate::db::traits::{CaseStore, CatalogBackend, DocumentStats, DocumentStore};
use crate::error::Result;
use crate::models::{Case, Document, ProcessingStatus};

pub struct LibSqlCatalog {
    db: Database,
}

impl LibSqlCatalog {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CaseStore for LibSqlCatalog {
    async fn create_case(&self, case: &Case) -> Result<()> {
        let conn = self.db.connect()?;
        CaseRepository::create(&conn, case).await
    }

    async fn get_case_by_id(&self, id: &str) -> Result<Option<Case>> {
        let conn = self.db.connect()?;
        CaseRepository::get_by_id(&conn, id).await
    }

    async fn delete_case(&self, id: &str) -> Result<bool> {
        let conn = self.db.connect()?;
        CaseRepository::delete(&conn, id).await
    }

    async fn try_begin_summary_generation(&self, case_id: &str) -> Result<bool> {
        let conn = self.db.connect()?;
        CaseRepository::try_begin_summary_generation(&conn, case_id).await
    }

    async fn complete_summary_generation(&self, case_id: &str, document_count: i64) -> Result<()> {
        let conn = self.db.connect()?;
        CaseRepository::complete_summary_generation(&conn, case_id, document_count).await
    }

    async fn fail_summary_generation(&self, case_id: &str) -> Result<()> {
        let conn = self.db.connect()?;
        CaseRepository::fail_summary_generation(&conn, case_id).await
    }

    async fn mark_summary_stale_if_generated(&self, case_id: &str) -> Result<bool> {
        let conn = self.db.connect()?;
        CaseRepository::mark_summary_stale_if_generated(&conn, case_id).await
    }
}

#[async_trait]
impl DocumentStore for LibSqlCatalog {
    async fn create_document(&self, doc: &Document) -> Result<()> {
        let conn = self.db.connect()?;
        DocumentRepository::create(&conn, doc).await
    }

    async fn get_document_by_id(&self, id: &str) -> Result<Option<Document>> {
        let conn = self.db.connect()?;
        DocumentRepository::get_by_id(&conn, id).await
    }

    async fn list_documents_for_case(&self, case_id: &str) -> Result<Vec<Document>> {
        let conn = self.db.connect()?;
        DocumentRepository::list_for_case(&conn, case_id).await
    }

    async fn list_documents_for_case_uploaded_after(
        &self,
        case_id: &str,
        after: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<Document>> {
        let conn = self.db.connect()?;
        DocumentRepository::list_for_case_uploaded_after(&conn, case_id, after).await
    }

    async fn list_complete_documents_for_case(&self, case_id: &str) -> Result<Vec<Document>> {
        let conn = self.db.connect()?;
        DocumentRepository::list_complete_for_case(&conn, case_id).await
    }

    async fn update_document(&self, doc: &Document) -> Result<()> {
        let conn = self.db.connect()?;
        DocumentRepository::update(&conn, doc).await
    }

    async fn delete_document(&self, id: &str) -> Result<bool> {
        let conn = self.db.connect()?;
        DocumentRepository::delete(&conn, id).await
    }

    async fn document_stats_for_case(&self, case_id: &str) -> Result<DocumentStats> {
        let conn = self.db.connect()?;
        DocumentRepository::stats_for_case(&conn, case_id).await
    }

    async fn get_documents_in_flight(&self) -> Result<Vec<Document>> {
        let conn = self.db.connect()?;
        DocumentRepository::get_in_flight(&conn).await
    }

    async fn update_document_status(
        &self,
        id: &str,
        status: ProcessingStatus,
        error: Option<&str>,
    ) -> Result<()> {
        let conn = self.db.connect()?;
        DocumentRepository::update_status(&conn, id, status, error).await
    }
}

#[async_trait]
impl CatalogBackend for LibSqlCatalog {
    async fn sync(&self) -> Result<()> {
        self.db.sync().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::models::FileType;

    async fn setup_test_db() -> LibSqlCatalog {
        use std::time::{SystemTime, UNIX_EPOCH};

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let thread_id = std::thread::current().id();

        let config = DatabaseConfig {
            url: format!(
                "file:/tmp/intake_test_db_{thread_id:?}_{timestamp}?mode=memory&cache=shared"
            ),
            auth_token: None,
            local_path: None,
        };
        let db = Database::new(&config).await.expect("failed to create database");

        LibSqlCatalog::new(db)
    }

    #[tokio::test]
    async fn create_and_fetch_case_and_document() {
        let catalog = setup_test_db().await;
        let case = Case::new("c1".into(), "Smith v. Jones".into(), "u1".into(), "/ws/c1".into());
        catalog.create_case(&case).await.unwrap();

        let doc = Document::new(
            "d1".into(),
            "c1".into(),
            "motion.pdf".into(),
            "motion".into(),
            FileType::Pdf,
        );
        catalog.create_document(&doc).await.unwrap();

        let fetched_case = catalog.get_case_by_id("c1").await.unwrap().unwrap();
        assert_eq!(fetched_case.title, "Smith v. Jones");

        let docs = catalog.list_documents_for_case("c1").await.unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[tokio::test]
    async fn summary_generation_admission_control_round_trip() {
        let catalog = setup_test_db().await;
        let case = Case::new("c1".into(), "t".into(), "u1".into(), "/ws/c1".into());
        catalog.create_case(&case).await.unwrap();

        assert!(catalog.try_begin_summary_generation("c1").await.unwrap());
        assert!(!catalog.try_begin_summary_generation("c1").await.unwrap());

        catalog.complete_summary_generation("c1", 3).await.unwrap();
        assert!(catalog.mark_summary_stale_if_generated("c1").await.unwrap());
    }

    #[tokio::test]
    async fn document_stats_and_in_flight_sweep() {
        let catalog = setup_test_db().await;
        let case = Case::new("c1".into(), "t".into(), "u1".into(), "/ws/c1".into());
        catalog.create_case(&case).await.unwrap();

        let mut extracting = Document::new(
            "d1".into(),
            "c1".into(),
            "a.pdf".into(),
            "a".into(),
            FileType::Pdf,
        );
        extracting.processing_status = ProcessingStatus::Extracting;
        catalog.create_document(&extracting).await.unwrap();

        let stats = catalog.document_stats_for_case("c1").await.unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.extracting, 1);

        let in_flight = catalog.get_documents_in_flight().await.unwrap();
        assert_eq!(in_flight.len(), 1);
    }
}

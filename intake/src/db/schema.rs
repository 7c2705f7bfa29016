use libsql::Connection;

use crate::error::Result;

pub async fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS cases (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            case_number TEXT,
            workspace_path TEXT NOT NULL,
            user_id TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            summary_status TEXT,
            summary_generated_at TEXT,
            summary_version INTEGER NOT NULL DEFAULT 0,
            summary_document_count INTEGER NOT NULL DEFAULT 0,
            narrative_updated_at TEXT,
            grounding_status TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_cases_user_id ON cases(user_id);

        CREATE TABLE IF NOT EXISTS documents (
            id TEXT PRIMARY KEY,
            case_id TEXT NOT NULL,
            filename TEXT NOT NULL,
            folder_name TEXT NOT NULL,
            document_type TEXT,
            file_type TEXT NOT NULL,
            page_count INTEGER,
            word_count INTEGER,
            processing_status TEXT NOT NULL DEFAULT 'pending',
            has_text_extraction INTEGER NOT NULL DEFAULT 0,
            has_metadata INTEGER NOT NULL DEFAULT 0,
            rag_indexed INTEGER NOT NULL DEFAULT 0,
            file_search_store_id TEXT,
            retrieval_file_uri TEXT,
            blob_key TEXT,
            blob_bucket TEXT,
            blob_version_id TEXT,
            blob_uploaded_at TEXT,
            content_type TEXT,
            file_size_bytes INTEGER,
            error_message TEXT,
            uploaded_at TEXT NOT NULL,
            processed_at TEXT,
            FOREIGN KEY (case_id) REFERENCES cases(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_documents_case_id ON documents(case_id);
        CREATE INDEX IF NOT EXISTS idx_documents_processing_status ON documents(processing_status);
        CREATE INDEX IF NOT EXISTS idx_documents_uploaded_at ON documents(uploaded_at);
        "#,
    )
    .await?;

    migrate_case_grounding_columns(conn).await?;

    Ok(())
}

/// `narrative_updated_at`/`grounding_status` were added after the initial
/// `cases` table landed; this migration covers databases created before
/// that (spec.md §3's "Grounding tracking (optional)" fields).
async fn migrate_case_grounding_columns(conn: &Connection) -> Result<()> {
    let grounding_status_exists: bool = conn
        .query(
            "SELECT COUNT(*) FROM pragma_table_info('cases') WHERE name='grounding_status'",
            (),
        )
        .await?
        .next()
        .await?
        .map(|row| row.get::<i64>(0).unwrap_or(0) > 0)
        .unwrap_or(false);

    if !grounding_status_exists {
        tracing::info!("Migrating cases table: adding grounding_status column");
        conn.execute("ALTER TABLE cases ADD COLUMN grounding_status TEXT", ())
            .await?;
        tracing::info!("Migration complete: grounding_status column added");
    }

    let narrative_updated_at_exists: bool = conn
        .query(
            "SELECT COUNT(*) FROM pragma_table_info('cases') WHERE name='narrative_updated_at'",
            (),
        )
        .await?
        .next()
        .await?
        .map(|row| row.get::<i64>(0).unwrap_or(0) > 0)
        .unwrap_or(false);

    if !narrative_updated_at_exists {
        tracing::info!("Migrating cases table: adding narrative_updated_at column");
        conn.execute(
            "ALTER TABLE cases ADD COLUMN narrative_updated_at TEXT",
            (),
        )
        .await?;
        tracing::info!("Migration complete: narrative_updated_at column added");
    }

    Ok(())
}

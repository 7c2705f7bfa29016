//! Per-case scratch workspace (spec.md §6.3): holds the generated summary
//! markdown and its backups. Writes are atomic (temp file + rename) so a
//! crash mid-write never leaves a half-written summary on disk.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::config::CacheFsConfig;
use crate::error::{IntakeError, Result};

pub struct CacheFs {
    root: PathBuf,
}

impl CacheFs {
    pub fn new(config: &CacheFsConfig) -> Self {
        Self {
            root: PathBuf::from(&config.root),
        }
    }

    pub fn case_dir(&self, case_id: &str) -> PathBuf {
        self.root.join(case_id).join("case-context")
    }

    fn summary_path(&self, case_id: &str) -> PathBuf {
        self.case_dir(case_id).join("case_summary.md")
    }

    fn backup_path(&self, case_id: &str) -> PathBuf {
        self.case_dir(case_id).join("case_summary.md.bak")
    }

    pub async fn read_summary(&self, case_id: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.summary_path(case_id)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(IntakeError::Io(e)),
        }
    }

    /// Writes `content` as the case's summary, keeping the previous version as
    /// a `.bak` file. The write itself goes to a temp file first and is
    /// renamed into place so readers never observe a partial summary.
    pub async fn write_summary(&self, case_id: &str, content: &str) -> Result<()> {
        let dir = self.case_dir(case_id);
        fs::create_dir_all(&dir).await?;

        let target = self.summary_path(case_id);
        let backup = self.backup_path(case_id);
        let tmp = dir.join(format!("summary.md.tmp-{}", nanoid::nanoid!(8)));

        fs::write(&tmp, content).await?;

        if fs::try_exists(&target).await.unwrap_or(false) {
            fs::rename(&target, &backup).await?;
        }

        fs::rename(&tmp, &target).await?;

        Ok(())
    }

    pub async fn delete_case(&self, case_id: &str) -> Result<()> {
        let dir = self.case_dir(case_id);
        match fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(IntakeError::Io(e)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cache_fs() -> (CacheFs, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let config = CacheFsConfig {
            root: tmp.path().to_string_lossy().into_owned(),
        };
        (CacheFs::new(&config), tmp)
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let (cache, _tmp) = test_cache_fs();
        cache.write_summary("case-1", "# Summary\n").await.unwrap();
        let content = cache.read_summary("case-1").await.unwrap();
        assert_eq!(content, Some("# Summary\n".to_string()));
    }

    #[tokio::test]
    async fn read_summary_missing_case_returns_none() {
        let (cache, _tmp) = test_cache_fs();
        let content = cache.read_summary("missing").await.unwrap();
        assert!(content.is_none());
    }

    #[tokio::test]
    async fn second_write_keeps_previous_as_backup() {
        let (cache, _tmp) = test_cache_fs();
        cache.write_summary("case-1", "v1").await.unwrap();
        cache.write_summary("case-1", "v2").await.unwrap();

        let current = cache.read_summary("case-1").await.unwrap().unwrap();
        assert_eq!(current, "v2");

        let backup_path = cache.backup_path("case-1");
        let backup = fs::read_to_string(backup_path).await.unwrap();
        assert_eq!(backup, "v1");
    }

    #[tokio::test]
    async fn delete_case_removes_the_directory() {
        let (cache, _tmp) = test_cache_fs();
        cache.write_summary("case-1", "v1").await.unwrap();
        cache.delete_case("case-1").await.unwrap();
        assert!(cache.read_summary("case-1").await.unwrap().is_none());
    }
}

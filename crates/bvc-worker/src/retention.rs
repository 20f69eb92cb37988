//! Retention cleanup of produced files.

use std::path::Path;

use bvc_models::produced_file_date;
use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

use crate::error::WorkerResult;
use crate::processor::is_file;

/// Delete concat lists and outputs in `dir` started more than
/// `retention_days` days before `today`.
///
/// Returns the number of files deleted. Files that cannot be removed are
/// logged and left in place.
pub async fn cleanup_produced_files(
    dir: &Path,
    today: NaiveDate,
    retention_days: i64,
) -> WorkerResult<usize> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if is_file(&entry.path()).await? {
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }
    }
    names.sort();

    let mut deleted = 0;
    for name in names {
        let date = match produced_file_date(&name) {
            Ok(Some(date)) => date,
            Ok(None) => continue,
            Err(e) => {
                warn!("Skipping {}: {}", name, e);
                continue;
            }
        };

        let age_days = (today - date).num_days();
        if age_days <= retention_days {
            continue;
        }

        let path = dir.join(&name);
        info!("Deleting {}", path.display());
        match tokio::fs::remove_file(&path).await {
            Ok(()) => deleted += 1,
            Err(e) => error!("error: {}: {}", path.display(), e),
        }
    }

    debug!("Deleted {} files from {}", deleted, dir.display());
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"").unwrap();
    }

    #[tokio::test]
    async fn test_deletes_only_expired_produced_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "20240301_080000-20240301_090000_F.mp4");
        touch(dir.path(), "20240301_080000-20240301_090000_R.con");
        touch(dir.path(), "20240302_235900-20240303_000500_F.mp4");
        touch(dir.path(), "20240301_080000_NF.mp4");
        touch(dir.path(), "blackvueconcat.lock");
        std::fs::create_dir(dir.path().join("20200101_000000-20200101_000100_F.mp4")).unwrap();

        let today = NaiveDate::from_ymd_opt(2024, 3, 16).unwrap();
        let deleted = cleanup_produced_files(dir.path(), today, 14).await.unwrap();

        // 15 days old goes, 14 days old stays
        assert_eq!(deleted, 2);
        assert!(!dir.path().join("20240301_080000-20240301_090000_F.mp4").exists());
        assert!(!dir.path().join("20240301_080000-20240301_090000_R.con").exists());
        assert!(dir.path().join("20240302_235900-20240303_000500_F.mp4").exists());
        assert!(dir.path().join("20240301_080000_NF.mp4").exists());
        assert!(dir.path().join("blackvueconcat.lock").exists());
        assert!(dir.path().join("20200101_000000-20200101_000100_F.mp4").is_dir());
    }

    #[tokio::test]
    async fn test_zero_retention_keeps_today() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "20240316_080000-20240316_090000_F.mp4");
        touch(dir.path(), "20240315_080000-20240315_090000_F.mp4");

        let today = NaiveDate::from_ymd_opt(2024, 3, 16).unwrap();
        let deleted = cleanup_produced_files(dir.path(), today, 0).await.unwrap();

        assert_eq!(deleted, 1);
        assert!(dir.path().join("20240316_080000-20240316_090000_F.mp4").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinked_produced_file_is_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let target = tempfile::tempdir().unwrap();
        let real = target.path().join("video.mp4");
        std::fs::write(&real, b"").unwrap();
        let link = dir.path().join("20240301_080000-20240301_090000_F.mp4");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let today = NaiveDate::from_ymd_opt(2024, 3, 16).unwrap();
        let deleted = cleanup_produced_files(dir.path(), today, 14).await.unwrap();

        assert_eq!(deleted, 1);
        assert!(std::fs::symlink_metadata(&link).is_err());
        // Only the link goes
        assert!(real.exists());
    }

    #[tokio::test]
    async fn test_negative_retention_deletes_today() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "20240316_080000-20240316_090000_F.mp4");

        let today = NaiveDate::from_ymd_opt(2024, 3, 16).unwrap();
        assert_eq!(cleanup_produced_files(dir.path(), today, -1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_directory_is_an_error() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 16).unwrap();
        assert!(cleanup_produced_files(Path::new("/nonexistent/out"), today, 14)
            .await
            .is_err());
    }
}

//! The single active attached document merged after every rendered
//! quotation. Its bytes live either on the local filesystem or behind an
//! HTTP URL.

use sqlx::Row;
use thiserror::Error;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttachmentRecord {
    pub id: String,
    pub file_name: String,
    pub location: String,
}

#[derive(Debug, Error)]
pub enum AttachmentFetchError {
    #[error("could not read attachment file `{path}`: {source}")]
    File { path: String, source: std::io::Error },
    #[error("could not download attachment `{url}`: {source}")]
    Download { url: String, source: reqwest::Error },
    #[error("attachment download `{url}` returned status {status}")]
    DownloadStatus { url: String, status: u16 },
}

impl AttachmentRecord {
    pub fn is_remote(&self) -> bool {
        self.location.starts_with("http://") || self.location.starts_with("https://")
    }

    /// Materialize the attachment bytes from wherever they live.
    pub async fn fetch_bytes(&self) -> Result<Vec<u8>, AttachmentFetchError> {
        if self.is_remote() {
            let response = reqwest::get(&self.location).await.map_err(|source| {
                AttachmentFetchError::Download { url: self.location.clone(), source }
            })?;

            if !response.status().is_success() {
                return Err(AttachmentFetchError::DownloadStatus {
                    url: self.location.clone(),
                    status: response.status().as_u16(),
                });
            }

            let bytes = response.bytes().await.map_err(|source| {
                AttachmentFetchError::Download { url: self.location.clone(), source }
            })?;
            return Ok(bytes.to_vec());
        }

        tokio::fs::read(&self.location).await.map_err(|source| AttachmentFetchError::File {
            path: self.location.clone(),
            source,
        })
    }
}

/// The currently active attachment, if any.
pub async fn find_active(pool: &DbPool) -> Result<Option<AttachmentRecord>, RepositoryError> {
    let row = sqlx::query(
        "SELECT id, file_name, location FROM attached_files WHERE is_active = 1 LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| AttachmentRecord {
        id: row.get("id"),
        file_name: row.get("file_name"),
        location: row.get("location"),
    }))
}

/// Register a new attachment and make it the only active one.
pub async fn register(
    pool: &DbPool,
    id: &str,
    file_name: &str,
    location: &str,
) -> Result<AttachmentRecord, RepositoryError> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE attached_files SET is_active = 0 WHERE is_active = 1")
        .execute(&mut *tx)
        .await?;
    sqlx::query(
        "INSERT OR REPLACE INTO attached_files (id, file_name, location, is_active)
         VALUES (?1, ?2, ?3, 1)",
    )
    .bind(id)
    .bind(file_name)
    .bind(location)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(AttachmentRecord {
        id: id.to_string(),
        file_name: file_name.to_string(),
        location: location.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use crate::{connect_with_settings, migrations};

    use super::{find_active, register};

    async fn pool() -> crate::DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    #[tokio::test]
    async fn registering_replaces_the_active_attachment() {
        let pool = pool().await;

        assert!(find_active(&pool).await.expect("query").is_none());

        register(&pool, "att-1", "brochure.pdf", "/tmp/brochure.pdf").await.expect("register");
        register(&pool, "att-2", "tarifario.pdf", "https://ccd.pe/tarifario.pdf")
            .await
            .expect("register second");

        let active = find_active(&pool).await.expect("query").expect("active exists");
        assert_eq!(active.id, "att-2");
        assert!(active.is_remote());
    }

    #[tokio::test]
    async fn local_attachment_bytes_are_read_from_disk() {
        let pool = pool().await;

        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"%PDF-1.4 stub").expect("write");
        let path = file.path().to_string_lossy().to_string();

        let record =
            register(&pool, "att-1", "stub.pdf", &path).await.expect("register");
        let bytes = record.fetch_bytes().await.expect("fetch");
        assert_eq!(bytes, b"%PDF-1.4 stub");
    }

    #[tokio::test]
    async fn missing_local_attachment_reports_the_path() {
        let record = super::AttachmentRecord {
            id: "att-x".to_string(),
            file_name: "gone.pdf".to_string(),
            location: "/definitely/not/here.pdf".to_string(),
        };

        let error = record.fetch_bytes().await.expect_err("fetch should fail");
        assert!(error.to_string().contains("/definitely/not/here.pdf"));
    }
}

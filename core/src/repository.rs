//! Durable storage of enumeration results.
//!
//! Layout inside the output directory:
//! * `<domain>_<source>.log`: the unmodified output lines of one source.
//! * `<domain>_subdomains.txt`: the final deduplicated list, one hostname per line.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use subtake_common::domain::Domain;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Defines where raw and final results of a run end up.
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Stores the raw output lines of one source.
    async fn save_source_log(
        &self,
        domain: &Domain,
        source_slug: &str,
        lines: &[String],
    ) -> Result<PathBuf, PersistError>;

    /// Stores the final subdomain list of `domain`.
    async fn save_subdomains(
        &self,
        domain: &Domain,
        subdomains: &[String],
    ) -> Result<PathBuf, PersistError>;
}

pub struct FileRepository {
    root: PathBuf,
}

impl FileRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn source_log_path(&self, domain: &Domain, source_slug: &str) -> PathBuf {
        self.root.join(format!("{domain}_{source_slug}.log"))
    }

    pub fn summary_path(&self, domain: &Domain) -> PathBuf {
        self.root.join(format!("{domain}_subdomains.txt"))
    }

    async fn write_lines(&self, path: &Path, lines: &[String]) -> Result<(), PersistError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| PersistError::CreateDir {
                path: self.root.clone(),
                source,
            })?;

        let mut contents = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
        for line in lines {
            contents.push_str(line);
            contents.push('\n');
        }

        tokio::fs::write(path, contents)
            .await
            .map_err(|source| PersistError::Write {
                path: path.to_path_buf(),
                source,
            })
    }
}

#[async_trait]
impl ResultRepository for FileRepository {
    async fn save_source_log(
        &self,
        domain: &Domain,
        source_slug: &str,
        lines: &[String],
    ) -> Result<PathBuf, PersistError> {
        let path = self.source_log_path(domain, source_slug);
        self.write_lines(&path, lines).await?;
        Ok(path)
    }

    async fn save_subdomains(
        &self,
        domain: &Domain,
        subdomains: &[String],
    ) -> Result<PathBuf, PersistError> {
        let path = self.summary_path(domain);
        self.write_lines(&path, subdomains).await?;
        Ok(path)
    }
}

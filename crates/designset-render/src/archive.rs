//! Remote design-set archives.
//!
//! A remote design set is a zip archive fetched over HTTP and expanded
//! entirely into memory; nothing is written to disk.

use std::{
    collections::BTreeMap,
    io::{Cursor, Read},
    path::Path,
    time::Duration,
};

use designset_core::config::RemoteSettings;
use reqwest::{StatusCode, redirect::Policy};
use thiserror::Error;
use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::{designset::DesignSet, fileset::FileSet};

/// Archive processing errors.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Non-200 response or transport failure.
    #[error("download failed: {0}")]
    Download(String),

    /// The bytes are not a readable zip archive.
    #[error("archive extraction failed: {0}")]
    Extraction(String),

    /// Reading a local archive file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// HTTP options for archive downloads.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Whole-request timeout.
    pub timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::from(&RemoteSettings::default())
    }
}

impl From<&RemoteSettings> for FetchOptions {
    fn from(settings: &RemoteSettings) -> Self {
        Self {
            timeout: settings.timeout(),
            user_agent: settings.user_agent.clone(),
        }
    }
}

/// Download an archive, following redirects.
///
/// Anything but `200 OK` is a [`ArchiveError::Download`].
pub async fn fetch(url: &str, options: &FetchOptions) -> Result<Vec<u8>> {
    info!(url, timeout_secs = options.timeout.as_secs(), "downloading archive");

    let client = reqwest::Client::builder()
        .timeout(options.timeout)
        .user_agent(options.user_agent.as_str())
        .redirect(Policy::limited(10))
        .build()
        .map_err(|e| ArchiveError::Download(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ArchiveError::Download(e.to_string()))?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(ArchiveError::Download(format!("HTTP {}", status.as_u16())));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| ArchiveError::Download(e.to_string()))?;

    debug!(url, bytes = body.len(), "archive downloaded");
    Ok(body.to_vec())
}

/// Expand zip bytes into an in-memory [`FileSet`].
///
/// Directory entries are skipped. Entries that cannot be decompressed are
/// dropped with a warning; only an unreadable archive is an error.
pub fn expand(bytes: &[u8]) -> Result<FileSet> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| ArchiveError::Extraction(e.to_string()))?;

    let mut entries = BTreeMap::new();
    for index in 0..archive.len() {
        let mut entry = match archive.by_index(index) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(index, error = %e, "skipping unreadable archive entry");
                continue;
            }
        };

        if entry.is_dir() {
            continue;
        }

        let name = entry.name().replace('\\', "/");
        let mut content = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
        if let Err(e) = entry.read_to_end(&mut content) {
            warn!(entry = %name, error = %e, "skipping undecodable archive entry");
            continue;
        }
        entries.insert(name, content);
    }

    debug!(files = entries.len(), "archive expanded");
    Ok(FileSet::memory(entries))
}

/// Download, expand and name a remote design set.
pub async fn load_remote(url: &str, options: &FetchOptions) -> Result<DesignSet> {
    let bytes = fetch(url, options).await?;
    Ok(DesignSet::from_archive(expand(&bytes)?))
}

/// Expand and name a design set from a zip file on disk.
pub fn load_file(path: &Path) -> Result<DesignSet> {
    let bytes = std::fs::read(path)?;
    Ok(DesignSet::from_archive(expand(&bytes)?))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::{ZipWriter, write::SimpleFileOptions};

    use super::*;

    fn build_zip(files: &[(&str, &[u8])], dirs: &[&str]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for dir in dirs {
            writer.add_directory(*dir, options).unwrap();
        }
        for (name, content) in files {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_expand_skips_directories() {
        let bytes = build_zip(
            &[
                ("shop/config.json", b"{\"theme\":\"a\"}"),
                ("shop/standard/html/top.html", b"<html></html>"),
            ],
            &["shop/", "shop/standard/"],
        );

        let files = expand(&bytes).expect("expand");
        assert_eq!(files.memory_len(), Some(2));
        assert_eq!(
            files.paths(),
            vec!["shop/config.json", "shop/standard/html/top.html"]
        );
        assert_eq!(
            files.read("shop/config.json").as_deref(),
            Some(b"{\"theme\":\"a\"}".as_slice())
        );
    }

    #[test]
    fn test_expand_rejects_garbage() {
        let err = expand(b"definitely not a zip").unwrap_err();
        assert!(matches!(err, ArchiveError::Extraction(_)));
        assert!(err.to_string().starts_with("archive extraction failed"));
    }

    #[test]
    fn test_load_file_detects_root() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("set.zip");
        std::fs::write(
            &path,
            build_zip(&[("data.json", b"{}"), ("standard/html/top.html", b"x")], &[]),
        )
        .unwrap();

        let ds = load_file(&path).expect("load");
        assert_eq!(ds.name(), crate::designset::REMOTE_DESIGN_SET);
    }

    #[tokio::test]
    async fn test_fetch_transport_failure() {
        let options = FetchOptions {
            timeout: Duration::from_secs(2),
            ..FetchOptions::default()
        };
        let err = fetch("http://127.0.0.1:1/designset.zip", &options)
            .await
            .unwrap_err();
        assert!(matches!(err, ArchiveError::Download(_)));
    }

    #[test]
    fn test_fetch_options_from_settings() {
        let options = FetchOptions::default();
        assert_eq!(options.timeout, Duration::from_secs(30));
        assert_eq!(options.user_agent, "MakeShop Template Renderer/1.0");
    }
}

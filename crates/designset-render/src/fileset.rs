//! Byte stores addressed by forward-slash paths.
//!
//! A [`FileSet`] is either backed by a directory on disk (read lazily) or
//! by a fully materialised map, as produced by expanding a remote archive.
//! The rest of the pipeline only talks to this type.

use std::{borrow::Cow, collections::BTreeMap, fs, path::PathBuf};

use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Clone)]
enum Backing {
    Directory(PathBuf),
    Memory(BTreeMap<String, Vec<u8>>),
}

/// Path-to-bytes store.
#[derive(Debug, Clone)]
pub struct FileSet {
    backing: Backing,
}

impl FileSet {
    /// File set rooted at a directory; paths resolve against `root`.
    #[must_use]
    pub fn directory(root: impl Into<PathBuf>) -> Self {
        Self {
            backing: Backing::Directory(root.into()),
        }
    }

    /// File set holding every entry in memory.
    ///
    /// Keys are normalised to forward slashes.
    #[must_use]
    pub fn memory(entries: impl IntoIterator<Item = (String, Vec<u8>)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(path, bytes)| (path.replace('\\', "/"), bytes))
            .collect();
        Self {
            backing: Backing::Memory(entries),
        }
    }

    /// Read a file's bytes.
    #[must_use]
    pub fn read(&self, path: &str) -> Option<Cow<'_, [u8]>> {
        if !is_safe_path(path) {
            return None;
        }
        match &self.backing {
            Backing::Directory(root) => {
                let full = root.join(path);
                if !full.is_file() {
                    return None;
                }
                match fs::read(&full) {
                    Ok(bytes) => Some(Cow::Owned(bytes)),
                    Err(e) => {
                        debug!(path = %full.display(), error = %e, "failed to read file");
                        None
                    }
                }
            }
            Backing::Memory(entries) => entries.get(path).map(|b| Cow::Borrowed(b.as_slice())),
        }
    }

    /// Whether a regular file exists at `path`.
    #[must_use]
    pub fn exists(&self, path: &str) -> bool {
        if !is_safe_path(path) {
            return false;
        }
        match &self.backing {
            Backing::Directory(root) => root.join(path).is_file(),
            Backing::Memory(entries) => entries.contains_key(path),
        }
    }

    /// Regular files directly inside `dir`, as full paths, sorted.
    #[must_use]
    pub fn list_dir(&self, dir: &str) -> Vec<String> {
        let dir = dir.trim_end_matches('/');
        if !dir.is_empty() && !is_safe_path(dir) {
            return Vec::new();
        }
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{dir}/")
        };

        match &self.backing {
            Backing::Directory(root) => {
                let Ok(read_dir) = fs::read_dir(root.join(dir)) else {
                    return Vec::new();
                };
                let mut files: Vec<String> = read_dir
                    .filter_map(std::result::Result::ok)
                    .filter(|entry| entry.path().is_file())
                    .filter_map(|entry| entry.file_name().to_str().map(|n| format!("{prefix}{n}")))
                    .collect();
                files.sort();
                files
            }
            Backing::Memory(entries) => entries
                .keys()
                .filter(|key| {
                    key.strip_prefix(&prefix)
                        .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
                })
                .cloned()
                .collect(),
        }
    }

    /// Every file path in the set, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        match &self.backing {
            Backing::Directory(root) => {
                let mut paths: Vec<String> = WalkDir::new(root)
                    .into_iter()
                    .filter_map(std::result::Result::ok)
                    .filter(|entry| entry.file_type().is_file())
                    .filter_map(|entry| {
                        let relative = entry.path().strip_prefix(root).ok()?;
                        let parts: Vec<_> = relative
                            .components()
                            .map(|c| c.as_os_str().to_str())
                            .collect::<Option<_>>()?;
                        Some(parts.join("/"))
                    })
                    .collect();
                paths.sort();
                paths
            }
            Backing::Memory(entries) => entries.keys().cloned().collect(),
        }
    }

    /// Number of files held in memory, or `None` for directory-backed sets.
    #[must_use]
    pub fn memory_len(&self) -> Option<usize> {
        match &self.backing {
            Backing::Directory(_) => None,
            Backing::Memory(entries) => Some(entries.len()),
        }
    }
}

/// Relative, forward-slash, no `..` and no empty segments.
fn is_safe_path(path: &str) -> bool {
    !path.is_empty()
        && !path.starts_with('/')
        && !path.contains('\\')
        && path.split('/').all(|seg| !seg.is_empty() && seg != ".." && seg != ".")
}

/// File name part of a forward-slash path.
#[must_use]
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// File name without its final extension.
#[must_use]
pub fn file_stem(path: &str) -> &str {
    let name = file_name(path);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}

/// Lower-cased final extension, if any.
#[must_use]
pub fn extension(path: &str) -> Option<String> {
    let name = file_name(path);
    match name.rfind('.') {
        Some(0) | None => None,
        Some(idx) => Some(name[idx + 1..].to_ascii_lowercase()),
    }
}

//! Design-set naming and path resolution.
//!
//! A design set lives under a `<name>/` prefix (local folders, most
//! archives) or directly at the root of an archive. Archive lookups try the
//! namespaced path first and fall back to the root-level path; local design
//! sets only ever see their own folder.

use std::{borrow::Cow, collections::BTreeMap, fs, path::Path};

use tracing::debug;

use crate::{
    error::{RenderError, Result},
    fileset::{FileSet, extension, file_name},
};

/// Name used when an archive holds a design set at its root.
pub const REMOTE_DESIGN_SET: &str = "remote-designset";

/// A named design set backed by a [`FileSet`].
#[derive(Debug, Clone)]
pub struct DesignSet {
    name: String,
    files: FileSet,
    root_fallback: bool,
}

impl DesignSet {
    /// Create an archive-style design set from parts without validation.
    ///
    /// Paths missing under `<name>/` resolve at the file-set root.
    #[must_use]
    pub fn new(name: impl Into<String>, files: FileSet) -> Self {
        Self {
            name: name.into(),
            files,
            root_fallback: true,
        }
    }

    /// Open a design-set folder below `root`.
    pub fn open_local(root: &Path, name: &str) -> Result<Self> {
        let dir = root.join(name);
        let single_component = !name.is_empty()
            && !name.contains(['/', '\\'])
            && name != "."
            && name != "..";
        if !single_component || !dir.is_dir() {
            return Err(RenderError::DesignSetNotFound(dir.display().to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            files: FileSet::directory(root),
            root_fallback: false,
        })
    }

    /// Wrap an expanded archive, inferring the design-set name.
    #[must_use]
    pub fn from_archive(files: FileSet) -> Self {
        let name = detect_root(&files);
        debug!(designset = %name, "detected design set root");
        Self::new(name, files)
    }

    /// Design-set name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Underlying file set.
    #[must_use]
    pub fn files(&self) -> &FileSet {
        &self.files
    }

    /// Resolve a design-set relative path to a file-set path.
    ///
    /// `<name>/<rel>` wins; for archives `<rel>` is used when that is absent.
    #[must_use]
    pub fn resolve(&self, rel: &str) -> Option<String> {
        let namespaced = format!("{}/{rel}", self.name);
        if self.files.exists(&namespaced) {
            Some(namespaced)
        } else if self.root_fallback && self.files.exists(rel) {
            Some(rel.to_string())
        } else {
            None
        }
    }

    /// Read a design-set relative file.
    #[must_use]
    pub fn read(&self, rel: &str) -> Option<Cow<'_, [u8]>> {
        self.resolve(rel).and_then(|path| self.files.read(&path))
    }

    /// Whether a design-set relative file exists.
    #[must_use]
    pub fn exists(&self, rel: &str) -> bool {
        self.resolve(rel).is_some()
    }

    /// Files directly under `rel_dir` with the given extension.
    ///
    /// Returns `file name -> file-set path`. Archives merge the namespaced
    /// and root-level directories; the namespaced file wins on a name clash.
    #[must_use]
    pub fn list(&self, rel_dir: &str, ext: &str) -> BTreeMap<String, String> {
        let rel_dir = rel_dir.trim_end_matches('/');
        let mut found = BTreeMap::new();

        let namespaced = format!("{}/{rel_dir}", self.name);
        let mut dirs = vec![namespaced.as_str()];
        if self.root_fallback {
            dirs.push(rel_dir);
        }
        for dir in dirs {
            for path in self.files.list_dir(dir) {
                if extension(&path).as_deref() != Some(ext) {
                    continue;
                }
                found.entry(file_name(&path).to_string()).or_insert(path);
            }
        }
        found
    }

    /// Page template file names under `standard/html/`, sorted.
    #[must_use]
    pub fn templates(&self) -> Vec<String> {
        self.list("standard/html", "html").into_keys().collect()
    }
}

/// Infer the design-set name from the layout of an expanded archive.
///
/// Rules, applied in priority order over the sorted entry list:
/// 1. `config.json` or `data.json` at the root → [`REMOTE_DESIGN_SET`]
/// 2. `<name>/config.json` or `<name>/data.json` → `name`
/// 3. anything under `standard/` at the root → [`REMOTE_DESIGN_SET`]
/// 4. anything under `<name>/standard/` → `name`
#[must_use]
pub fn detect_root(files: &FileSet) -> String {
    let paths = files.paths();

    if paths.iter().any(|p| p == "config.json" || p == "data.json") {
        return REMOTE_DESIGN_SET.to_string();
    }

    let namespaced_data = paths.iter().find_map(|p| {
        let (name, rest) = p.split_once('/')?;
        (rest == "config.json" || rest == "data.json").then_some(name)
    });
    if let Some(name) = namespaced_data {
        return name.to_string();
    }

    if paths.iter().any(|p| p.starts_with("standard/")) {
        return REMOTE_DESIGN_SET.to_string();
    }

    let namespaced_standard = paths.iter().find_map(|p| {
        let (name, rest) = p.split_once('/')?;
        rest.starts_with("standard/").then_some(name)
    });

    namespaced_standard.map_or_else(|| REMOTE_DESIGN_SET.to_string(), str::to_string)
}

/// Names of local design-set folders below `root` that start with `prefix`, sorted.
#[must_use]
pub fn discover_local(root: &Path, prefix: &str) -> Vec<String> {
    let Ok(entries) = fs::read_dir(root) else {
        return Vec::new();
    };

    let mut names: Vec<String> = entries
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|name| name.starts_with(prefix))
        .collect();
    names.sort();
    names
}

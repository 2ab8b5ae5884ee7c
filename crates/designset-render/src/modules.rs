//! Module pre-rendering.
//!
//! Every `.html` file directly under `_module_/` is rendered against the
//! same snapshot of the page context and exposed to the main template as
//! text, keyed by file stem.

use std::collections::BTreeMap;

use designset_core::encoding;
use serde_json::Value;
use tracing::debug;

use crate::{
    designset::DesignSet,
    engine::Engine,
    fileset::file_stem,
};

/// Design-set relative directory holding modules.
pub const MODULE_DIR: &str = "_module_";

/// Result of rendering one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleOutcome {
    /// Rendered text.
    Rendered(String),
    /// Why the module could not be rendered.
    Failed(String),
}

impl ModuleOutcome {
    /// Rendered text, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Rendered(text) => Some(text),
            Self::Failed(_) => None,
        }
    }
}

/// Render every module against `scope`.
///
/// `scope` must not contain a `module` key.
#[must_use]
pub fn render_modules(
    engine: &Engine,
    design_set: &DesignSet,
    scope: &Value,
) -> BTreeMap<String, ModuleOutcome> {
    let files = design_set.list(MODULE_DIR, "html");
    debug!(designset = %design_set.name(), count = files.len(), "rendering modules");

    files
        .into_iter()
        .map(|(file_name, path)| {
            let name = file_stem(&file_name).to_string();
            let outcome = match design_set.files().read(&path) {
                Some(bytes) => {
                    let source = encoding::to_utf8(&bytes);
                    match engine.render(&path, &source, scope) {
                        Ok(text) => ModuleOutcome::Rendered(text),
                        Err(e) => ModuleOutcome::Failed(e.to_string()),
                    }
                }
                None => ModuleOutcome::Failed(format!("unreadable module file: {path}")),
            };
            (name, outcome)
        })
        .collect()
}

//! Page data assembly.

use designset_core::{PageContext, encoding};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{designset::DesignSet, error::Result};

/// Settings file exposed under `config`.
pub const CONFIG_FILE: &str = "config.json";

/// Page data file merged into the top level.
pub const DATA_FILE: &str = "data.json";

/// Load a JSON object from the design set.
///
/// Missing files, malformed JSON and non-object documents all yield an
/// empty object.
#[must_use]
pub fn load_json(design_set: &DesignSet, rel: &str) -> Map<String, Value> {
    let Some(bytes) = design_set.read(rel) else {
        return Map::new();
    };

    match serde_json::from_str::<Value>(&encoding::to_utf8(&bytes)) {
        Ok(Value::Object(map)) => {
            debug!(designset = %design_set.name(), file = rel, keys = map.len(), "loaded json");
            map
        }
        Ok(other) => {
            warn!(
                designset = %design_set.name(),
                file = rel,
                kind = designset_core::value::kind_name(&other),
                "json document is not an object, ignoring"
            );
            Map::new()
        }
        Err(e) => {
            warn!(
                designset = %design_set.name(),
                file = rel,
                error = %e,
                "malformed json, ignoring"
            );
            Map::new()
        }
    }
}

/// Build the page context: defaults, then `data.json`, then `config.json`,
/// then `overrides` deep-merged on top.
///
/// `Value::Null` means no overrides.
pub fn assemble(design_set: &DesignSet, overrides: Value) -> Result<PageContext> {
    let mut context = PageContext::with_defaults(design_set.name());
    context.merge_data(load_json(design_set, DATA_FILE));
    context.set_config(load_json(design_set, CONFIG_FILE));
    context.apply_overrides(overrides)?;
    Ok(context)
}

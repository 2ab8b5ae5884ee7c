//! Render command - one-shot page render

use std::{
    fs,
    path::{Path, PathBuf},
};

use color_eyre::eyre::{Result, WrapErr, bail, eyre};
use designset_core::Settings;
use designset_render::{
    DesignSet, FetchOptions, RenderRequest, Renderer, archive, discover_local,
};
use serde_json::Value;

/// Where the design set comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Local design-set folder; the first one found when `None`.
    Local(Option<String>),
    /// Zip archive, either an `http(s)://` URL or a file path.
    Archive(String),
}

/// Options for the render command.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Template file name under `standard/html/`.
    pub template: String,
    /// Design-set source.
    pub source: Source,
    /// JSON file with override data.
    pub data: Option<PathBuf>,
    /// Inline stylesheets and scripts. Archives are always inlined.
    pub inline: bool,
    /// Output file; stdout when `None`.
    pub output: Option<PathBuf>,
}

/// Run the render command.
pub async fn run(settings: &Settings, options: RenderOptions) -> Result<()> {
    tracing::info!(template = %options.template, source = ?options.source, "Rendering page");

    let overrides = match &options.data {
        Some(path) => load_overrides(path)?,
        None => Value::Null,
    };
    let renderer = Renderer::from_settings(&settings.render)
        .wrap_err("Failed to initialise renderer")?;

    let page = match &options.source {
        Source::Archive(location) => {
            let request = RenderRequest::new(&options.template)
                .with_overrides(overrides)
                .with_inline_assets(true);
            if is_url(location) {
                renderer
                    .render_remote(location, &FetchOptions::from(&settings.remote), &request)
                    .await?
            } else {
                let design_set = archive::load_file(Path::new(location))
                    .wrap_err_with(|| format!("Failed to read archive {location}"))?;
                renderer.render_archive(&design_set, &request)?
            }
        }
        Source::Local(name) => {
            let name = match name {
                Some(name) => name.clone(),
                None => discover_local(&settings.designsets.root, &settings.designsets.prefix)
                    .into_iter()
                    .next()
                    .ok_or_else(|| {
                        eyre!(
                            "No design set found in {}",
                            settings.designsets.root.display()
                        )
                    })?,
            };
            let request = RenderRequest::new(&options.template)
                .with_overrides(overrides)
                .with_inline_assets(options.inline);
            let design_set = DesignSet::open_local(&settings.designsets.root, &name)?;
            renderer.render(&design_set, &request)?
        }
    };

    match &options.output {
        Some(path) => {
            fs::write(path, &page)
                .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
            println!("  ✓ Wrote {} ({} bytes)", path.display(), page.len());
        }
        None => print!("{page}"),
    }

    Ok(())
}

fn is_url(location: &str) -> bool {
    let lower = location.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn load_overrides(path: &Path) -> Result<Value> {
    let content =
        fs::read_to_string(path).wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .wrap_err_with(|| format!("Invalid JSON in {}", path.display()))?;
    if !value.is_object() {
        bail!("Override data in {} must be a JSON object", path.display());
    }
    Ok(value)
}

//! Render orchestration.
//!
//! Ties the pipeline together for local folders and expanded archives.

use std::{collections::BTreeMap, time::Instant};

use designset_core::{PageContext, config::RenderSettings, encoding};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    archive::{self, FetchOptions},
    assembler,
    designset::DesignSet,
    engine::Engine,
    error::{RenderError, Result},
    fileset::file_stem,
    inline,
    modules::{self, ModuleOutcome},
};

/// Design-set relative directory holding page templates.
pub const TEMPLATE_DIR: &str = "standard/html";

/// One page render.
#[derive(Debug, Clone, Default)]
pub struct RenderRequest {
    /// Template file name under `standard/html/`, e.g. `top.html`.
    pub template: String,

    /// Data deep-merged over the assembled context; `Null` for none.
    pub overrides: Value,

    /// Embed stylesheets and scripts into the page.
    pub inline_assets: bool,
}

impl RenderRequest {
    /// Create a request for a template with no overrides.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            ..Self::default()
        }
    }

    /// Set override data.
    #[must_use]
    pub fn with_overrides(mut self, overrides: Value) -> Self {
        self.overrides = overrides;
        self
    }

    /// Enable or disable asset inlining.
    #[must_use]
    pub fn with_inline_assets(mut self, inline_assets: bool) -> Self {
        self.inline_assets = inline_assets;
        self
    }
}

/// Page renderer holding the configured template engine.
#[derive(Debug)]
pub struct Renderer {
    engine: Engine,
    strict_modules: bool,
}

impl Renderer {
    /// Create a renderer with default settings.
    pub fn new() -> Result<Self> {
        Ok(Self {
            engine: Engine::new()?,
            strict_modules: false,
        })
    }

    /// Create a renderer from settings.
    pub fn from_settings(settings: &RenderSettings) -> Result<Self> {
        Ok(Self::new()?.with_strict_modules(settings.strict_modules))
    }

    /// Fail the page when any module fails.
    #[must_use]
    pub fn with_strict_modules(mut self, strict: bool) -> Self {
        self.strict_modules = strict;
        self
    }

    /// Render a page from a design set.
    pub fn render(&self, design_set: &DesignSet, request: &RenderRequest) -> Result<String> {
        let start = Instant::now();
        info!(
            designset = %design_set.name(),
            template = %request.template,
            inline = request.inline_assets,
            "rendering page"
        );

        // 1. Locate the main template
        let source = template_source(design_set, &request.template)?;

        // 2. Assemble data
        let mut context = assembler::assemble(design_set, request.overrides.clone())?;

        // 3. Link the page stylesheet when it is not going to be inlined
        if !request.inline_assets {
            link_page_stylesheet(design_set, &request.template, &mut context);
        }

        // 4. Pre-render modules
        let modules = self.render_modules(design_set, &context)?;
        let namespace = context.finish(modules);

        // 5. Render the main template
        let name = format!("{TEMPLATE_DIR}/{}", request.template);
        let mut html = self.engine.render(&name, &source, &namespace)?;

        // 6. Inline assets
        if request.inline_assets {
            let block = inline::generate_inline_block(design_set, &request.template);
            if !block.is_empty() {
                html = inline::splice(&html, &block);
            }
        }

        info!(
            designset = %design_set.name(),
            template = %request.template,
            bytes = html.len(),
            duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "page rendered"
        );
        Ok(html)
    }

    /// Render a page from an expanded archive.
    ///
    /// Every failure is reported as a remote archive failure.
    pub fn render_archive(
        &self,
        design_set: &DesignSet,
        request: &RenderRequest,
    ) -> Result<String> {
        self.render(design_set, request).map_err(RenderError::remote)
    }

    /// Download an archive and render a page from it.
    pub async fn render_remote(
        &self,
        url: &str,
        options: &FetchOptions,
        request: &RenderRequest,
    ) -> Result<String> {
        let design_set = archive::load_remote(url, options)
            .await
            .map_err(|e| RenderError::from(e).remote())?;
        self.render_archive(&design_set, request)
    }

    /// The final template namespace, including rendered modules.
    pub fn build_context(&self, design_set: &DesignSet, overrides: Value) -> Result<Value> {
        let context = assembler::assemble(design_set, overrides)?;
        let modules = self.render_modules(design_set, &context)?;
        Ok(context.finish(modules))
    }

    /// Render modules, dropping or escalating failures.
    fn render_modules(
        &self,
        design_set: &DesignSet,
        context: &PageContext,
    ) -> Result<BTreeMap<String, String>> {
        let scope = context.module_scope();
        let mut rendered = BTreeMap::new();

        for (name, outcome) in modules::render_modules(&self.engine, design_set, &scope) {
            match outcome {
                ModuleOutcome::Rendered(text) => {
                    rendered.insert(name, text);
                }
                ModuleOutcome::Failed(reason) if self.strict_modules => {
                    return Err(RenderError::Module { name, reason });
                }
                ModuleOutcome::Failed(reason) => {
                    warn!(
                        designset = %design_set.name(),
                        module = %name,
                        %reason,
                        "module failed to render, omitting"
                    );
                }
            }
        }

        debug!(designset = %design_set.name(), count = rendered.len(), "modules rendered");
        Ok(rendered)
    }
}

fn template_source(design_set: &DesignSet, template: &str) -> Result<String> {
    if template.trim().is_empty() {
        return Err(RenderError::validation("parameter \"template\" is required"));
    }

    let rel = format!("{TEMPLATE_DIR}/{template}");
    let bytes = design_set
        .read(&rel)
        .ok_or_else(|| RenderError::TemplateNotFound(format!("{}/{rel}", design_set.name())))?;
    Ok(encoding::to_utf8(&bytes))
}

fn link_page_stylesheet(design_set: &DesignSet, template: &str, context: &mut PageContext) {
    let stem = file_stem(template);
    if design_set.exists(&format!("standard/css/{stem}.css")) {
        context.append_head(&format!(
            "<link href=\"/designsets/{}/standard/css/{stem}.css\" rel=\"stylesheet\">\n",
            design_set.name()
        ));
    }
}

//! Design-set rendering pipeline.
//!
//! # Modules
//!
//! - [`fileset`] - Path-to-bytes stores over a directory or an expanded archive
//! - [`designset`] - Design-set naming, root detection and path resolution
//! - [`archive`] - Remote zip download and in-memory expansion
//! - [`assembler`] - Page context assembly from `config.json` and `data.json`
//! - [`engine`] - Template engine with `<{ }>` syntax
//! - [`filters`] - Storefront text filters
//! - [`modules`] - `_module_/` pre-rendering
//! - [`inline`] - Stylesheet and script inlining
//! - [`statics`] - Static file serving
//! - [`renderer`] - Render orchestration

pub mod archive;
pub mod assembler;
pub mod designset;
pub mod engine;
pub mod error;
pub mod fileset;
pub mod filters;
pub mod inline;
pub mod modules;
pub mod renderer;
pub mod statics;

pub use archive::{ArchiveError, FetchOptions};
pub use designset::{DesignSet, REMOTE_DESIGN_SET, discover_local};
pub use error::{RenderError, Result};
pub use fileset::FileSet;
pub use modules::ModuleOutcome;
pub use renderer::{RenderRequest, Renderer};
pub use statics::{StaticAsset, load_static};

//! Design-set renderer CLI library.
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations (serve, render, list)
//! - [`server`] - JSON render API and preview server
//!
//! # Example
//!
//! ```no_run
//! use designset::cmd;
//! use designset_core::Settings;
//!
//! let settings = Settings::load(None).unwrap();
//! cmd::list::run(&settings).unwrap();
//! ```

pub mod cmd;
pub mod server;

pub use designset_core::Settings;
pub use designset_render::{DesignSet, RenderRequest, Renderer};

/// Initialize tracing with the specified verbosity level.
///
/// # Arguments
///
/// * `verbose` - Verbosity level (0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE)
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    let mut filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());
    // The HTTP trace layer logs at DEBUG; show requests from -v upward.
    if verbose == 1
        && let Ok(directive) = "tower_http=debug".parse::<tracing_subscriber::filter::Directive>()
    {
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();
}

//! Design-set renderer CLI
//!
//! Renders storefront design sets to HTML, locally or from remote archives.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use std::path::{Path, PathBuf};

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use designset::cmd::{
    self,
    render::{RenderOptions, Source},
};
use designset_core::Settings;

/// Command-line interface for the design-set renderer.
#[derive(Parser)]
#[command(
    name = "designset",
    version,
    about = "Render storefront design sets to HTML"
)]
struct Cli {
    /// Path to settings file (must exist; `designset.toml` is read if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the design-set folders
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Run the render API and preview server
    Serve {
        /// Address to listen on (e.g., 0.0.0.0:8080)
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Render one page
    Render {
        /// Template file under standard/html/ (e.g., top.html)
        #[arg(short, long)]
        template: String,
        /// Local design-set folder (defaults to the first one found)
        #[arg(short, long, conflicts_with = "archive")]
        designset: Option<String>,
        /// Zip archive URL or path
        #[arg(short, long)]
        archive: Option<String>,
        /// JSON file merged over the page data
        #[arg(long)]
        data: Option<PathBuf>,
        /// Inline stylesheets and scripts (always on for archives)
        #[arg(long)]
        inline: bool,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List local design sets and their templates
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    designset::init_tracing(cli.verbose);

    let mut settings =
        load_settings(cli.config.as_deref()).wrap_err("Failed to load settings")?;
    if let Some(root) = cli.root {
        settings.designsets.root = root;
    }

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                settings.server.bind = bind;
            }
            settings.validate().wrap_err("Invalid settings")?;
            cmd::serve::run(settings).await?;
        }
        Commands::Render {
            template,
            designset,
            archive,
            data,
            inline,
            output,
        } => {
            let source = match archive {
                Some(location) => Source::Archive(location),
                None => Source::Local(designset),
            };
            let options = RenderOptions {
                template,
                source,
                data,
                inline,
                output,
            };
            cmd::render::run(&settings, options).await?;
        }
        Commands::List => {
            cmd::list::run(&settings)?;
        }
    }

    Ok(())
}

/// Settings file read when `--config` is not given.
const DEFAULT_CONFIG: &str = "designset.toml";

/// An explicit settings file must exist; the default one is optional.
fn load_settings(config: Option<&Path>) -> designset_core::Result<Settings> {
    match config {
        Some(path) => Settings::load_file(path),
        None => Settings::load(Some(Path::new(DEFAULT_CONFIG))),
    }
}

//! List command - show local design sets and their templates

use color_eyre::eyre::{Result, WrapErr};
use designset_core::Settings;
use designset_render::{DesignSet, discover_local};

/// A local design set and its page templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// Folder name.
    pub name: String,
    /// Template file names under `standard/html/`.
    pub templates: Vec<String>,
}

/// Collect every local design set with its templates.
pub fn collect(settings: &Settings) -> Result<Vec<Listing>> {
    let root = &settings.designsets.root;
    discover_local(root, &settings.designsets.prefix)
        .into_iter()
        .map(|name| {
            let design_set = DesignSet::open_local(root, &name)
                .wrap_err_with(|| format!("Failed to open design set {name}"))?;
            Ok(Listing {
                templates: design_set.templates(),
                name,
            })
        })
        .collect()
}

/// Run the list command.
pub fn run(settings: &Settings) -> Result<()> {
    let listings = collect(settings)?;

    if listings.is_empty() {
        println!(
            "No design sets matching `{}*` in {}",
            settings.designsets.prefix,
            settings.designsets.root.display()
        );
        return Ok(());
    }

    for listing in &listings {
        println!("{}", listing.name);
        if listing.templates.is_empty() {
            println!("  (no templates)");
        }
        for template in &listing.templates {
            println!("  {template}");
        }
    }

    Ok(())
}

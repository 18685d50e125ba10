//! List command implementation
//!
//! Lists installed distributions and editable links in the site directory.

use std::path::Path;

use console::Style;

use super::{GlobalOptions, display_path};
use crate::cli::ListArgs;
use crate::error::Result;
use crate::metadata::{egg_link, list_installed};
use crate::source::name;

/// One line of `list` output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedPackage {
    pub name: String,
    pub version: Option<String>,
    /// `vcs`, `archive`, `dir`, `index` or `editable`
    pub source: String,
    pub location: Option<String>,
}

/// Run list command
pub fn run(global: &GlobalOptions, args: ListArgs) -> Result<()> {
    let site_dir = global.site_dir()?;
    let packages = collect(&site_dir)?;

    if packages.is_empty() {
        println!("No packages installed in {}.", display_path(&site_dir));
        return Ok(());
    }

    println!("Installed packages ({}):", packages.len());
    for package in &packages {
        let version = package.version.as_deref().unwrap_or("-");
        println!(
            "  {} {} {}",
            Style::new().bold().yellow().apply_to(&package.name),
            version,
            Style::new().dim().apply_to(format!("[{}]", package.source))
        );
        if args.detailed {
            if let Some(location) = &package.location {
                println!("    {} {}", Style::new().bold().apply_to("Source:"), location);
            }
        }
    }
    Ok(())
}

/// Installed distributions and editable links, sorted by name
pub fn collect(site_dir: &Path) -> Result<Vec<ListedPackage>> {
    let mut packages = Vec::new();
    for dist in list_installed(site_dir)? {
        let direct_url = dist.direct_url()?;
        packages.push(ListedPackage {
            source: direct_url
                .as_ref()
                .map_or("index", |record| record.kind_label())
                .to_string(),
            location: direct_url.map(|record| record.url),
            name: dist.name,
            version: Some(dist.version),
        });
    }
    for link in egg_link::list(site_dir)? {
        packages.push(ListedPackage {
            location: Some(display_path(&link.source)),
            name: link.name,
            version: None,
            source: "editable".to_string(),
        });
    }
    packages.sort_by_key(|package| name::canonicalize(&package.name));
    Ok(packages)
}

//! Uninstall command implementation

use std::path::Path;

use console::Style;
use inquire::Confirm;

use super::{GlobalOptions, display_path};
use crate::cli::UninstallArgs;
use crate::error::{Result, SourcemarkError};
use crate::metadata::{self, egg_link, find_installed};

/// Run uninstall command
pub fn run(global: &GlobalOptions, args: UninstallArgs) -> Result<()> {
    let site_dir = global.site_dir()?;

    // Every name must resolve before anything is removed
    let mut planned = Vec::with_capacity(args.names.len());
    for name in &args.names {
        planned.push(describe_installed(&site_dir, name)?);
    }

    if !args.yes && !confirm_uninstall(&site_dir, &planned)? {
        println!("Uninstall cancelled.");
        return Ok(());
    }

    let done = Style::new().green().bold();
    for name in &args.names {
        let report = metadata::uninstall(&site_dir, name)?;
        let version = report
            .version
            .unwrap_or_else(|| "(editable)".to_string());
        println!(
            "  {} Removed {} {} ({} file(s))",
            done.apply_to("✓"),
            report.name,
            version,
            report.removed_files
        );
    }
    Ok(())
}

/// `name version` of an installed distribution or editable link
fn describe_installed(site_dir: &Path, name: &str) -> Result<String> {
    if let Some(dist) = find_installed(site_dir, name)? {
        return Ok(format!("{} {}", dist.name, dist.version));
    }
    if let Some(link) = egg_link::find(site_dir, name)? {
        return Ok(format!(
            "{} (editable, {})",
            link.name,
            display_path(&link.source)
        ));
    }
    Err(SourcemarkError::DistributionNotFound {
        name: name.to_string(),
    })
}

fn confirm_uninstall(site_dir: &Path, planned: &[String]) -> Result<bool> {
    println!(
        "\nThe following package(s) will be removed from {}:",
        display_path(site_dir)
    );
    for package in planned {
        println!("  - {package}");
    }
    println!();

    Ok(Confirm::new("Proceed with uninstall?")
        .with_default(true)
        .with_help_message("Press Enter to confirm, or 'n' to cancel")
        .prompt()?)
}

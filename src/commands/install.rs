//! Install command implementation

use std::time::Duration;

use console::Style;

use super::{GlobalOptions, display_path};
use crate::cli::InstallArgs;
use crate::config::ConfigOverrides;
use crate::error::{Result, SourcemarkError, source};
use crate::install::{InstallReport, InstalledTarget, Installer};
use crate::source::InstallTarget;

/// Run install command
pub fn run(global: &GlobalOptions, args: InstallArgs) -> Result<()> {
    let raw_targets = args.target_strings();
    if raw_targets.is_empty() {
        return Err(source::invalid_syntax(
            "",
            "nothing to install; give at least one target or -e <path|url>",
        ));
    }

    // Syntax errors stop the run before anything is fetched
    let targets = raw_targets
        .iter()
        .map(|raw| InstallTarget::parse(raw).map_err(|e| e.for_target(raw)))
        .collect::<Result<Vec<_>>>()?;

    let config = global.resolve(ConfigOverrides {
        site_dir: None,
        src_dir: args.src_dir,
        find_links: args.find_links,
        constraints: args.constraints,
        http_timeout: args.timeout.map(Duration::from_secs),
        no_hash: args.no_hash,
        jobs: args.jobs,
    })?;

    let installer = Installer::new(config)?;
    println!(
        "Installing {} target(s) into {}",
        targets.len(),
        display_path(&installer.config().site_dir)
    );

    let report = installer.install(&targets);
    print_report(&report);
    report.ensure_success()
}

fn print_report(report: &InstallReport) {
    let ok = Style::new().green().bold();
    let failed = Style::new().red().bold();
    let dim = Style::new().dim();

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(installed) => {
                println!(
                    "  {} {} {}",
                    ok.apply_to("✓"),
                    installed_label(installed),
                    dim.apply_to(describe_source(installed))
                );
            }
            Err(e) => {
                let reason = match e {
                    SourcemarkError::TargetFailed { source, .. } => source.to_string(),
                    other => other.to_string(),
                };
                eprintln!(
                    "  {} {}: {}",
                    failed.apply_to("✗"),
                    outcome.target,
                    reason
                );
            }
        }
    }

    let installed = report.installed().count();
    if installed > 0 {
        println!("Installed {installed} package(s)");
    }
}

fn installed_label(installed: &InstalledTarget) -> String {
    let mut label = format!("{} {}", installed.name, installed.version);
    if let Some(previous) = &installed.replaced {
        label.push_str(&format!(" (replaced {previous})"));
    }
    label
}

fn describe_source(installed: &InstalledTarget) -> String {
    match &installed.direct_url {
        Some(direct_url) => format!("[{}] {}", direct_url.kind_label(), direct_url.url),
        None => format!("[{}]", installed.kind.as_str()),
    }
}

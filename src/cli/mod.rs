//! CLI definitions using clap derive API
//!
//! This module is organized into submodules for each command's argument types:
//! - install: Install command arguments
//! - uninstall: Uninstall command arguments
//! - list: List command arguments
//! - show: Show command arguments
//! - completions: Completions command arguments

use clap::builder::{Styles, styling::AnsiColor};
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

pub mod completions;
pub mod install;
pub mod list;
pub mod show;
pub mod uninstall;

pub use completions::CompletionsArgs;
pub use install::InstallArgs;
pub use list::ListArgs;
pub use show::ShowArgs;
pub use uninstall::UninstallArgs;

/// Sourcemark - package installer that remembers where packages came from
#[derive(Parser, Debug)]
#[command(
    name = "sourcemark",
    author,
    version,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Install packages from VCS, archives and directories with direct URL provenance",
    long_about = "Sourcemark installs packages from version control repositories, archives, \
                  local directories and find-links directories. Every install from a direct \
                  source leaves a direct_url.json record naming exactly what was installed.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  sourcemark install 'git+https://host/repo@v1.0#egg=pkg'  \x1b[90m# Install a tag\x1b[0m\n   \
                  sourcemark install ./dist/pkg-1.0.tar.gz                \x1b[90m# Install an archive\x1b[0m\n   \
                  sourcemark install -e ./pkg                             \x1b[90m# Editable install\x1b[0m\n   \
                  sourcemark install pkg -c constraints.txt               \x1b[90m# Constrained install\x1b[0m\n   \
                  sourcemark show pkg                                     \x1b[90m# Show provenance\x1b[0m\n   \
                  sourcemark uninstall pkg -y                             \x1b[90m# Remove a package\x1b[0m\n\n\
                  "
)]
pub struct Cli {
    /// Configuration file (defaults to ~/.config/sourcemark/config.yaml)
    #[arg(long, global = true, env = "SOURCEMARK_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Site directory packages are installed into
    #[arg(long = "target", short = 't', global = true, env = "SOURCEMARK_TARGET", value_name = "DIR")]
    pub site_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Parse the process arguments, keeping install targets in command line order
    pub fn parse_ordered() -> Self {
        Self::try_parse_ordered_from(std::env::args_os()).unwrap_or_else(|e| e.exit())
    }

    pub fn try_parse_ordered_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command().try_get_matches_from(args)?;
        let mut cli = Self::from_arg_matches(&matches)?;
        if let (Commands::Install(install), Some(("install", sub))) =
            (&mut cli.command, matches.subcommand())
        {
            install.record_positions(sub);
        }
        Ok(cli)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install packages from names, URLs, VCS references or paths
    Install(InstallArgs),

    /// Remove installed packages
    Uninstall(UninstallArgs),

    /// List installed packages
    List(ListArgs),

    /// Show where an installed package came from
    Show(ShowArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

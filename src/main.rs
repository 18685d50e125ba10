//! Sourcemark - package installer with direct URL provenance
//!
//! Installs packages from VCS references, archives and local directories,
//! leaving a `direct_url.json` record that names exactly what was installed.

use tracing_subscriber::EnvFilter;

use sourcemark::cli::{Cli, Commands};
use sourcemark::commands::{self, GlobalOptions};

/// Log to stderr; `RUST_LOG` wins over the verbosity flag
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sourcemark={default_level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    let cli = Cli::parse_ordered();
    init_tracing(cli.verbose);

    let global = GlobalOptions {
        config: cli.config,
        site_dir: cli.site_dir,
    };

    let result = match cli.command {
        Commands::Install(args) => commands::install::run(&global, args),
        Commands::Uninstall(args) => commands::uninstall::run(&global, args),
        Commands::List(args) => commands::list::run(&global, args),
        Commands::Show(args) => commands::show::run(&global, args),
        Commands::Completions(args) => commands::completions::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

use clap::Parser;

/// Arguments for the uninstall command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Uninstall with confirmation:\n    sourcemark uninstall simple\n\n\
                   Uninstall without asking:\n    sourcemark uninstall simple testpkg -y")]
pub struct UninstallArgs {
    /// Names of the installed packages
    #[arg(required = true, num_args = 1..)]
    pub names: Vec<String>,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

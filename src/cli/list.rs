use clap::Parser;

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Include the source of each package
    #[arg(long, short = 'd')]
    pub detailed: bool,
}

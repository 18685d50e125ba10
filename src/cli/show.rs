use clap::Parser;

/// Arguments for the show command
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Name of the installed package
    pub name: String,

    /// Print the direct URL record as JSON (`null` when there is none)
    #[arg(long)]
    pub json: bool,
}

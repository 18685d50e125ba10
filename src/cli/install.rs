use clap::{ArgMatches, Parser};
use std::path::PathBuf;

/// Arguments for the install command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Install a tag of a git repository:\n    sourcemark install 'git+https://host/repo@v1.0#egg=pkg'\n\n\
                   Install an archive, verifying its hash:\n    sourcemark install 'https://host/pkg-1.0.tar.gz#sha256=<hex>'\n\n\
                   Install in development mode:\n    sourcemark install -e ./pkg\n\n\
                   Install from a local wheelhouse:\n    sourcemark install pkg==1.0 -f ./wheelhouse")]
pub struct InstallArgs {
    /// Install targets: names, `name @ url`, VCS references, archives or paths
    pub targets: Vec<String>,

    /// Install a local directory or VCS reference in editable mode
    #[arg(long = "editable", short = 'e', value_name = "PATH|URL")]
    pub editable: Vec<String>,

    /// Constrain named requirements with a constraints file
    #[arg(long = "constraint", short = 'c', value_name = "FILE")]
    pub constraints: Vec<PathBuf>,

    /// Look for archives in this directory
    #[arg(long = "find-links", short = 'f', value_name = "DIR")]
    pub find_links: Vec<PathBuf>,

    /// Directory for editable VCS checkouts
    #[arg(long = "src", value_name = "DIR")]
    pub src_dir: Option<PathBuf>,

    /// Number of targets installed in parallel
    #[arg(long, short = 'j', value_name = "N")]
    pub jobs: Option<usize>,

    /// Timeout for HTTP requests, in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Do not compute archive hashes for provenance records
    #[arg(long)]
    pub no_hash: bool,

    /// Command line positions of `targets`, then of `editable`
    #[arg(skip)]
    positions: Option<(Vec<usize>, Vec<usize>)>,
}

impl InstallArgs {
    /// Remember where each target appeared on the command line
    pub fn record_positions(&mut self, matches: &ArgMatches) {
        let indices = |id: &str| -> Vec<usize> {
            matches
                .indices_of(id)
                .map(Iterator::collect)
                .unwrap_or_default()
        };
        self.positions = Some((indices("targets"), indices("editable")));
    }

    /// Target strings in command line order, editable ones marked with `-e`
    ///
    /// Without recorded positions, editable targets follow the others.
    pub fn target_strings(&self) -> Vec<String> {
        let plain = self.targets.iter().cloned();
        let editable = self.editable.iter().map(|target| format!("-e {target}"));

        let Some((plain_at, editable_at)) = &self.positions else {
            return plain.chain(editable).collect();
        };
        let mut ordered: Vec<(usize, String)> = plain_at
            .iter()
            .copied()
            .zip(plain)
            .chain(editable_at.iter().copied().zip(editable))
            .collect();
        ordered.sort_by_key(|(index, _)| *index);
        ordered.into_iter().map(|(_, target)| target).collect()
    }
}

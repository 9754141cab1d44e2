//! CLI for htmlgrab.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use htmlgrab_core::config::{self, Backend, HtmlgrabConfig};
use htmlgrab_core::url_model::PathStyle;
use std::path::PathBuf;

use commands::{run_completions, run_fetch, run_man, run_map_url};

/// Fetch every URL of a dataset and store its HTML under a path derived from the URL.
#[derive(Debug, Parser)]
#[command(name = "htmlgrab", version)]
#[command(about = "htmlgrab: batch HTML fetcher for offline corpora", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<CliCommand>,

    #[command(flatten)]
    pub fetch: FetchArgs,
}

/// Arguments of the default action: fetch a dataset directory.
#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Dataset directory: holds the dataset file and receives the fetched pages.
    #[arg(value_name = "DATASET_DIR")]
    pub dataset_dir: Option<PathBuf>,

    /// Dataset file name inside DATASET_DIR (default from config: dataset.csv).
    #[arg(long, value_name = "NAME")]
    pub dataset_file: Option<String>,

    /// Header of the URL column (default from config: url).
    #[arg(long, value_name = "NAME")]
    pub url_column: Option<String>,

    /// Page source to use for this run.
    #[arg(long, value_enum)]
    pub backend: Option<BackendArg>,

    /// Replace characters some filesystems reject (`:`, `?`, `*`, ...) in path segments.
    #[arg(long)]
    pub portable_paths: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    /// Headless Chrome: rendered DOM after scripts ran.
    Chrome,
    /// Plain HTTP GET: HTML as served.
    Http,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Chrome => Backend::Chrome,
            BackendArg::Http => Backend::Http,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Print the domain and output path each URL maps to.
    MapUrl {
        /// URLs to map.
        #[arg(required = true)]
        urls: Vec<String>,

        /// Show portable (sanitized) paths.
        #[arg(long)]
        portable: bool,
    },

    /// Print a shell completion script to stdout.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print the man page (roff) to stdout.
    Man,
}

impl FetchArgs {
    /// Applies command-line overrides on top of the loaded config.
    pub fn apply_to(&self, cfg: &mut HtmlgrabConfig) {
        if let Some(name) = &self.dataset_file {
            cfg.dataset_file = name.clone();
        }
        if let Some(column) = &self.url_column {
            cfg.url_column = column.clone();
        }
        if let Some(backend) = self.backend {
            cfg.backend = backend.into();
        }
        if self.portable_paths {
            cfg.path_style = PathStyle::Portable;
        }
    }
}

impl Cli {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            Some(CliCommand::MapUrl { urls, portable }) => run_map_url(&urls, portable),
            Some(CliCommand::Completions { shell }) => run_completions(shell),
            Some(CliCommand::Man) => run_man(),
            None => {
                let Some(dataset_dir) = cli.fetch.dataset_dir.clone() else {
                    anyhow::bail!("missing DATASET_DIR; run `htmlgrab --help` for usage");
                };
                let mut cfg = config::load_or_init()?;
                cli.fetch.apply_to(&mut cfg);
                tracing::debug!("effective config: {:?}", cfg);
                run_fetch(cfg, dataset_dir).await?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests;

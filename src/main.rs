use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{command, value_parser, Arg, ArgAction, ArgGroup, Command};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod clone;
mod command;
mod config;
mod descriptor;
mod error;
mod source;

use crate::{
    command::{DryRunner, SystemRunner},
    config::{Options, Source},
};

fn cli() -> Command {
    command!()
        .arg(
            Arg::new("json")
                .long("json")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Read the repository JSON from a file (`-` for stdin)"),
        )
        .arg(
            Arg::new("url")
                .long("url")
                .value_name("URL")
                .help("Fetch the repository JSON from an API URL"),
        )
        .group(
            ArgGroup::new("source")
                .args(["json", "url"])
                .required(true),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .required(true)
                .help("The directory to clone into"),
        )
        .arg(
            Arg::new("no-bare")
                .long("no-bare")
                .action(ArgAction::SetTrue)
                .help("Check out a working tree instead of making bare clones"),
        )
        .arg(
            Arg::new("forks")
                .long("forks")
                .action(ArgAction::SetTrue)
                .help("Also clone repositories that are forks"),
        )
        .arg(
            Arg::new("no-gc")
                .long("no-gc")
                .action(ArgAction::SetTrue)
                .help("Don't run `git gc` after cloning"),
        )
        .arg(
            Arg::new("dry-run")
                .short('n')
                .long("dry-run")
                .action(ArgAction::SetTrue)
                .help("Print the commands that would run without running them"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Log progress and every command as it runs"),
        )
        .arg(
            Arg::new("git")
                .long("git")
                .value_name("PROGRAM")
                .env("GIT_CLONE_GITHUB_GIT")
                .default_value("git")
                .help("The git executable to use"),
        )
}

/// Quiet unless asked; `RUST_LOG` still overrides this.
fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "info,git_clone_github=debug"
    } else {
        "warn"
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    let options = Options::from_matches(&matches)?;

    init_logging(options.verbose);

    let text = source::resolve(&options.source).await?;
    let document = descriptor::parse(&text).with_context(|| match &options.source {
        Source::File(path) => format!("Error while parsing {}", path.display()),
        Source::Url(url) => format!("Error while parsing response from {url}"),
    })?;
    let descriptors = descriptor::extract(&document)?;

    info!("Found {} repositories", descriptors.len());

    let summary = if options.dry_run {
        clone::clone_all(&options, &descriptors, &mut DryRunner::new(std::io::stdout()))?
    } else {
        clone::clone_all(&options, &descriptors, &mut SystemRunner)?
    };

    info!(
        cloned = summary.cloned,
        already_cloned = summary.already_cloned,
        skipped_forks = summary.skipped_forks,
        "Done"
    );

    Ok(())
}

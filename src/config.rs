use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::ArgMatches;

/// Where the JSON document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A local file, or standard input when the path is `-`.
    File(PathBuf),
    Url(String),
}

#[derive(Debug, Clone)]
pub struct Options {
    pub source: Source,
    pub output: PathBuf,
    pub bare: bool,
    pub include_forks: bool,
    pub gc: bool,
    pub dry_run: bool,
    pub verbose: bool,
    /// The git executable to invoke.
    pub git: String,
}

impl Options {
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let source = match (
            matches.get_one::<PathBuf>("json"),
            matches.get_one::<String>("url"),
        ) {
            (Some(path), None) => Source::File(path.clone()),
            (None, Some(url)) => Source::Url(url.clone()),
            _ => bail!("Exactly one of --json or --url must be given"),
        };

        let Some(output) = matches.get_one::<PathBuf>("output") else {
            bail!("--output is required");
        };

        Ok(Self {
            source,
            output: output.clone(),
            bare: !matches.get_flag("no-bare"),
            include_forks: matches.get_flag("forks"),
            gc: !matches.get_flag("no-gc"),
            dry_run: matches.get_flag("dry-run"),
            verbose: matches.get_flag("verbose"),
            git: matches
                .get_one::<String>("git")
                .cloned()
                .unwrap_or_else(|| "git".into()),
        })
    }
}

#[cfg(test)]
impl Options {
    /// Defaults as the CLI would produce them for `--json - -o <output>`.
    pub fn for_output(output: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::File(PathBuf::from("-")),
            output: output.into(),
            bare: true,
            include_forks: false,
            gc: true,
            dry_run: false,
            verbose: false,
            git: "git".into(),
        }
    }
}

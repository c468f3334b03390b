use std::path::{Path, PathBuf};

use tracing::info;

use crate::{
    command::{Invocation, Runner},
    config::Options,
    descriptor::Descriptor,
    error::Result,
};

/// Where one repository ends up on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub owner_dir: PathBuf,
    pub metadata: PathBuf,
    /// `None` for bare clones.
    pub work_tree: Option<PathBuf>,
    pub git_dir: PathBuf,
}

impl Layout {
    pub fn new(output: &Path, owner: &str, repo: &str, bare: bool) -> Self {
        let owner_dir = output.join(owner);
        let metadata = owner_dir.join(format!("{repo}.json"));

        if bare {
            Self {
                git_dir: owner_dir.join(format!("{repo}.git")),
                work_tree: None,
                metadata,
                owner_dir,
            }
        } else {
            let work_tree = owner_dir.join(repo);
            Self {
                git_dir: work_tree.join(".git"),
                work_tree: Some(work_tree),
                metadata,
                owner_dir,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Cloned,
    AlreadyCloned,
    SkippedFork,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub cloned: usize,
    pub already_cloned: usize,
    pub skipped_forks: usize,
}

impl Summary {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Cloned => self.cloned += 1,
            Outcome::AlreadyCloned => self.already_cloned += 1,
            Outcome::SkippedFork => self.skipped_forks += 1,
        }
    }
}

/// Clone every descriptor in order, stopping at the first error.
pub fn clone_all(
    options: &Options,
    descriptors: &[Descriptor],
    runner: &mut impl Runner,
) -> Result<Summary> {
    let mut summary = Summary::default();
    for descriptor in descriptors {
        summary.record(clone_one(options, descriptor, runner)?);
    }
    Ok(summary)
}

pub fn clone_one(
    options: &Options,
    descriptor: &Descriptor,
    runner: &mut impl Runner,
) -> Result<Outcome> {
    if descriptor.fork && !options.include_forks {
        info!("Skipping fork {}", descriptor.full_name);
        return Ok(Outcome::SkippedFork);
    }

    let (owner, repo) = descriptor.owner_and_repo()?;
    let layout = Layout::new(&options.output, owner, repo, options.bare);

    if layout.git_dir.exists() {
        info!(
            "Skipping {}, already cloned at {}",
            descriptor.full_name,
            layout.git_dir.display()
        );
        return Ok(Outcome::AlreadyCloned);
    }

    info!("Cloning {} into {}", descriptor.full_name, layout.git_dir.display());

    runner.run(&Invocation::new("mkdir").arg("-p").arg(&layout.owner_dir))?;

    // written before cloning so an interrupted clone can be retried from this file
    let mut metadata = serde_json::to_vec_pretty(&descriptor.raw)?;
    metadata.push(b'\n');
    runner.write_file(&layout.metadata, &metadata)?;

    let git = || Invocation::new(&options.git);

    runner.run(
        &git()
            .args(["clone", "--mirror"])
            .arg(&descriptor.clone_url)
            .arg(&layout.git_dir),
    )?;

    if let Some(work_tree) = &layout.work_tree {
        runner.run(
            &git()
                .arg("--git-dir")
                .arg(&layout.git_dir)
                .args(["config", "--bool", "core.bare", "false"]),
        )?;
        runner.run(&git().arg("-C").arg(work_tree).args(["reset", "--hard"]))?;
    }

    if options.gc {
        runner.run(&git().arg("--git-dir").arg(&layout.git_dir).arg("gc"))?;
    }

    Ok(Outcome::Cloned)
}

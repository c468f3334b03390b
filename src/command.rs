use std::{
    ffi::{OsStr, OsString},
    fmt,
    io::Write,
    path::Path,
    process::Command,
};

use tracing::debug;

use crate::error::{Error, Result};

/// An external command line, kept as data so it can be run, printed or recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: OsString,
    args: Vec<OsString>,
}

impl Invocation {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            args: vec![],
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_owned()));
        self
    }

    /// The command line as a shell would need it, byte for byte.
    pub fn to_shell(&self) -> Vec<u8> {
        let mut line = shell_word(&self.program);
        for arg in &self.args {
            line.push(b' ');
            line.extend(shell_word(arg));
        }
        line
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.to_shell()))
    }
}

#[cfg(unix)]
fn shell_word(s: &OsStr) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;

    shell_escape::unix::escape_os_str(s).as_bytes().to_vec()
}

#[cfg(not(unix))]
fn shell_word(s: &OsStr) -> Vec<u8> {
    shell_escape::escape(s.to_string_lossy()).into_owned().into_bytes()
}

/// Performs every side effect of a clone run.
pub trait Runner {
    fn run(&mut self, invocation: &Invocation) -> Result<()>;

    fn write_file(&mut self, path: &Path, contents: &[u8]) -> Result<()>;
}

/// Executes commands and fails on the first unsuccessful exit.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<()> {
        debug!("Running {invocation}");

        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .status()
            .map_err(|e| Error::Command {
                command: invocation.to_string(),
                status: format!("could not be started: {e}"),
            })?;

        if !status.success() {
            return Err(Error::Command {
                command: invocation.to_string(),
                status: status.to_string(),
            });
        }

        Ok(())
    }

    fn write_file(&mut self, path: &Path, contents: &[u8]) -> Result<()> {
        debug!("Writing {}", path.display());

        std::fs::write(path, contents).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Prints what a live run would do, touching nothing.
#[derive(Debug)]
pub struct DryRunner<W> {
    out: W,
}

impl<W: Write> DryRunner<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn print(&mut self, line: &[u8]) -> Result<()> {
        self.out
            .write_all(line)
            .and_then(|_| self.out.write_all(b"\n"))
            .map_err(|source| Error::Io {
                path: "<stdout>".into(),
                source,
            })
    }
}

impl<W: Write> Runner for DryRunner<W> {
    fn run(&mut self, invocation: &Invocation) -> Result<()> {
        self.print(&invocation.to_shell())
    }

    fn write_file(&mut self, path: &Path, contents: &[u8]) -> Result<()> {
        let mut line = format!("# write {} bytes to ", contents.len()).into_bytes();
        line.extend(shell_word(path.as_os_str()));
        self.print(&line)
    }
}

/// Remembers everything it is asked to do.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct Recorder {
    pub commands: Vec<Invocation>,
    pub files: Vec<(std::path::PathBuf, Vec<u8>)>,
    /// Create the target directory of `clone` commands, so existence checks see them.
    pub materialize: bool,
}

#[cfg(test)]
impl Runner for Recorder {
    fn run(&mut self, invocation: &Invocation) -> Result<()> {
        self.commands.push(invocation.clone());

        if self.materialize && invocation.args.iter().any(|a| a == "clone") {
            if let Some(target) = invocation.args.last() {
                std::fs::create_dir_all(target).unwrap();
            }
        }

        Ok(())
    }

    fn write_file(&mut self, path: &Path, contents: &[u8]) -> Result<()> {
        self.files.push((path.to_path_buf(), contents.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_words_are_not_quoted() {
        let invocation = Invocation::new("git")
            .args(["--git-dir", "/srv/mirror/a/b.git", "gc"]);
        assert_eq!(invocation.to_string(), "git --git-dir /srv/mirror/a/b.git gc");
    }

    #[test]
    fn awkward_words_are_quoted() {
        let invocation = Invocation::new("mkdir")
            .arg("-p")
            .arg("/tmp/my repos/a")
            .arg("it's");
        assert_eq!(
            invocation.to_string(),
            r"mkdir -p '/tmp/my repos/a' 'it'\''s'"
        );
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_paths_keep_their_bytes() {
        use std::os::unix::ffi::OsStrExt;

        let path = OsStr::from_bytes(b"/tmp/out\xff/o");
        let invocation = Invocation::new("mkdir").arg("-p").arg(path);
        assert_eq!(invocation.to_shell(), b"mkdir -p '/tmp/out\xff/o'".to_vec());

        let mut out = vec![];
        DryRunner::new(&mut out).run(&invocation).unwrap();
        assert_eq!(out, b"mkdir -p '/tmp/out\xff/o'\n".to_vec());
    }

    #[test]
    fn dry_runner_prints_instead_of_running() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("new");
        let mut out = vec![];

        let mut runner = DryRunner::new(&mut out);
        runner
            .run(&Invocation::new("mkdir").arg("-p").arg(&target))
            .unwrap();
        runner.write_file(&target.join("x.json"), b"{}").unwrap();

        assert!(!target.exists());
        let printed = String::from_utf8(out).unwrap();
        let lines: Vec<_> = printed.lines().collect();
        assert_eq!(lines[0], format!("mkdir -p {}", target.display()));
        assert!(lines[1].starts_with("# write 2 bytes to "), "{}", lines[1]);
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_executes() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a").join("b");

        SystemRunner
            .run(&Invocation::new("mkdir").arg("-p").arg(&target))
            .unwrap();
        assert!(target.is_dir());

        SystemRunner
            .write_file(&target.join("b.json"), b"{}\n")
            .unwrap();
        assert_eq!(std::fs::read(target.join("b.json")).unwrap(), b"{}\n");
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_reports_failure() {
        assert!(SystemRunner.run(&Invocation::new("true")).is_ok());

        let err = SystemRunner
            .run(&Invocation::new("false").arg("--flag"))
            .unwrap_err();
        match err {
            Error::Command { command, status } => {
                assert_eq!(command, "false --flag");
                assert!(status.contains('1'), "{status}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn missing_program_is_command_error() {
        let err = SystemRunner
            .run(&Invocation::new("definitely-not-a-real-program-4711"))
            .unwrap_err();
        assert!(matches!(err, Error::Command { .. }));
    }
}

use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{ReleaseError, Result};

/// Where and how a subprocess runs.
#[derive(Debug, Clone)]
pub struct CmdProps {
    pub dir: PathBuf,
    pub verbose: bool,
}

impl CmdProps {
    pub fn new(dir: impl Into<PathBuf>, verbose: bool) -> CmdProps {
        CmdProps {
            dir: dir.into(),
            verbose,
        }
    }
}

/// Runs the command, surfacing stderr in the error on failure. In verbose
/// mode output is streamed to the terminal instead of captured.
fn run(props: &CmdProps, program: &str, args: &[&str]) -> Result<String> {
    let mut cmd = Command::new(program);
    cmd.args(args).current_dir(&props.dir);

    let label = format!("{} {}", program, args.join(" "));

    if props.verbose {
        let status = cmd
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()?;
        if !status.success() {
            return Err(shell_error(&label, status.code(), String::new()));
        }
        return Ok(String::new());
    }

    let output = cmd.output()?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(shell_error(&label, output.status.code(), stderr));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

fn shell_error(command: &str, code: Option<i32>, stderr: String) -> ReleaseError {
    let detail = if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    };
    let status = match code {
        Some(code) => format!("exit status: {}", code),
        None => "a signal".to_string(),
    };
    ReleaseError::Shell {
        command: command.to_string(),
        status,
        detail,
    }
}

/// git operations, always scoped to one checkout directory.
pub struct Git {
    props: CmdProps,
}

impl Git {
    pub fn new(dir: impl Into<PathBuf>, verbose: bool) -> Git {
        Git {
            props: CmdProps::new(dir, verbose),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.props.dir
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        run(&self.props, "git", args)
    }

    /// Shallow-clones `url` at `branch` into this directory, pulling
    /// submodules along when asked.
    pub fn clone(&self, url: &str, branch: &str, submodules: bool) -> Result<()> {
        let dir = self.props.dir.to_string_lossy().to_string();
        let mut args = vec!["clone", "--depth=1"];
        if submodules {
            args.push("--recurse-submodules");
        }
        args.extend(["-b", branch, url, dir.as_str()]);

        // clone creates the target dir itself, so run from its parent
        let parent = self
            .props
            .dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        run(&CmdProps::new(parent, self.props.verbose), "git", &args)?;
        Ok(())
    }

    pub fn switch(&self, branch: &str) -> Result<()> {
        self.run(&["switch", branch])?;
        Ok(())
    }

    pub fn switch_create(&self, branch: &str) -> Result<()> {
        self.run(&["switch", "-c", branch])?;
        Ok(())
    }

    /// Stages everything and commits. A clean tree is not an error, just a
    /// skipped commit, so repeated runs stay idempotent.
    pub fn commit_all(&self, message: &str) -> Result<bool> {
        if self.is_porcelain()? {
            return Ok(false);
        }
        self.run(&["add", "--all"])?;
        self.run(&["commit", "-m", message])?;
        Ok(true)
    }

    pub fn push(&self) -> Result<()> {
        self.run(&["push", "origin", "HEAD"])?;
        Ok(())
    }

    pub fn push_tag(&self, tag: &str, annotated: bool) -> Result<()> {
        if annotated {
            self.run(&["tag", "-a", tag, "-m", tag])?;
        } else {
            self.run(&["tag", tag])?;
        }
        self.run(&["push", "origin", tag])?;
        Ok(())
    }

    /// Deepens a shallow clone enough to reach `ref_name`. The remote starts
    /// out restricted to the cloned branch, so widen it first.
    pub fn fetch(&self, ref_name: &str, since: Option<&str>) -> Result<()> {
        self.run(&["remote", "set-branches", "origin", "*"])?;
        match since {
            Some(date) => {
                let shallow = format!("--shallow-since={}", date);
                self.run(&["fetch", "origin", ref_name, &shallow])?;
            }
            None => {
                self.run(&["fetch", "origin", ref_name])?;
            }
        }
        Ok(())
    }

    /// Whether `branch` already exists on the remote.
    pub fn remote_branch_exists(&self, url: &str, branch: &str) -> Result<bool> {
        let result = self.run(&["ls-remote", "--exit-code", "--heads", url, branch]);
        match result {
            Ok(_) => Ok(true),
            // --exit-code makes ls-remote exit 2 when no refs match
            Err(ReleaseError::Shell { ref status, .. }) if status == "exit status: 2" => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// A short log of the most recent commits, for previews.
    pub fn recent_log(&self, count: usize) -> Result<String> {
        let n = format!("-{}", count);
        self.run(&["log", "--oneline", &n])
    }

    /// The pinned sha of a submodule, from `git submodule status`.
    pub fn submodule_sha(&self, path: &str) -> Result<String> {
        let out = self.run(&["submodule", "status", path])?;
        let line = out.trim();
        // format: " <sha> <path> (<describe>)", prefixed with -/+ when dirty
        let sha: String = line
            .trim_start_matches(['-', '+', 'U'])
            .chars()
            .take_while(|c| c.is_ascii_hexdigit())
            .collect();
        if sha.is_empty() {
            return Err(ReleaseError::missing(format!(
                "no submodule found at {}",
                path
            )));
        }
        Ok(sha)
    }

    /// True when the working tree has no uncommitted changes.
    pub fn is_porcelain(&self) -> Result<bool> {
        let out = self.run(&["status", "--porcelain"])?;
        Ok(out.trim().is_empty())
    }

    pub fn cherry_pick(&self, sha: &str) -> Result<()> {
        self.run(&["cherry-pick", sha]).map_err(|e| {
            ReleaseError::CherryPick(format!("could not cherry pick {}: {}", sha, e))
        })?;
        Ok(())
    }

    pub fn cherry_pick_continue(&self) -> Result<()> {
        self.run(&["add", "--all"])?;
        self.run(&["cherry-pick", "--continue"]).map_err(|e| {
            ReleaseError::CherryPick(format!("could not continue the cherry pick: {}", e))
        })?;
        Ok(())
    }

    /// Paths still in conflict after a failed merge or cherry-pick.
    pub fn conflicts(&self) -> Result<Vec<String>> {
        let out = self.run(&["diff", "--name-only", "--diff-filter=U"])?;
        Ok(out.lines().map(str::to_string).collect())
    }

}

/// npm operations scoped to one checkout directory.
pub struct Npm {
    props: CmdProps,
}

impl Npm {
    pub fn new(dir: impl Into<PathBuf>, verbose: bool) -> Npm {
        Npm {
            props: CmdProps::new(dir, verbose),
        }
    }

    fn run(&self, args: &[&str]) -> Result<()> {
        run(&self.props, "npm", args)?;
        Ok(())
    }

    pub fn ci(&self) -> Result<()> {
        self.run(&["ci"])
    }

    pub fn install(&self) -> Result<()> {
        self.run(&["install"])
    }

    pub fn run_script(&self, script: &str) -> Result<()> {
        self.run(&["run", script])
    }

    /// Runs a script in a subdirectory of the checkout.
    pub fn run_script_in(&self, subdir: &str, script: &str) -> Result<()> {
        let dir = self.props.dir.join(subdir);
        run(
            &CmdProps::new(dir, self.props.verbose),
            "npm",
            &["run", script],
        )?;
        Ok(())
    }

    /// `npm version` without the automatic commit and tag. Same-version
    /// bumps are allowed so reruns on an already-bumped branch succeed.
    pub fn version(&self, version: &str) -> Result<()> {
        self.run(&[
            "version",
            "--no-git-tag-version",
            "--allow-same-version",
            version,
        ])
    }

    /// Bumps the version of a package in a subdirectory of the checkout.
    pub fn version_in(&self, subdir: &str, version: &str) -> Result<()> {
        let dir = self.props.dir.join(subdir);
        run(
            &CmdProps::new(dir, self.props.verbose),
            "npm",
            &["version", "--no-git-tag-version", "--allow-same-version", version],
        )?;
        Ok(())
    }
}

/// bundler and rake, for the iOS side of the house.
pub struct Bundler {
    props: CmdProps,
}

impl Bundler {
    pub fn new(dir: impl Into<PathBuf>, verbose: bool) -> Bundler {
        Bundler {
            props: CmdProps::new(dir, verbose),
        }
    }

    pub fn install(&self) -> Result<()> {
        run(&self.props, "bundle", &["install"])?;
        Ok(())
    }

    pub fn pod_install(&self) -> Result<()> {
        run(&self.props, "bundle", &["exec", "pod", "install"])?;
        Ok(())
    }

    pub fn rake(&self, task: &str) -> Result<()> {
        run(&self.props, "bundle", &["exec", "rake", task])?;
        Ok(())
    }
}

/// Opens `path` in the user's `$EDITOR` and waits for it to exit.
pub fn open_in_editor(path: &Path) -> Result<()> {
    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    let status = Command::new(&editor)
        .arg(path)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()?;
    if !status.success() {
        return Err(shell_error(&editor, status.code(), String::new()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_run_captures_stdout() {
        let dir = TempDir::new().unwrap();
        let props = CmdProps::new(dir.path(), false);
        let out = run(&props, "echo", &["hello"]).unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[test]
    fn test_failure_carries_command_and_status() {
        let dir = TempDir::new().unwrap();
        let props = CmdProps::new(dir.path(), false);
        let err = run(&props, "false", &[]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("false"), "unexpected message: {}", msg);
        assert!(msg.contains('1'), "unexpected message: {}", msg);
    }

    #[test]
    fn test_git_porcelain_in_fresh_repo() {
        let dir = TempDir::new().unwrap();
        let props = CmdProps::new(dir.path(), false);
        run(&props, "git", &["init", "-q"]).unwrap();
        let git = Git::new(dir.path(), false);
        assert!(git.is_porcelain().unwrap());

        std::fs::write(dir.path().join("file.txt"), "content").unwrap();
        assert!(!git.is_porcelain().unwrap());
    }
}

use std::env;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{ReleaseError, Result};

/// A scratch directory for repository checkouts.
///
/// Backed by a temp dir that is removed on drop unless the caller asked to
/// keep it (or `GBM_NO_WORKSPACE` pointed us at the current directory).
pub struct Workspace {
    dir: PathBuf,
    // None when the directory is not ours to delete.
    temp: Option<TempDir>,
}

impl Workspace {
    /// Creates a fresh workspace. With `no_workspace`, the current working
    /// directory is used as-is and never cleaned up.
    pub fn new(no_workspace: bool) -> Result<Workspace> {
        if no_workspace {
            let dir = env::current_dir()?;
            return Ok(Workspace { dir, temp: None });
        }
        let temp = TempDir::with_prefix("gbm-")
            .map_err(|e| ReleaseError::config(format!("could not create workspace: {}", e)))?;
        let dir = temp.path().to_path_buf();
        Ok(Workspace {
            dir,
            temp: Some(temp),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolves a repository checkout path inside the workspace.
    pub fn repo_dir(&self, repo: &str) -> PathBuf {
        self.dir.join(repo)
    }

    /// Disarms cleanup so the checkouts survive for inspection.
    pub fn keep(&mut self) -> PathBuf {
        if let Some(temp) = self.temp.take() {
            return temp.keep();
        }
        self.dir.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_is_removed_on_drop() {
        let path;
        {
            let ws = Workspace::new(false).unwrap();
            path = ws.dir().to_path_buf();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_kept_workspace_survives_drop() {
        let path;
        {
            let mut ws = Workspace::new(false).unwrap();
            path = ws.keep();
            assert!(path.exists());
        }
        assert!(path.exists());
        std::fs::remove_dir_all(&path).unwrap();
    }

    #[test]
    fn test_repo_dir_joins() {
        let ws = Workspace::new(false).unwrap();
        assert_eq!(ws.repo_dir("gutenberg"), ws.dir().join("gutenberg"));
    }
}

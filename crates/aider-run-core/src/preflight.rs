//! Filesystem checks performed before anything is handed to the agent.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Fatal preflight failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreflightError {
    #[error("repoPath does not exist: {}", .0.display())]
    RepoPathMissing(PathBuf),

    #[error("repoPath is not a directory: {}", .0.display())]
    RepoPathNotDirectory(PathBuf),
}

/// Result of a successful `repoPath` check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCheck {
    pub path: PathBuf,
    /// False when the directory has no `.git` entry. Not fatal.
    pub has_git: bool,
}

/// Validates the repository directory the agent will run in.
///
/// A `.git` file counts as well as a directory, so linked worktrees pass.
pub fn check_repo_path(path: &Path) -> Result<RepoCheck, PreflightError> {
    if !path.exists() {
        return Err(PreflightError::RepoPathMissing(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(PreflightError::RepoPathNotDirectory(path.to_path_buf()));
    }

    Ok(RepoCheck {
        path: path.to_path_buf(),
        has_git: path.join(".git").exists(),
    })
}

/// Returns the entries of `files` that do not exist, in order.
///
/// Relative paths are resolved against `working_dir`, which is where the
/// agent will look for them.
pub fn missing_files<'a>(
    working_dir: &Path,
    files: impl IntoIterator<Item = &'a PathBuf>,
) -> Vec<PathBuf> {
    files
        .into_iter()
        .filter(|file| !working_dir.join(file).exists())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_repo_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nope");

        let err = check_repo_path(&path).unwrap_err();
        assert_eq!(err, PreflightError::RepoPathMissing(path.clone()));
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_repo_path_is_a_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();

        let err = check_repo_path(&file).unwrap_err();
        assert_eq!(err, PreflightError::RepoPathNotDirectory(file));
    }

    #[test]
    fn test_repo_without_git() {
        let temp = TempDir::new().unwrap();

        let check = check_repo_path(temp.path()).unwrap();
        assert!(!check.has_git);
    }

    #[test]
    fn test_repo_with_git_dir() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join(".git")).unwrap();

        let check = check_repo_path(temp.path()).unwrap();
        assert!(check.has_git);
        assert_eq!(check.path, temp.path());
    }

    #[test]
    fn test_worktree_git_file_counts() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(".git"), "gitdir: /elsewhere").unwrap();

        assert!(check_repo_path(temp.path()).unwrap().has_git);
    }

    #[test]
    fn test_missing_files_resolves_relative_to_working_dir() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("present.txt"), "").unwrap();
        let files = vec![
            PathBuf::from("present.txt"),
            PathBuf::from("absent.txt"),
            temp.path().join("present.txt"),
        ];

        let missing = missing_files(temp.path(), &files);
        assert_eq!(missing, vec![PathBuf::from("absent.txt")]);
    }
}

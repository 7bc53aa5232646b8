//! Source control lookup for build contexts

use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Answers questions about the version-controlled tree around a directory
pub trait SourceControl {
    /// Root of the repository containing `path`, if any
    fn repository_root_of(&self, path: &Path) -> Option<PathBuf>;

    /// Remote URL builds should clone from, for a repository root
    fn origin_url(&self, _root: &Path) -> Option<String> {
        None
    }
}

/// Git working trees found by walking up to a `.git` entry
#[derive(Debug, Clone, Default)]
pub struct GitRepository;

impl GitRepository {
    /// Create a git lookup
    pub fn new() -> Self {
        Self
    }
}

impl SourceControl for GitRepository {
    fn repository_root_of(&self, path: &Path) -> Option<PathBuf> {
        let path = path.canonicalize().ok()?;
        let root = path
            .ancestors()
            .find(|dir| dir.join(".git").exists())
            .map(Path::to_path_buf);
        match &root {
            Some(root) => debug!("{} is inside git repository {}", path.display(), root.display()),
            None => debug!("{} is not inside a git repository", path.display()),
        }
        root
    }

    fn origin_url(&self, root: &Path) -> Option<String> {
        let config = std::fs::read_to_string(root.join(".git").join("config")).ok()?;
        parse_origin_url(&config)
    }
}

/// `url` of the `[remote "origin"]` section of a git config file
fn parse_origin_url(config: &str) -> Option<String> {
    let section = Regex::new(r#"^\s*\[\s*([^\s\]"]+)(?:\s+"([^"]*)")?\s*\]"#).ok()?;
    let url = Regex::new(r"^\s*url\s*=\s*(.+?)\s*$").ok()?;

    let mut in_origin = false;
    for line in config.lines() {
        if let Some(caps) = section.captures(line) {
            in_origin = caps[1].eq_ignore_ascii_case("remote")
                && caps.get(2).map(|m| m.as_str()) == Some("origin");
            continue;
        }
        if in_origin {
            if let Some(caps) = url.captures(line) {
                return Some(caps[1].to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"[core]
	repositoryformatversion = 0
	bare = false
[remote "upstream"]
	url = https://example.com/upstream/app.git
[remote "origin"]
	url = git@example.com:team/app.git
	fetch = +refs/heads/*:refs/remotes/origin/*
[branch "main"]
	remote = origin
"#;

    #[test]
    fn test_parse_origin_url() {
        assert_eq!(
            parse_origin_url(CONFIG),
            Some("git@example.com:team/app.git".to_string())
        );
        assert_eq!(parse_origin_url("[core]\n\tbare = false\n"), None);
    }

    #[test]
    fn test_repository_root_of_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::create_dir_all(root.join("services/web")).unwrap();

        let git = GitRepository::new();
        assert_eq!(git.repository_root_of(&root.join("services/web")), Some(root.clone()));
        assert_eq!(git.origin_url(&root), None);

        std::fs::write(root.join(".git/config"), CONFIG).unwrap();
        assert_eq!(
            git.origin_url(&root),
            Some("git@example.com:team/app.git".to_string())
        );
    }

    #[test]
    fn test_missing_path_has_no_root() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(GitRepository::new().repository_root_of(&dir.path().join("missing")), None);
    }
}

//! File discovery.

use std::path::Path;

use async_trait::async_trait;
use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

/// Enumerates candidate files under a root.
#[async_trait]
pub trait FileLister: Send + Sync {
    /// Repo-relative POSIX paths matching `include` and not `exclude`, sorted.
    async fn list(&self, root: &Path, include: &[String], exclude: &[String]) -> anyhow::Result<Vec<String>>;
}

/// Include/exclude matcher over repo-relative paths.
pub struct PathFilter {
    include: GlobSet,
    exclude: GlobSet,
}

impl PathFilter {
    pub fn new(include: &[String], exclude: &[String]) -> anyhow::Result<Self> {
        Ok(Self {
            include: build(include)?,
            exclude: build(exclude)?,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        self.include.is_match(path) && !self.exclude.is_match(path)
    }

    /// Whether a directory can be skipped without looking inside: any file
    /// under it would be excluded.
    pub fn prunes_dir(&self, dir: &str) -> bool {
        !dir.is_empty() && self.exclude.is_match(format!("{}/_", dir))
    }
}

fn build(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// Walks the file system with `walkdir`, matching paths with `globset`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobFileLister;

#[async_trait]
impl FileLister for GlobFileLister {
    async fn list(&self, root: &Path, include: &[String], exclude: &[String]) -> anyhow::Result<Vec<String>> {
        let filter = PathFilter::new(include, exclude)?;
        let mut files = Vec::new();

        let walker = WalkDir::new(root).follow_links(false).into_iter().filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            !filter.prunes_dir(&relative(root, e.path()))
        });

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = relative(root, entry.path());
            if filter.matches(&rel) {
                files.push(rel);
            }
        }

        files.sort();
        Ok(files)
    }
}

/// Repo-relative POSIX form of `path`.
pub fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_lists_sorted_relative_paths() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src/util")).unwrap();
        fs::create_dir_all(temp.path().join("node_modules/dep")).unwrap();
        fs::write(temp.path().join("src/b.ts"), "").unwrap();
        fs::write(temp.path().join("src/util/a.ts"), "").unwrap();
        fs::write(temp.path().join("README.md"), "").unwrap();
        fs::write(temp.path().join("node_modules/dep/index.js"), "").unwrap();

        let files = GlobFileLister
            .list(temp.path(), &strings(&["**/*"]), &strings(&["**/node_modules/**"]))
            .await
            .unwrap();
        assert_eq!(files, vec!["README.md", "src/b.ts", "src/util/a.ts"]);
    }

    #[tokio::test]
    async fn test_include_restricts() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();
        fs::write(temp.path().join("src/a.py"), "").unwrap();
        fs::write(temp.path().join("setup.py"), "").unwrap();

        let files = GlobFileLister
            .list(temp.path(), &strings(&["src/**"]), &[])
            .await
            .unwrap();
        assert_eq!(files, vec!["src/a.py"]);
    }

    #[test]
    fn test_path_filter() {
        let filter = PathFilter::new(&strings(&["**/*"]), &strings(&["**/dist/**", "**/*.min.js"])).unwrap();
        assert!(filter.matches("src/app.js"));
        assert!(!filter.matches("lib/app.min.js"));
        assert!(!filter.matches("dist/app.js"));
        assert!(filter.prunes_dir("packages/a/dist"));
        assert!(!filter.prunes_dir("src"));
        assert!(PathFilter::new(&strings(&["["]), &[]).is_err());
    }
}

//! Recursive template copy
//!
//! Copies a template tree byte-for-byte, skipping dependency caches and
//! version-control metadata. Placeholders inside copied files are left alone.

use std::fs;
use std::path::{Component, Path};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Directory names never copied out of a template tree
pub const DEFAULT_EXCLUDES: &[&str] = &["node_modules", ".git"];

/// Counts of what a copy produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub files: usize,
    pub directories: usize,
}

/// Whether any component of `relative` names an excluded directory
pub fn is_excluded(relative: &Path, excludes: &[String]) -> bool {
    relative.components().any(|component| match component {
        Component::Normal(part) => excludes.iter().any(|ex| part == ex.as_str()),
        _ => false,
    })
}

/// Copy every file and directory under `source` into `dest`
pub fn copy_template(source: &Path, dest: &Path, excludes: &[String]) -> Result<CopyStats> {
    if !source.is_dir() {
        return Err(Error::TemplateNotFound(source.to_path_buf()));
    }

    fs::create_dir_all(dest).map_err(|source| Error::Copy {
        path: dest.to_path_buf(),
        source,
    })?;

    let mut stats = CopyStats::default();

    let walker = WalkDir::new(source)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry
                .path()
                .strip_prefix(source)
                .map(|rel| !is_excluded(rel, excludes))
                .unwrap_or(true)
        });

    for entry in walker {
        let entry = entry.map_err(|e| Error::Copy {
            path: e.path().unwrap_or(source).to_path_buf(),
            source: e.into(),
        })?;

        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| Error::Other(e.to_string()))?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|source| Error::Copy {
                path: target.clone(),
                source,
            })?;
            stats.directories += 1;
        } else {
            fs::copy(entry.path(), &target).map_err(|source| Error::Copy {
                path: entry.path().to_path_buf(),
                source,
            })?;
            stats.files += 1;
        }
    }

    debug!(
        source = %source.display(),
        dest = %dest.display(),
        files = stats.files,
        directories = stats.directories,
        "Copied template tree"
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn excludes() -> Vec<String> {
        DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect()
    }

    fn write(path: &Path, content: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// Relative file paths and contents under `root`, excluded dirs removed
    fn snapshot(root: &Path) -> Vec<(String, Vec<u8>)> {
        let ex = excludes();
        let mut files: Vec<_> = WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
                if is_excluded(&rel, &ex) {
                    None
                } else {
                    Some((rel.display().to_string(), fs::read(e.path()).unwrap()))
                }
            })
            .collect();
        files.sort();
        files
    }

    #[test]
    fn test_copy_matches_source_without_excluded_dirs() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let dest = dst.path().join("frontend");

        write(&src.path().join("package.json"), b"{\"name\":\"app\"}");
        write(&src.path().join("src/App.tsx"), b"export default 1\n");
        write(&src.path().join("src/abi/Counter.ts"), &[0, 159, 146, 150]);
        write(&src.path().join("node_modules/react/index.js"), b"x");
        write(&src.path().join(".git/HEAD"), b"ref: refs/heads/main");
        write(&src.path().join("src/node_modules/nested.js"), b"y");

        let stats = copy_template(src.path(), &dest, &excludes()).unwrap();

        assert_eq!(stats.files, 3);
        assert_eq!(snapshot(src.path()), snapshot(&dest));
        assert!(!dest.join("node_modules").exists());
        assert!(!dest.join(".git").exists());
        assert!(!dest.join("src/node_modules").exists());
    }

    #[test]
    fn test_copy_keeps_empty_directories() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        fs::create_dir_all(src.path().join("lib/empty")).unwrap();

        let stats = copy_template(src.path(), dst.path(), &excludes()).unwrap();
        assert_eq!(stats.directories, 2);
        assert!(dst.path().join("lib/empty").is_dir());
    }

    #[test]
    fn test_missing_source_is_template_not_found() {
        let dst = TempDir::new().unwrap();
        let missing = dst.path().join("nope");
        let err = copy_template(&missing, &dst.path().join("out"), &excludes()).unwrap_err();
        assert!(matches!(err, Error::TemplateNotFound(p) if p == missing));
        assert!(!dst.path().join("out").exists());
    }

    #[test]
    fn test_destination_conflict_fails() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        fs::create_dir_all(src.path().join("src")).unwrap();
        // A file sits where the template needs a directory
        fs::write(dst.path().join("src"), "occupied").unwrap();

        let err = copy_template(src.path(), dst.path(), &excludes()).unwrap_err();
        assert!(matches!(err, Error::Copy { .. }));
        assert_eq!(fs::read_to_string(dst.path().join("src")).unwrap(), "occupied");
    }

    #[test]
    fn test_is_excluded_matches_whole_components() {
        let ex = excludes();
        assert!(is_excluded(Path::new("node_modules/a.js"), &ex));
        assert!(is_excluded(Path::new("a/.git/config"), &ex));
        assert!(!is_excluded(Path::new("my_node_modules/a.js"), &ex));
        assert!(!is_excluded(Path::new(".gitignore"), &ex));
    }
}

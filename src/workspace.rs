//! Template discovery and output directories.

use chrono::Local;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Sorted file names of the `*.svg` templates in `dir`. A missing directory
/// has no templates.
pub fn list_templates(dir: impl AsRef<Path>) -> Result<Vec<String>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_svg = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));
        if is_svg && path.is_file() {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

/// Create `path` as a directory. A regular file in the way is moved aside to
/// `<name>.bak-YYYYmmddHHMMSS`, or removed if it cannot be renamed.
pub fn ensure_dir(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.is_file() {
        let mut backup = path.as_os_str().to_owned();
        backup.push(format!(".bak-{}", Local::now().format("%Y%m%d%H%M%S")));
        let backup = PathBuf::from(backup);
        match std::fs::rename(path, &backup) {
            Ok(()) => log::warn!(
                "moved file blocking {} to {}",
                path.display(),
                backup.display()
            ),
            Err(e) => {
                log::warn!("cannot move {} aside ({}), removing it", path.display(), e);
                std::fs::remove_file(path)?;
            }
        }
    }
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// Output locations for generated artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDirs {
    pub root: PathBuf,
    pub previews: PathBuf,
    pub batches: PathBuf,
}

impl OutputDirs {
    /// Create `root`, `root/previews` and `root/batches`.
    pub fn prepare(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let dirs = Self {
            previews: root.join("previews"),
            batches: root.join("batches"),
            root,
        };
        ensure_dir(&dirs.root)?;
        ensure_dir(&dirs.previews)?;
        ensure_dir(&dirs.batches)?;
        Ok(dirs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_templates_sorted_svg_only() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.svg", "a.svg", "notes.txt", "C.SVG"] {
            std::fs::write(dir.path().join(name), "<svg/>").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.svg")).unwrap();

        let names = list_templates(dir.path()).unwrap();
        assert_eq!(names, vec!["C.SVG", "a.svg", "b.svg"]);
    }

    #[test]
    fn test_missing_template_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_templates(dir.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn test_ensure_dir_moves_blocking_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("outputs");
        std::fs::write(&target, "not a dir").unwrap();

        ensure_dir(&target).unwrap();
        assert!(target.is_dir());

        let backups: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.unwrap().file_name().into_string().ok())
            .filter(|n| n.starts_with("outputs.bak-"))
            .collect();
        assert_eq!(backups.len(), 1);
        assert_eq!(backups[0].len(), "outputs.bak-".len() + 14);
    }

    #[test]
    fn test_output_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let dirs = OutputDirs::prepare(dir.path().join("out")).unwrap();
        assert!(dirs.previews.is_dir());
        assert!(dirs.batches.is_dir());
        // idempotent
        OutputDirs::prepare(&dirs.root).unwrap();
    }
}

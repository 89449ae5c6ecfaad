//! Reference-set discovery.
//!
//! The reference generator saves each notebook's outputs under
//! `<root>/.../<Example*>/Save/<file>`. Discovery walks a root and collects
//! those files, keyed by their path relative to the root so that two trees
//! can be paired.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::config::DiscoveryConfig;
use crate::error::{CompareError, Result};

/// Reference outputs found under one root, keyed by relative path.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSet {
    root: PathBuf,
    entries: BTreeMap<PathBuf, PathBuf>,
}

impl ReferenceSet {
    /// Walk `root` and collect every file directly inside the save
    /// subfolder of a directory whose name starts with the example prefix.
    ///
    /// The root directory itself is never treated as an example directory.
    /// A root without matching directories gives an empty set; a root that
    /// cannot be read is an error.
    pub fn discover(root: impl AsRef<Path>, config: &DiscoveryConfig) -> Result<Self> {
        let root = root.as_ref();
        let mut entries = BTreeMap::new();

        let walker = WalkDir::new(root).min_depth(1).sort_by_file_name();
        for entry in walker {
            let entry = entry.map_err(|e| CompareError::Discovery {
                root: root.to_path_buf(),
                message: e.to_string(),
            })?;

            if !entry.file_type().is_dir() {
                continue;
            }
            let is_example = entry
                .file_name()
                .to_str()
                .map(|name| name.starts_with(&config.example_prefix))
                .unwrap_or(false);
            if !is_example {
                continue;
            }

            let save_dir = entry.path().join(&config.save_subdir);
            if !save_dir.is_dir() {
                debug!(example = %entry.path().display(), "Example directory without save folder");
                continue;
            }

            for file in saved_files(&save_dir)? {
                let relative = file
                    .strip_prefix(root)
                    .map_err(|e| CompareError::Discovery {
                        root: root.to_path_buf(),
                        message: e.to_string(),
                    })?
                    .to_path_buf();
                entries.insert(relative, file);
            }
        }

        // WalkDir reports an unreadable root as an error, but a missing root
        // with min_depth(1) can slip through as an empty walk
        if entries.is_empty() && !root.is_dir() {
            return Err(CompareError::Discovery {
                root: root.to_path_buf(),
                message: "not a directory".to_string(),
            });
        }

        debug!(root = %root.display(), count = entries.len(), "Discovered reference files");

        Ok(Self {
            root: root.to_path_buf(),
            entries,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Absolute path of the reference stored at `relative`.
    pub fn get(&self, relative: &Path) -> Option<&Path> {
        self.entries.get(relative).map(PathBuf::as_path)
    }

    pub fn contains(&self, relative: &Path) -> bool {
        self.entries.contains_key(relative)
    }

    /// `(relative, absolute)` pairs in relative-path order.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &Path)> {
        self.entries
            .iter()
            .map(|(rel, abs)| (rel.as_path(), abs.as_path()))
    }
}

/// Regular files directly inside `save_dir`, sorted by name.
fn saved_files(save_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(save_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_discovers_only_save_files_of_example_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("Example_OLR_Tracking/Save/Track.nc"));
        touch(&root.join("Example_OLR_Tracking/Save/Mask.nc"));
        touch(&root.join("Example_OLR_Tracking/Plot/frame.png"));
        touch(&root.join("Other/Save/ignored.nc"));
        touch(&root.join("nested/Example_Precip/Save/Features.nc"));
        fs::create_dir_all(root.join("Example_OLR_Tracking/Save/subdir")).unwrap();

        let set = ReferenceSet::discover(root, &DiscoveryConfig::default()).unwrap();
        let relative: Vec<&Path> = set.iter().map(|(rel, _)| rel).collect();
        assert_eq!(
            relative,
            vec![
                Path::new("Example_OLR_Tracking/Save/Mask.nc"),
                Path::new("Example_OLR_Tracking/Save/Track.nc"),
                Path::new("nested/Example_Precip/Save/Features.nc"),
            ]
        );
        assert_eq!(
            set.get(Path::new("Example_OLR_Tracking/Save/Mask.nc")),
            Some(root.join("Example_OLR_Tracking/Save/Mask.nc").as_path())
        );
    }

    #[test]
    fn test_root_without_examples_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("notes/Save/file.nc"));

        let set = ReferenceSet::discover(dir.path(), &DiscoveryConfig::default()).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_root_itself_is_not_an_example() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("Example_root");
        touch(&root.join("Save/file.nc"));

        let set = ReferenceSet::discover(&root, &DiscoveryConfig::default()).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ReferenceSet::discover(dir.path().join("absent"), &DiscoveryConfig::default());
        assert!(matches!(result, Err(CompareError::Discovery { .. })));
    }

    #[test]
    fn test_custom_prefix_and_subdir() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("Demo_1/Output/a.nc"));
        touch(&dir.path().join("Example_1/Save/b.nc"));

        let config = DiscoveryConfig {
            example_prefix: "Demo".to_string(),
            save_subdir: "Output".to_string(),
        };
        let set = ReferenceSet::discover(dir.path(), &config).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.contains(Path::new("Demo_1/Output/a.nc")));
    }
}

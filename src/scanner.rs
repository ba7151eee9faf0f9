use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use walkdir::WalkDir;

use crate::config::ScanConfig;

/// One container file slated for subtitle processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkUnit {
    pub path: PathBuf,
}

/// Recursively enumerate `root` and produce one work unit per container
/// file that still needs processing. Returns the units plus a flag that is
/// false when any subtree could not be listed; enumeration errors abort
/// only the affected subtree.
pub fn scan_directory(root: &Path, config: &ScanConfig) -> (Vec<WorkUnit>, bool) {
    let mut units = Vec::new();
    let mut clean = true;

    debug!("Reading {}", root.display());

    let mut walker = WalkDir::new(root).into_iter();
    loop {
        let entry = match walker.next() {
            None => break,
            Some(Ok(entry)) => entry,
            Some(Err(e)) => {
                error!("Failed to enumerate under {}: {}", root.display(), e);
                clean = false;
                continue;
            }
        };

        let path = entry.path();
        if is_excluded(path, &config.exclude_patterns) {
            info!("Skipping excluded path {}", path.display());
            if entry.file_type().is_dir() {
                walker.skip_current_dir();
            }
            continue;
        }

        if !entry.file_type().is_file() {
            continue;
        }

        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.contains(&config.container_extension) {
            continue;
        }

        if name.contains(&config.merged_suffix) {
            debug!("File {} is a prior merged output, skipping", path.display());
            continue;
        }

        let merged_name = name.replace(&config.container_extension, &config.merged_suffix);
        if path.with_file_name(&merged_name).exists() {
            info!(
                "Merged file for {} already exists, not converting subtitles",
                path.display()
            );
            continue;
        }

        info!("Found container file {}", path.display());
        units.push(WorkUnit {
            path: path.to_path_buf(),
        });
    }

    (units, clean)
}

fn is_excluded(path: &Path, patterns: &[String]) -> bool {
    let path_str = path.to_string_lossy();
    patterns
        .iter()
        .any(|pattern| !pattern.is_empty() && path_str.contains(pattern.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    fn scan_config() -> ScanConfig {
        ScanConfig {
            container_extension: ".mkv".to_string(),
            merged_suffix: "-merged.mkv".to_string(),
            exclude_patterns: Vec::new(),
        }
    }

    fn unit_names(units: &[WorkUnit]) -> Vec<String> {
        let mut names: Vec<String> = units
            .iter()
            .map(|u| u.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn emits_one_unit_per_container_file() {
        let tree = assert_fs::TempDir::new().unwrap();
        tree.child("movie.mkv").touch().unwrap();
        tree.child("other.mkv").touch().unwrap();
        tree.child("notes.txt").touch().unwrap();

        let (units, clean) = scan_directory(tree.path(), &scan_config());
        assert!(clean);
        assert_eq!(unit_names(&units), vec!["movie.mkv", "other.mkv"]);
    }

    #[test]
    fn recurses_into_subdirectories() {
        let tree = assert_fs::TempDir::new().unwrap();
        tree.child("season1/e01.mkv").touch().unwrap();
        tree.child("season1/extras/bonus.mkv").touch().unwrap();

        let (units, clean) = scan_directory(tree.path(), &scan_config());
        assert!(clean);
        assert_eq!(unit_names(&units), vec!["bonus.mkv", "e01.mkv"]);
    }

    #[test]
    fn never_reprocesses_merged_outputs() {
        let tree = assert_fs::TempDir::new().unwrap();
        tree.child("movie-merged.mkv").touch().unwrap();

        let (units, _) = scan_directory(tree.path(), &scan_config());
        assert!(units.is_empty());
    }

    #[test]
    fn skips_files_with_an_existing_merged_sibling() {
        let tree = assert_fs::TempDir::new().unwrap();
        tree.child("movie.mkv").touch().unwrap();
        tree.child("movie-merged.mkv").touch().unwrap();
        tree.child("fresh.mkv").touch().unwrap();

        let (units, _) = scan_directory(tree.path(), &scan_config());
        assert_eq!(unit_names(&units), vec!["fresh.mkv"]);
    }

    #[test]
    fn second_run_over_a_finished_tree_finds_nothing() {
        let tree = assert_fs::TempDir::new().unwrap();
        tree.child("a.mkv").touch().unwrap();
        tree.child("b/b.mkv").touch().unwrap();

        let (first, _) = scan_directory(tree.path(), &scan_config());
        assert_eq!(first.len(), 2);

        // Simulate a completed batch: every input gains a merged sibling.
        tree.child("a-merged.mkv").touch().unwrap();
        tree.child("b/b-merged.mkv").touch().unwrap();

        let (second, _) = scan_directory(tree.path(), &scan_config());
        assert!(second.is_empty());
    }

    #[test]
    fn exclusion_patterns_skip_matching_subtrees() {
        let tree = assert_fs::TempDir::new().unwrap();
        tree.child("keep/movie.mkv").touch().unwrap();
        tree.child("samples/sample.mkv").touch().unwrap();

        let mut config = scan_config();
        config.exclude_patterns = vec!["samples".to_string()];

        let (units, _) = scan_directory(tree.path(), &config);
        assert_eq!(unit_names(&units), vec!["movie.mkv"]);
    }

    #[test]
    fn exclusion_patterns_match_file_paths_too() {
        let tree = assert_fs::TempDir::new().unwrap();
        tree.child("movie.mkv").touch().unwrap();
        tree.child("movie.sample.mkv").touch().unwrap();

        let mut config = scan_config();
        config.exclude_patterns = vec![".sample.".to_string()];

        let (units, _) = scan_directory(tree.path(), &config);
        assert_eq!(unit_names(&units), vec!["movie.mkv"]);
    }
}

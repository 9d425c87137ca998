//! Discovery of ESTree JSON module files with directory pruning.
//!
//! - Early directory pruning via `WalkDir::filter_entry` (O(1) subtree skip)
//! - Parallel entry filtering via Rayon's `par_bridge`
//! - Sorted output, so sessions see modules in a stable order

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::ast::{estree, Module};
use crate::error::{IoResultExt, ShakerResult};

/// Directories skipped by default.
const EXCLUDED_DIRS: &[&str] = &[".git", "node_modules", "target", ".cache"];

#[inline]
fn is_excluded_dir(entry: &walkdir::DirEntry, excludes: &HashSet<&str>) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| excludes.contains(name))
}

/// Gathers every `*.json` file under `root`. A file path is returned as is.
pub fn gather_ast_files(root: &Path) -> Result<Vec<PathBuf>> {
    gather_ast_files_with_excludes(root, &[])
}

/// Like [`gather_ast_files`] with extra directory names to skip.
pub fn gather_ast_files_with_excludes(root: &Path, excludes: &[&str]) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let all_excludes: HashSet<&str> = EXCLUDED_DIRS
        .iter()
        .copied()
        .chain(excludes.iter().copied())
        .collect();

    let mut files = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_excluded_dir(e, &all_excludes))
        .par_bridge()
        .filter_map(|entry| match entry {
            Ok(e) => {
                let path = e.path();
                if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                    Some(Ok(path.to_path_buf()))
                } else {
                    None
                }
            }
            Err(e) => Some(Err(e.into())),
        })
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("Failed to gather .json files from {}", root.display()))?;

    files.sort();
    Ok(files)
}

/// Reads and lowers one ESTree JSON file. The module is named after the
/// file with its `.json` suffix dropped (`app.js.json` -> `app.js`).
pub fn load_module(path: &Path) -> ShakerResult<Module> {
    let json = fs::read_to_string(path).with_path(path)?;
    let display = path.display().to_string();
    let filename = display.strip_suffix(".json").unwrap_or(&display);
    estree::module_from_estree(&json, filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("jsshake_scan_{}_{}", tag, std::process::id()));
        if dir.exists() {
            fs::remove_dir_all(&dir).ok();
        }
        fs::create_dir_all(&dir).expect("Failed to create test directory");
        dir
    }

    #[test]
    fn test_gather_skips_excluded_dirs() {
        let dir = temp_root("gather");
        fs::create_dir_all(dir.join("src/nested")).unwrap();
        fs::create_dir_all(dir.join("node_modules/pkg")).unwrap();
        fs::write(dir.join("src/a.js.json"), "{}").unwrap();
        fs::write(dir.join("src/nested/b.js.json"), "{}").unwrap();
        fs::write(dir.join("src/readme.md"), "").unwrap();
        fs::write(dir.join("node_modules/pkg/c.json"), "{}").unwrap();

        let files = gather_ast_files(&dir).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("src/a.js.json"));
        assert!(files[1].ends_with("src/nested/b.js.json"));

        let fewer = gather_ast_files_with_excludes(&dir, &["nested"]).unwrap();
        assert_eq!(fewer.len(), 1);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_module_from_file() {
        let dir = temp_root("load");
        let path = dir.join("entry.js.json");
        fs::write(
            &path,
            r#"{ "type": "Program", "sourceType": "module", "body": [
                { "type": "ExpressionStatement",
                  "expression": { "type": "Identifier", "name": "x" } }
            ] }"#,
        )
        .unwrap();

        let module = load_module(&path).unwrap();
        assert!(module.filename.ends_with("entry.js"));
        assert_eq!(module.body().len(), 1);

        let missing = load_module(&dir.join("missing.json")).unwrap_err();
        assert!(missing.path().is_some());

        fs::remove_dir_all(&dir).ok();
    }
}

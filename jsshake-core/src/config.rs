//! Configuration loading from jsshake.toml.
//!
//! ```toml
//! only-exports = ["default", "styles"]
//! unknown-export-policy = "reexport-all"
//! keep-side-effect-sources = ["\\.css$", "^core-js/"]
//!
//! [[known-dead-imports]]
//! name = "invariant"
//! source = "tiny-invariant"
//!
//! [env-strip]
//! enabled = true
//! files = ["\\.tsx?$"]
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::{fs, path::Path};

pub const CONFIG_FILE: &str = "jsshake.toml";

/// What to do when a requested export is neither exported nor re-exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownExportPolicy {
    /// Fail the module.
    Error,
    /// Shake with whatever matched.
    Ignore,
    /// Keep every wildcard re-export alive; the name may come from one.
    ReexportAll,
    /// Leave the module untouched.
    #[default]
    SkipShaking,
}

impl UnknownExportPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Ignore => "ignore",
            Self::ReexportAll => "reexport-all",
            Self::SkipShaking => "skip-shaking",
        }
    }
}

impl fmt::Display for UnknownExportPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnknownExportPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "error" => Ok(Self::Error),
            "ignore" => Ok(Self::Ignore),
            "reexport-all" => Ok(Self::ReexportAll),
            "skip-shaking" => Ok(Self::SkipShaking),
            other => Err(format!(
                "unknown policy `{}` (expected error, ignore, reexport-all or skip-shaking)",
                other
            )),
        }
    }
}

/// An import known to be useless at evaluation time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct KnownDeadImport {
    /// Imported name (`default` for default imports).
    pub name: String,
    pub source: String,
}

/// Environment-code stripping.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EnvStripConfig {
    pub enabled: bool,
    /// Filename patterns; empty matches every file.
    pub files: Vec<String>,
    /// Globals replaced by `undefined`.
    pub globals: Vec<String>,
}

impl Default for EnvStripConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            files: Vec::new(),
            globals: [
                "XMLHttpRequest",
                "clearImmediate",
                "clearInterval",
                "clearTimeout",
                "document",
                "fetch",
                "localStorage",
                "location",
                "navigator",
                "sessionStorage",
                "setImmediate",
                "setInterval",
                "setTimeout",
                "window",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// Main configuration structure for jsshake.toml.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ShakeConfig {
    /// Requested exports. `*` keeps every export, `side-effect` keeps
    /// side-effect imports, an empty list removes everything.
    pub only_exports: Vec<String>,
    pub unknown_export_policy: UnknownExportPolicy,
    /// Never remove side-effect imports.
    pub keep_side_effects: bool,
    /// Sources (regex) whose side-effect imports are kept.
    pub keep_side_effect_sources: Vec<String>,
    pub known_dead_imports: Vec<KnownDeadImport>,
    /// Keep exports whose local name equals an imported name.
    pub alias_imported_names: bool,
    pub env_strip: EnvStripConfig,
}

impl Default for ShakeConfig {
    fn default() -> Self {
        Self {
            only_exports: vec!["*".to_string()],
            unknown_export_policy: UnknownExportPolicy::default(),
            keep_side_effects: false,
            keep_side_effect_sources: Vec::new(),
            known_dead_imports: Vec::new(),
            alias_imported_names: true,
            env_strip: EnvStripConfig::default(),
        }
    }
}

/// Loads configuration from jsshake.toml in `root` if it exists.
pub fn load_config(root: &Path) -> Result<Option<ShakeConfig>> {
    let path = root.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(None);
    }
    load_config_file(&path).map(Some)
}

/// Loads configuration from an explicit file.
pub fn load_config_file(path: &Path) -> Result<ShakeConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let cfg = toml::from_str(&content)
        .with_context(|| format!("Invalid {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_root(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("jsshake_config_{}_{}", tag, std::process::id()));
        if dir.exists() {
            fs::remove_dir_all(&dir).ok();
        }
        fs::create_dir_all(&dir).expect("Failed to create test directory");
        dir
    }

    #[test]
    fn test_defaults() {
        let cfg = ShakeConfig::default();
        assert_eq!(cfg.only_exports, ["*"]);
        assert_eq!(cfg.unknown_export_policy, UnknownExportPolicy::SkipShaking);
        assert!(cfg.alias_imported_names);
        assert!(!cfg.env_strip.enabled);
        assert!(cfg.env_strip.globals.iter().any(|g| g == "window"));
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = temp_root("missing");
        assert!(load_config(&dir).unwrap().is_none());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_full_config() {
        let dir = temp_root("full");
        fs::write(
            dir.join(CONFIG_FILE),
            r#"
only-exports = ["a", "default"]
unknown-export-policy = "reexport-all"
keep-side-effect-sources = ["\\.css$"]
alias-imported-names = false

[[known-dead-imports]]
name = "invariant"
source = "tiny-invariant"

[env-strip]
enabled = true
files = ["\\.tsx$"]
"#,
        )
        .expect("Failed to write config");

        let cfg = load_config(&dir).unwrap().unwrap();
        assert_eq!(cfg.only_exports, ["a", "default"]);
        assert_eq!(cfg.unknown_export_policy, UnknownExportPolicy::ReexportAll);
        assert_eq!(cfg.keep_side_effect_sources, ["\\.css$"]);
        assert!(!cfg.alias_imported_names);
        assert_eq!(cfg.known_dead_imports[0].source, "tiny-invariant");
        assert!(cfg.env_strip.enabled);
        // Unspecified env-strip globals keep their defaults.
        assert!(!cfg.env_strip.globals.is_empty());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_policy_is_error() {
        let dir = temp_root("invalid");
        fs::write(dir.join(CONFIG_FILE), "unknown-export-policy = \"maybe\"\n")
            .expect("Failed to write config");
        assert!(load_config(&dir).is_err());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("ignore".parse::<UnknownExportPolicy>(), Ok(UnknownExportPolicy::Ignore));
        assert!("never".parse::<UnknownExportPolicy>().is_err());
        assert_eq!(UnknownExportPolicy::ReexportAll.to_string(), "reexport-all");
    }
}

//! Config discovery
//!
//! Finds candidate config files, drops the ones that do not look like
//! configs, and warns about configs that would overwrite each other's output.
//!
//! ```rust,no_run
//! use exfig::core::discovery::{ConfigDiscovery, PatternConfigReader};
//!
//! # fn example() -> exfig::domain::Result<()> {
//! let discovery = ConfigDiscovery::new("pkl");
//! let configs = discovery.discover_in_directory("configs")?;
//! let filtered = discovery.filter_valid_configs(configs);
//! let conflicts =
//!     discovery.detect_output_path_conflicts(&filtered.valid, &PatternConfigReader::new());
//! # Ok(())
//! # }
//! ```

pub mod file_ids;
pub mod reader;

pub use file_ids::FileIdExtractor;
pub use reader::{ConfigReader, ConfigSummary, PatternConfigReader};

use crate::config::DiscoveryConfig;
use crate::domain::config_file::{ConfigFile, OutputPathConflict};
use crate::domain::context::ResultExt;
use crate::domain::errors::DiscoveryError;
use crate::domain::result::Result;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

/// Marker of a config written against the published schema
fn amends_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?m)^\s*amends\s+""#).expect("amends pattern is valid")
    })
}

/// A top-level platform section such as `ios {` or `android = new Android {`
fn platform_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?m)^\s*(ios|android|flutter|web)\s*(=\s*new\b[^{\n]*)?\{")
            .expect("platform pattern is valid")
    })
}

/// Configs split by the syntactic validity check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredConfigs {
    pub valid: Vec<ConfigFile>,
    pub invalid: Vec<ConfigFile>,
}

/// Locates and vets config files
#[derive(Debug, Clone)]
pub struct ConfigDiscovery {
    extension: String,
}

impl ConfigDiscovery {
    /// `extension` is matched case-insensitively, with or without a leading dot
    pub fn new(extension: impl Into<String>) -> Self {
        let extension = extension.into();
        Self {
            extension: extension.trim_start_matches('.').to_ascii_lowercase(),
        }
    }

    pub fn from_config(config: &DiscoveryConfig) -> Self {
        Self::new(config.extension.clone())
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Lists config files directly inside `dir`, sorted by path
    ///
    /// # Errors
    ///
    /// `DiscoveryError::DirectoryNotFound` when `dir` is missing or not a
    /// directory.
    pub fn discover_in_directory(&self, dir: impl AsRef<Path>) -> Result<Vec<ConfigFile>> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(DiscoveryError::DirectoryNotFound(dir.to_path_buf()).into());
        }

        let mut paths = Vec::new();
        let entries =
            fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && self.has_extension(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        tracing::debug!(dir = %dir.display(), found = paths.len(), "Discovered config files");
        Ok(paths.into_iter().map(ConfigFile::new).collect())
    }

    /// Turns explicit paths into configs, keeping their order
    ///
    /// # Errors
    ///
    /// `DiscoveryError::FileNotFound` naming the first missing path.
    pub fn discover_from_paths(&self, paths: &[PathBuf]) -> Result<Vec<ConfigFile>> {
        if let Some(missing) = paths.iter().find(|p| !p.is_file()) {
            return Err(DiscoveryError::FileNotFound(missing.clone()).into());
        }
        Ok(paths.iter().cloned().map(ConfigFile::new).collect())
    }

    /// Keeps files that carry the schema marker or a platform section
    pub fn filter_valid_configs(&self, configs: Vec<ConfigFile>) -> FilteredConfigs {
        let mut filtered = FilteredConfigs::default();

        for config in configs {
            let looks_valid = match fs::read_to_string(&config.path) {
                Ok(contents) => Self::looks_like_config(&contents),
                Err(e) => {
                    tracing::debug!(config = %config.name, error = %e, "Config file unreadable");
                    false
                }
            };
            if looks_valid {
                filtered.valid.push(config);
            } else {
                filtered.invalid.push(config);
            }
        }

        if !filtered.invalid.is_empty() {
            tracing::debug!(
                valid = filtered.valid.len(),
                invalid = filtered.invalid.len(),
                "Filtered config candidates"
            );
        }
        filtered
    }

    /// Cheap syntactic check, not a parse
    pub fn looks_like_config(contents: &str) -> bool {
        amends_pattern().is_match(contents) || platform_pattern().is_match(contents)
    }

    /// Groups configs by resolved output path and reports shared paths
    ///
    /// Relative outputs resolve against the config's directory. Configs the
    /// reader cannot handle are ignored here.
    pub fn detect_output_path_conflicts(
        &self,
        configs: &[ConfigFile],
        reader: &dyn ConfigReader,
    ) -> Vec<OutputPathConflict> {
        let mut by_path: BTreeMap<PathBuf, Vec<ConfigFile>> = BTreeMap::new();

        for config in configs {
            let summary = match reader.read(&config.path) {
                Ok(summary) => summary,
                Err(e) => {
                    tracing::debug!(config = %config.name, error = %e, "Skipping config in conflict check");
                    continue;
                }
            };

            let resolved: BTreeSet<PathBuf> = summary
                .output_paths
                .iter()
                .map(|output| resolve_output_path(config.base_dir(), output))
                .collect();

            for path in resolved {
                by_path.entry(path).or_default().push(config.clone());
            }
        }

        by_path
            .into_iter()
            .filter(|(_, configs)| configs.len() > 1)
            .map(|(path, configs)| OutputPathConflict { path, configs })
            .collect()
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(&self.extension))
            .unwrap_or(false)
    }
}

/// Joins `output` onto `base` and folds `.`/`..` lexically
fn resolve_output_path(base: &Path, output: &Path) -> PathBuf {
    let joined = if output.is_absolute() {
        output.to_path_buf()
    } else {
        base.join(output)
    };

    let mut resolved = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    resolved.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    resolved.pop();
                } else {
                    resolved.push(component);
                }
            }
            other => resolved.push(other),
        }
    }
    resolved
}

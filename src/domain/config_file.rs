//! Config file identity

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// One export target: a config path plus a display name.
///
/// Names need not be unique across a batch; the path is what identifies the
/// config, the name is what shows up in logs and reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Path to the config file
    pub path: PathBuf,

    /// Display name (the file stem by default)
    pub name: String,
}

impl ConfigFile {
    /// Creates a config file named after its file stem
    ///
    /// ```
    /// use exfig::domain::ConfigFile;
    ///
    /// let config = ConfigFile::new("projects/ios-app.pkl");
    /// assert_eq!(config.name, "ios-app");
    /// ```
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }

    /// Creates a config file with an explicit display name
    pub fn with_name(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }

    /// Directory the config lives in; relative output paths resolve against it
    pub fn base_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl fmt::Display for ConfigFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Several configs resolving to the same output path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPathConflict {
    /// Resolved output path
    pub path: PathBuf,

    /// Every config that writes to `path`
    pub configs: Vec<ConfigFile>,
}

impl OutputPathConflict {
    /// Names of the conflicting configs, for reporting
    pub fn config_names(&self) -> Vec<&str> {
        self.configs.iter().map(|c| c.name.as_str()).collect()
    }
}

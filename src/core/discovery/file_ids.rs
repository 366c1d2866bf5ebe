//! Remote file ids referenced by a set of configs

use super::reader::ConfigReader;
use crate::domain::config_file::ConfigFile;
use crate::domain::ids::FileId;
use std::collections::HashSet;
use std::sync::Arc;

/// Collects the deduplicated file ids used across configs
///
/// Unreadable configs contribute nothing; they fail later, in their own run.
#[derive(Clone)]
pub struct FileIdExtractor {
    reader: Arc<dyn ConfigReader>,
}

impl FileIdExtractor {
    pub fn new(reader: Arc<dyn ConfigReader>) -> Self {
        Self { reader }
    }

    /// Union of all referenced ids in first-encounter order
    pub fn extract_unique(&self, configs: &[ConfigFile]) -> Vec<FileId> {
        let mut seen = HashSet::new();
        let mut ids = Vec::new();

        for config in configs {
            let summary = match self.reader.read(&config.path) {
                Ok(summary) => summary,
                Err(e) => {
                    tracing::debug!(config = %config.name, error = %e, "Skipping config during file id extraction");
                    continue;
                }
            };

            for file_id in summary.file_ids() {
                if seen.insert(file_id.clone()) {
                    ids.push(file_id.clone());
                }
            }
        }

        tracing::debug!(configs = configs.len(), file_ids = ids.len(), "Extracted remote file ids");
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::discovery::reader::ConfigSummary;
    use crate::domain::errors::ExfigError;
    use crate::domain::result::Result;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    struct MapReader(HashMap<PathBuf, ConfigSummary>);

    impl ConfigReader for MapReader {
        fn read(&self, path: &Path) -> Result<ConfigSummary> {
            self.0
                .get(path)
                .cloned()
                .ok_or_else(|| ExfigError::Configuration("unparseable".to_string()))
        }
    }

    fn summary(figma: &[&str], tokens: &[&str]) -> ConfigSummary {
        ConfigSummary {
            figma_file_ids: figma.iter().map(|s| FileId::new(*s).unwrap()).collect(),
            tokens_file_ids: tokens.iter().map(|s| FileId::new(*s).unwrap()).collect(),
            output_paths: Vec::new(),
        }
    }

    #[test]
    fn test_union_is_deduplicated_in_encounter_order() {
        let reader = MapReader(HashMap::from([
            (PathBuf::from("a.pkl"), summary(&["light1", "dark1"], &["tokens"])),
            (PathBuf::from("b.pkl"), summary(&["light1"], &[])),
            // dark id of one config equals light id of another
            (PathBuf::from("c.pkl"), summary(&["light2", "light1"], &["tokens"])),
        ]));
        let extractor = FileIdExtractor::new(Arc::new(reader));

        let configs = vec![
            ConfigFile::new("a.pkl"),
            ConfigFile::new("broken.pkl"),
            ConfigFile::new("b.pkl"),
            ConfigFile::new("c.pkl"),
        ];
        let ids: Vec<String> = extractor
            .extract_unique(&configs)
            .into_iter()
            .map(|id| id.to_string())
            .collect();

        assert_eq!(ids, vec!["light1", "dark1", "tokens", "light2"]);
    }
}

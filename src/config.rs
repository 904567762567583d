//! Scan configuration.
//!
//! Loaded from a TOML file by the CLI or constructed in code; every field
//! has a working default.

use serde::Deserialize;
use std::path::Path;

use crate::graph::extract::DEFAULT_MAX_STRUCT_DEPTH;
use crate::snapshot::Category;

/// Tunables for a scan session.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Treat pinned assets (the store's protector flag) as roots. When off,
    /// a pinned asset with no other user is reported unused.
    pub respect_pinned: bool,
    /// Recursion bound for the generic structural property walk.
    pub max_struct_depth: usize,
    /// Batch size for extraction-heavy categories (scenes, objects,
    /// materials, node groups).
    pub heavy_batch_size: usize,
    /// Batch size for everything else.
    pub light_batch_size: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            respect_pinned: true,
            max_struct_depth: DEFAULT_MAX_STRUCT_DEPTH,
            heavy_batch_size: 32,
            light_batch_size: 256,
        }
    }
}

impl ScanConfig {
    /// Batch size for one category. Heavier-to-extract categories process in
    /// smaller batches so cancellation latency stays bounded.
    pub fn batch_size(&self, category: Category) -> usize {
        let heavy = matches!(
            category,
            Category::Scene | Category::Object | Category::Material | Category::NodeGroup
        );
        let size = if heavy {
            self.heavy_batch_size
        } else {
            self.light_batch_size
        };
        size.max(1)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = ScanConfig::default();
        assert!(config.respect_pinned);
        assert_eq!(config.max_struct_depth, DEFAULT_MAX_STRUCT_DEPTH);
        assert!(config.batch_size(Category::NodeGroup) < config.batch_size(Category::Image));
    }

    #[test]
    fn batch_size_never_zero() {
        let config = ScanConfig {
            heavy_batch_size: 0,
            light_batch_size: 0,
            ..ScanConfig::default()
        };
        assert_eq!(config.batch_size(Category::Material), 1);
        assert_eq!(config.batch_size(Category::Image), 1);
    }

    #[test]
    fn load_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "respect_pinned = false\nheavy_batch_size = 8").unwrap();

        let config = ScanConfig::load(file.path()).unwrap();
        assert!(!config.respect_pinned);
        assert_eq!(config.heavy_batch_size, 8);
        // Unspecified fields fall back to defaults.
        assert_eq!(config.light_batch_size, ScanConfig::default().light_batch_size);
    }
}

//! Spec inventory construction.
//!
//! The inventory is a single arena of [`SpecLocation`] entries indexed by
//! `(SpecType, key, version)`. Category views are derived on demand instead of
//! keeping one map per spec type.
use crate::classify::SpecClassifier;
use crate::config::IntegrityConfig;
use crate::model::{spec_id, FeatureRecord, SpecLocation, SpecType};
use crate::workspace::Workspace;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Typed inventory of every declared spec, in first-insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<SpecLocation>", into = "Vec<SpecLocation>")]
pub struct SpecInventory {
    entries: Vec<SpecLocation>,
    index: HashMap<(SpecType, String), usize>,
}

impl SpecInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a location, replacing any entry with the same type and `key@version`.
    ///
    /// Returns the replaced entry; the slot keeps its original position.
    pub fn insert(&mut self, location: SpecLocation) -> Option<SpecLocation> {
        let slot = (location.spec_type, location.id());
        match self.index.get(&slot) {
            Some(&idx) => Some(std::mem::replace(&mut self.entries[idx], location)),
            None => {
                self.index.insert(slot, self.entries.len());
                self.entries.push(location);
                None
            }
        }
    }

    pub fn get(&self, spec_type: SpecType, key: &str, version: &str) -> Option<&SpecLocation> {
        self.index
            .get(&(spec_type, spec_id(key, version)))
            .map(|&idx| &self.entries[idx])
    }

    pub fn contains(&self, spec_type: SpecType, key: &str, version: &str) -> bool {
        self.get(spec_type, key, version).is_some()
    }

    /// Entries of one category, in insertion order.
    pub fn of_type(&self, spec_type: SpecType) -> impl Iterator<Item = &SpecLocation> + '_ {
        self.entries
            .iter()
            .filter(move |entry| entry.spec_type == spec_type)
    }

    pub fn len_of(&self, spec_type: SpecType) -> usize {
        self.of_type(spec_type).count()
    }

    pub fn test_specs(&self) -> impl Iterator<Item = &SpecLocation> + '_ {
        self.of_type(SpecType::TestSpec)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpecLocation> + '_ {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<SpecLocation>> for SpecInventory {
    fn from(entries: Vec<SpecLocation>) -> Self {
        let mut inventory = SpecInventory::new();
        for entry in entries {
            inventory.insert(entry);
        }
        inventory
    }
}

impl From<SpecInventory> for Vec<SpecLocation> {
    fn from(inventory: SpecInventory) -> Self {
        inventory.entries
    }
}

/// Output of one inventory scan.
#[derive(Debug, Clone, Default)]
pub struct ScanOutput {
    pub inventory: SpecInventory,
    pub features: Vec<FeatureRecord>,
}

/// Walks workspace files and accumulates the inventory and feature list.
pub struct InventoryBuilder<'a> {
    workspace: &'a dyn Workspace,
    classifier: &'a dyn SpecClassifier,
    config: &'a IntegrityConfig,
}

impl<'a> InventoryBuilder<'a> {
    pub fn new(
        workspace: &'a dyn Workspace,
        classifier: &'a dyn SpecClassifier,
        config: &'a IntegrityConfig,
    ) -> Self {
        Self {
            workspace,
            classifier,
            config,
        }
    }

    /// Enumerate files from the configured patterns and scan them.
    pub fn scan(&self) -> Result<ScanOutput> {
        let files = self
            .workspace
            .glob(&self.config.spec_patterns, &self.config.ignore)?;
        Ok(self.scan_files(&files))
    }

    /// Scan an explicit list of files.
    ///
    /// Directories, unreadable files, and files without recognizable content
    /// are skipped.
    pub fn scan_files(&self, files: &[PathBuf]) -> ScanOutput {
        let mut output = ScanOutput::default();
        for path in files {
            if self.workspace.is_dir(path) {
                continue;
            }
            let content = match self.workspace.read(path) {
                Ok(content) => content,
                Err(err) => {
                    tracing::debug!(
                        path = %path.display(),
                        error = %err,
                        "skipping unreadable file"
                    );
                    continue;
                }
            };
            if self.classifier.is_feature_path(path) {
                if let Some(feature) = self.classifier.classify_feature(&content, path) {
                    output.features.push(feature);
                }
                continue;
            }
            for record in self.classifier.classify(&content, path) {
                if record.spec_type == SpecType::Feature {
                    continue;
                }
                if let Some(previous) = output.inventory.insert(record.clone()) {
                    tracing::debug!(
                        spec = %record.id(),
                        spec_type = %record.spec_type,
                        previous = %previous.file_path.display(),
                        current = %record.file_path.display(),
                        "duplicate spec; keeping the later declaration"
                    );
                }
            }
        }
        tracing::info!(
            specs = output.inventory.len(),
            features = output.features.len(),
            files = files.len(),
            "inventory scan complete"
        );
        output
    }
}

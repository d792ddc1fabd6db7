//! Implementation resolution for individual specs.
//!
//! Three independent evidence streams propose candidate files for a spec:
//!
//! - [`explicit`]: the `implementations` list declared inside the spec block
//! - [`discovery`]: source files that mention the spec key or its identifiers
//! - [`convention`]: paths implied by spec type and kebab-cased key
//!
//! Candidates are merged first-writer-wins by path in that order, checked for
//! existence, optionally hashed, and rolled up into an [`ImplementationStatus`].
use crate::classify::SpecClassifier;
use crate::config::IntegrityConfig;
use crate::inventory::SpecInventory;
use crate::model::{SpecLocation, SpecRecord, SpecType};
use crate::util::sha256_hex;
use crate::workspace::Workspace;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

pub mod convention;
pub mod discovery;
pub mod explicit;

use discovery::{KeyVariants, SourceFile, SourceScanner};

/// Categories resolved by [`ImplementationResolver::resolve_all_implementations`].
pub const IMPLEMENTABLE: [SpecType; 6] = [
    SpecType::Operation,
    SpecType::Event,
    SpecType::Presentation,
    SpecType::Form,
    SpecType::Workflow,
    SpecType::DataView,
];

/// Which evidence stream produced a candidate.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ImplementationSource {
    Explicit,
    Discovered,
    Convention,
}

impl ImplementationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImplementationSource::Explicit => "explicit",
            ImplementationSource::Discovered => "discovered",
            ImplementationSource::Convention => "convention",
        }
    }
}

/// Role of an implementation file.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ImplementationType {
    Handler,
    Component,
    Form,
    Event,
    Service,
    Test,
    Other,
}

impl ImplementationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImplementationType::Handler => "handler",
            ImplementationType::Component => "component",
            ImplementationType::Form => "form",
            ImplementationType::Event => "event",
            ImplementationType::Service => "service",
            ImplementationType::Test => "test",
            ImplementationType::Other => "other",
        }
    }

    /// Parse a declared type; unknown names map to `Other`.
    pub fn parse(raw: &str) -> ImplementationType {
        match raw.trim().to_ascii_lowercase().as_str() {
            "handler" => ImplementationType::Handler,
            "component" => ImplementationType::Component,
            "form" => ImplementationType::Form,
            "event" => ImplementationType::Event,
            "service" => ImplementationType::Service,
            "test" => ImplementationType::Test,
            _ => ImplementationType::Other,
        }
    }

    /// Infer the role of a file from its path.
    pub fn infer(path: &Path) -> ImplementationType {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        let full = path.to_string_lossy().to_ascii_lowercase().replace('\\', "/");
        if name.contains(".test.") || name.contains(".spec.") || full.contains("/__tests__/") {
            ImplementationType::Test
        } else if full.contains("handler") {
            ImplementationType::Handler
        } else if full.contains("form") {
            ImplementationType::Form
        } else if name.ends_with(".tsx") || name.ends_with(".jsx") || full.contains("component") {
            ImplementationType::Component
        } else if full.contains("event") {
            ImplementationType::Event
        } else if full.contains("service") {
            ImplementationType::Service
        } else {
            ImplementationType::Other
        }
    }
}

impl fmt::Display for ImplementationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Candidate proposed by one of the evidence streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub impl_type: ImplementationType,
    pub source: ImplementationSource,
    pub description: Option<String>,
}

/// A candidate after existence and hash checks.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ResolvedImplementation {
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub impl_type: ImplementationType,
    pub source: ImplementationSource,
    pub exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImplementationStatus {
    Missing,
    Partial,
    Implemented,
}

impl ImplementationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImplementationStatus::Missing => "missing",
            ImplementationStatus::Partial => "partial",
            ImplementationStatus::Implemented => "implemented",
        }
    }
}

impl fmt::Display for ImplementationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct SpecImplementationResult {
    pub spec_key: String,
    pub spec_version: String,
    pub spec_path: PathBuf,
    pub spec_type: SpecType,
    pub implementations: Vec<ResolvedImplementation>,
    pub status: ImplementationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_hash: Option<String>,
}

/// Roll-up over many resolution results.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImplementationSummary {
    pub total: usize,
    pub implemented: usize,
    pub partial: usize,
    pub missing: usize,
    pub coverage_percent: u32,
}

/// Derive status from resolved candidates.
///
/// Existing tests alone never count as an implementation.
pub fn derive_status(implementations: &[ResolvedImplementation]) -> ImplementationStatus {
    // Also true when nothing exists at all.
    let only_tests_exist = implementations
        .iter()
        .filter(|candidate| candidate.exists)
        .all(|candidate| candidate.impl_type == ImplementationType::Test);
    if only_tests_exist {
        ImplementationStatus::Missing
    } else if implementations.iter().all(|candidate| candidate.exists) {
        ImplementationStatus::Implemented
    } else {
        ImplementationStatus::Partial
    }
}

/// Summarize a batch of results.
pub fn summarize(results: &[SpecImplementationResult]) -> ImplementationSummary {
    let mut summary = ImplementationSummary {
        total: results.len(),
        ..ImplementationSummary::default()
    };
    for result in results {
        match result.status {
            ImplementationStatus::Implemented => summary.implemented += 1,
            ImplementationStatus::Partial => summary.partial += 1,
            ImplementationStatus::Missing => summary.missing += 1,
        }
    }
    if summary.total > 0 {
        summary.coverage_percent =
            ((summary.implemented as f64 * 100.0) / summary.total as f64).round() as u32;
    }
    summary
}

/// Dedup-by-path accumulator; the first candidate for a path wins.
#[derive(Debug, Default)]
struct CandidateSet {
    seen: HashSet<PathBuf>,
    ordered: Vec<Candidate>,
}

impl CandidateSet {
    fn extend(&mut self, candidates: impl IntoIterator<Item = Candidate>) {
        for candidate in candidates {
            if self.seen.insert(candidate.path.clone()) {
                self.ordered.push(candidate);
            }
        }
    }
}

/// Resolves implementation candidates for specs in one workspace.
pub struct ImplementationResolver<'a> {
    workspace: &'a dyn Workspace,
    classifier: &'a dyn SpecClassifier,
    scanner: &'a dyn SourceScanner,
    config: &'a IntegrityConfig,
    sources: OnceCell<Vec<SourceFile>>,
}

impl<'a> ImplementationResolver<'a> {
    pub fn new(
        workspace: &'a dyn Workspace,
        classifier: &'a dyn SpecClassifier,
        scanner: &'a dyn SourceScanner,
        config: &'a IntegrityConfig,
    ) -> Self {
        Self {
            workspace,
            classifier,
            scanner,
            config,
            sources: OnceCell::new(),
        }
    }

    /// Resolve the first spec declared in `spec_path`.
    ///
    /// Fails when the file is missing, unreadable, or declares no spec.
    pub fn resolve_implementations(&self, spec_path: &Path) -> Result<SpecImplementationResult> {
        let spec_path = self.workspace.resolve(spec_path);
        if !self.workspace.exists(&spec_path) {
            return Err(anyhow!("spec file not found: {}", spec_path.display()));
        }
        let content = self.workspace.read(&spec_path)?;
        let record = self
            .classifier
            .classify(&content, &spec_path)
            .into_iter()
            .find(|record| record.spec_type != SpecType::Feature)
            .ok_or_else(|| anyhow!("no spec declared in {}", spec_path.display()))?;
        self.resolve_record(&record, &content)
    }

    /// Resolve one inventory entry.
    pub fn resolve_spec(&self, spec: &SpecLocation) -> Result<SpecImplementationResult> {
        let content = self.workspace.read(&spec.file_path)?;
        self.resolve_record(spec, &content)
    }

    /// Resolve every implementable spec in the inventory.
    ///
    /// A spec that fails to resolve is logged and skipped; the rest keep
    /// inventory order.
    pub fn resolve_all_implementations(
        &self,
        inventory: &SpecInventory,
    ) -> Vec<SpecImplementationResult> {
        let mut results = Vec::new();
        for spec in inventory
            .iter()
            .filter(|spec| IMPLEMENTABLE.contains(&spec.spec_type))
        {
            match self.resolve_spec(spec) {
                Ok(result) => results.push(result),
                Err(err) => {
                    tracing::warn!(
                        spec = %spec.id(),
                        error = %format!("{err:#}"),
                        "failed to resolve implementations"
                    );
                }
            }
        }
        tracing::info!(specs = results.len(), "implementation resolution complete");
        results
    }

    /// Resolve a record whose spec document content is already loaded.
    pub fn resolve_record(
        &self,
        record: &SpecRecord,
        content: &str,
    ) -> Result<SpecImplementationResult> {
        let settings = &self.config.implementations;
        let mut candidates = CandidateSet::default();

        if settings.explicit {
            let block = explicit::spec_block(content, &record.key, &record.version);
            let declared = explicit::parse_implementations(block.unwrap_or(content));
            candidates.extend(declared.into_iter().map(|declared| Candidate {
                path: self.workspace.resolve(Path::new(&declared.path)),
                impl_type: declared.impl_type,
                source: ImplementationSource::Explicit,
                description: declared.description,
            }));
        }

        if settings.discovery {
            let variants = KeyVariants::for_key(&record.key);
            let sources = self.source_files()?;
            candidates.extend(discovery::discover(
                self.scanner,
                sources,
                &variants,
                self.workspace.root(),
            ));
        }

        if settings.convention {
            for dir in &settings.convention_dirs {
                candidates.extend(
                    convention::convention_paths(record.spec_type, &record.key, dir)
                        .into_iter()
                        .map(|expected| Candidate {
                            path: self.workspace.resolve(&expected.path),
                            impl_type: expected.impl_type,
                            source: ImplementationSource::Convention,
                            description: None,
                        }),
                );
            }
        }

        let implementations: Vec<ResolvedImplementation> = candidates
            .ordered
            .into_iter()
            .map(|candidate| self.check_candidate(candidate))
            .collect();
        let status = derive_status(&implementations);
        tracing::debug!(
            spec = %record.id(),
            candidates = implementations.len(),
            %status,
            "resolved implementations"
        );
        Ok(SpecImplementationResult {
            spec_key: record.key.clone(),
            spec_version: record.version.clone(),
            spec_path: record.file_path.clone(),
            spec_type: record.spec_type,
            implementations,
            status,
            spec_hash: settings
                .compute_hashes
                .then(|| sha256_hex(content.as_bytes())),
        })
    }

    fn check_candidate(&self, candidate: Candidate) -> ResolvedImplementation {
        let exists = self.workspace.exists(&candidate.path);
        let content_hash = if exists && self.config.implementations.compute_hashes {
            match self.workspace.read(&candidate.path) {
                Ok(content) => Some(sha256_hex(content.as_bytes())),
                Err(err) => {
                    tracing::debug!(path = %candidate.path.display(), error = %err, "hash skipped");
                    None
                }
            }
        } else {
            None
        };
        ResolvedImplementation {
            path: candidate.path,
            impl_type: candidate.impl_type,
            source: candidate.source,
            exists,
            content_hash,
            description: candidate.description,
        }
    }

    /// Source files for discovery, loaded once per resolver.
    fn source_files(&self) -> Result<&[SourceFile]> {
        if let Some(sources) = self.sources.get() {
            return Ok(sources);
        }
        let mut excluded = self.config.ignore.clone();
        excluded.extend(self.config.spec_patterns.iter().cloned());
        let paths = self
            .workspace
            .glob(&self.config.source_patterns, &excluded)?;
        let loaded: Vec<SourceFile> = paths
            .into_iter()
            .filter_map(|path| match self.workspace.read(&path) {
                Ok(content) => Some(SourceFile { path, content }),
                Err(err) => {
                    tracing::debug!(
                        path = %path.display(),
                        error = %err,
                        "skipping unreadable source"
                    );
                    None
                }
            })
            .collect();
        tracing::debug!(files = loaded.len(), "loaded discovery sources");
        Ok(self.sources.get_or_init(|| loaded))
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;

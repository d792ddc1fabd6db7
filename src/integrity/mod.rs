//! Structural integrity analysis over the spec inventory.
//!
//! A run scans the workspace once, validates every feature reference, indexes
//! test targets, and then derives orphans and per-type coverage. Integrity
//! problems are returned as [`IntegrityIssue`] values; only I/O setup failures
//! (bad globs, unreadable root) surface as errors.
//!
//! ```text
//! InventoryBuilder ─┬─> references::validate_references ─┐
//!                   ├─> test_targets::build_test_index ──┼─> coverage::analyze_coverage
//!                   └─────────────────────────────────────┘
//! ```
use crate::classify::SpecClassifier;
use crate::config::IntegrityConfig;
use crate::inventory::{InventoryBuilder, SpecInventory};
use crate::model::{FeatureRecord, SpecLocation, SpecRef, SpecType};
use crate::workspace::Workspace;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

mod coverage;
mod references;
mod test_targets;

pub use coverage::{analyze_coverage, CoverageAnalysis, CoverageByType};
pub use references::{referenced_id, validate_references, ReferenceCheck};
pub use test_targets::{build_test_index, TestToTargetIndex};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kinds of structural defects.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    Orphaned,
    UnresolvedRef,
    MissingFeature,
    BrokenLink,
    MissingTest,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::Orphaned => "orphaned",
            IssueKind::UnresolvedRef => "unresolved-ref",
            IssueKind::MissingFeature => "missing-feature",
            IssueKind::BrokenLink => "broken-link",
            IssueKind::MissingTest => "missing-test",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structural defect found by the analysis.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct IntegrityIssue {
    pub severity: Severity,
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub message: String,
    pub file: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_type: Option<SpecType>,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<SpecRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_key: Option<String>,
}

impl IntegrityIssue {
    /// Issue about a feature's reference to a spec.
    pub(crate) fn for_reference(
        severity: Severity,
        kind: IssueKind,
        message: String,
        feature: &FeatureRecord,
        spec_type: SpecType,
        reference: &SpecRef,
    ) -> Self {
        Self {
            severity,
            kind,
            message,
            file: feature.file_path.clone(),
            spec_key: Some(reference.key.clone()),
            spec_type: Some(spec_type),
            reference: Some(reference.clone()),
            feature_key: Some(feature.key.clone()),
        }
    }

    /// Issue about an inventory entry itself.
    pub(crate) fn for_spec(
        severity: Severity,
        kind: IssueKind,
        message: String,
        spec: &SpecLocation,
    ) -> Self {
        Self {
            severity,
            kind,
            message,
            file: spec.file_path.clone(),
            spec_key: Some(spec.key.clone()),
            spec_type: Some(spec.spec_type),
            reference: Some(SpecRef::new(spec.key.clone(), spec.version.clone())),
            feature_key: None,
        }
    }
}

/// Options for a single analysis run.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    /// Only validate references of the feature with this key.
    pub feature_key: Option<String>,
}

/// Complete result of an integrity run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrityAnalysisResult {
    pub inventory: SpecInventory,
    pub features: Vec<FeatureRecord>,
    pub coverage: BTreeMap<SpecType, CoverageByType>,
    pub issues: Vec<IntegrityIssue>,
    pub orphaned_specs: Vec<SpecLocation>,
    pub test_index: TestToTargetIndex,
    pub healthy: bool,
}

impl IntegrityAnalysisResult {
    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &IntegrityIssue> + '_ {
        self.issues.iter().filter(move |issue| issue.kind == kind)
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Error)
            .count()
    }
}

/// Whether no issue has error severity.
pub fn is_healthy(issues: &[IntegrityIssue]) -> bool {
    issues.iter().all(|issue| issue.severity != Severity::Error)
}

/// Run the full integrity analysis against a workspace.
pub fn analyze_integrity(
    workspace: &dyn Workspace,
    classifier: &dyn SpecClassifier,
    config: &IntegrityConfig,
    options: &AnalyzeOptions,
) -> Result<IntegrityAnalysisResult> {
    let scan = InventoryBuilder::new(workspace, classifier, config).scan()?;
    Ok(analyze_scanned(
        scan.inventory,
        scan.features,
        config,
        options,
        workspace.root().to_path_buf(),
    ))
}

/// Run the analysis passes over an already built inventory.
pub fn analyze_scanned(
    inventory: SpecInventory,
    features: Vec<FeatureRecord>,
    config: &IntegrityConfig,
    options: &AnalyzeOptions,
    root: PathBuf,
) -> IntegrityAnalysisResult {
    let mut issues = Vec::new();
    let selected: Vec<&FeatureRecord> = match options.feature_key.as_deref() {
        Some(key) => {
            let matched: Vec<&FeatureRecord> =
                features.iter().filter(|feature| feature.key == key).collect();
            if matched.is_empty() {
                issues.push(IntegrityIssue {
                    severity: Severity::Error,
                    kind: IssueKind::MissingFeature,
                    message: format!("Feature {key} not found"),
                    file: root,
                    spec_key: None,
                    spec_type: Some(SpecType::Feature),
                    reference: None,
                    feature_key: Some(key.to_string()),
                });
            }
            matched
        }
        None => features.iter().collect(),
    };

    let references = validate_references(&inventory, &selected);
    issues.extend(references.issues);
    let test_index = build_test_index(&inventory);
    let coverage = analyze_coverage(
        &inventory,
        &references.referenced,
        &test_index,
        &config.require_tests_for,
    );
    issues.extend(coverage.issues);

    let healthy = is_healthy(&issues);
    tracing::info!(
        issues = issues.len(),
        orphaned = coverage.orphaned_specs.len(),
        healthy,
        "integrity analysis complete"
    );
    IntegrityAnalysisResult {
        inventory,
        features,
        coverage: coverage.coverage,
        issues,
        orphaned_specs: coverage.orphaned_specs,
        test_index,
        healthy,
    }
}

#[cfg(test)]
#[path = "integrity_tests.rs"]
mod tests;

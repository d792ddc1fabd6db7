//! Orphan detection and per-type coverage.
use super::references::referenced_id;
use super::test_targets::TestToTargetIndex;
use super::{IntegrityIssue, IssueKind, Severity};
use crate::inventory::SpecInventory;
use crate::model::{SpecLocation, SpecType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Coverage counters for one spec category.
///
/// `covered + orphaned == total` always holds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CoverageByType {
    pub total: usize,
    pub covered: usize,
    pub orphaned: usize,
    pub missing_test: usize,
}

#[derive(Debug, Clone, Default)]
pub struct CoverageAnalysis {
    pub coverage: BTreeMap<SpecType, CoverageByType>,
    pub issues: Vec<IntegrityIssue>,
    pub orphaned_specs: Vec<SpecLocation>,
}

/// Compute coverage, orphans, and missing tests.
///
/// Coverage is reported for the orphan-eligible categories plus every
/// category in `require_tests`; orphan issues are only raised for the former.
pub fn analyze_coverage(
    inventory: &SpecInventory,
    referenced: &HashSet<String>,
    test_index: &TestToTargetIndex,
    require_tests: &[SpecType],
) -> CoverageAnalysis {
    let mut analysis = CoverageAnalysis::default();
    let mut categories: Vec<SpecType> = SpecType::ORPHAN_ELIGIBLE.to_vec();
    for spec_type in require_tests {
        if !categories.contains(spec_type) {
            categories.push(*spec_type);
        }
    }

    for spec_type in categories {
        let orphan_eligible = SpecType::ORPHAN_ELIGIBLE.contains(&spec_type);
        let tests_required = require_tests.contains(&spec_type);
        let mut counts = CoverageByType::default();
        for spec in inventory.of_type(spec_type) {
            counts.total += 1;
            if referenced.contains(&referenced_id(spec_type, &spec.key, &spec.version)) {
                counts.covered += 1;
            } else if orphan_eligible {
                analysis.issues.push(IntegrityIssue::for_spec(
                    Severity::Warning,
                    IssueKind::Orphaned,
                    format!(
                        "{} {}.v{} is not referenced by any feature",
                        spec_type.label(),
                        spec.key,
                        spec.version
                    ),
                    spec,
                ));
                analysis.orphaned_specs.push(spec.clone());
            }
            if tests_required && !has_test(inventory, test_index, spec) {
                counts.missing_test += 1;
                analysis.issues.push(IntegrityIssue::for_spec(
                    Severity::Warning,
                    IssueKind::MissingTest,
                    format!(
                        "{} {}.v{} has no test spec",
                        spec_type.label(),
                        spec.key,
                        spec.version
                    ),
                    spec,
                ));
            }
        }
        counts.orphaned = counts.total - counts.covered;
        analysis.coverage.insert(spec_type, counts);
    }
    analysis
}

/// A spec has a test when one targets it or `<key>.test` exists at its version.
fn has_test(
    inventory: &SpecInventory,
    test_index: &TestToTargetIndex,
    spec: &SpecLocation,
) -> bool {
    test_index.has_tests(&spec.id())
        || inventory.contains(
            SpecType::TestSpec,
            &format!("{}.test", spec.key),
            &spec.version,
        )
}

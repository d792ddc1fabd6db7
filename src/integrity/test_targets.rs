//! Bidirectional index between test specs and the specs they target.
use crate::inventory::SpecInventory;
use crate::model::spec_id;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Test-to-target index keyed by `key@version` on both sides.
///
/// Every test appears in exactly one of `test_to_target`, `orphaned_tests`, or
/// `tests_without_target`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestToTargetIndex {
    pub target_to_tests: BTreeMap<String, BTreeSet<String>>,
    pub test_to_target: BTreeMap<String, String>,
    pub orphaned_tests: Vec<String>,
    pub tests_without_target: Vec<String>,
}

impl TestToTargetIndex {
    pub fn has_tests(&self, target_id: &str) -> bool {
        self.target_to_tests
            .get(target_id)
            .is_some_and(|tests| !tests.is_empty())
    }
}

/// Build the index from the test specs in the inventory.
///
/// A target without an explicit version is looked up at the test's own version.
pub fn build_test_index(inventory: &SpecInventory) -> TestToTargetIndex {
    let mut index = TestToTargetIndex::default();
    for test in inventory.test_specs() {
        let test_id = test.id();
        let Some(target) = test.test_target.as_ref() else {
            index.tests_without_target.push(test_id);
            continue;
        };
        let version = target.version.as_deref().unwrap_or(&test.version);
        if !inventory.contains(target.target_type.spec_type(), &target.key, version) {
            tracing::debug!(
                test = %test_id,
                target = %target.key,
                version,
                "test target not found"
            );
            index.orphaned_tests.push(test_id);
            continue;
        }
        let target_id = spec_id(&target.key, version);
        index
            .target_to_tests
            .entry(target_id.clone())
            .or_default()
            .insert(test_id.clone());
        index.test_to_target.insert(test_id, target_id);
    }
    index
}

//! Feature reference validation.
use super::{IntegrityIssue, IssueKind, Severity};
use crate::inventory::SpecInventory;
use crate::model::{spec_id, FeatureRecord, SpecRef, SpecType};
use std::collections::HashSet;

/// Issues found while validating references plus the set of referenced specs.
#[derive(Debug, Clone, Default)]
pub struct ReferenceCheck {
    pub issues: Vec<IntegrityIssue>,
    /// `type:key@version` identifiers of every resolved (or required) spec.
    pub referenced: HashSet<String>,
}

/// Identifier stored in [`ReferenceCheck::referenced`].
pub fn referenced_id(spec_type: SpecType, key: &str, version: &str) -> String {
    format!("{}:{}", spec_type, spec_id(key, version))
}

/// Check every reference of every feature against the inventory.
pub fn validate_references(
    inventory: &SpecInventory,
    features: &[&FeatureRecord],
) -> ReferenceCheck {
    let mut check = ReferenceCheck::default();
    for feature in features {
        let plain = [
            (SpecType::Operation, &feature.operations),
            (SpecType::Event, &feature.events),
            (SpecType::Presentation, &feature.presentations),
            (SpecType::Experiment, &feature.experiments),
        ];
        for (spec_type, refs) in plain {
            for reference in refs.iter() {
                if !check.resolve(inventory, spec_type, reference) {
                    check.issues.push(IntegrityIssue::for_reference(
                        Severity::Error,
                        IssueKind::UnresolvedRef,
                        format!(
                            "{} {} referenced by feature {} not found",
                            spec_type.label(),
                            reference,
                            feature.key
                        ),
                        feature,
                        spec_type,
                        reference,
                    ));
                }
            }
        }

        for reference in &feature.capabilities_provided {
            if !check.resolve(inventory, SpecType::Capability, reference) {
                check.issues.push(IntegrityIssue::for_reference(
                    Severity::Warning,
                    IssueKind::UnresolvedRef,
                    format!(
                        "Capability {} provided by feature {} not found",
                        reference, feature.key
                    ),
                    feature,
                    SpecType::Capability,
                    reference,
                ));
            }
        }

        // Satisfied by some other feature's `provides`; not checked locally.
        for reference in &feature.capabilities_required {
            check.referenced.insert(referenced_id(
                SpecType::Capability,
                &reference.key,
                &reference.version,
            ));
        }

        for link in &feature.op_to_presentation_links {
            for (spec_type, reference) in [
                (SpecType::Operation, &link.op),
                (SpecType::Presentation, &link.pres),
            ] {
                if !check.resolve(inventory, spec_type, reference) {
                    check.issues.push(IntegrityIssue::for_reference(
                        Severity::Error,
                        IssueKind::BrokenLink,
                        format!(
                            "Link {} -> {} in feature {} points to missing {} {}",
                            link.op,
                            link.pres,
                            feature.key,
                            spec_type.as_str(),
                            reference
                        ),
                        feature,
                        spec_type,
                        reference,
                    ));
                }
            }
        }
    }
    tracing::debug!(
        features = features.len(),
        referenced = check.referenced.len(),
        issues = check.issues.len(),
        "reference validation complete"
    );
    check
}

impl ReferenceCheck {
    /// Record the reference when it resolves; report whether it did.
    fn resolve(
        &mut self,
        inventory: &SpecInventory,
        spec_type: SpecType,
        reference: &SpecRef,
    ) -> bool {
        if inventory.contains(spec_type, &reference.key, &reference.version) {
            self.referenced.insert(referenced_id(
                spec_type,
                &reference.key,
                &reference.version,
            ));
            true
        } else {
            false
        }
    }
}

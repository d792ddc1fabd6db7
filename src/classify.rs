//! Classification of contract documents into spec and feature records.
//!
//! The engine only depends on [`SpecClassifier`]; [`ContractClassifier`] is
//! the bundled implementation for `define<Kind>({ ... })` style documents.
use crate::document::{
    array_elements, define_blocks, identity_object, object_field, string_field, DefineBlock,
};
use crate::model::{
    FeatureRecord, OpPresentationLink, SpecRecord, SpecRef, SpecType, TestTarget, TestTargetType,
};
use std::path::Path;

/// Version assumed when a block omits one.
pub const DEFAULT_VERSION: &str = "1";

/// Turns document text into normalized records.
///
/// Implementations never fail: unknown or malformed content yields no records.
pub trait SpecClassifier {
    /// Whether `path` names a feature document.
    fn is_feature_path(&self, path: &Path) -> bool;

    /// Every spec declared in `content`, in source order.
    fn classify(&self, content: &str, path: &Path) -> Vec<SpecRecord>;

    /// The feature declared in `content`, if any.
    fn classify_feature(&self, content: &str, path: &Path) -> Option<FeatureRecord>;
}

/// Classifier for TypeScript-style contract documents.
#[derive(Debug, Clone, Default)]
pub struct ContractClassifier;

impl ContractClassifier {
    pub fn new() -> Self {
        Self
    }
}

/// Map a `define<Kind>` suffix to the spec type it declares.
pub fn spec_type_for_define(kind: &str) -> Option<SpecType> {
    let spec_type = match kind {
        "Command" | "Query" | "Operation" => SpecType::Operation,
        "Event" => SpecType::Event,
        "Presentation" => SpecType::Presentation,
        "Capability" => SpecType::Capability,
        "Workflow" => SpecType::Workflow,
        "DataView" => SpecType::DataView,
        "FormSpec" | "Form" => SpecType::Form,
        "Migration" => SpecType::Migration,
        "Experiment" => SpecType::Experiment,
        "Integration" => SpecType::Integration,
        "KnowledgeSpace" => SpecType::Knowledge,
        "Telemetry" => SpecType::Telemetry,
        "AppConfig" => SpecType::AppConfig,
        "Policy" => SpecType::Policy,
        "TestSpec" => SpecType::TestSpec,
        "Feature" => SpecType::Feature,
        _ => return None,
    };
    Some(spec_type)
}

fn record_from_block(block: &DefineBlock<'_>, path: &Path) -> Option<SpecRecord> {
    let spec_type = spec_type_for_define(block.kind)?;
    let object = block.object?;
    let identity = identity_object(object);
    let key = string_field(identity, "key").filter(|key| !key.trim().is_empty())?;
    let version = string_field(identity, "version").unwrap_or_else(|| DEFAULT_VERSION.to_string());
    let stability = string_field(identity, "stability");
    let test_target = if spec_type == SpecType::TestSpec {
        object_field(object, "target").and_then(parse_test_target)
    } else {
        None
    };
    Some(SpecRecord {
        key,
        version,
        spec_type,
        file_path: path.to_path_buf(),
        stability,
        test_target,
    })
}

/// Parse `{ type: 'operation', key: '...', version?: ... }`.
///
/// The target identity may also be nested under a field named after the type,
/// e.g. `{ type: 'operation', operation: { key, version } }`.
fn parse_test_target(value: &str) -> Option<TestTarget> {
    let target_type = TestTargetType::parse(&string_field(value, "type")?)?;
    let nested_name = match target_type {
        TestTargetType::Operation => "operation",
        TestTargetType::Workflow => "workflow",
    };
    let identity = object_field(value, nested_name)
        .filter(|nested| nested.starts_with('{'))
        .unwrap_or(value);
    let key = string_field(identity, "key")?;
    Some(TestTarget {
        target_type,
        key,
        version: string_field(identity, "version"),
    })
}

/// Parse an array of `{ key, version }` literals, skipping malformed entries.
fn parse_refs(value: Option<&str>) -> Vec<SpecRef> {
    value
        .map(array_elements)
        .unwrap_or_default()
        .into_iter()
        .filter_map(parse_ref)
        .collect()
}

fn parse_ref(literal: &str) -> Option<SpecRef> {
    let key = string_field(literal, "key")?;
    let version = string_field(literal, "version").unwrap_or_else(|| DEFAULT_VERSION.to_string());
    Some(SpecRef { key, version })
}

fn parse_links(value: Option<&str>) -> Vec<OpPresentationLink> {
    value
        .map(array_elements)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|element| {
            let op = object_field(element, "op").and_then(parse_ref)?;
            let pres = object_field(element, "pres")
                .or_else(|| object_field(element, "presentation"))
                .and_then(parse_ref)?;
            Some(OpPresentationLink { op, pres })
        })
        .collect()
}

fn feature_from_object(object: &str, path: &Path) -> Option<FeatureRecord> {
    let identity = identity_object(object);
    let key = string_field(identity, "key")?;
    let capabilities = object_field(object, "capabilities").filter(|caps| caps.starts_with('{'));
    Some(FeatureRecord {
        key,
        file_path: path.to_path_buf(),
        operations: parse_refs(object_field(object, "operations")),
        events: parse_refs(object_field(object, "events")),
        presentations: parse_refs(object_field(object, "presentations")),
        experiments: parse_refs(object_field(object, "experiments")),
        capabilities_provided: parse_refs(
            capabilities.and_then(|caps| object_field(caps, "provides")),
        ),
        capabilities_required: parse_refs(
            capabilities.and_then(|caps| object_field(caps, "requires")),
        ),
        op_to_presentation_links: parse_links(
            object_field(object, "opToPresentation")
                .or_else(|| object_field(object, "opToPresentationLinks")),
        ),
    })
}

impl SpecClassifier for ContractClassifier {
    fn is_feature_path(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.contains(".feature."))
    }

    fn classify(&self, content: &str, path: &Path) -> Vec<SpecRecord> {
        define_blocks(content)
            .iter()
            .filter_map(|block| record_from_block(block, path))
            .collect()
    }

    fn classify_feature(&self, content: &str, path: &Path) -> Option<FeatureRecord> {
        define_blocks(content)
            .iter()
            .filter(|block| block.kind == "Feature")
            .find_map(|block| block.object.and_then(|object| feature_from_object(object, path)))
    }
}

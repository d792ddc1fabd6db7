//! Shared record types for contract specs and features.
//!
//! These types are produced by the classifier and consumed by every analysis
//! pass, so they stay plain data with stable string identifiers.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Spec categories tracked by the inventory.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum SpecType {
    Operation,
    Event,
    Presentation,
    Capability,
    Workflow,
    DataView,
    Form,
    Migration,
    Experiment,
    Integration,
    Knowledge,
    Telemetry,
    AppConfig,
    Policy,
    TestSpec,
    Feature,
}

impl SpecType {
    /// Every category that lands in the inventory (features are tracked separately).
    pub const INVENTORY: [SpecType; 15] = [
        SpecType::Operation,
        SpecType::Event,
        SpecType::Presentation,
        SpecType::Capability,
        SpecType::Workflow,
        SpecType::DataView,
        SpecType::Form,
        SpecType::Migration,
        SpecType::Experiment,
        SpecType::Integration,
        SpecType::Knowledge,
        SpecType::Telemetry,
        SpecType::AppConfig,
        SpecType::Policy,
        SpecType::TestSpec,
    ];

    /// Categories whose entries must be referenced by at least one feature.
    pub const ORPHAN_ELIGIBLE: [SpecType; 4] = [
        SpecType::Operation,
        SpecType::Event,
        SpecType::Presentation,
        SpecType::Experiment,
    ];

    /// Return the stable string identifier used in JSON artifacts.
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecType::Operation => "operation",
            SpecType::Event => "event",
            SpecType::Presentation => "presentation",
            SpecType::Capability => "capability",
            SpecType::Workflow => "workflow",
            SpecType::DataView => "data-view",
            SpecType::Form => "form",
            SpecType::Migration => "migration",
            SpecType::Experiment => "experiment",
            SpecType::Integration => "integration",
            SpecType::Knowledge => "knowledge",
            SpecType::Telemetry => "telemetry",
            SpecType::AppConfig => "app-config",
            SpecType::Policy => "policy",
            SpecType::TestSpec => "test-spec",
            SpecType::Feature => "feature",
        }
    }

    /// Parse the stable identifier back into a spec type.
    pub fn parse(raw: &str) -> Option<SpecType> {
        SpecType::INVENTORY
            .iter()
            .chain(std::iter::once(&SpecType::Feature))
            .find(|kind| kind.as_str() == raw)
            .copied()
    }

    /// Human-facing label used in issue messages.
    pub fn label(&self) -> &'static str {
        match self {
            SpecType::Operation => "Operation",
            SpecType::Event => "Event",
            SpecType::Presentation => "Presentation",
            SpecType::Capability => "Capability",
            SpecType::Workflow => "Workflow",
            SpecType::DataView => "Data view",
            SpecType::Form => "Form",
            SpecType::Migration => "Migration",
            SpecType::Experiment => "Experiment",
            SpecType::Integration => "Integration",
            SpecType::Knowledge => "Knowledge space",
            SpecType::Telemetry => "Telemetry",
            SpecType::AppConfig => "App config",
            SpecType::Policy => "Policy",
            SpecType::TestSpec => "Test spec",
            SpecType::Feature => "Feature",
        }
    }
}

impl fmt::Display for SpecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Spec kinds a test may declare as its target.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TestTargetType {
    Operation,
    Workflow,
}

impl TestTargetType {
    /// Inventory category the target lives in.
    pub fn spec_type(&self) -> SpecType {
        match self {
            TestTargetType::Operation => SpecType::Operation,
            TestTargetType::Workflow => SpecType::Workflow,
        }
    }

    pub fn parse(raw: &str) -> Option<TestTargetType> {
        match raw {
            "operation" => Some(TestTargetType::Operation),
            "workflow" => Some(TestTargetType::Workflow),
            _ => None,
        }
    }
}

/// Declared target of a test spec.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct TestTarget {
    pub target_type: TestTargetType,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Normalized record emitted by a classifier for one spec block.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct SpecRecord {
    pub key: String,
    pub version: String,
    pub spec_type: SpecType,
    pub file_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_target: Option<TestTarget>,
}

/// Inventory entry; identical to the classifier record once stored.
pub type SpecLocation = SpecRecord;

impl SpecRecord {
    /// Inventory key in `key@version` form.
    pub fn id(&self) -> String {
        spec_id(&self.key, &self.version)
    }
}

/// Build the `key@version` identifier used across indexes.
pub fn spec_id(key: &str, version: &str) -> String {
    format!("{key}@{version}")
}

/// Reference from a feature to a spec.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpecRef {
    pub key: String,
    pub version: String,
}

impl SpecRef {
    pub fn new(key: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            version: version.into(),
        }
    }

    /// Inventory key in `key@version` form.
    pub fn id(&self) -> String {
        spec_id(&self.key, &self.version)
    }
}

impl fmt::Display for SpecRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.v{}", self.key, self.version)
    }
}

/// Direct operation to presentation link declared by a feature.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct OpPresentationLink {
    pub op: SpecRef,
    pub pres: SpecRef,
}

/// Grouping document that references specs by key and version.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct FeatureRecord {
    pub key: String,
    pub file_path: PathBuf,
    #[serde(default)]
    pub operations: Vec<SpecRef>,
    #[serde(default)]
    pub events: Vec<SpecRef>,
    #[serde(default)]
    pub presentations: Vec<SpecRef>,
    #[serde(default)]
    pub experiments: Vec<SpecRef>,
    #[serde(default)]
    pub capabilities_provided: Vec<SpecRef>,
    #[serde(default)]
    pub capabilities_required: Vec<SpecRef>,
    #[serde(default)]
    pub op_to_presentation_links: Vec<OpPresentationLink>,
}

//! Stub documents for specs that a feature references but nobody defined.
//!
//! Each supported type renders through one pure function; the output is a
//! valid contract document that the classifier reads back as the missing spec.
use crate::model::{SpecRef, SpecType};
use crate::util::{kebab_case, pascal_case};
use anyhow::{anyhow, Result};
use std::path::PathBuf;

const CONTRACTS_IMPORT: &str = "@contracts/lib";

/// Values substituted into a skeleton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkeletonContext {
    pub key: String,
    pub version: String,
    pub feature_key: String,
    /// Exported constant name, e.g. `BillingChargeSpec`.
    pub const_name: String,
}

impl SkeletonContext {
    pub fn new(reference: &SpecRef, feature_key: &str) -> Self {
        Self {
            key: reference.key.clone(),
            version: reference.version.clone(),
            feature_key: feature_key.to_string(),
            const_name: format!("{}Spec", pascal_case(&reference.key)),
        }
    }
}

/// Directory and file suffix used for a generated spec type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkeletonLayout {
    pub dir: &'static str,
    pub suffix: &'static str,
}

impl SkeletonLayout {
    /// `{dir}/{kebab}.{suffix}.ts` relative to the skeleton root.
    pub fn relative_path(&self, key: &str) -> PathBuf {
        PathBuf::from(self.dir).join(format!("{}.{}.ts", kebab_case(key), self.suffix))
    }
}

/// Layout for spec types that have a skeleton.
pub fn layout(spec_type: SpecType) -> Option<SkeletonLayout> {
    let (dir, suffix) = match spec_type {
        SpecType::Operation => ("operations", "operation"),
        SpecType::Event => ("events", "event"),
        SpecType::Presentation => ("presentations", "presentation"),
        SpecType::Experiment => ("experiments", "experiment"),
        SpecType::Capability => ("capabilities", "capability"),
        _ => return None,
    };
    Some(SkeletonLayout { dir, suffix })
}

/// Render the stub document for `spec_type`.
///
/// Values that cannot sit inside a plain quoted literal are rejected.
pub fn render_skeleton(spec_type: SpecType, ctx: &SkeletonContext) -> Result<String> {
    for (field, value) in [
        ("key", &ctx.key),
        ("version", &ctx.version),
        ("feature key", &ctx.feature_key),
    ] {
        if value.contains(['\'', '"', '\\', '`', '\n', '\r']) {
            return Err(anyhow!(
                "{field} {value:?} cannot be written into a skeleton literal"
            ));
        }
    }
    let body = match spec_type {
        SpecType::Operation => render_operation(ctx),
        SpecType::Event => render_event(ctx),
        SpecType::Presentation => render_presentation(ctx),
        SpecType::Experiment => render_experiment(ctx),
        SpecType::Capability => render_capability(ctx),
        other => {
            return Err(anyhow!(
                "unsupported spec type for skeleton generation: {other}"
            ))
        }
    };
    Ok(body)
}

fn meta_block(ctx: &SkeletonContext, spec_type: SpecType) -> String {
    format!(
        "  meta: {{\n    key: '{key}',\n    version: '{version}',\n    stability: 'experimental',\n    description: '{label} stub generated for feature {feature}.',\n  }},\n",
        key = ctx.key,
        version = ctx.version,
        label = spec_type.label(),
        feature = ctx.feature_key,
    )
}

fn render_operation(ctx: &SkeletonContext) -> String {
    format!(
        "import {{ defineCommand }} from '{CONTRACTS_IMPORT}';\n\nexport const {name} = defineCommand({{\n{meta}  io: {{\n    input: null,\n    output: null,\n  }},\n  policy: {{ auth: 'user' }},\n}});\n",
        name = ctx.const_name,
        meta = meta_block(ctx, SpecType::Operation),
    )
}

fn render_event(ctx: &SkeletonContext) -> String {
    format!(
        "import {{ defineEvent }} from '{CONTRACTS_IMPORT}';\n\nexport const {name} = defineEvent({{\n{meta}  payload: null,\n}});\n",
        name = ctx.const_name,
        meta = meta_block(ctx, SpecType::Event),
    )
}

fn render_presentation(ctx: &SkeletonContext) -> String {
    format!(
        "import {{ definePresentation }} from '{CONTRACTS_IMPORT}';\n\nexport const {name} = definePresentation({{\n{meta}  source: {{ type: 'component', componentKey: '{component}' }},\n  targets: ['react'],\n}});\n",
        name = ctx.const_name,
        meta = meta_block(ctx, SpecType::Presentation),
        component = pascal_case(&ctx.key),
    )
}

fn render_experiment(ctx: &SkeletonContext) -> String {
    format!(
        "import {{ defineExperiment }} from '{CONTRACTS_IMPORT}';\n\nexport const {name} = defineExperiment({{\n{meta}  variants: [\n    {{ id: 'control', weight: 50 }},\n    {{ id: 'treatment', weight: 50 }},\n  ],\n}});\n",
        name = ctx.const_name,
        meta = meta_block(ctx, SpecType::Experiment),
    )
}

fn render_capability(ctx: &SkeletonContext) -> String {
    format!(
        "import {{ defineCapability }} from '{CONTRACTS_IMPORT}';\n\nexport const {name} = defineCapability({{\n{meta}  provides: [],\n  requires: [],\n}});\n",
        name = ctx.const_name,
        meta = meta_block(ctx, SpecType::Capability),
    )
}

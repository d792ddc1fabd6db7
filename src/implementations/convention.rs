//! Paths implied by spec type and kebab-cased key.
use super::ImplementationType;
use crate::model::SpecType;
use crate::util::kebab_case;
use std::path::{Path, PathBuf};

/// An expected implementation location, relative to the workspace root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConventionPath {
    pub path: PathBuf,
    pub impl_type: ImplementationType,
}

/// Expected implementation and sibling test paths for a spec under `dir`.
///
/// Categories without a convention produce nothing.
pub fn convention_paths(spec_type: SpecType, key: &str, dir: &str) -> Vec<ConventionPath> {
    let (subdir, implementation, test, impl_type) = match spec_type {
        SpecType::Operation => (
            "handlers",
            "handler.ts",
            "handler.test.ts",
            ImplementationType::Handler,
        ),
        SpecType::Presentation => ("components", "tsx", "test.tsx", ImplementationType::Component),
        SpecType::Form => ("forms", "form.tsx", "form.test.tsx", ImplementationType::Form),
        SpecType::Event => ("events", "event.ts", "event.test.ts", ImplementationType::Event),
        _ => return Vec::new(),
    };
    let kebab = kebab_case(key);
    let base = Path::new(dir).join(subdir);
    vec![
        ConventionPath {
            path: base.join(format!("{kebab}.{implementation}")),
            impl_type,
        },
        ConventionPath {
            path: base.join(format!("{kebab}.{test}")),
            impl_type: ImplementationType::Test,
        },
    ]
}

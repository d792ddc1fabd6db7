//! Referential integrity and implementation resolution for contract specs.
//!
//! A workspace holds spec documents (operations, events, presentations, ...)
//! and feature documents that reference them by `key@version`. The library
//! builds a typed inventory of every spec, validates feature references,
//! indexes test specs against their targets, derives orphans and coverage,
//! resolves implementation files for each spec, and applies mechanical fixes
//! for dangling references.
//!
//! All file access goes through [`workspace::Workspace`] and all document
//! parsing through [`classify::SpecClassifier`], so every pass can run
//! against fixtures as easily as against a real tree.
pub mod classify;
pub mod config;
pub mod document;
pub mod fix;
pub mod implementations;
pub mod integrity;
pub mod inventory;
pub mod model;
pub mod util;
pub mod workspace;

pub use classify::{ContractClassifier, SpecClassifier};
pub use config::IntegrityConfig;
pub use implementations::discovery::{PatternScanner, SourceScanner};
pub use implementations::ImplementationResolver;
pub use integrity::{analyze_integrity, AnalyzeOptions, IntegrityAnalysisResult};
pub use inventory::{InventoryBuilder, SpecInventory};
pub use workspace::{FsWorkspace, Workspace};

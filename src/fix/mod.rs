//! Remediation of fixable integrity issues.
//!
//! Each issue moves through `detected -> strategized -> resolved` and ends up
//! applied or failed. Failures are captured in the returned [`FixResult`]; a
//! batch never stops on one bad issue. Every result carries a ledger of file
//! changes so [`revert_fix`] can undo it.
use crate::config::IntegrityConfig;
use crate::integrity::{IntegrityIssue, IssueKind};
use crate::model::{SpecRef, SpecType};
use crate::workspace::Workspace;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub mod skeleton;
mod strategies;

pub use skeleton::{render_skeleton, SkeletonContext};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum FixStrategy {
    RemoveReference,
    ImplementSkeleton,
    ImplementAi,
}

impl FixStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FixStrategy::RemoveReference => "remove-reference",
            FixStrategy::ImplementSkeleton => "implement-skeleton",
            FixStrategy::ImplementAi => "implement-ai",
        }
    }

    pub fn parse(raw: &str) -> Option<FixStrategy> {
        match raw.trim() {
            "remove-reference" => Some(FixStrategy::RemoveReference),
            "implement-skeleton" => Some(FixStrategy::ImplementSkeleton),
            "implement-ai" => Some(FixStrategy::ImplementAi),
            _ => None,
        }
    }
}

impl fmt::Display for FixStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An issue with everything a strategy needs to act on it.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct FixableIssue {
    pub issue: IntegrityIssue,
    #[serde(rename = "ref")]
    pub reference: SpecRef,
    pub spec_type: SpecType,
    pub feature_file: PathBuf,
    pub feature_key: String,
    pub available_strategies: Vec<FixStrategy>,
}

impl FixableIssue {
    /// `None` unless the issue names a reference, feature, and spec type of a
    /// fixable kind.
    pub fn from_issue(issue: &IntegrityIssue) -> Option<FixableIssue> {
        let available_strategies = match issue.kind {
            IssueKind::UnresolvedRef => vec![
                FixStrategy::RemoveReference,
                FixStrategy::ImplementSkeleton,
                FixStrategy::ImplementAi,
            ],
            IssueKind::BrokenLink => vec![
                FixStrategy::RemoveReference,
                FixStrategy::ImplementSkeleton,
            ],
            _ => return None,
        };
        Some(FixableIssue {
            reference: issue.reference.clone()?,
            feature_key: issue.feature_key.clone()?,
            spec_type: issue.spec_type?,
            feature_file: issue.file.clone(),
            issue: issue.clone(),
            available_strategies,
        })
    }
}

/// Fixable subset of `issues`, in order.
pub fn fixable_issues(issues: &[IntegrityIssue]) -> Vec<FixableIssue> {
    issues.iter().filter_map(FixableIssue::from_issue).collect()
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileAction {
    Created,
    Modified,
    Deleted,
}

impl FileAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileAction::Created => "created",
            FileAction::Modified => "modified",
            FileAction::Deleted => "deleted",
        }
    }
}

/// One ledger entry.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: PathBuf,
    pub action: FileAction,
    /// Content before the change, for modified and deleted files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_content: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct FixResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<FixStrategy>,
    pub issue: IntegrityIssue,
    pub files_changed: Vec<FileChange>,
    /// The ledger describes intended changes only.
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct BatchFixResult {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<FixResult>,
}

#[derive(Debug, Clone, Default)]
pub struct FixOptions {
    /// Force this strategy; fails when the issue does not offer it.
    pub strategy: Option<FixStrategy>,
    /// Pick `implement-ai` whenever it is offered.
    pub prefer_ai: bool,
    pub dry_run: bool,
}

/// Interactive choice between several strategies.
pub trait StrategySelector {
    fn select(&self, issue: &FixableIssue, available: &[FixStrategy]) -> Option<FixStrategy>;
}

/// Produces full spec documents for `implement-ai`.
pub trait SpecAuthor {
    fn author(&self, issue: &FixableIssue, target: &Path) -> Result<String>;
}

/// Pick the strategy for one issue.
///
/// Precedence: forced, AI preference, the only option, the selector, then the
/// first option.
pub fn resolve_strategy(
    issue: &FixableIssue,
    options: &FixOptions,
    selector: Option<&dyn StrategySelector>,
) -> Result<FixStrategy> {
    let available = &issue.available_strategies;
    if let Some(forced) = options.strategy {
        if available.contains(&forced) {
            return Ok(forced);
        }
        return Err(anyhow!(
            "strategy {forced} is not available for {} issues",
            issue.issue.kind
        ));
    }
    if options.prefer_ai && available.contains(&FixStrategy::ImplementAi) {
        return Ok(FixStrategy::ImplementAi);
    }
    let first = *available
        .first()
        .ok_or_else(|| anyhow!("no fix strategy available for {} issues", issue.issue.kind))?;
    if available.len() == 1 {
        return Ok(first);
    }
    let chosen = selector
        .and_then(|selector| selector.select(issue, available))
        .filter(|choice| available.contains(choice));
    Ok(chosen.unwrap_or(first))
}

/// Applies fix strategies against a workspace.
pub struct FixDispatcher<'a> {
    workspace: &'a dyn Workspace,
    config: &'a IntegrityConfig,
    selector: Option<&'a dyn StrategySelector>,
    author: Option<&'a dyn SpecAuthor>,
}

impl<'a> FixDispatcher<'a> {
    pub fn new(workspace: &'a dyn Workspace, config: &'a IntegrityConfig) -> Self {
        Self {
            workspace,
            config,
            selector: None,
            author: None,
        }
    }

    pub fn with_selector(mut self, selector: &'a dyn StrategySelector) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn with_author(mut self, author: &'a dyn SpecAuthor) -> Self {
        self.author = Some(author);
        self
    }

    /// Fix one issue; errors are captured in the result.
    pub fn fix(&self, issue: &FixableIssue, options: &FixOptions) -> FixResult {
        let mut result = FixResult {
            success: false,
            strategy: None,
            issue: issue.issue.clone(),
            files_changed: Vec::new(),
            dry_run: options.dry_run,
            error: None,
        };
        let applied = resolve_strategy(issue, options, self.selector).and_then(|strategy| {
            result.strategy = Some(strategy);
            self.apply(strategy, issue, options.dry_run)
        });
        match applied {
            Ok(changes) => {
                result.success = true;
                result.files_changed = changes;
            }
            Err(err) => {
                tracing::warn!(
                    reference = %issue.reference,
                    feature = %issue.feature_key,
                    error = %format!("{err:#}"),
                    "fix failed"
                );
                result.error = Some(format!("{err:#}"));
            }
        }
        result
    }

    /// Fix issues one after another; each failure stays isolated.
    pub fn batch_fix(&self, issues: &[FixableIssue], options: &FixOptions) -> BatchFixResult {
        let results: Vec<FixResult> = issues.iter().map(|issue| self.fix(issue, options)).collect();
        let succeeded = results.iter().filter(|result| result.success).count();
        tracing::info!(
            total = results.len(),
            succeeded,
            dry_run = options.dry_run,
            "batch fix complete"
        );
        BatchFixResult {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    fn apply(
        &self,
        strategy: FixStrategy,
        issue: &FixableIssue,
        dry_run: bool,
    ) -> Result<Vec<FileChange>> {
        match strategy {
            FixStrategy::RemoveReference => {
                strategies::remove_reference(self.workspace, issue, dry_run)
            }
            FixStrategy::ImplementSkeleton => {
                strategies::implement_skeleton(self.workspace, self.config, issue, dry_run)
            }
            FixStrategy::ImplementAi => {
                let author = self
                    .author
                    .ok_or_else(|| anyhow!("implement-ai needs a spec author; none configured"))?;
                let target = strategies::skeleton_target(self.workspace, self.config, issue)?;
                let content = author.author(issue, &target)?;
                strategies::write_new_spec(self.workspace, target, &content, dry_run)
            }
        }
    }
}

/// Undo a successful fix from its ledger.
///
/// Failed and dry-run results changed nothing and are left alone.
pub fn revert_fix(workspace: &dyn Workspace, result: &FixResult) -> Result<()> {
    if !result.success || result.dry_run {
        return Ok(());
    }
    for change in result.files_changed.iter().rev() {
        match change.action {
            FileAction::Created => {
                if workspace.exists(&change.path) {
                    workspace.remove(&change.path)?;
                }
            }
            FileAction::Modified | FileAction::Deleted => {
                let previous = change.previous_content.as_deref().ok_or_else(|| {
                    anyhow!("no previous content recorded for {}", change.path.display())
                })?;
                workspace.write(&change.path, previous)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "fix_tests.rs"]
mod tests;

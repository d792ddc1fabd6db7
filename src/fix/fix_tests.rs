use super::{
    fixable_issues, resolve_strategy, revert_fix, FileAction, FixDispatcher, FixOptions,
    FixStrategy, FixableIssue, SpecAuthor, StrategySelector,
};
use crate::classify::{ContractClassifier, SpecClassifier};
use crate::config::{default_config, IntegrityConfig};
use crate::integrity::{analyze_integrity, AnalyzeOptions, IntegrityIssue, IssueKind, Severity};
use crate::model::{SpecRef, SpecType};
use crate::workspace::{FsWorkspace, Workspace};
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

const FEATURE: &str = r#"import { defineFeature } from '@contracts/lib';

export const BillingFeature = defineFeature({
  meta: { key: 'billing', version: '1' },
  operations: [
    { key: 'billing.charge', version: '1' },
    { version: '1', key: 'billing.refund' },
    { key: 'billing.void', version: '1' },
  ],
  presentations: [{ key: 'billing.form', version: '1' }],
  opToPresentation: [
    { op: { key: 'billing.charge', version: '1' }, pres: { key: 'billing.summary', version: '1' } },
  ],
});
"#;

const CHARGE: &str = "export const C = defineCommand({ meta: { key: 'billing.charge', version: '1' } });\n";
const VOID: &str = "export const V = defineCommand({ meta: { key: 'billing.void', version: '1' } });\n";
const FORM: &str =
    "export const F = definePresentation({ meta: { key: 'billing.form', version: '1' } });\n";

fn write_file(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("create temp dir");
    write_file(dir.path(), "contracts/billing.feature.ts", FEATURE);
    write_file(dir.path(), "contracts/charge.command.ts", CHARGE);
    write_file(dir.path(), "contracts/void.command.ts", VOID);
    write_file(dir.path(), "contracts/form.presentation.ts", FORM);
    dir
}

fn issues(ws: &FsWorkspace, config: &IntegrityConfig) -> Vec<IntegrityIssue> {
    analyze_integrity(ws, &ContractClassifier::new(), config, &AnalyzeOptions::default())
        .expect("analyze")
        .issues
}

fn find(fixable: &[FixableIssue], kind: IssueKind, key: &str) -> FixableIssue {
    fixable
        .iter()
        .find(|issue| issue.issue.kind == kind && issue.reference.key == key)
        .cloned()
        .unwrap_or_else(|| panic!("no {kind} issue for {key}"))
}

fn forced(strategy: FixStrategy) -> FixOptions {
    FixOptions {
        strategy: Some(strategy),
        ..FixOptions::default()
    }
}

struct PickLast;

impl StrategySelector for PickLast {
    fn select(&self, _issue: &FixableIssue, available: &[FixStrategy]) -> Option<FixStrategy> {
        available.last().copied()
    }
}

struct CannedAuthor;

impl SpecAuthor for CannedAuthor {
    fn author(&self, issue: &FixableIssue, _target: &Path) -> Result<String> {
        Ok(format!(
            "export const S = defineCommand({{ meta: {{ key: '{}', version: '{}' }} }});\n",
            issue.reference.key, issue.reference.version
        ))
    }
}

#[test]
fn only_feature_reference_issues_are_fixable() {
    let dir = fixture();
    let ws = FsWorkspace::new(dir.path());
    let all = issues(&ws, &default_config());
    let fixable = fixable_issues(&all);

    let unresolved = find(&fixable, IssueKind::UnresolvedRef, "billing.refund");
    assert_eq!(unresolved.available_strategies.len(), 3);
    assert_eq!(unresolved.spec_type, SpecType::Operation);
    assert_eq!(unresolved.feature_key, "billing");
    let broken = find(&fixable, IssueKind::BrokenLink, "billing.summary");
    assert_eq!(
        broken.available_strategies,
        vec![FixStrategy::RemoveReference, FixStrategy::ImplementSkeleton]
    );
    assert_eq!(broken.spec_type, SpecType::Presentation);

    let orphan = IntegrityIssue {
        severity: Severity::Warning,
        kind: IssueKind::Orphaned,
        message: "orphan".to_string(),
        file: PathBuf::from("a.ts"),
        spec_key: Some("a".to_string()),
        spec_type: Some(SpecType::Operation),
        reference: Some(SpecRef::new("a", "1")),
        feature_key: None,
    };
    assert!(FixableIssue::from_issue(&orphan).is_none());
    let no_ref = IntegrityIssue {
        kind: IssueKind::UnresolvedRef,
        reference: None,
        feature_key: Some("billing".to_string()),
        ..orphan
    };
    assert!(FixableIssue::from_issue(&no_ref).is_none());
}

#[test]
fn strategy_precedence() {
    let dir = fixture();
    let ws = FsWorkspace::new(dir.path());
    let fixable = fixable_issues(&issues(&ws, &default_config()));
    let unresolved = find(&fixable, IssueKind::UnresolvedRef, "billing.refund");
    let broken = find(&fixable, IssueKind::BrokenLink, "billing.summary");

    let pick = |issue: &FixableIssue, options: &FixOptions, selector: Option<&dyn StrategySelector>| {
        resolve_strategy(issue, options, selector).expect("strategy")
    };
    assert_eq!(
        pick(&unresolved, &forced(FixStrategy::ImplementSkeleton), Some(&PickLast)),
        FixStrategy::ImplementSkeleton
    );
    let prefer_ai = FixOptions {
        prefer_ai: true,
        ..FixOptions::default()
    };
    assert_eq!(pick(&unresolved, &prefer_ai, None), FixStrategy::ImplementAi);
    // Not offered for broken links; falls through to the selector.
    assert_eq!(
        pick(&broken, &prefer_ai, Some(&PickLast)),
        FixStrategy::ImplementSkeleton
    );
    assert_eq!(
        pick(&unresolved, &FixOptions::default(), None),
        FixStrategy::RemoveReference
    );

    let mut single = unresolved.clone();
    single.available_strategies = vec![FixStrategy::ImplementSkeleton];
    assert_eq!(
        pick(&single, &FixOptions::default(), Some(&PickLast)),
        FixStrategy::ImplementSkeleton
    );

    let err = resolve_strategy(&broken, &forced(FixStrategy::ImplementAi), None).unwrap_err();
    assert!(err.to_string().contains("not available"));
}

#[test]
fn remove_reference_rewrites_feature_document() {
    let dir = fixture();
    let ws = FsWorkspace::new(dir.path());
    let config = default_config();
    let fixable = fixable_issues(&issues(&ws, &config));
    let refund = find(&fixable, IssueKind::UnresolvedRef, "billing.refund");

    let dispatcher = FixDispatcher::new(&ws, &config);
    let result = dispatcher.fix(&refund, &forced(FixStrategy::RemoveReference));
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.files_changed.len(), 1);
    assert_eq!(result.files_changed[0].action, FileAction::Modified);
    assert_eq!(result.files_changed[0].previous_content.as_deref(), Some(FEATURE));

    let feature_path = dir.path().join("contracts/billing.feature.ts");
    let updated = fs::read_to_string(&feature_path).expect("read feature");
    assert!(!updated.contains("billing.refund"));
    assert!(updated.contains(
        "    { key: 'billing.charge', version: '1' },\n    { key: 'billing.void', version: '1' },\n  ],"
    ));
    let feature = ContractClassifier::new()
        .classify_feature(&updated, &feature_path)
        .expect("feature still parses");
    assert_eq!(
        feature.operations,
        vec![
            SpecRef::new("billing.charge", "1"),
            SpecRef::new("billing.void", "1"),
        ]
    );

    revert_fix(&ws, &result).expect("revert");
    assert_eq!(fs::read_to_string(&feature_path).expect("read feature"), FEATURE);
}

#[test]
fn remove_reference_drops_whole_broken_link() {
    let dir = fixture();
    let ws = FsWorkspace::new(dir.path());
    let config = default_config();
    let fixable = fixable_issues(&issues(&ws, &config));
    let broken = find(&fixable, IssueKind::BrokenLink, "billing.summary");

    let result = FixDispatcher::new(&ws, &config).fix(&broken, &FixOptions::default());
    assert_eq!(result.strategy, Some(FixStrategy::RemoveReference));
    assert!(result.success, "{:?}", result.error);

    let updated = fs::read_to_string(dir.path().join("contracts/billing.feature.ts")).unwrap();
    assert!(updated.contains("opToPresentation: [\n  ],"));
    assert!(updated.contains("{ key: 'billing.charge', version: '1' },"));
}

#[test]
fn skeleton_is_written_next_to_feature_and_never_overwritten() {
    let dir = fixture();
    let ws = FsWorkspace::new(dir.path());
    let config = default_config();
    let fixable = fixable_issues(&issues(&ws, &config));
    let refund = find(&fixable, IssueKind::UnresolvedRef, "billing.refund");
    let dispatcher = FixDispatcher::new(&ws, &config);

    let result = dispatcher.fix(&refund, &forced(FixStrategy::ImplementSkeleton));
    assert!(result.success, "{:?}", result.error);
    let target = dir
        .path()
        .join("contracts/operations/billing-refund.operation.ts");
    assert_eq!(result.files_changed[0].path, target);
    assert_eq!(result.files_changed[0].action, FileAction::Created);
    let written = fs::read_to_string(&target).expect("skeleton written");
    let records = ContractClassifier::new().classify(&written, &target);
    assert_eq!(records[0].key, "billing.refund");

    let remaining = issues(&ws, &config);
    assert!(!remaining
        .iter()
        .any(|issue| issue.spec_key.as_deref() == Some("billing.refund")
            && issue.kind == IssueKind::UnresolvedRef));

    let again = dispatcher.fix(&refund, &forced(FixStrategy::ImplementSkeleton));
    assert!(!again.success);
    assert!(again.error.as_deref().unwrap_or_default().contains("refusing to overwrite"));

    revert_fix(&ws, &result).expect("revert");
    assert!(!target.exists());
}

#[test]
fn dry_run_reports_without_writing() {
    let dir = fixture();
    let ws = FsWorkspace::new(dir.path());
    let mut config = default_config();
    config.fix.skeleton_dir = Some("generated".to_string());
    let fixable = fixable_issues(&issues(&ws, &config));
    let refund = find(&fixable, IssueKind::UnresolvedRef, "billing.refund");
    let options = FixOptions {
        strategy: Some(FixStrategy::ImplementSkeleton),
        dry_run: true,
        ..FixOptions::default()
    };

    let result = FixDispatcher::new(&ws, &config).fix(&refund, &options);
    assert!(result.success);
    assert!(result.dry_run);
    let target = dir
        .path()
        .join("generated/operations/billing-refund.operation.ts");
    assert_eq!(result.files_changed[0].path, target);
    assert!(!target.exists());
    assert!(!ws.exists(Path::new("generated")));

    let removal = FixDispatcher::new(&ws, &config).fix(
        &refund,
        &FixOptions {
            strategy: Some(FixStrategy::RemoveReference),
            dry_run: true,
            ..FixOptions::default()
        },
    );
    assert!(removal.success);
    assert_eq!(
        fs::read_to_string(dir.path().join("contracts/billing.feature.ts")).unwrap(),
        FEATURE
    );
}

#[test]
fn implement_ai_requires_an_author() {
    let dir = fixture();
    let ws = FsWorkspace::new(dir.path());
    let config = default_config();
    let fixable = fixable_issues(&issues(&ws, &config));
    let refund = find(&fixable, IssueKind::UnresolvedRef, "billing.refund");
    let options = FixOptions {
        prefer_ai: true,
        ..FixOptions::default()
    };

    let result = FixDispatcher::new(&ws, &config).fix(&refund, &options);
    assert_eq!(result.strategy, Some(FixStrategy::ImplementAi));
    assert!(!result.success);
    assert!(result.error.as_deref().unwrap_or_default().contains("spec author"));

    let author = CannedAuthor;
    let result = FixDispatcher::new(&ws, &config)
        .with_author(&author)
        .fix(&refund, &options);
    assert!(result.success, "{:?}", result.error);
    let written = fs::read_to_string(&result.files_changed[0].path).expect("authored spec");
    assert!(written.contains("key: 'billing.refund'"));
}

#[test]
fn batch_isolates_failures() {
    let dir = fixture();
    let ws = FsWorkspace::new(dir.path());
    let config = default_config();
    let fixable = fixable_issues(&issues(&ws, &config));
    let refund = find(&fixable, IssueKind::UnresolvedRef, "billing.refund");
    let mut workflow = refund.clone();
    workflow.spec_type = SpecType::Workflow;
    workflow.reference = SpecRef::new("billing.flow", "1");

    let batch = FixDispatcher::new(&ws, &config).batch_fix(
        &[workflow, refund],
        &forced(FixStrategy::ImplementSkeleton),
    );
    assert_eq!((batch.total, batch.succeeded, batch.failed), (2, 1, 1));
    assert!(batch.results[0]
        .error
        .as_deref()
        .unwrap_or_default()
        .contains("unsupported spec type"));
    assert!(batch.results[1].success);
}

#[test]
fn revert_ignores_failed_results() {
    let dir = fixture();
    let ws = FsWorkspace::new(dir.path());
    let config = default_config();
    let fixable = fixable_issues(&issues(&ws, &config));
    let broken = find(&fixable, IssueKind::BrokenLink, "billing.summary");
    let failed = FixDispatcher::new(&ws, &config).fix(&broken, &forced(FixStrategy::ImplementAi));
    assert!(!failed.success);
    revert_fix(&ws, &failed).expect("noop revert");
    assert!(ws.exists(Path::new("contracts/billing.feature.ts")));
}

#[test]
fn dispatcher_consults_selector() {
    let dir = fixture();
    let ws = FsWorkspace::new(dir.path());
    let config = default_config();
    let fixable = fixable_issues(&issues(&ws, &config));
    let broken = find(&fixable, IssueKind::BrokenLink, "billing.summary");

    let result = FixDispatcher::new(&ws, &config)
        .with_selector(&PickLast)
        .fix(&broken, &FixOptions::default());
    assert_eq!(result.strategy, Some(FixStrategy::ImplementSkeleton));
    assert!(result.success, "{:?}", result.error);
    assert_eq!(
        result.files_changed[0].path,
        dir.path()
            .join("contracts/presentations/billing-summary.presentation.ts")
    );
}

#[test]
fn link_missing_both_sides_is_removed_once() {
    let dir = tempfile::tempdir().expect("create temp dir");
    write_file(
        dir.path(),
        "contracts/shop.feature.ts",
        r#"export const Shop = defineFeature({
  meta: { key: 'shop' },
  opToPresentation: [
    { op: { key: 'shop.buy', version: '1' }, pres: { key: 'shop.view', version: '1' } },
  ],
});
"#,
    );
    let ws = FsWorkspace::new(dir.path());
    let config = default_config();
    let fixable = fixable_issues(&issues(&ws, &config));
    assert_eq!(fixable.len(), 2);
    assert!(fixable
        .iter()
        .all(|issue| issue.issue.kind == IssueKind::BrokenLink));

    let batch = FixDispatcher::new(&ws, &config).batch_fix(&fixable, &FixOptions::default());
    assert_eq!((batch.total, batch.succeeded, batch.failed), (2, 2, 0));
    assert_eq!(batch.results[0].files_changed.len(), 1);
    assert!(batch.results[1].files_changed.is_empty());

    let updated = fs::read_to_string(dir.path().join("contracts/shop.feature.ts")).unwrap();
    assert!(updated.contains("opToPresentation: [\n  ],"));
    assert!(!issues(&ws, &config)
        .iter()
        .any(|issue| issue.kind == IssueKind::BrokenLink));
}

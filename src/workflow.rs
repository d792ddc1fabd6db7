use crate::cli::{CheckArgs, FixArgs, ImplsArgs, InitArgs};
use anyhow::{anyhow, Context, Result};
use contract_integrity::classify::ContractClassifier;
use contract_integrity::config::{config_path, default_config, load_or_default, write_config};
use contract_integrity::fix::{fixable_issues, BatchFixResult, FixDispatcher, FixOptions};
use contract_integrity::implementations::discovery::PatternScanner;
use contract_integrity::implementations::{
    summarize, ImplementationResolver, ImplementationSummary, SpecImplementationResult,
};
use contract_integrity::integrity::{analyze_integrity, AnalyzeOptions, IntegrityAnalysisResult};
use contract_integrity::inventory::InventoryBuilder;
use contract_integrity::util::display_path;
use contract_integrity::workspace::FsWorkspace;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

fn workspace_root(root: &Path) -> Result<PathBuf> {
    let root = fs::canonicalize(root).with_context(|| format!("resolve {}", root.display()))?;
    if !root.is_dir() {
        return Err(anyhow!("workspace root {} is not a directory", root.display()));
    }
    Ok(root)
}

pub fn run_init(args: InitArgs) -> Result<()> {
    let root = workspace_root(&args.root)?;
    let path = config_path(&root);
    if path.is_file() && !args.force {
        return Err(anyhow!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        ));
    }
    write_config(&root, &default_config())?;
    println!("wrote {}", path.display());
    Ok(())
}

/// Returns whether the workspace is healthy.
pub fn run_check(args: CheckArgs) -> Result<bool> {
    let root = workspace_root(&args.root)?;
    let config = load_or_default(&root)?;
    let workspace = FsWorkspace::new(&root);
    let options = AnalyzeOptions {
        feature_key: args.feature,
    };
    let result = analyze_integrity(&workspace, &ContractClassifier::new(), &config, &options)?;
    if args.json {
        let text = serde_json::to_string_pretty(&result).context("serialize integrity result")?;
        println!("{text}");
    } else {
        print_check(&root, &result);
    }
    Ok(result.healthy)
}

fn print_check(root: &Path, result: &IntegrityAnalysisResult) {
    for issue in &result.issues {
        println!(
            "{:<7} {:<15} {} ({})",
            issue.severity.as_str(),
            issue.kind.as_str(),
            issue.message,
            display_path(&issue.file, Some(root))
        );
    }
    if !result.issues.is_empty() {
        println!();
    }
    println!(
        "specs: {}  features: {}  issues: {} ({} errors)",
        result.inventory.len(),
        result.features.len(),
        result.issues.len(),
        result.error_count()
    );
    for (spec_type, counts) in &result.coverage {
        println!(
            "  {:<13} {}/{} referenced, {} orphaned, {} missing tests",
            spec_type.as_str(),
            counts.covered,
            counts.total,
            counts.orphaned,
            counts.missing_test
        );
    }
    println!("{}", if result.healthy { "healthy" } else { "unhealthy" });
}

#[derive(Serialize)]
struct ImplsReport {
    results: Vec<SpecImplementationResult>,
    summary: ImplementationSummary,
}

pub fn run_impls(args: ImplsArgs) -> Result<()> {
    let root = workspace_root(&args.root)?;
    let config = load_or_default(&root)?;
    let workspace = FsWorkspace::new(&root);
    let classifier = ContractClassifier::new();
    let scanner = PatternScanner::new();
    let resolver = ImplementationResolver::new(&workspace, &classifier, &scanner, &config);
    let results = match args.spec.as_deref() {
        Some(spec) => vec![resolver.resolve_implementations(spec)?],
        None => {
            let scan = InventoryBuilder::new(&workspace, &classifier, &config).scan()?;
            resolver.resolve_all_implementations(&scan.inventory)
        }
    };
    let report = ImplsReport {
        summary: summarize(&results),
        results,
    };
    if args.json {
        let text = serde_json::to_string_pretty(&report).context("serialize implementations")?;
        println!("{text}");
        return Ok(());
    }
    for result in &report.results {
        println!(
            "{:<11} {} {}@{}",
            result.status.as_str(),
            result.spec_type,
            result.spec_key,
            result.spec_version
        );
        for implementation in &result.implementations {
            println!(
                "    [{}] {:<10} {:<9} {}",
                if implementation.exists { "x" } else { " " },
                implementation.source.as_str(),
                implementation.impl_type.as_str(),
                display_path(&implementation.path, Some(&root))
            );
        }
    }
    let summary = report.summary;
    println!(
        "total: {}  implemented: {}  partial: {}  missing: {}  coverage: {}%",
        summary.total,
        summary.implemented,
        summary.partial,
        summary.missing,
        summary.coverage_percent
    );
    Ok(())
}

/// Returns whether every attempted fix succeeded.
pub fn run_fix(args: FixArgs) -> Result<bool> {
    let root = workspace_root(&args.root)?;
    let config = load_or_default(&root)?;
    let workspace = FsWorkspace::new(&root);
    let options = AnalyzeOptions {
        feature_key: args.feature,
    };
    let analysis = analyze_integrity(&workspace, &ContractClassifier::new(), &config, &options)?;
    let fixable = fixable_issues(&analysis.issues);
    let fix_options = FixOptions {
        strategy: args.strategy,
        prefer_ai: args.prefer_ai,
        dry_run: args.dry_run,
    };
    let batch = FixDispatcher::new(&workspace, &config).batch_fix(&fixable, &fix_options);
    if args.json {
        let text = serde_json::to_string_pretty(&batch).context("serialize fix results")?;
        println!("{text}");
    } else {
        print_fix(&root, &batch, args.dry_run);
    }
    Ok(batch.failed == 0)
}

fn print_fix(root: &Path, batch: &BatchFixResult, dry_run: bool) {
    if batch.total == 0 {
        println!("no fixable issues");
        return;
    }
    for result in &batch.results {
        let strategy = result.strategy.map_or("-", |strategy| strategy.as_str());
        let outcome = if result.success { "fixed" } else { "failed" };
        println!("{outcome:<6} {strategy:<18} {}", result.issue.message);
        for change in &result.files_changed {
            println!(
                "    {} {}",
                change.action.as_str(),
                display_path(&change.path, Some(root))
            );
        }
        if let Some(error) = &result.error {
            println!("    error: {error}");
        }
    }
    println!(
        "{}total: {}  succeeded: {}  failed: {}",
        if dry_run { "(dry run) " } else { "" },
        batch.total,
        batch.succeeded,
        batch.failed
    );
}

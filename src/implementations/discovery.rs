//! Workspace-wide discovery of files that reference a spec.
//!
//! Matching is delegated to a [`SourceScanner`]; [`PatternScanner`] is the
//! bundled regex-based scanner for TypeScript and JavaScript sources.
use super::{Candidate, ImplementationSource, ImplementationType};
use crate::util::pascal_case;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Trailing key segments that naming conventions often drop.
const STRIPPABLE_SUFFIXES: [&str; 8] = [
    "command",
    "query",
    "operation",
    "event",
    "presentation",
    "form",
    "spec",
    "contract",
];

/// How a source file refers to a spec.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Import,
    TypeUsage,
    HandlerWrapper,
    Assignment,
    KeyLiteral,
}

impl ReferenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceKind::Import => "import",
            ReferenceKind::TypeUsage => "type_usage",
            ReferenceKind::HandlerWrapper => "handler_wrapper",
            ReferenceKind::Assignment => "assignment",
            ReferenceKind::KeyLiteral => "key_literal",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One piece of evidence that a file references a spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeReference {
    pub kind: ReferenceKind,
    /// The literal or identifier that matched.
    pub symbol: String,
    /// 1-based line of the match.
    pub line: usize,
}

/// A source file loaded for discovery.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub content: String,
}

/// Deterministic search terms derived from a spec key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyVariants {
    pub key: String,
    /// Quoted-string forms: the key itself and its suffix-stripped form.
    pub literals: Vec<String>,
    /// Identifier forms: PascalCase joins, with and without `Spec`/`Contract`.
    pub identifiers: Vec<String>,
}

impl KeyVariants {
    pub fn for_key(key: &str) -> Self {
        let mut literals = vec![key.to_string()];
        if let Some(stripped) = strip_suffix_segment(key) {
            literals.push(stripped);
        }
        let mut identifiers = Vec::new();
        for base in &literals {
            let pascal = pascal_case(base);
            if pascal.len() < 3 {
                continue;
            }
            for candidate in [
                pascal.clone(),
                format!("{pascal}Spec"),
                format!("{pascal}Contract"),
            ] {
                if !identifiers.contains(&candidate) {
                    identifiers.push(candidate);
                }
            }
        }
        Self {
            key: key.to_string(),
            literals,
            identifiers,
        }
    }
}

/// Drop a trailing conventional segment (`.command`, `.v2`, ...) when the key
/// has more than one segment.
fn strip_suffix_segment(key: &str) -> Option<String> {
    let (head, last) = key.rsplit_once('.')?;
    if head.is_empty() {
        return None;
    }
    let lower = last.to_ascii_lowercase();
    let is_version = lower.len() > 1
        && lower.starts_with('v')
        && lower[1..].chars().all(|ch| ch.is_ascii_digit());
    (STRIPPABLE_SUFFIXES.contains(&lower.as_str()) || is_version).then(|| head.to_string())
}

/// Finds references to a spec inside one source file.
pub trait SourceScanner {
    /// At most one reference per [`ReferenceKind`], in first-match order.
    fn find_references(
        &self,
        content: &str,
        path: &Path,
        variants: &KeyVariants,
    ) -> Vec<CodeReference>;
}

struct Matchers {
    key: String,
    patterns: Vec<(ReferenceKind, Regex)>,
}

impl Matchers {
    fn build(variants: &KeyVariants) -> Self {
        let mut patterns = Vec::new();
        if !variants.identifiers.is_empty() {
            let names = variants
                .identifiers
                .iter()
                .map(|name| regex::escape(name))
                .collect::<Vec<_>>()
                .join("|");
            let sources = [
                (
                    ReferenceKind::Import,
                    format!(r#"(?:import|export)\s[^;]*?\b(?:{names})\b[^;]*?\bfrom\s*['"]"#),
                ),
                (
                    ReferenceKind::TypeUsage,
                    format!(
                        r"\b(?:typeof|satisfies|implements|extends|keyof)\s+(?:{names})\b|<\s*(?:{names})\s*[,>]"
                    ),
                ),
                (
                    ReferenceKind::HandlerWrapper,
                    format!(
                        r"\b(?:implement|createHandler|defineHandler|makeHandler|withContract|bindContract|register)\w*\s*(?:<[^>()]*>)?\s*\(\s*(?:{names})\b"
                    ),
                ),
                (
                    ReferenceKind::Assignment,
                    format!(
                        r"\b(?:spec|contract|operation|presentation|event|form)\s*[:=]\s*(?:{names})\b"
                    ),
                ),
            ];
            for (kind, source) in sources {
                match Regex::new(&source) {
                    Ok(regex) => patterns.push((kind, regex)),
                    Err(err) => tracing::debug!(%kind, error = %err, "skipping discovery pattern"),
                }
            }
        }
        let literals = variants
            .literals
            .iter()
            .map(|literal| regex::escape(literal))
            .collect::<Vec<_>>()
            .join("|");
        match Regex::new(&format!(r#"['"`](?:{literals})['"`]"#)) {
            Ok(regex) => patterns.push((ReferenceKind::KeyLiteral, regex)),
            Err(err) => tracing::debug!(error = %err, "skipping key literal pattern"),
        }
        Self {
            key: variants.key.clone(),
            patterns,
        }
    }
}

/// Regex-based [`SourceScanner`].
///
/// Compiled patterns for the most recent key are cached, since discovery scans
/// every source file for one spec before moving to the next.
#[derive(Default)]
pub struct PatternScanner {
    cache: RefCell<Option<Rc<Matchers>>>,
}

impl PatternScanner {
    pub fn new() -> Self {
        Self::default()
    }

    fn matchers(&self, variants: &KeyVariants) -> Rc<Matchers> {
        let mut cache = self.cache.borrow_mut();
        match cache.as_ref() {
            Some(matchers) if matchers.key == variants.key => Rc::clone(matchers),
            _ => {
                let built = Rc::new(Matchers::build(variants));
                *cache = Some(Rc::clone(&built));
                built
            }
        }
    }
}

impl SourceScanner for PatternScanner {
    fn find_references(
        &self,
        content: &str,
        _path: &Path,
        variants: &KeyVariants,
    ) -> Vec<CodeReference> {
        let matchers = self.matchers(variants);
        let mut references = Vec::new();
        for (kind, regex) in &matchers.patterns {
            if let Some(found) = regex.find(content) {
                references.push(CodeReference {
                    kind: *kind,
                    symbol: matched_symbol(found.as_str(), variants),
                    line: content[..found.start()].matches('\n').count() + 1,
                });
            }
        }
        references
    }
}

/// Which variant a match contains; the literal key when none stands out.
fn matched_symbol(matched: &str, variants: &KeyVariants) -> String {
    variants
        .identifiers
        .iter()
        .chain(variants.literals.iter())
        .filter(|variant| matched.contains(variant.as_str()))
        .max_by_key(|variant| variant.len())
        .cloned()
        .unwrap_or_else(|| variants.key.clone())
}

/// Candidates for every source file with at least one reference.
///
/// Candidate types are inferred from the path relative to `root`.
pub fn discover(
    scanner: &dyn SourceScanner,
    sources: &[SourceFile],
    variants: &KeyVariants,
    root: &Path,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for source in sources {
        let references = scanner.find_references(&source.content, &source.path, variants);
        if references.is_empty() {
            continue;
        }
        let kinds: BTreeSet<ReferenceKind> = references.iter().map(|r| r.kind).collect();
        let first = &references[0];
        candidates.push(Candidate {
            path: source.path.clone(),
            impl_type: ImplementationType::infer(
                source.path.strip_prefix(root).unwrap_or(&source.path),
            ),
            source: ImplementationSource::Discovered,
            description: Some(format!(
                "references {} via {} (line {})",
                first.symbol,
                kinds
                    .iter()
                    .map(ReferenceKind::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
                first.line
            )),
        });
    }
    candidates
}

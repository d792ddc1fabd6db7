//! File edits behind each fix strategy.
use super::skeleton::{layout, render_skeleton, SkeletonContext};
use super::{FileAction, FileChange, FixableIssue};
use crate::classify::DEFAULT_VERSION;
use crate::config::IntegrityConfig;
use crate::document::{
    array_elements, define_blocks, identity_object, object_field, string_field, subslice_offset,
};
use crate::integrity::IssueKind;
use crate::model::{SpecRef, SpecType};
use crate::workspace::Workspace;
use anyhow::{anyhow, Result};
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Delete the offending reference literal from the feature document.
///
/// Broken links drop the whole `{ op, pres }` entry. A link whose other side
/// was already fixed is gone, and yields an empty ledger.
pub(crate) fn remove_reference(
    workspace: &dyn Workspace,
    issue: &FixableIssue,
    dry_run: bool,
) -> Result<Vec<FileChange>> {
    let content = workspace.read(&issue.feature_file)?;
    let Some(range) = locate_reference(&content, issue) else {
        if issue.issue.kind == IssueKind::BrokenLink
            && feature_object(&content, &issue.feature_key).is_some()
        {
            tracing::debug!(
                file = %issue.feature_file.display(),
                reference = %issue.reference,
                "link already removed"
            );
            return Ok(Vec::new());
        }
        return Err(anyhow!(
            "reference {} not found in {}",
            issue.reference,
            issue.feature_file.display()
        ));
    };
    let updated = cut_element(&content, range);
    if !dry_run {
        workspace.write(&issue.feature_file, &updated)?;
    }
    tracing::debug!(
        file = %issue.feature_file.display(),
        reference = %issue.reference,
        dry_run,
        "removed reference"
    );
    Ok(vec![FileChange {
        path: issue.feature_file.clone(),
        action: FileAction::Modified,
        previous_content: Some(content),
    }])
}

/// Write a rendered skeleton for the missing spec.
pub(crate) fn implement_skeleton(
    workspace: &dyn Workspace,
    config: &IntegrityConfig,
    issue: &FixableIssue,
    dry_run: bool,
) -> Result<Vec<FileChange>> {
    let target = skeleton_target(workspace, config, issue)?;
    let ctx = SkeletonContext::new(&issue.reference, &issue.feature_key);
    let content = render_skeleton(issue.spec_type, &ctx)?;
    write_new_spec(workspace, target, &content, dry_run)
}

/// Where a generated spec for `issue` lives.
pub(crate) fn skeleton_target(
    workspace: &dyn Workspace,
    config: &IntegrityConfig,
    issue: &FixableIssue,
) -> Result<PathBuf> {
    let layout = layout(issue.spec_type).ok_or_else(|| {
        anyhow!(
            "unsupported spec type for skeleton generation: {}",
            issue.spec_type
        )
    })?;
    let base = match config.fix.skeleton_dir.as_deref() {
        Some(dir) => workspace.resolve(Path::new(dir)),
        None => workspace
            .resolve(&issue.feature_file)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| workspace.root().to_path_buf()),
    };
    Ok(base.join(layout.relative_path(&issue.reference.key)))
}

/// Create `path` with `content`; existing files are never overwritten.
pub(crate) fn write_new_spec(
    workspace: &dyn Workspace,
    path: PathBuf,
    content: &str,
    dry_run: bool,
) -> Result<Vec<FileChange>> {
    if workspace.exists(&path) {
        return Err(anyhow!(
            "{} already exists; refusing to overwrite",
            path.display()
        ));
    }
    if !dry_run {
        if let Some(parent) = path.parent() {
            if !workspace.is_dir(parent) {
                workspace.mkdir(parent)?;
            }
        }
        workspace.write(&path, content)?;
    }
    tracing::debug!(path = %path.display(), dry_run, "created spec");
    Ok(vec![FileChange {
        path,
        action: FileAction::Created,
        previous_content: None,
    }])
}

/// Object literal of the feature block named `feature_key`, else the first one.
fn feature_object<'a>(content: &'a str, feature_key: &str) -> Option<&'a str> {
    let objects: Vec<&str> = define_blocks(content)
        .into_iter()
        .filter(|block| block.kind == "Feature")
        .filter_map(|block| block.object)
        .collect();
    objects
        .iter()
        .copied()
        .find(|object| {
            string_field(identity_object(object), "key").as_deref() == Some(feature_key)
        })
        .or_else(|| objects.first().copied())
}

fn same_ref(literal: &str, reference: &SpecRef) -> bool {
    string_field(literal, "key").as_deref() == Some(reference.key.as_str())
        && string_field(literal, "version")
            .as_deref()
            .unwrap_or(DEFAULT_VERSION)
            == reference.version
}

/// Array holding references of `spec_type` in a feature object.
fn reference_list(object: &str, spec_type: SpecType) -> Option<&str> {
    match spec_type {
        SpecType::Operation => object_field(object, "operations"),
        SpecType::Event => object_field(object, "events"),
        SpecType::Presentation => object_field(object, "presentations"),
        SpecType::Experiment => object_field(object, "experiments"),
        SpecType::Capability => {
            object_field(object, "capabilities").and_then(|caps| object_field(caps, "provides"))
        }
        _ => None,
    }
}

/// Byte range of the array element to delete.
fn locate_reference(content: &str, issue: &FixableIssue) -> Option<Range<usize>> {
    let object = feature_object(content, &issue.feature_key)?;
    let element = if issue.issue.kind == IssueKind::BrokenLink {
        let sides: &[&str] = if issue.spec_type == SpecType::Operation {
            &["op"]
        } else {
            &["pres", "presentation"]
        };
        let links = object_field(object, "opToPresentation")
            .or_else(|| object_field(object, "opToPresentationLinks"))?;
        array_elements(links).into_iter().find(|link| {
            sides.iter().any(|side| {
                object_field(link, side).is_some_and(|side| same_ref(side, &issue.reference))
            })
        })?
    } else {
        let list = reference_list(object, issue.spec_type)?;
        array_elements(list)
            .into_iter()
            .find(|element| same_ref(element, &issue.reference))?
    };
    let start = subslice_offset(content, element)?;
    Some(start..start + element.len())
}

/// Remove an array element along with one adjoining separator.
fn cut_element(content: &str, range: Range<usize>) -> String {
    let mut start = range.start;
    let mut end = range.end;
    let after = &content[end..];
    let gap = after.len() - after.trim_start_matches([' ', '\t']).len();
    if after[gap..].starts_with(',') {
        end += gap + 1;
        let rest = &content[end..];
        end += rest.len() - rest.trim_start_matches([' ', '\t']).len();
    } else {
        // Last element: the separator sits before it.
        let before = content[..start].trim_end();
        if before.ends_with(',') {
            start = before.len() - 1;
        }
    }
    let mut updated = String::with_capacity(content.len());
    updated.push_str(&content[..start]);
    updated.push_str(&content[end..]);
    drop_blank_line(updated, start)
}

fn drop_blank_line(mut text: String, pos: usize) -> String {
    let line_start = text[..pos].rfind('\n').map_or(0, |idx| idx + 1);
    let Some(line_end) = text[pos..].find('\n').map(|idx| pos + idx) else {
        return text;
    };
    if text[line_start..line_end].trim().is_empty() {
        text.replace_range(line_start..=line_end, "");
    }
    text
}

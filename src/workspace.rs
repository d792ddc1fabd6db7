//! File-system access for the engine.
//!
//! Every pass reads and writes through [`Workspace`] so analyses can run
//! against a real tree or a fixture without changing the passes themselves.
use crate::util::posix_rel;
use anyhow::{anyhow, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File enumeration and I/O consumed by the engine.
pub trait Workspace {
    /// Root directory that relative paths resolve against.
    fn root(&self) -> &Path;

    /// Enumerate files matching any of `patterns` and none of `ignore`.
    ///
    /// Patterns are matched against workspace-relative, slash-separated paths.
    /// Results are absolute and sorted.
    fn glob(&self, patterns: &[String], ignore: &[String]) -> Result<Vec<PathBuf>>;

    fn read(&self, path: &Path) -> Result<String>;

    fn write(&self, path: &Path, content: &str) -> Result<()>;

    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    fn mkdir(&self, path: &Path) -> Result<()>;

    fn remove(&self, path: &Path) -> Result<()>;

    /// Resolve a possibly relative path against the workspace root.
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root().join(path)
        }
    }
}

/// [`Workspace`] backed by the local file system.
#[derive(Debug, Clone)]
pub struct FsWorkspace {
    root: PathBuf,
}

impl FsWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Workspace for FsWorkspace {
    fn root(&self) -> &Path {
        &self.root
    }

    fn glob(&self, patterns: &[String], ignore: &[String]) -> Result<Vec<PathBuf>> {
        let include_set = compile_globset(patterns)?;
        let ignore_set = compile_globset(ignore)?;
        let mut files = Vec::new();
        if !self.root.is_dir() {
            return Ok(files);
        }
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0 || !ignore_set.is_match(posix_rel(entry.path(), &self.root))
            });
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(error = %err, "skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = posix_rel(entry.path(), &self.root);
            if include_set.is_match(&rel) && !ignore_set.is_match(&rel) {
                files.push(entry.path().to_path_buf());
            }
        }
        files.sort();
        Ok(files)
    }

    fn read(&self, path: &Path) -> Result<String> {
        let path = self.resolve(path);
        fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))
    }

    fn write(&self, path: &Path, content: &str) -> Result<()> {
        let path = self.resolve(path);
        let parent = path
            .parent()
            .ok_or_else(|| anyhow!("no parent directory for {}", path.display()))?;
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .with_context(|| format!("stage write for {}", path.display()))?;
        tmp.write_all(content.as_bytes())
            .with_context(|| format!("write {}", path.display()))?;
        tmp.persist(&path)
            .map_err(|err| anyhow!("publish {}: {}", path.display(), err.error))?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.resolve(path).is_dir()
    }

    fn mkdir(&self, path: &Path) -> Result<()> {
        let path = self.resolve(path);
        fs::create_dir_all(&path).with_context(|| format!("create {}", path.display()))
    }

    fn remove(&self, path: &Path) -> Result<()> {
        let path = self.resolve(path);
        fs::remove_file(&path).with_context(|| format!("remove {}", path.display()))
    }
}

fn compile_globset(globs: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for g in globs {
        builder.add(Glob::new(g).with_context(|| format!("invalid glob: {g:?}"))?);
    }
    Ok(builder.build()?)
}

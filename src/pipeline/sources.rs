// src/pipeline/sources.rs

//! Expand `src` glob patterns into concrete files.
//!
//! Every pattern has a *base*: the literal directory prefix before the
//! first component containing a glob metacharacter (for a literal path, its
//! parent directory). Output paths keep the part of the path below the
//! base, so `build/images/**/*.png` with `dest = "dist/images"` writes
//! `build/images/icons/a.png` to `dist/images/icons/a.png`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use globset::{GlobBuilder, GlobMatcher};
use tracing::debug;

use crate::fs::FileSystem;

/// A file selected by a source pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path on the filesystem (project root joined in).
    pub path: PathBuf,
    /// Path relative to the pattern's base; this is where it lands in `dest`.
    pub relative: PathBuf,
}

fn is_glob_component(component: &str) -> bool {
    component.contains(['*', '?', '[', '{'])
}

/// Split a pattern into its literal base directory and whether it contains
/// any glob syntax at all.
pub fn glob_base(pattern: &str) -> (PathBuf, bool) {
    let components: Vec<&str> = pattern.split('/').collect();
    match components.iter().position(|c| is_glob_component(c)) {
        Some(idx) => (components[..idx].iter().collect(), true),
        None => {
            let path = Path::new(pattern);
            let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
            (base, false)
        }
    }
}

fn compile(pattern: &str) -> Result<GlobMatcher> {
    let glob = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .with_context(|| format!("invalid glob pattern: {pattern}"))?;
    Ok(glob.compile_matcher())
}

/// Recursively list every file below `dir`, sorted.
fn walk(fs: &dyn FileSystem, dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs.read_dir(dir)? {
        if fs.is_dir(&entry) {
            walk(fs, &entry, out)?;
        } else if fs.is_file(&entry) {
            out.push(entry);
        }
    }
    Ok(())
}

/// `/`-separated form of a relative path, for glob matching.
fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn relative_to(path: &Path, base: &Path, pattern: &str) -> Result<PathBuf> {
    path.strip_prefix(base)
        .map(Path::to_path_buf)
        .map_err(|_| anyhow!("source {:?} from '{pattern}' is not below base {:?}", path, base))
}

/// Resolve `patterns` (relative to `root`) into the list of files to process.
///
/// - A literal pattern naming a missing file is an error.
/// - A glob that matches nothing contributes nothing.
/// - Files are ordered by pattern, then path; duplicates are dropped.
/// - `base`, when given, overrides every pattern's own base.
pub fn collect_sources(
    fs: &dyn FileSystem,
    root: &Path,
    patterns: &[String],
    base: Option<&Path>,
) -> Result<Vec<SourceFile>> {
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut files = Vec::new();

    for pattern in patterns {
        let (pattern_base, is_glob) = glob_base(pattern);
        let base = base.map(Path::to_path_buf).unwrap_or(pattern_base.clone());

        let mut matched: Vec<(PathBuf, PathBuf)> = Vec::new();
        if is_glob {
            let matcher = compile(pattern)?;
            let walk_root = root.join(&pattern_base);
            if fs.is_dir(&walk_root) {
                let mut all = Vec::new();
                walk(fs, &walk_root, &mut all)?;
                for path in all {
                    let from_root = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
                    if matcher.is_match(slash_path(&from_root)) {
                        matched.push((path, from_root));
                    }
                }
            }
            debug!(pattern = %pattern, matched = matched.len(), "expanded glob");
        } else {
            let path = root.join(pattern);
            if !fs.is_file(&path) {
                bail!("missing source file '{pattern}' (looked at {:?})", path);
            }
            matched.push((path, PathBuf::from(pattern)));
        }

        for (path, from_root) in matched {
            if !seen.insert(path.clone()) {
                continue;
            }
            let relative = relative_to(&from_root, &base, pattern)?;
            files.push(SourceFile { path, relative });
        }
    }

    Ok(files)
}

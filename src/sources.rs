//! Marketplace source preparation.
//!
//! Before a plugin is packaged for the marketplace every first-party source file
//! has its block comments removed and the copyright notice prepended. Anything
//! below a `ThirdParty` directory is left untouched.

use crate::error::{ErrorExt, Result};
use regex::Regex;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::WalkDir;

static BLOCK_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("block comment regex is valid"));

/// Directory name whose contents are never rewritten
pub const THIRD_PARTY_DIR: &str = "ThirdParty";

/// Outcome of [`rewrite_sources`]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RewriteReport {
    /// Files rewritten in place
    pub rewritten: usize,
    /// Files left alone because they are not UTF-8 text
    pub skipped: Vec<PathBuf>,
}

/// Remove every `/* ... */` comment from `text`
pub fn strip_block_comments(text: &str) -> Cow<'_, str> {
    BLOCK_COMMENT_RE.replace_all(text, "")
}

/// Rewritten file contents: optional notice line followed by the comment-free text
pub fn rewrite_source(text: &str, notice: Option<&str>) -> String {
    let stripped = strip_block_comments(text);
    match notice {
        Some(notice) => format!("{}\n{}", notice, stripped),
        None => stripped.into_owned(),
    }
}

fn is_third_party(rel_path: &Path) -> bool {
    rel_path
        .components()
        .any(|c| c.as_os_str() == THIRD_PARTY_DIR)
}

/// Rewrite every first-party file below `source_dir` in place.
pub async fn rewrite_sources(source_dir: &Path, notice: Option<&str>) -> Result<RewriteReport> {
    let mut report = RewriteReport::default();

    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel_path = entry.path().strip_prefix(source_dir)?;
        if is_third_party(rel_path) {
            continue;
        }

        let bytes = tokio::fs::read(entry.path())
            .await
            .fs_context("reading source file", entry.path())?;
        let Ok(text) = String::from_utf8(bytes) else {
            log::warn!("skipping non-UTF-8 file {}", entry.path().display());
            report.skipped.push(entry.path().to_path_buf());
            continue;
        };

        tokio::fs::write(entry.path(), rewrite_source(&text, notice))
            .await
            .fs_context("writing source file", entry.path())?;
        report.rewritten += 1;
    }

    log::info!(
        "rewrote {} source files in {}",
        report.rewritten,
        source_dir.display()
    );
    Ok(report)
}

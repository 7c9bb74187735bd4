//! `format` command: run clang-format over the plugin sources.

use crate::cli::RuntimeConfig;
use crate::error::{Result, StagingError};
use crate::process::{self, CommandSpec};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Files below `source_dir` whose extension is in `extensions`, in sorted walk order
fn collect_sources(source_dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.iter().any(|wanted| wanted == ext));
        if matches {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Execute the format command
pub(super) async fn execute_format(config: &RuntimeConfig) -> Result<()> {
    let settings = &config.tool().format;
    let style_file = config.root().join(&settings.style_file);
    if !style_file.is_file() {
        return Err(StagingError::MissingSource { path: style_file }.into());
    }

    let source_dir = config.plugin_dir().join("Source");
    if !source_dir.is_dir() {
        return Err(StagingError::MissingSource { path: source_dir }.into());
    }

    config.section("Format sources");
    let files = tokio::task::spawn_blocking({
        let source_dir = source_dir.clone();
        let extensions = settings.extensions.clone();
        move || collect_sources(&source_dir, &extensions)
    })
    .await??;

    for file in &files {
        config.verbose_println(&format!("Formatting {}", file.display()));
        let command = CommandSpec::new(&settings.clang_format)
            .arg("-i")
            .flag_path("-style=file:", &style_file)
            .arg(file);
        process::run_checked(&command).await?;
    }

    config.info_println(&format!("Formatted {} files", files.len()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_collect_sources_filters_and_sorts() {
        let temp = TempDir::new().unwrap();
        let src = temp.path();
        std::fs::create_dir_all(src.join("B/Private")).unwrap();
        std::fs::create_dir_all(src.join("A")).unwrap();
        std::fs::write(src.join("B/Private/x.cpp"), "").unwrap();
        std::fs::write(src.join("A/y.h"), "").unwrap();
        std::fs::write(src.join("A/notes.txt"), "").unwrap();
        std::fs::write(src.join("Module.Build.cs"), "").unwrap();

        let extensions = vec!["cpp".to_string(), "h".to_string(), "cs".to_string()];
        let files = collect_sources(src, &extensions).unwrap();
        assert_eq!(
            files,
            vec![
                src.join("A/y.h"),
                src.join("B/Private/x.cpp"),
                src.join("Module.Build.cs"),
            ]
        );
    }
}

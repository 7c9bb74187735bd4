//! `test` command: run the editor automation tests headless.

use crate::cli::RuntimeConfig;
use crate::config::TestSettings;
use crate::error::{Result, StagingError};
use crate::platform::{EnginePlatform, UnrealVersion};
use crate::process;
use std::path::{Path, PathBuf};

/// First `*.uproject` directly inside `root`, by name
fn find_project(root: &Path) -> Option<PathBuf> {
    let root_str = root.to_str()?;
    let pattern = format!("{}/*.uproject", glob::Pattern::escape(root_str));
    let mut projects: Vec<PathBuf> = glob::glob(&pattern).ok()?.flatten().collect();
    projects.sort();
    projects.into_iter().next()
}

/// `--filter` when given, otherwise the configured prefix
fn resolve_filter<'a>(cli_filter: Option<&'a str>, settings: &'a TestSettings) -> &'a str {
    cli_filter.unwrap_or(&settings.filter)
}

/// Execute the test command
pub(super) async fn execute_test(
    config: &RuntimeConfig,
    platform: EnginePlatform,
    unreal: UnrealVersion,
    filter: Option<&str>,
) -> Result<()> {
    let project = find_project(config.root()).ok_or_else(|| StagingError::MissingSource {
        path: config.root().join("*.uproject"),
    })?;
    let report_dir = config.root().join("Saved").join("Automation").join("Reports");
    let filter = resolve_filter(filter, &config.tool().test);

    config.section(&format!("Automation tests ({})", filter));
    let command = platform.automation_test_command(
        &config.tool().engine,
        unreal,
        &project,
        &report_dir,
        filter,
    );
    config.progress(&format!("Running {}", command));
    process::run_checked(&command).await?;

    config.info_println(&format!("Reports written to {}", report_dir.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_filter_defaults_to_configured_prefix() {
        let settings = TestSettings::default();
        assert_eq!(resolve_filter(None, &settings), "Inworld");
        assert_eq!(resolve_filter(Some("Inworld.Audio"), &settings), "Inworld.Audio");
    }

    #[test]
    fn test_find_project_picks_first_by_name() {
        let temp = TempDir::new().unwrap();
        assert_eq!(find_project(temp.path()), None);

        std::fs::write(temp.path().join("Zeta.uproject"), "{}").unwrap();
        std::fs::write(temp.path().join("Alpha.uproject"), "{}").unwrap();
        assert_eq!(
            find_project(temp.path()),
            Some(temp.path().join("Alpha.uproject"))
        );
    }
}

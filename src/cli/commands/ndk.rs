//! `ndk` command: clean, build and vendor the native SDK.

use crate::cli::RuntimeConfig;
use crate::error::{CliError, ErrorExt, ReleaseError, Result, StagingError};
use crate::platform::NdkPlatform;
use crate::process;
use crate::staging::{self, FolderMode, fs::remove_tree};
use clap::ValueEnum;
use std::path::{Path, PathBuf};

/// Folders vendored from the SDK package into the plugin
const PACKAGE_FOLDERS: [&str; 3] = ["lib", "include", "src"];

/// Which NDK steps to run; they always run in clean, build, copy order
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct NdkActions {
    pub clean: bool,
    pub build: bool,
    pub copy: bool,
}

/// SDK locations derived from the plugin directory and config
struct NdkPaths {
    build_dir: PathBuf,
    package_dir: PathBuf,
    library_dir: PathBuf,
}

impl NdkPaths {
    fn new(config: &RuntimeConfig) -> Self {
        let plugin = config.plugin_dir();
        let ndk = &config.tool().ndk;
        let build_dir = plugin.join(&ndk.source_dir).join("build");
        Self {
            package_dir: build_dir.join("package"),
            build_dir,
            library_dir: plugin.join(&ndk.library_dir),
        }
    }
}

/// Execute the ndk command
pub(super) async fn execute_ndk(
    config: &RuntimeConfig,
    platform: Option<NdkPlatform>,
    actions: NdkActions,
) -> Result<()> {
    if !(actions.clean || actions.build || actions.copy) {
        return Err(CliError::MissingConfiguration {
            argument: "an action".to_string(),
            allowed: "--clean, --build, --copy".to_string(),
        }
        .into());
    }

    // checked up front so --clean does not run before a doomed --build
    let build_platform = match (actions.build, platform) {
        (true, None) => {
            return Err(CliError::MissingConfiguration {
                argument: "--platform".to_string(),
                allowed: platform_names(),
            }
            .into());
        }
        (true, Some(platform)) => Some(platform),
        (false, _) => None,
    };

    let paths = NdkPaths::new(config);

    if actions.clean {
        clean(config, &paths).await?;
    }
    if let Some(platform) = build_platform {
        build(config, &paths, platform).await?;
    }
    if actions.copy {
        copy(config, &paths).await?;
    }

    Ok(())
}

fn platform_names() -> String {
    NdkPlatform::value_variants()
        .iter()
        .filter_map(|p| p.to_possible_value())
        .map(|v| v.get_name().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

async fn clean(config: &RuntimeConfig, paths: &NdkPaths) -> Result<()> {
    config.section("Clean NDK");
    for folder in PACKAGE_FOLDERS {
        let dir = paths.library_dir.join(folder);
        config.progress(&format!("Removing {}", dir.display()));
        remove_tree(&dir).await?;
    }
    config.progress(&format!("Removing {}", paths.build_dir.display()));
    remove_tree(&paths.build_dir).await
}

async fn build(config: &RuntimeConfig, paths: &NdkPaths, platform: NdkPlatform) -> Result<()> {
    config.section(&format!("Build NDK ({:?})", platform));
    let steps = platform
        .build_configuration(&config.tool().ndk)
        .in_dir(&paths.build_dir);

    if !paths.build_dir.exists() {
        tokio::fs::create_dir_all(&paths.build_dir)
            .await
            .fs_context("creating directory", &paths.build_dir)?;

        config.progress("Generating build files");
        if let Err(e) = process::run_sequence(&steps.generate).await {
            config.error_println("Unable to generate NDK");
            // a half-generated tree would skip generation on the next run
            let cleanup = remove_tree(&paths.build_dir).await;
            return Err(keep_primary_error(e, &paths.build_dir, cleanup));
        }
    } else {
        config.verbose_println(&format!(
            "{} exists, skipping generation",
            paths.build_dir.display()
        ));
    }

    config.progress("Building");
    process::run_sequence(&steps.build)
        .await
        .inspect_err(|_| config.error_println("Unable to build NDK"))
}

/// Return `primary`, logging a failed cleanup of `path` instead of reporting it.
fn keep_primary_error(primary: ReleaseError, path: &Path, cleanup: Result<()>) -> ReleaseError {
    if let Err(e) = cleanup {
        log::warn!("unable to remove {}: {}", path.display(), e);
    }
    primary
}

async fn copy(config: &RuntimeConfig, paths: &NdkPaths) -> Result<()> {
    config.section("Copy NDK");
    if !paths.package_dir.is_dir() {
        return Err(StagingError::MissingSource {
            path: paths.package_dir.clone(),
        }
        .into());
    }

    let mut copied = 0;
    for folder in PACKAGE_FOLDERS {
        config.progress(&format!(
            "Copying {} into {}",
            folder,
            paths.library_dir.display()
        ));
        copied += staging::copy_folder(
            &paths.package_dir,
            &paths.library_dir,
            Path::new(folder),
            FolderMode::Overlay,
        )
        .await?;
    }
    config.info_println(&format!("Copied {} files", copied));
    Ok(())
}

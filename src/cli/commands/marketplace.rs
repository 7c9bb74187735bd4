//! `marketplace` command: package the plugin with RunUAT and zip it.

use crate::archive::{self, ArchiveFormat};
use crate::cli::RuntimeConfig;
use crate::error::Result;
use crate::manifest::{VERSION_FIELD, read_version};
use crate::platform::{EnginePlatform, UnrealVersion};
use crate::process;
use crate::sources::rewrite_sources;
use crate::staging::{self, CopySpec, FolderMode, StagingAssembler, fs::remove_tree};

/// Build output folders dropped when packaging without binaries
const BUILD_OUTPUT_FOLDERS: [&str; 2] = ["Binaries", "Intermediate"];

/// Execute the marketplace command
pub(super) async fn execute_marketplace(
    config: &RuntimeConfig,
    platform: EnginePlatform,
    unreal: UnrealVersion,
    binaries: bool,
    keep_temp: bool,
) -> Result<()> {
    let tool = config.tool();
    let product = config.product();
    let temp_root = config.root().join(&tool.marketplace.temp_dir);
    let copy_root = temp_root.join("Copy");
    let package_dir = temp_root.join(product);

    config.section(&format!("Marketplace package ({} UE {})", platform.as_str(), unreal));

    let mut layout = CopySpec::new();
    for folder in &tool.marketplace.folders {
        layout = layout.folder(folder, FolderMode::Overlay);
    }
    layout = layout.file(config.descriptor_name());

    let assembler = StagingAssembler::new(config.plugin_dir(), &copy_root);
    staging::check_destination(&config.plugin_dir(), &temp_root)?;
    assembler.check_layout(&layout)?;
    config.progress(&format!("Preparing {}", temp_root.display()));
    staging::prepare_destination(&temp_root).await?;

    assembler
        .apply(&layout, |instruction| {
            config.progress(&format!("{}", instruction));
        })
        .await?;

    let source_dir = copy_root.join("Source");
    if source_dir.is_dir() {
        config.progress("Rewriting sources");
        let report = rewrite_sources(&source_dir, tool.copyright_notice.as_deref()).await?;
        for skipped in &report.skipped {
            config.warning_println(&format!(
                "Left non-text file untouched: {}",
                skipped.display()
            ));
        }
        config.verbose_println(&format!("Rewrote {} source files", report.rewritten));
    }

    let build_plugin = platform.build_plugin_command(
        &tool.engine,
        unreal,
        &copy_root.join(config.descriptor_name()),
        &package_dir,
    );
    config.progress(&format!("Running {}", build_plugin));
    process::run_checked(&build_plugin).await?;

    if !binaries {
        for folder in BUILD_OUTPUT_FOLDERS {
            let dir = package_dir.join(folder);
            config.progress(&format!("Removing {}", dir.display()));
            remove_tree(&dir).await?;
        }
    }

    let version = read_version(&package_dir.join(config.descriptor_name()), VERSION_FIELD).await?;
    let archive_base = config
        .root()
        .join(format!("{}_{}_{}", product, version, unreal));
    let archive_path = archive::archive(&package_dir, &archive_base, ArchiveFormat::Zip).await?;
    config.success_println(&format!("Wrote {}", archive_path.display()));

    if keep_temp {
        config.verbose_println(&format!("Keeping {}", temp_root.display()));
    } else {
        remove_tree(&temp_root).await?;
    }

    Ok(())
}

//! `stage` command: assemble the release tree and optionally archive it.

use crate::archive::{self, ArchiveFormat};
use crate::cli::RuntimeConfig;
use crate::error::Result;
use crate::manifest::{VERSION_FIELD, read_version};
use crate::staging::StagingAssembler;
use std::path::Path;

/// Execute the stage command
pub(super) async fn execute_stage(
    config: &RuntimeConfig,
    archive_format: Option<ArchiveFormat>,
    output_dir: Option<&Path>,
) -> Result<()> {
    let output_dir = output_dir.unwrap_or(&config.tool().release.output_dir);
    let staging_root = config.root().join(output_dir);
    let layout = config.tool().release_layout(config.product());

    config.section("Release staging");
    let assembler = StagingAssembler::new(config.root(), &staging_root);

    assembler.check_layout(&layout)?;
    config.progress(&format!("Preparing {}", staging_root.display()));
    assembler.prepare_destination().await?;

    let files = assembler
        .apply(&layout, |instruction| {
            config.progress(&format!("{}", instruction));
        })
        .await?;
    config.info_println(&format!(
        "Staged {} files from {} instructions into {}",
        files,
        layout.len(),
        staging_root.display()
    ));

    let Some(format) = archive_format else {
        return Ok(());
    };

    let version = read_version(&config.plugin_descriptor(), VERSION_FIELD).await?;
    config.verbose_println(&format!("{} version {}", config.product(), version));

    let archive_base = config
        .root()
        .join(format!("{}-{}", config.product(), version));
    config.progress(&format!("Archiving as {}", format.extension()));
    let archive_path = archive::archive(&staging_root, &archive_base, format).await?;
    config.success_println(&format!("Wrote {}", archive_path.display()));

    Ok(())
}

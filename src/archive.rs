//! Staging tree archiving.
//!
//! Compresses a whole staging tree into a single release artifact. Entries are
//! stored relative to the staging root, so extracting the archive reproduces
//! the tree exactly.

use crate::error::{ArchiveError, Result};
use flate2::{Compression, write::GzEncoder};
use path_absolutize::Absolutize;
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tar::HeaderMode;
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

/// Supported archive formats.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, clap::ValueEnum)]
pub enum ArchiveFormat {
    /// Deflate-compressed zip archive (.zip)
    Zip,
    /// Gzip-compressed tarball (.tar.gz)
    TarGz,
}

impl ArchiveFormat {
    /// File extension without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::TarGz => "tar.gz",
        }
    }
}

/// Appends `.ext` to `path`.
///
/// `Path::with_extension` would eat version suffixes such as `Plugin_1.2_5.3`.
fn append_extension(path: &Path, extension: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Compress the tree at `staging_root` into `output_without_extension.<ext>`.
///
/// Returns the path of the written archive.
pub async fn archive(
    staging_root: &Path,
    output_without_extension: &Path,
    format: ArchiveFormat,
) -> Result<PathBuf> {
    let dest_path = append_extension(output_without_extension, format.extension());
    let fail = |reason: String| ArchiveError {
        path: dest_path.clone(),
        reason,
    };

    if !staging_root.is_dir() {
        return Err(fail(format!(
            "staging tree {} is not a directory",
            staging_root.display()
        ))
        .into());
    }

    let abs_root = staging_root
        .absolutize()
        .map_err(|e| fail(e.to_string()))?
        .into_owned();
    let abs_dest = dest_path
        .absolutize()
        .map_err(|e| fail(e.to_string()))?
        .into_owned();
    if abs_dest.starts_with(&abs_root) {
        return Err(fail("archive would be written inside the staging tree".to_string()).into());
    }

    if let Some(parent) = dest_path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| fail(e.to_string()))?;
    }

    // written under a temporary name so a failed run never leaves a
    // truncated file that looks like a finished artifact
    let partial_path = append_extension(&dest_path, "partial");
    let file = tokio::fs::File::create(&partial_path)
        .await
        .map_err(|e| fail(e.to_string()))?;
    let std_file = file.into_std().await;

    log::info!(
        "archiving {} into {}",
        staging_root.display(),
        dest_path.display()
    );

    let src_dir = abs_root.clone();
    let written = tokio::task::spawn_blocking(move || match format {
        ArchiveFormat::Zip => zip_dir(&src_dir, std_file),
        ArchiveFormat::TarGz => tar_and_gzip_dir(&src_dir, std_file),
    })
    .await;

    let outcome: Result<()> = match written {
        Ok(Ok(())) => tokio::fs::rename(&partial_path, &dest_path)
            .await
            .map_err(|e| fail(e.to_string()).into()),
        Ok(Err(e)) => Err(fail(e.to_string()).into()),
        Err(join_error) => Err(join_error.into()),
    };
    if outcome.is_err()
        && let Err(e) = tokio::fs::remove_file(&partial_path).await
        && e.kind() != io::ErrorKind::NotFound
    {
        log::warn!("unable to remove {}: {}", partial_path.display(), e);
    }
    outcome.map(|()| dest_path)
}

/// Archive entry name for a path relative to the staging root.
fn entry_name(rel_path: &Path) -> String {
    rel_path
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn zip_dir(src_dir: &Path, file: File) -> io::Result<()> {
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(src_dir).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();

        if path == src_dir {
            continue;
        }

        let rel_path = path.strip_prefix(src_dir).map_err(io::Error::other)?;
        let name = entry_name(rel_path);

        if entry.file_type().is_dir() {
            zip.add_directory(name, options).map_err(io::Error::other)?;
        } else {
            let size = entry.metadata()?.len();
            let file_options = options.large_file(size >= u64::from(u32::MAX));
            zip.start_file(name, file_options)
                .map_err(io::Error::other)?;
            let mut src = File::open(path)?;
            io::copy(&mut src, &mut zip)?;
        }
    }

    let mut finished = zip.finish().map_err(io::Error::other)?;
    finished.flush()
}

fn tar_and_gzip_dir(src_dir: &Path, file: File) -> io::Result<()> {
    let enc = GzEncoder::new(file, Compression::default());
    let mut tar = tar::Builder::new(enc);

    for entry in WalkDir::new(src_dir).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();

        if path == src_dir {
            continue;
        }

        let rel_path = path.strip_prefix(src_dir).map_err(io::Error::other)?;
        let metadata = std::fs::metadata(path)?;

        let mut header = tar::Header::new_gnu();
        header.set_metadata_in_mode(&metadata, HeaderMode::Deterministic);

        if entry.file_type().is_dir() {
            tar.append_data(&mut header, rel_path, &mut io::empty())?;
        } else {
            let mut src = File::open(path)?;
            tar.append_data(&mut header, rel_path, &mut src)?;
        }
    }

    let enc = tar.into_inner()?;
    let mut finished = enc.finish()?;
    finished.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_extension_keeps_version_dots() {
        assert_eq!(
            append_extension(Path::new("out/Plugin_1.2_5.3"), "zip"),
            PathBuf::from("out/Plugin_1.2_5.3.zip")
        );
        assert_eq!(
            append_extension(Path::new("Plugin-1.0"), ArchiveFormat::TarGz.extension()),
            PathBuf::from("Plugin-1.0.tar.gz")
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_archive_leaves_no_artifact() {
        let temp = tempfile::TempDir::new().unwrap();
        let staging_root = temp.path().join("package-release");
        std::fs::create_dir_all(&staging_root).unwrap();
        std::fs::write(staging_root.join("a.txt"), "alpha").unwrap();
        std::os::unix::fs::symlink("missing-target", staging_root.join("zz-dangling")).unwrap();

        for format in [ArchiveFormat::Zip, ArchiveFormat::TarGz] {
            let base = temp.path().join("Widget-1.0");
            let result = archive(&staging_root, &base, format).await;
            assert!(result.is_err());

            let dest = append_extension(&base, format.extension());
            assert!(!dest.exists(), "{} left behind", dest.display());
            assert!(!append_extension(&dest, "partial").exists());
        }
    }

    #[test]
    fn test_entry_name_uses_forward_slashes() {
        let rel: PathBuf = ["sub", "dir", "b.txt"].iter().collect();
        assert_eq!(entry_name(&rel), "sub/dir/b.txt");
    }

    #[tokio::test]
    async fn test_archive_inside_staging_tree_rejected() {
        let temp = tempfile::TempDir::new().unwrap();
        let err = archive(temp.path(), &temp.path().join("self"), ArchiveFormat::Zip)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("inside the staging tree"));
    }

    #[tokio::test]
    async fn test_archive_missing_staging_tree() {
        let temp = tempfile::TempDir::new().unwrap();
        let err = archive(
            &temp.path().join("absent"),
            &temp.path().join("out"),
            ArchiveFormat::Zip,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, crate::error::ReleaseError::Archive(_)));
    }
}

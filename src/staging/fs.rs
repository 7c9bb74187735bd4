//! File system primitives for staging trees.
//!
//! Provides tree removal that survives read-only entries, file and directory
//! copies with symlink preservation, and path-annotated error handling.

use crate::error::{ErrorExt, Result, StagingError};
use std::{
    fs::Permissions,
    io,
    path::{Path, PathBuf},
};
use tokio::fs;
use walkdir::WalkDir;

/// Removes the file or directory tree at `path` if it exists.
///
/// Read-only attributes are cleared on every entry first, otherwise removal
/// fails on some platforms. Symlinks are unlinked, never followed.
pub async fn remove_tree(path: &Path) -> Result<()> {
    let metadata = match fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e).fs_context("inspecting", path),
    };

    if !metadata.is_dir() {
        if metadata.is_file()
            && let Some(perms) = writable_permissions(metadata.permissions(), false)
        {
            fs::set_permissions(path, perms)
                .await
                .fs_context("clearing read-only attribute on", path)?;
        }
        return fs::remove_file(path).await.fs_context("removing file", path);
    }

    let root = path.to_path_buf();
    tokio::task::spawn_blocking(move || make_tree_writable(&root)).await??;

    log::debug!("removing tree {}", path.display());
    fs::remove_dir_all(path)
        .await
        .fs_context("removing directory", path)
}

/// Removes `path` and recreates it as an empty directory.
pub async fn prepare_dir(path: &Path) -> Result<()> {
    remove_tree(path).await?;
    fs::create_dir_all(path)
        .await
        .fs_context("creating directory", path)
}

fn make_tree_writable(path: &Path) -> Result<()> {
    let metadata = std::fs::symlink_metadata(path).fs_context("inspecting", path)?;
    if metadata.file_type().is_symlink() {
        return Ok(());
    }

    if let Some(perms) = writable_permissions(metadata.permissions(), metadata.is_dir()) {
        std::fs::set_permissions(path, perms)
            .fs_context("clearing read-only attribute on", path)?;
    }

    if metadata.is_dir() {
        for entry in std::fs::read_dir(path).fs_context("reading directory", path)? {
            let entry = entry.fs_context("reading directory", path)?;
            make_tree_writable(&entry.path())?;
        }
    }
    Ok(())
}

/// Returns the permissions an entry needs to be deletable, or `None` if it already has them.
#[cfg(unix)]
fn writable_permissions(mut perms: Permissions, is_dir: bool) -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;

    let mode = perms.mode();
    let wanted = if is_dir { mode | 0o700 } else { mode | 0o200 };
    if wanted == mode {
        return None;
    }
    perms.set_mode(wanted);
    Some(perms)
}

/// Returns the permissions an entry needs to be deletable, or `None` if it already has them.
#[cfg(not(unix))]
fn writable_permissions(mut perms: Permissions, _is_dir: bool) -> Option<Permissions> {
    if !perms.readonly() {
        return None;
    }
    #[allow(clippy::permissions_set_readonly_false)]
    perms.set_readonly(false);
    Some(perms)
}

/// Makes a symbolic link to a directory.
#[cfg(unix)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

/// Makes a symbolic link to a directory.
#[cfg(windows)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(src, dst)
}

/// Makes a symbolic link to a file.
#[cfg(unix)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

/// Makes a symbolic link to a file.
#[cfg(windows)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(src, dst)
}

/// Copies a regular file from one path to another, creating any parent
/// directories of the destination path as necessary.
///
/// Fails if the source path is a directory or doesn't exist.
pub async fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if !from.exists() {
        return Err(StagingError::MissingSource {
            path: from.to_path_buf(),
        }
        .into());
    }
    if !from.is_file() {
        return Err(StagingError::UnexpectedKind {
            path: from.to_path_buf(),
            expected: "file",
        }
        .into());
    }
    if let Some(dest_dir) = to.parent() {
        fs::create_dir_all(dest_dir)
            .await
            .fs_context("creating directory", dest_dir)?;
    }
    fs::copy(from, to).await.fs_context("copying file", from)?;
    Ok(())
}

/// Recursively copies the contents of directory `from` into `to`, creating
/// `to` and any parents as necessary.
///
/// Existing entries in `to` are kept; same-named files are overwritten.
/// Symlinks are recreated as symlinks. Returns the number of files copied.
pub async fn copy_dir(from: &Path, to: &Path) -> Result<usize> {
    if !from.exists() {
        return Err(StagingError::MissingSource {
            path: from.to_path_buf(),
        }
        .into());
    }
    if !from.is_dir() {
        return Err(StagingError::UnexpectedKind {
            path: from.to_path_buf(),
            expected: "directory",
        }
        .into());
    }
    fs::create_dir_all(to)
        .await
        .fs_context("creating directory", to)?;

    let mut copied = 0;
    for entry in WalkDir::new(from) {
        let entry = entry?;
        debug_assert!(entry.path().starts_with(from));
        let rel_path = entry.path().strip_prefix(from)?;
        let dest_path: PathBuf = to.join(rel_path);

        if entry.file_type().is_symlink() {
            let target = fs::read_link(entry.path())
                .await
                .fs_context("reading symlink", entry.path())?;
            if fs::symlink_metadata(&dest_path).await.is_ok() {
                remove_tree(&dest_path).await?;
            }
            if entry.path().is_dir() {
                symlink_dir(&target, &dest_path).fs_context("creating symlink", &dest_path)?;
            } else {
                symlink_file(&target, &dest_path).fs_context("creating symlink", &dest_path)?;
            }
        } else if entry.file_type().is_dir() {
            fs::create_dir_all(&dest_path)
                .await
                .fs_context("creating directory", &dest_path)?;
        } else {
            log::debug!("copy {} -> {}", entry.path().display(), dest_path.display());
            fs::copy(entry.path(), &dest_path)
                .await
                .fs_context("copying file", entry.path())?;
            copied += 1;
        }
    }

    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_remove_tree_missing_is_noop() {
        let temp = TempDir::new().unwrap();
        let result = remove_tree(&temp.path().join("absent")).await;
        assert!(result.is_ok(), "{:?}", result.err());
    }

    #[tokio::test]
    async fn test_remove_tree_single_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("lone.txt");
        std::fs::write(&file, "x").unwrap();
        remove_tree(&file).await.unwrap();
        assert!(!file.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_remove_tree_leaves_symlink_target() {
        let temp = TempDir::new().unwrap();
        let outside = temp.path().join("outside");
        std::fs::create_dir(&outside).unwrap();
        std::fs::write(outside.join("keep.txt"), "keep").unwrap();

        let tree = temp.path().join("tree");
        std::fs::create_dir(&tree).unwrap();
        std::os::unix::fs::symlink(&outside, tree.join("link")).unwrap();

        remove_tree(&tree).await.unwrap();
        assert!(!tree.exists());
        assert!(outside.join("keep.txt").exists());
    }

    #[tokio::test]
    async fn test_copy_file_rejects_directory() {
        let temp = TempDir::new().unwrap();
        let err = copy_file(temp.path(), &temp.path().join("out"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::ReleaseError::Staging(StagingError::UnexpectedKind {
                expected: "file",
                ..
            })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_writable_permissions_adds_owner_bits() {
        use std::os::unix::fs::PermissionsExt;

        let perms = writable_permissions(Permissions::from_mode(0o444), false).unwrap();
        assert_eq!(perms.mode() & 0o777, 0o644);

        let perms = writable_permissions(Permissions::from_mode(0o555), true).unwrap();
        assert_eq!(perms.mode() & 0o777, 0o755);

        assert!(writable_permissions(Permissions::from_mode(0o644), false).is_none());
    }
}

//! Release staging assembly.
//!
//! A [`CopySpec`] is an ordered list of copy instructions interpreted relative to a
//! source root and a destination root. [`StagingAssembler`] prepares a fresh
//! destination and applies the instructions strictly in order, stopping at the
//! first failure.
//!
//! ```no_run
//! use uplugin_release::staging::{CopySpec, FolderMode, StagingAssembler};
//!
//! # async fn run() -> uplugin_release::Result<()> {
//! let spec = CopySpec::new()
//!     .file("README.md")
//!     .create_dir("MyPlugin")
//!     .folder("MyPlugin/Source", FolderMode::CreateNew);
//!
//! let assembler = StagingAssembler::new("/repo", "/repo/package-release");
//! assembler.prepare_destination().await?;
//! assembler.apply(&spec, |instruction| println!("{instruction}")).await?;
//! # Ok(())
//! # }
//! ```

pub mod fs;

use crate::error::{ErrorExt, Result, StagingError};
use path_absolutize::Absolutize;
use serde::Deserialize;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// How a folder instruction treats an existing destination directory.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderMode {
    /// Merge into the destination, keeping unrelated files already there.
    #[default]
    Overlay,
    /// The destination must not exist yet; it is created and then filled.
    CreateNew,
}

/// A single staging instruction.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CopyInstruction {
    /// Copy one file.
    File {
        /// Path relative to both roots
        path: PathBuf,
    },
    /// Copy a directory tree.
    Folder {
        /// Path relative to both roots
        path: PathBuf,
        /// Behaviour when the destination already exists
        #[serde(default)]
        mode: FolderMode,
    },
    /// Create an empty directory in the destination if absent.
    CreateDir {
        /// Path relative to the destination root
        path: PathBuf,
    },
}

impl CopyInstruction {
    /// The relative path this instruction operates on.
    pub fn path(&self) -> &Path {
        match self {
            CopyInstruction::File { path }
            | CopyInstruction::Folder { path, .. }
            | CopyInstruction::CreateDir { path } => path,
        }
    }
}

impl fmt::Display for CopyInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CopyInstruction::File { path } => write!(f, "copy file {}", path.display()),
            CopyInstruction::Folder { path, .. } => write!(f, "copy folder {}", path.display()),
            CopyInstruction::CreateDir { path } => {
                write!(f, "create directory {}", path.display())
            }
        }
    }
}

/// Ordered list of staging instructions defining one packaging run.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct CopySpec {
    instructions: Vec<CopyInstruction>,
}

impl CopySpec {
    /// Create an empty spec
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a file instruction
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.instructions
            .push(CopyInstruction::File { path: path.into() });
        self
    }

    /// Append a folder instruction
    pub fn folder(mut self, path: impl Into<PathBuf>, mode: FolderMode) -> Self {
        self.instructions.push(CopyInstruction::Folder {
            path: path.into(),
            mode,
        });
        self
    }

    /// Append a directory creation instruction
    pub fn create_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.instructions
            .push(CopyInstruction::CreateDir { path: path.into() });
        self
    }

    /// Instructions in execution order
    pub fn instructions(&self) -> &[CopyInstruction] {
        &self.instructions
    }

    /// Number of instructions
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Whether the spec has no instructions
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl From<Vec<CopyInstruction>> for CopySpec {
    fn from(instructions: Vec<CopyInstruction>) -> Self {
        Self { instructions }
    }
}

/// Rejects paths that are absolute, climb out of their root or name the root itself.
fn validate_relative(path: &Path) -> Result<&Path> {
    let escapes = !path
        .components()
        .any(|c| matches!(c, Component::Normal(_)))
        || path.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
    if escapes {
        return Err(StagingError::InvalidRelativePath {
            path: path.to_path_buf(),
        }
        .into());
    }
    Ok(path)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    Ok(path
        .absolutize()
        .fs_context("resolving path", path)?
        .into_owned())
}

/// Fails when clearing `destination` would delete `source` or one of its parents.
///
/// Paths are compared lexically after absolutizing; symlinks are not resolved.
pub fn check_destination(source: &Path, destination: &Path) -> Result<()> {
    let source_path = absolute(source)?;
    let destination = absolute(destination)?;
    if source_path.starts_with(&destination) {
        return Err(StagingError::DestinationOverlapsSource {
            destination,
            source_path,
        }
        .into());
    }
    Ok(())
}

/// Empty `root`, recreating it as a writable directory.
///
/// Existing contents are removed even when marked read-only.
pub async fn prepare_destination(root: &Path) -> Result<()> {
    log::info!("preparing staging tree {}", root.display());
    fs::prepare_dir(root).await
}

/// Copy `src_root/relative_path` to `dst_root/relative_path`.
pub async fn copy_file(src_root: &Path, dst_root: &Path, relative_path: &Path) -> Result<()> {
    let relative_path = validate_relative(relative_path)?;
    fs::copy_file(&src_root.join(relative_path), &dst_root.join(relative_path)).await
}

/// Recursively copy `src_root/relative_path` into `dst_root/relative_path`.
///
/// Returns the number of files copied.
pub async fn copy_folder(
    src_root: &Path,
    dst_root: &Path,
    relative_path: &Path,
    mode: FolderMode,
) -> Result<usize> {
    let relative_path = validate_relative(relative_path)?;
    let from = src_root.join(relative_path);
    let to = dst_root.join(relative_path);

    if !from.exists() {
        return Err(StagingError::MissingSource { path: from }.into());
    }

    if mode == FolderMode::CreateNew {
        if tokio::fs::symlink_metadata(&to).await.is_ok() {
            return Err(StagingError::DestinationExists { path: to }.into());
        }
        if let Some(parent) = to.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .fs_context("creating directory", parent)?;
        }
        tokio::fs::create_dir(&to)
            .await
            .fs_context("creating directory", &to)?;
    }

    fs::copy_dir(&from, &to).await
}

/// Create `dst_root/relative_path` if it does not exist yet.
pub async fn create_dir(dst_root: &Path, relative_path: &Path) -> Result<()> {
    let relative_path = validate_relative(relative_path)?;
    let dir = dst_root.join(relative_path);
    tokio::fs::create_dir_all(&dir)
        .await
        .fs_context("creating directory", &dir)
}

/// Applies copy instructions from a source root to a destination root.
#[derive(Debug, Clone)]
pub struct StagingAssembler {
    source_root: PathBuf,
    destination_root: PathBuf,
}

impl StagingAssembler {
    /// Create an assembler for the given roots
    pub fn new(source_root: impl Into<PathBuf>, destination_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            destination_root: destination_root.into(),
        }
    }

    /// Source root
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Destination root
    pub fn destination_root(&self) -> &Path {
        &self.destination_root
    }

    /// Empty and recreate the destination root.
    ///
    /// Refuses a destination that is the source root or one of its parents.
    pub async fn prepare_destination(&self) -> Result<()> {
        check_destination(&self.source_root, &self.destination_root)?;
        prepare_destination(&self.destination_root).await
    }

    /// Check that no copied path overlaps the destination root.
    ///
    /// A source inside the destination would be deleted by
    /// [`prepare_destination`](Self::prepare_destination); a destination inside
    /// a copied folder would be copied into itself.
    pub fn check_layout(&self, spec: &CopySpec) -> Result<()> {
        check_destination(&self.source_root, &self.destination_root)?;
        let destination = absolute(&self.destination_root)?;

        for instruction in spec.instructions() {
            if matches!(instruction, CopyInstruction::CreateDir { .. }) {
                continue;
            }
            let relative_path = validate_relative(instruction.path())?;
            let source_path = absolute(&self.source_root.join(relative_path))?;
            if source_path.starts_with(&destination) || destination.starts_with(&source_path) {
                return Err(StagingError::DestinationOverlapsSource {
                    destination,
                    source_path,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Run one instruction, returning the number of files it copied
    pub async fn apply_instruction(&self, instruction: &CopyInstruction) -> Result<usize> {
        match instruction {
            CopyInstruction::File { path } => {
                copy_file(&self.source_root, &self.destination_root, path).await?;
                Ok(1)
            }
            CopyInstruction::Folder { path, mode } => {
                copy_folder(&self.source_root, &self.destination_root, path, *mode).await
            }
            CopyInstruction::CreateDir { path } => {
                create_dir(&self.destination_root, path).await?;
                Ok(0)
            }
        }
    }

    /// Run every instruction in order, reporting each to `observer` before it runs.
    ///
    /// Stops at the first failure. Returns the total number of files copied.
    pub async fn apply<F>(&self, spec: &CopySpec, mut observer: F) -> Result<usize>
    where
        F: FnMut(&CopyInstruction),
    {
        self.check_layout(spec)?;
        let mut copied = 0;
        for instruction in spec.instructions() {
            observer(instruction);
            copied += self.apply_instruction(instruction).await?;
        }
        log::info!(
            "staged {} files into {}",
            copied,
            self.destination_root.display()
        );
        Ok(copied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReleaseError;

    #[test]
    fn test_validate_relative() {
        assert!(validate_relative(Path::new("Plugin/Source")).is_ok());
        assert!(validate_relative(Path::new("./README.md")).is_ok());
        assert!(validate_relative(Path::new("../outside")).is_err());
        assert!(validate_relative(Path::new("a/../../b")).is_err());
        assert!(validate_relative(Path::new("")).is_err());
        assert!(validate_relative(Path::new(".")).is_err());
        assert!(validate_relative(Path::new("./.")).is_err());
        #[cfg(unix)]
        assert!(validate_relative(Path::new("/etc/passwd")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_check_destination_refuses_source_and_parents() {
        let root = Path::new("/repo");
        assert!(check_destination(root, Path::new("/repo/package-release")).is_ok());
        assert!(check_destination(root, Path::new("/repo")).is_err());
        assert!(check_destination(root, Path::new("/repo/.")).is_err());
        assert!(check_destination(root, Path::new("/repo/Plugin/..")).is_err());
        assert!(check_destination(root, Path::new("/")).is_err());
        assert!(check_destination(root, Path::new("/elsewhere")).is_ok());
    }

    #[test]
    fn test_check_layout_refuses_overlapping_folders() {
        let assembler = StagingAssembler::new("/repo", "/repo/package-release");
        let fine = CopySpec::new()
            .file("README.md")
            .create_dir("Plugin")
            .folder("Plugin/Source", FolderMode::CreateNew);
        assert!(assembler.check_layout(&fine).is_ok());

        let err = assembler
            .check_layout(&CopySpec::new().folder("package-release/old", FolderMode::Overlay))
            .unwrap_err();
        assert!(matches!(
            err,
            ReleaseError::Staging(StagingError::DestinationOverlapsSource { .. })
        ));

        let nested = StagingAssembler::new("/repo", "/repo/Plugin/Content/out");
        assert!(
            nested
                .check_layout(&CopySpec::new().folder("Plugin/Content", FolderMode::Overlay))
                .is_err()
        );
    }

    #[test]
    fn test_instruction_display() {
        let spec = CopySpec::new()
            .file("README.md")
            .folder("Plugin/Content", FolderMode::CreateNew)
            .create_dir("Plugin");
        let lines: Vec<String> = spec.instructions().iter().map(|i| i.to_string()).collect();
        assert_eq!(
            lines,
            vec![
                "copy file README.md",
                "copy folder Plugin/Content",
                "create directory Plugin"
            ]
        );
    }

    #[test]
    fn test_spec_from_toml() {
        #[derive(Deserialize)]
        struct Layout {
            copy: CopySpec,
        }

        let layout: Layout = toml::from_str(
            r#"
            [[copy]]
            kind = "file"
            path = "LICENSE.md"

            [[copy]]
            kind = "folder"
            path = "Plugin/Config"
            mode = "create_new"

            [[copy]]
            kind = "folder"
            path = "Plugin/Extras"
            "#,
        )
        .unwrap();

        assert_eq!(
            layout.copy,
            CopySpec::new()
                .file("LICENSE.md")
                .folder("Plugin/Config", FolderMode::CreateNew)
                .folder("Plugin/Extras", FolderMode::Overlay)
        );
    }
}

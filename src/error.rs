//! Error types for uplugin_release operations.
//!
//! This module defines all error types with actionable error messages and recovery suggestions.
//! Every workflow is fail-fast: the first error aborts the run and is reported once by the CLI.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for uplugin_release operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Main error type for all uplugin_release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// Staging tree errors
    #[error("Staging error: {0}")]
    Staging(#[from] StagingError),

    /// External process errors
    #[error("Command error: {0}")]
    Process(#[from] ProcessError),

    /// Plugin descriptor errors
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Archive creation errors
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Tool configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// File system error with path context.
    ///
    /// Created by the [`ErrorExt`] trait's `fs_context` method.
    #[error("{context} {path}: {error}")]
    Fs {
        /// Context describing the operation (e.g., "reading config file")
        context: &'static str,
        /// Path that was being accessed
        path: PathBuf,
        /// The underlying I/O error
        error: io::Error,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error walking a directory tree
    #[error("{0}")]
    Walkdir(#[from] walkdir::Error),

    /// Path prefix stripping error
    #[error("{0}")]
    StripPrefix(#[from] std::path::StripPrefixError),

    /// Blocking task failed to complete
    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Unknown flag or malformed command line
    #[error("Unknown argument: {reason}")]
    UnknownArgument {
        /// Reason for the error
        reason: String,
    },

    /// Required flag absent or value not in the allowed set
    #[error("Missing configuration: {argument} (expected one of: {allowed})")]
    MissingConfiguration {
        /// Argument name
        argument: String,
        /// Values the argument accepts
        allowed: String,
    },
}

/// Staging tree errors
#[derive(Error, Debug)]
pub enum StagingError {
    /// Expected file or directory absent before copy
    #[error("Missing source: {path}")]
    MissingSource {
        /// Path that was expected to exist
        path: PathBuf,
    },

    /// Create-then-copy target is already present
    #[error("Destination already exists: {path}")]
    DestinationExists {
        /// Destination directory
        path: PathBuf,
    },

    /// Clearing or filling the destination would touch the source tree
    #[error("Destination {destination} overlaps source {source_path}")]
    DestinationOverlapsSource {
        /// Destination directory
        destination: PathBuf,
        /// Source path it overlaps
        source_path: PathBuf,
    },

    /// Source exists but is the wrong kind of entry
    #[error("{path} is not a {expected}")]
    UnexpectedKind {
        /// Offending path
        path: PathBuf,
        /// "file" or "directory"
        expected: &'static str,
    },

    /// Instruction path escapes its root
    #[error("Invalid relative path '{path}': must be relative and must not contain '..'")]
    InvalidRelativePath {
        /// Path as written in the instruction
        path: PathBuf,
    },
}

/// External process errors
#[derive(Error, Debug)]
pub enum ProcessError {
    /// External process returned non-zero
    #[error("failed to run {command} (exit code {code})")]
    CommandFailed {
        /// Rendered command line
        command: String,
        /// Exit code, -1 when terminated by a signal
        code: i32,
    },

    /// Program could not be located
    #[error("'{program}' not found: {reason}")]
    ToolNotFound {
        /// Program name or path
        program: String,
        /// Lookup failure
        reason: String,
    },

    /// Process could not be started
    #[error("failed to start {command}: {error}")]
    SpawnFailed {
        /// Rendered command line
        command: String,
        /// The underlying error
        error: io::Error,
    },
}

/// Plugin descriptor errors
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Manifest unreadable, unparseable or field missing
    #[error("Malformed manifest {path}: {reason}")]
    Malformed {
        /// Manifest path
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },
}

/// Archive creation errors
#[derive(Error, Debug)]
#[error("Failed to write archive {path}: {reason}")]
pub struct ArchiveError {
    /// Archive path
    pub path: PathBuf,
    /// Reason for the error
    pub reason: String,
}

/// Tool configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read {path}: {error}")]
    Read {
        /// Config file path
        path: PathBuf,
        /// The underlying error
        error: io::Error,
    },

    /// Config file is not valid TOML for the expected schema
    #[error("Failed to parse {path}: {error}")]
    Parse {
        /// Config file path
        path: PathBuf,
        /// The underlying error
        error: toml::de::Error,
    },
}

impl ReleaseError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            ReleaseError::Cli(CliError::MissingConfiguration { argument, allowed }) => vec![
                format!("Pass {} with one of: {}", argument, allowed),
                "Run with --help to see all options".to_string(),
            ],
            ReleaseError::Cli(CliError::UnknownArgument { .. }) => {
                vec!["Run with --help to see all options".to_string()]
            }
            ReleaseError::Staging(StagingError::MissingSource { path }) => vec![
                format!("Check that {} exists", path.display()),
                "Use --root to point at the plugin repository".to_string(),
            ],
            ReleaseError::Staging(StagingError::DestinationExists { path }) => vec![
                format!(
                    "{} is listed twice or nested inside another folder instruction",
                    path.display()
                ),
                "Review the release layout in uplugin-release.toml".to_string(),
            ],
            ReleaseError::Staging(StagingError::DestinationOverlapsSource { .. }) => vec![
                "Pick an output or temp directory below the repository root that is not copied from"
                    .to_string(),
            ],
            ReleaseError::Process(ProcessError::ToolNotFound { program, .. }) => vec![
                format!("Install {} or add it to PATH", program),
                "Set the engine roots in uplugin-release.toml if the engine lives elsewhere"
                    .to_string(),
            ],
            ReleaseError::Manifest(ManifestError::Malformed { path, .. }) => vec![format!(
                "Ensure {} is valid JSON with a \"VersionName\" string",
                path.display()
            )],
            ReleaseError::Config(_) => {
                vec!["Fix the config file or pass --config with another file".to_string()]
            }
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }

    /// Whether this error came from bad command line input
    pub fn is_usage_error(&self) -> bool {
        matches!(self, ReleaseError::Cli(_))
    }
}

/// Extension trait for filesystem operations with automatic path context.
///
/// Wraps I/O errors with the path that caused them for better diagnostics.
pub trait ErrorExt<T> {
    /// Add filesystem context to an I/O error.
    ///
    /// The `context` should be a present-tense verb phrase describing the operation,
    /// e.g., "reading file", "creating directory", "copying file".
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, io::Error> {
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|error| ReleaseError::Fs {
            context,
            path: path.into(),
            error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_context_keeps_path() {
        let result: std::result::Result<(), io::Error> =
            Err(io::Error::new(io::ErrorKind::NotFound, "gone"));
        let err = result.fs_context("reading file", "/tmp/x").unwrap_err();
        assert_eq!(err.to_string(), "reading file /tmp/x: gone");
    }

    #[test]
    fn test_usage_errors() {
        let err = ReleaseError::Cli(CliError::MissingConfiguration {
            argument: "--platform".to_string(),
            allowed: "Win64, Mac".to_string(),
        });
        assert!(err.is_usage_error());
        assert!(err.recovery_suggestions()[0].contains("--platform"));

        let err = ReleaseError::Process(ProcessError::CommandFailed {
            command: "cmake ..".to_string(),
            code: 1,
        });
        assert!(!err.is_usage_error());
        assert!(err.to_string().contains("cmake .."));
    }
}

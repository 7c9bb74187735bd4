//! # uplugin_release
//!
//! Release tooling for Unreal Engine plugin repositories.
//!
//! The core is the release staging assembler: it empties a staging directory
//! and fills it from the plugin checkout through an ordered list of copy
//! instructions. Around it sit the workflows a plugin release needs:
//!
//! - **Stage**: assemble `package-release/` and optionally archive it as
//!   `<product>-<version>.zip` or `.tar.gz`
//! - **NDK**: clean, build (CMake) and vendor the native SDK
//! - **Marketplace**: prepare sources, package with RunUAT and zip
//! - **Format** and **Test**: clang-format and headless automation runs
//!
//! ## Usage
//!
//! ```bash
//! uplugin_release stage --archive zip
//! uplugin_release ndk -p Mac --clean --build --copy
//! uplugin_release marketplace -p Win64 -u 5.3 --binaries false
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod manifest;
pub mod platform;
pub mod process;
pub mod sources;
pub mod staging;

pub use archive::{ArchiveFormat, archive};
pub use cli::Args;
pub use config::ToolConfig;
pub use error::{CliError, ReleaseError, Result};
pub use manifest::read_version;
pub use platform::{BuildConfiguration, EnginePlatform, NdkPlatform, UnrealVersion};
pub use process::CommandSpec;
pub use staging::{CopyInstruction, CopySpec, FolderMode, StagingAssembler};

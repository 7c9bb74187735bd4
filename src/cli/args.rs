//! Command line argument parsing and runtime configuration.
//!
//! Platform and engine version values are parsed straight into enums, so an
//! unknown name is rejected by the parser together with the usage text.

use crate::archive::ArchiveFormat;
use crate::config::ToolConfig;
use crate::error::Result;
use crate::platform::{EnginePlatform, NdkPlatform, UnrealVersion};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, Subcommand};
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};

/// Release tooling for Unreal Engine plugin repositories
#[derive(Parser, Debug)]
#[command(
    name = "uplugin_release",
    version,
    about = "Release tooling for Unreal Engine plugin repositories",
    long_about = "Stage and archive plugin releases, build the native SDK, package for the
marketplace, format sources and run automation tests.

Usage:
  uplugin_release stage --archive zip
  uplugin_release ndk -p Mac --clean --build --copy
  uplugin_release marketplace -p Win64 -u 5.3 --binaries false
  uplugin_release format
  uplugin_release test -p Win64 -u 5.4"
)]
pub struct Args {
    /// Plugin repository root (defaults to the current directory)
    #[arg(long, global = true, env = "UPLUGIN_RELEASE_ROOT", value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Configuration file (defaults to <root>/uplugin-release.toml)
    #[arg(long, global = true, env = "UPLUGIN_RELEASE_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// More output (-v for verbose, -vv for debug logging)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Workflow to run
    #[command(subcommand)]
    pub command: Command,
}

/// Release workflows
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Assemble the release staging tree and optionally archive it
    Stage {
        /// Archive the staged tree as <product>-<version>.<ext>
        #[arg(short, long, value_enum, value_name = "FORMAT")]
        archive: Option<ArchiveFormat>,

        /// Staging directory, relative to the root (overrides the config)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Clean, build and vendor the native SDK
    Ndk {
        /// Build platform
        #[arg(short, long, value_enum, ignore_case = true)]
        platform: Option<NdkPlatform>,

        /// Delete the SDK build tree and the vendored library folders
        #[arg(short, long)]
        clean: bool,

        /// Generate (first time) and build the SDK
        #[arg(short, long)]
        build: bool,

        /// Copy the built package into the plugin
        #[arg(short = 'x', long)]
        copy: bool,
    },

    /// Package the plugin with RunUAT and zip it for the marketplace
    Marketplace {
        /// Engine host platform
        #[arg(short, long, value_enum, ignore_case = true)]
        platform: EnginePlatform,

        /// Engine version
        #[arg(short, long, value_enum)]
        unreal: UnrealVersion,

        /// Keep Binaries and Intermediate in the package
        #[arg(
            short,
            long,
            action = ArgAction::Set,
            default_value_t = true,
            value_parser = BoolishValueParser::new(),
            value_name = "BOOL"
        )]
        binaries: bool,

        /// Keep the scratch directory after packaging
        #[arg(long)]
        keep_temp: bool,
    },

    /// Run clang-format over the plugin sources
    Format,

    /// Run the editor automation tests
    Test {
        /// Engine host platform
        #[arg(short, long, value_enum, ignore_case = true)]
        platform: EnginePlatform,

        /// Engine version
        #[arg(short, long, value_enum)]
        unreal: UnrealVersion,

        /// Automation test name filter (defaults to `filter` in the `[test]` config)
        #[arg(long)]
        filter: Option<String>,
    },
}

impl Command {
    /// Subcommand name as typed on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Command::Stage { .. } => "stage",
            Command::Ndk { .. } => "ndk",
            Command::Marketplace { .. } => "marketplace",
            Command::Format => "format",
            Command::Test { .. } => "test",
        }
    }
}

impl Args {
    /// Parse arguments from `itr`, returning clap's error instead of exiting
    pub fn try_parse_args<I, T>(itr: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(itr)
    }
}

/// Configuration derived from command line arguments and the config file
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    root: PathBuf,
    tool: ToolConfig,
    product: String,
    output: super::OutputManager,
}

impl RuntimeConfig {
    /// Resolve the root, load the config file and determine the product
    pub fn from_args(args: &Args) -> Result<Self> {
        let root = match &args.root {
            Some(root) => root.absolutize()?.into_owned(),
            None => std::env::current_dir()?,
        };
        let tool = ToolConfig::load(&root, args.config.as_deref())?;
        let product = tool.resolve_product(&root)?;
        log::debug!("root {} product {}", root.display(), product);

        Ok(Self {
            root,
            tool,
            product,
            output: super::OutputManager::new(args.verbose > 0, args.quiet),
        })
    }

    /// Repository root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Loaded tool configuration
    pub fn tool(&self) -> &ToolConfig {
        &self.tool
    }

    /// Plugin name
    pub fn product(&self) -> &str {
        &self.product
    }

    /// `<root>/<product>`
    pub fn plugin_dir(&self) -> PathBuf {
        self.root.join(&self.product)
    }

    /// `<root>/<product>/<product>.uplugin`
    pub fn plugin_descriptor(&self) -> PathBuf {
        self.plugin_dir().join(self.descriptor_name())
    }

    /// `<product>.uplugin`
    pub fn descriptor_name(&self) -> String {
        format!("{}.uplugin", self.product)
    }

    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Print an informational summary line
    pub fn info_println(&self, message: &str) {
        self.output.info(message);
    }

    /// Print a workflow step
    pub fn progress(&self, message: &str) {
        self.output.progress(message);
    }

    /// Print verbose message
    pub fn verbose_println(&self, message: &str) {
        self.output.verbose(message);
    }

    /// Print error message (always shown)
    pub fn error_println(&self, message: &str) {
        self.output.error(message);
    }

    /// Print warning message
    pub fn warning_println(&self, message: &str) {
        self.output.warn(message);
    }

    /// Print success message
    pub fn success_println(&self, message: &str) {
        self.output.success(message);
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        self.output.section(title);
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.output.is_quiet()
    }
}

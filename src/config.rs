//! Tool configuration.
//!
//! Settings are read from a TOML file and layered over built-in defaults; any
//! field left out of the file keeps its default. The file is looked up in order:
//!
//! 1. an explicit path (`--config` / `UPLUGIN_RELEASE_CONFIG`)
//! 2. `<root>/uplugin-release.toml`
//! 3. `<user config dir>/uplugin-release/config.toml`
//!
//! When none exists the defaults are used as-is.

use crate::error::{CliError, ConfigError, Result};
use crate::staging::{CopySpec, FolderMode};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name looked up in the repository root
pub const CONFIG_FILE_NAME: &str = "uplugin-release.toml";

/// Top-level tool configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Plugin name; the plugin lives in `<root>/<product>/<product>.uplugin`.
    /// Detected from the repository layout when unset.
    pub product: Option<String>,
    /// Line prepended to every rewritten marketplace source file
    pub copyright_notice: Option<String>,
    /// Unreal Engine installation settings
    pub engine: EngineSettings,
    /// Native SDK build settings
    pub ndk: NdkSettings,
    /// Release staging settings
    pub release: ReleaseSettings,
    /// Marketplace packaging settings
    pub marketplace: MarketplaceSettings,
    /// Source formatting settings
    pub format: FormatSettings,
    /// Editor automation test settings
    pub test: TestSettings,
}

/// Where Unreal Engine versions are installed
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSettings {
    /// Directory holding `UE_<version>` installs on Windows
    pub windows_root: PathBuf,
    /// Directory holding `UE_<version>` installs on macOS
    pub mac_root: PathBuf,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            windows_root: PathBuf::from(r"C:\Program Files\Epic Games"),
            mac_root: PathBuf::from("/Users/Shared/Epic Games"),
        }
    }
}

/// Native SDK (CMake) build settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NdkSettings {
    /// SDK checkout, relative to the plugin directory
    pub source_dir: PathBuf,
    /// Vendored library directory, relative to the plugin directory
    pub library_dir: PathBuf,
    /// CMake executable
    pub cmake: String,
    /// CMake target to build
    pub target: String,
    /// Generator used for Windows builds
    pub visual_studio_generator: String,
    /// Android NDK install used for Android builds
    pub android_ndk: PathBuf,
    /// Android API level
    pub android_system_version: u32,
    /// Android ABI
    pub android_abi: String,
}

impl Default for NdkSettings {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("inworld-ndk"),
            library_dir: PathBuf::from("Source/ThirdParty/InworldAINDKLibrary"),
            cmake: "cmake".to_string(),
            target: "inworld-ndk".to_string(),
            visual_studio_generator: "Visual Studio 16 2019".to_string(),
            android_ndk: PathBuf::from("/Users/runner/Library/Android/sdk/ndk/25.2.9519653"),
            android_system_version: 31,
            android_abi: "arm64-v8a".to_string(),
        }
    }
}

/// Release staging settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReleaseSettings {
    /// Staging tree, relative to the repository root
    pub output_dir: PathBuf,
    /// Copy instructions; defaults to [`default_release_layout`]
    pub copy: Option<CopySpec>,
}

impl Default for ReleaseSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("package-release"),
            copy: None,
        }
    }
}

/// Marketplace packaging settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarketplaceSettings {
    /// Scratch directory, relative to the repository root; removed after packaging
    pub temp_dir: PathBuf,
    /// Plugin folders copied into the package build
    pub folders: Vec<PathBuf>,
}

impl Default for MarketplaceSettings {
    fn default() -> Self {
        Self {
            temp_dir: PathBuf::from("build-scripts/Temp"),
            folders: ["Config", "Content", "Resources", "Source"]
                .into_iter()
                .map(PathBuf::from)
                .collect(),
        }
    }
}

/// clang-format settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatSettings {
    /// clang-format executable
    pub clang_format: String,
    /// Style file, relative to the repository root
    pub style_file: PathBuf,
    /// File extensions to format
    pub extensions: Vec<String>,
}

impl Default for FormatSettings {
    fn default() -> Self {
        Self {
            clang_format: "clang-format".to_string(),
            style_file: PathBuf::from("scripts/format/.clang-format"),
            extensions: vec!["cpp".to_string(), "h".to_string(), "cs".to_string()],
        }
    }
}

/// Editor automation test settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TestSettings {
    /// Test name prefix passed to `Automation RunTests`
    pub filter: String,
}

impl Default for TestSettings {
    fn default() -> Self {
        Self {
            filter: "Inworld".to_string(),
        }
    }
}

/// Release layout used when the config does not list copy instructions.
pub fn default_release_layout(product: &str) -> CopySpec {
    let plugin = PathBuf::from(product);
    let mut spec = CopySpec::new()
        .file("LICENSE.md")
        .file("README.md")
        .file("Changelog.md")
        .create_dir(&plugin)
        .file(plugin.join(format!("{}.uplugin", product)))
        .file(plugin.join("LICENSE.md"));
    for folder in ["Config", "Content", "Resources", "Source"] {
        spec = spec.folder(plugin.join(folder), FolderMode::CreateNew);
    }
    spec
}

impl ToolConfig {
    /// Parse a config document
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|error| {
            ConfigError::Parse {
                path: path.to_path_buf(),
                error,
            }
            .into()
        })
    }

    /// Read and parse the config file at `path`
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|error| ConfigError::Read {
            path: path.to_path_buf(),
            error,
        })?;
        Self::from_toml_str(&content, path)
    }

    /// Load the config for `root`, following the lookup order in the module docs.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            log::debug!("using config {}", path.display());
            return Self::from_file(path);
        }

        let candidates = [
            Some(root.join(CONFIG_FILE_NAME)),
            dirs::config_dir().map(|dir| dir.join("uplugin-release").join("config.toml")),
        ];
        for path in candidates.into_iter().flatten() {
            if path.is_file() {
                log::debug!("using config {}", path.display());
                return Self::from_file(&path);
            }
        }

        log::debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    /// Configured product name, or the single plugin found under `root`.
    ///
    /// A plugin is a directory `<root>/<name>` holding `<name>.uplugin`.
    pub fn resolve_product(&self, root: &Path) -> Result<String> {
        if let Some(product) = &self.product {
            return Ok(product.clone());
        }

        let found = detect_plugins(root);
        match found.as_slice() {
            [single] => Ok(single.clone()),
            _ => Err(CliError::MissingConfiguration {
                argument: "product in uplugin-release.toml".to_string(),
                allowed: if found.is_empty() {
                    "no <Name>/<Name>.uplugin found under the root".to_string()
                } else {
                    found.join(", ")
                },
            }
            .into()),
        }
    }

    /// Copy instructions for the release staging tree
    pub fn release_layout(&self, product: &str) -> CopySpec {
        self.release
            .copy
            .clone()
            .unwrap_or_else(|| default_release_layout(product))
    }
}

fn detect_plugins(root: &Path) -> Vec<String> {
    let Some(root_str) = root.to_str() else {
        return Vec::new();
    };
    let pattern = format!("{}/*/*.uplugin", glob::Pattern::escape(root_str));
    let Ok(paths) = glob::glob(&pattern) else {
        return Vec::new();
    };

    let mut found: Vec<String> = paths
        .flatten()
        .filter_map(|path| {
            let stem = path.file_stem()?.to_str()?.to_string();
            let dir = path.parent()?.file_name()?.to_str()?;
            (stem == dir).then_some(stem)
        })
        .collect();
    found.sort();
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = ToolConfig::from_toml_str(
            r#"
            product = "MyPlugin"

            [engine]
            mac_root = "/opt/Epic"
            "#,
            Path::new("test.toml"),
        )
        .unwrap();

        assert_eq!(config.product.as_deref(), Some("MyPlugin"));
        assert_eq!(config.engine.mac_root, PathBuf::from("/opt/Epic"));
        assert_eq!(
            config.engine.windows_root,
            EngineSettings::default().windows_root
        );
        assert_eq!(config.ndk.cmake, "cmake");
        assert_eq!(config.release.output_dir, PathBuf::from("package-release"));
        assert_eq!(config.test.filter, "Inworld");
    }

    #[test]
    fn test_automation_filter_configurable() {
        let config = ToolConfig::from_toml_str(
            "[test]\nfilter = \"Widget.Smoke\"\n",
            Path::new("test.toml"),
        )
        .unwrap();
        assert_eq!(config.test.filter, "Widget.Smoke");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = ToolConfig::from_toml_str("prodcut = \"x\"", Path::new("bad.toml")).unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn test_sample_config_parses() {
        let config = ToolConfig::from_toml_str(
            include_str!("../config/uplugin-release.toml"),
            Path::new("config/uplugin-release.toml"),
        )
        .unwrap();
        assert_eq!(config.product.as_deref(), Some("InworldAI"));
        assert_eq!(config.test.filter, "Inworld");
        let layout = config.release_layout("InworldAI");
        assert!(layout.len() > 10);
    }

    #[test]
    fn test_default_layout() {
        let layout = default_release_layout("Plugin");
        assert_eq!(layout.len(), 10);
        assert_eq!(
            layout.instructions()[4].path(),
            Path::new("Plugin").join("Plugin.uplugin")
        );
    }

    #[test]
    fn test_explicit_missing_config_fails() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.toml");
        assert!(ToolConfig::load(temp.path(), Some(&missing)).is_err());
    }

    #[test]
    fn test_root_config_file_used() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "product = \"FromRoot\"\n").unwrap();
        let config = ToolConfig::load(temp.path(), None).unwrap();
        assert_eq!(config.product.as_deref(), Some("FromRoot"));
    }

    #[test]
    fn test_resolve_product_detects_single_plugin() {
        let temp = TempDir::new().unwrap();
        let plugin = temp.path().join("Widget");
        std::fs::create_dir(&plugin).unwrap();
        std::fs::write(plugin.join("Widget.uplugin"), "{}").unwrap();
        // descriptor whose name does not match its folder is ignored
        let other = temp.path().join("Other");
        std::fs::create_dir(&other).unwrap();
        std::fs::write(other.join("Mismatch.uplugin"), "{}").unwrap();

        let product = ToolConfig::default().resolve_product(temp.path()).unwrap();
        assert_eq!(product, "Widget");
    }

    #[test]
    fn test_resolve_product_ambiguous() {
        let temp = TempDir::new().unwrap();
        for name in ["A", "B"] {
            let dir = temp.path().join(name);
            std::fs::create_dir(&dir).unwrap();
            std::fs::write(dir.join(format!("{name}.uplugin")), "{}").unwrap();
        }
        let err = ToolConfig::default()
            .resolve_product(temp.path())
            .unwrap_err();
        assert!(err.to_string().contains("A, B"));
    }
}

//! Supported platforms and the external commands each one maps to.
//!
//! Platform and engine version names are parsed into enums at argument parse
//! time, so unknown names never reach command construction.

use crate::config::{EngineSettings, NdkSettings};
use crate::process::CommandSpec;
use clap::ValueEnum;
use std::fmt;
use std::path::{Path, PathBuf};

/// Native SDK build targets.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, ValueEnum)]
pub enum NdkPlatform {
    /// Static library for 64-bit Windows
    #[value(name = "Win64")]
    Win64,
    /// Shared library (DLL) for 64-bit Windows
    #[value(name = "Win64-ndk-dll")]
    Win64NdkDll,
    /// Universal (x86_64 + arm64) static library for macOS
    #[value(name = "Mac")]
    Mac,
    /// Static library for iOS devices
    #[value(name = "iOS")]
    Ios,
    /// Static library for arm64 Android
    #[value(name = "Android")]
    Android,
}

/// CMake configure and build steps for one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfiguration {
    /// Steps that generate the build tree; run once per fresh build directory
    pub generate: Vec<CommandSpec>,
    /// Steps that compile the library
    pub build: Vec<CommandSpec>,
}

impl BuildConfiguration {
    /// Run every step inside `dir`
    pub fn in_dir(self, dir: &Path) -> Self {
        let place = |steps: Vec<CommandSpec>| {
            steps
                .into_iter()
                .map(|step| step.current_dir(dir))
                .collect()
        };
        Self {
            generate: place(self.generate),
            build: place(self.build),
        }
    }
}

impl NdkPlatform {
    /// CMake commands for this platform. Steps expect to run in `<sdk>/build`.
    pub fn build_configuration(&self, ndk: &NdkSettings) -> BuildConfiguration {
        let configure = CommandSpec::new(&ndk.cmake);
        let configure = match self {
            NdkPlatform::Win64 | NdkPlatform::Win64NdkDll => configure
                .args(["..", "-G", ndk.visual_studio_generator.as_str()])
                .arg(if *self == NdkPlatform::Win64NdkDll {
                    "-DINWORLD_SHARED=True"
                } else {
                    "-DINWORLD_SHARED=False"
                })
                .args([
                    "-DAEC=True",
                    "-DINWORLD_LOG_CALLBACK=True",
                    "-DINWORLD_AUDIO_DUMP=True",
                ]),
            NdkPlatform::Mac => configure.args([
                "..",
                "-DINWORLD_SHARED=False",
                "-DAEC=False",
                "-DMAC=True",
                "-DINWORLD_LOG_CALLBACK=True",
                "-DCMAKE_OSX_ARCHITECTURES=x86_64;arm64",
                "-DINWORLD_AUDIO_DUMP=True",
            ]),
            NdkPlatform::Ios => configure.args([
                "-G",
                "Xcode",
                "..",
                "-DINWORLD_SHARED=False",
                "-DAEC=False",
                "-DIOS=True",
                "-DCMAKE_TOOLCHAIN_FILE=./ios.toolchain.cmake",
                "-DPLATFORM=OS64",
                "-DINWORLD_LOG_CALLBACK=True",
            ]),
            NdkPlatform::Android => configure
                .args([
                    "..",
                    "-DINWORLD_SHARED=False",
                    "-DAEC=False",
                    "-DANDROID=True",
                    "-DCMAKE_SYSTEM_NAME=Android",
                ])
                .arg(format!(
                    "-DCMAKE_SYSTEM_VERSION={}",
                    ndk.android_system_version
                ))
                .arg(format!("-DCMAKE_ANDROID_ARCH_ABI={}", ndk.android_abi))
                .flag_path("-DCMAKE_ANDROID_NDK=", &ndk.android_ndk)
                .arg("-DINWORLD_LOG_CALLBACK=True"),
        };

        let mut build = CommandSpec::new(&ndk.cmake).args([
            "--build",
            ".",
            "--target",
            ndk.target.as_str(),
            "--config",
            "Release",
        ]);
        if *self == NdkPlatform::Ios {
            build = build.args(["--", "CODE_SIGNING_ALLOWED=NO"]);
        }

        BuildConfiguration {
            generate: vec![configure],
            build: vec![build],
        }
    }
}

/// Unreal Engine host platforms.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, ValueEnum)]
pub enum EnginePlatform {
    /// 64-bit Windows
    #[value(name = "Win64")]
    Win64,
    /// macOS
    #[value(name = "Mac")]
    Mac,
}

/// Supported Unreal Engine versions.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, ValueEnum)]
pub enum UnrealVersion {
    /// Unreal Engine 5.0
    #[value(name = "5.0")]
    V5_0,
    /// Unreal Engine 5.1
    #[value(name = "5.1")]
    V5_1,
    /// Unreal Engine 5.2
    #[value(name = "5.2")]
    V5_2,
    /// Unreal Engine 5.3
    #[value(name = "5.3")]
    V5_3,
    /// Unreal Engine 5.4
    #[value(name = "5.4")]
    V5_4,
}

impl UnrealVersion {
    /// Version string as used in install folders and artifact names
    pub fn as_str(&self) -> &'static str {
        match self {
            UnrealVersion::V5_0 => "5.0",
            UnrealVersion::V5_1 => "5.1",
            UnrealVersion::V5_2 => "5.2",
            UnrealVersion::V5_3 => "5.3",
            UnrealVersion::V5_4 => "5.4",
        }
    }
}

impl fmt::Display for UnrealVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl EnginePlatform {
    /// Name passed to `-TargetPlatforms`
    pub fn as_str(&self) -> &'static str {
        match self {
            EnginePlatform::Win64 => "Win64",
            EnginePlatform::Mac => "Mac",
        }
    }

    /// `<install root>/UE_<version>/Engine`
    pub fn engine_dir(&self, engine: &EngineSettings, version: UnrealVersion) -> PathBuf {
        let root = match self {
            EnginePlatform::Win64 => &engine.windows_root,
            EnginePlatform::Mac => &engine.mac_root,
        };
        root.join(format!("UE_{}", version)).join("Engine")
    }

    /// Path of the RunUAT entry script
    pub fn run_uat(&self, engine: &EngineSettings, version: UnrealVersion) -> PathBuf {
        let script = match self {
            EnginePlatform::Win64 => "RunUAT.bat",
            EnginePlatform::Mac => "RunUAT.sh",
        };
        self.engine_dir(engine, version)
            .join("Build")
            .join("BatchFiles")
            .join(script)
    }

    /// Path of the editor executable
    pub fn editor(&self, engine: &EngineSettings, version: UnrealVersion) -> PathBuf {
        let binaries = self.engine_dir(engine, version).join("Binaries");
        match self {
            EnginePlatform::Win64 => binaries.join("Win64").join("UnrealEditor.exe"),
            EnginePlatform::Mac => binaries
                .join("Mac")
                .join("UnrealEditor.app")
                .join("Contents")
                .join("MacOS")
                .join("UnrealEditor"),
        }
    }

    /// `RunUAT BuildPlugin` packaging `plugin` into `package_dir`
    pub fn build_plugin_command(
        &self,
        engine: &EngineSettings,
        version: UnrealVersion,
        plugin: &Path,
        package_dir: &Path,
    ) -> CommandSpec {
        CommandSpec::new(self.run_uat(engine, version))
            .arg("BuildPlugin")
            .flag_path("-plugin=", plugin)
            .arg(format!("-TargetPlatforms={}", self.as_str()))
            .flag_path("-package=", package_dir)
    }

    /// Headless editor run executing the automation tests matching `filter`
    pub fn automation_test_command(
        &self,
        engine: &EngineSettings,
        version: UnrealVersion,
        project_file: &Path,
        report_dir: &Path,
        filter: &str,
    ) -> CommandSpec {
        CommandSpec::new(self.editor(engine, version))
            .arg(project_file)
            .args(["-Game", "-nullrhi"])
            .flag_path("-ReportExportPath=", report_dir)
            .arg(format!("-ExecCmds=Automation RunTests {}; Quit", filter))
    }
}

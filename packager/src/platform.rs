//! Platform settings and their translation into build-tool flags.
//!
//! Settings are an explicit value handed to the command assembler. The
//! [`SettingsTranslator`] turns them into the prefix tokens of the configure
//! command; the assembler does not look inside those tokens.

use crate::assembler::Arg;
use clap::ValueEnum;
use serde::Serialize;
use std::fmt;

/// Target operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize)]
pub enum Os {
    /// Linux.
    Linux,
    /// macOS.
    Macos,
    /// Windows.
    Windows,
    /// FreeBSD.
    #[value(name = "freebsd")]
    FreeBsd,
}

impl Os {
    /// The operating system this binary was compiled for.
    #[must_use]
    pub const fn host() -> Self {
        if cfg!(target_os = "macos") {
            Self::Macos
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "freebsd") {
            Self::FreeBsd
        } else {
            Self::Linux
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Linux => "Linux",
            Self::Macos => "Macos",
            Self::Windows => "Windows",
            Self::FreeBsd => "FreeBSD",
        })
    }
}

/// C++ compiler family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize)]
pub enum Compiler {
    /// GNU g++.
    Gcc,
    /// LLVM clang++.
    Clang,
    /// Apple's clang distribution.
    AppleClang,
    /// Microsoft Visual C++.
    #[value(name = "msvc", alias = "visual-studio")]
    VisualStudio,
}

impl Compiler {
    /// Usual compiler for an operating system.
    #[must_use]
    pub const fn default_for(os: Os) -> Self {
        match os {
            Os::Macos => Self::AppleClang,
            Os::Windows => Self::VisualStudio,
            Os::FreeBsd => Self::Clang,
            Os::Linux => Self::Gcc,
        }
    }
}

impl fmt::Display for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Gcc => "gcc",
            Self::Clang => "clang",
            Self::AppleClang => "apple-clang",
            Self::VisualStudio => "Visual Studio",
        })
    }
}

/// Target architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize)]
pub enum Arch {
    /// 32-bit x86.
    X86,
    /// 64-bit x86.
    #[value(name = "x86_64")]
    X86_64,
    /// 64-bit ARM.
    Armv8,
}

impl Arch {
    /// The architecture this binary was compiled for.
    #[must_use]
    pub const fn host() -> Self {
        if cfg!(target_arch = "x86") {
            Self::X86
        } else if cfg!(target_arch = "aarch64") {
            Self::Armv8
        } else {
            Self::X86_64
        }
    }

    /// Machine flag for gcc-style compilers, if one is needed.
    const fn machine_flag(self) -> Option<&'static str> {
        match self {
            Self::X86 => Some("-m32"),
            Self::X86_64 => Some("-m64"),
            Self::Armv8 => None,
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::X86 => "x86",
            Self::X86_64 => "x86_64",
            Self::Armv8 => "armv8",
        })
    }
}

/// CMake build type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum, Serialize)]
pub enum BuildType {
    /// Unoptimised with debug information.
    Debug,
    /// Optimised.
    #[default]
    Release,
    /// Optimised with debug information.
    #[value(name = "relwithdebinfo")]
    RelWithDebInfo,
    /// Optimised for size.
    #[value(name = "minsizerel")]
    MinSizeRel,
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Debug => "Debug",
            Self::Release => "Release",
            Self::RelWithDebInfo => "RelWithDebInfo",
            Self::MinSizeRel => "MinSizeRel",
        })
    }
}

/// Operating system, compiler, architecture, and build type for one build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformSettings {
    /// Target operating system.
    pub os: Os,
    /// Compiler family.
    pub compiler: Compiler,
    /// Compiler version, when known.
    pub compiler_version: Option<String>,
    /// Target architecture.
    pub arch: Arch,
    /// Build type.
    pub build_type: BuildType,
}

impl PlatformSettings {
    /// Settings describing the host with a release build.
    #[must_use]
    pub fn host() -> Self {
        let os = Os::host();
        Self {
            os,
            compiler: Compiler::default_for(os),
            compiler_version: None,
            arch: Arch::host(),
            build_type: BuildType::default(),
        }
    }

    /// Return true when the generator holds several configurations in one
    /// build tree, so the configuration is picked at build time.
    #[must_use]
    pub fn is_multi_config(&self) -> bool {
        self.compiler == Compiler::VisualStudio
    }
}

/// Translates platform settings into configure and build tokens.
pub trait SettingsTranslator {
    /// Arguments placed after the source directory in the configure command.
    fn configure_flags(&self, settings: &PlatformSettings) -> Vec<Arg>;

    /// Arguments selecting the configuration in build commands. Empty for
    /// single-configuration generators.
    fn build_config(&self, settings: &PlatformSettings) -> Vec<Arg>;
}

/// The CMake settings translator.
///
/// Emits the generator, the build type for single-configuration generators,
/// the compiler identity, and machine flags for gcc-style compilers.
#[derive(Debug, Clone, Copy, Default)]
pub struct CmakeSettingsTranslator;

impl CmakeSettingsTranslator {
    fn generator(settings: &PlatformSettings) -> String {
        match (settings.compiler, settings.os) {
            (Compiler::VisualStudio, _) => {
                let major = settings
                    .compiler_version
                    .as_deref()
                    .and_then(|v| v.split('.').next())
                    .unwrap_or("14");
                let suffix = if settings.arch == Arch::X86_64 {
                    " Win64"
                } else {
                    ""
                };
                format!("Visual Studio {major}{suffix}")
            }
            (_, Os::Windows) => "MinGW Makefiles".to_owned(),
            _ => "Unix Makefiles".to_owned(),
        }
    }
}

impl SettingsTranslator for CmakeSettingsTranslator {
    fn configure_flags(&self, settings: &PlatformSettings) -> Vec<Arg> {
        let mut flags = vec![Arg::plain("-G"), Arg::quoted("", Self::generator(settings))];

        if !settings.is_multi_config() {
            flags.push(Arg::plain(format!("-DCMAKE_BUILD_TYPE={}", settings.build_type)));
        }

        flags.push(Arg::quoted("-DCONAN_COMPILER=", settings.compiler.to_string()));
        if let Some(version) = &settings.compiler_version {
            flags.push(Arg::quoted("-DCONAN_COMPILER_VERSION=", version.as_str()));
        }

        if settings.compiler != Compiler::VisualStudio {
            if let Some(machine) = settings.arch.machine_flag() {
                flags.push(Arg::plain(format!("-DCONAN_CXX_FLAGS={machine}")));
                flags.push(Arg::plain(format!("-DCONAN_SHARED_LINKER_FLAGS={machine}")));
                flags.push(Arg::plain(format!("-DCONAN_C_FLAGS={machine}")));
            }
        }

        flags
    }

    fn build_config(&self, settings: &PlatformSettings) -> Vec<Arg> {
        if settings.is_multi_config() {
            vec![Arg::plain("--config"), Arg::plain(settings.build_type.to_string())]
        } else {
            Vec::new()
        }
    }
}

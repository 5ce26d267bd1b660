//! Unit tests for command assembly.

use super::*;
use crate::platform::{Arch, BuildType, CmakeSettingsTranslator, Compiler, Os};
use desa_recipe::{OptionSchema, SchemaVersion, resolve};
use rstest::{fixture, rstest};
use std::collections::BTreeMap;

/// Translator returning a fixed prefix, standing in for the real one.
struct FixedTranslator;

impl SettingsTranslator for FixedTranslator {
    fn configure_flags(&self, _settings: &PlatformSettings) -> Vec<Arg> {
        vec![Arg::plain("<settings>")]
    }

    fn build_config(&self, _settings: &PlatformSettings) -> Vec<Arg> {
        vec![Arg::plain("<config>")]
    }
}

#[fixture]
fn settings() -> PlatformSettings {
    PlatformSettings {
        os: Os::Linux,
        compiler: Compiler::Gcc,
        compiler_version: None,
        arch: Arch::X86_64,
        build_type: BuildType::Release,
    }
}

fn options(pairs: &[(&str, &str)]) -> OptionSet {
    let overrides: BTreeMap<String, String> = pairs
        .iter()
        .map(|&(k, v)| (k.to_owned(), v.to_owned()))
        .collect();
    resolve(&OptionSchema::for_version(SchemaVersion::V2), &overrides).expect("valid options")
}

fn configure(
    options: &OptionSet,
    settings: &PlatformSettings,
    translator: &dyn SettingsTranslator,
    install_prefix: &str,
) -> BuildInvocation {
    assemble_configure_command(&ConfigureRequest {
        tool: DEFAULT_TOOL,
        options,
        settings,
        translator,
        source_dir: Utf8Path::new("/src"),
        build_dir: Utf8Path::new("/build"),
        install_prefix: Utf8Path::new(install_prefix),
    })
}

#[rstest]
fn configure_tokens_follow_declaration_order(settings: PlatformSettings) {
    let set = options(&[("shared", "false"), ("build_tests", "true")]);
    let invocation = configure(&set, &settings, &FixedTranslator, "/pkg");

    assert_eq!(invocation.program(), "cmake");
    assert_eq!(
        invocation.args(),
        &[
            "\"/src\"",
            "<settings>",
            "-DENABLE_CONAN=True",
            "-DBUILD_SHARED_LIBS=False",
            "-DBUILD_TESTING=True",
            "-DCMAKE_INSTALL_PREFIX=\"/pkg\"",
        ]
    );
    assert_eq!(invocation.working_dir(), Utf8Path::new("/build"));
    assert_eq!(invocation.source_dir(), Some(Utf8Path::new("/src")));
}

#[rstest]
fn identical_inputs_give_identical_commands(settings: PlatformSettings) {
    // Override maps built in different orders resolve to the same set.
    let first = options(&[("build_tests", "1"), ("shared", "True")]);
    let second = options(&[("shared", "true"), ("build_tests", "TRUE")]);

    let a = configure(&first, &settings, &CmakeSettingsTranslator, "/pkg");
    let b = configure(&second, &settings, &CmakeSettingsTranslator, "/pkg");

    assert_eq!(a.args(), b.args());
    assert_eq!(a.command_line(), b.command_line());
    assert_eq!(a.fingerprint(), b.fingerprint());
}

#[rstest]
fn every_option_contributes_exactly_one_flag(settings: PlatformSettings) {
    let set = options(&[]);
    let invocation = configure(&set, &settings, &CmakeSettingsTranslator, "/pkg");

    for flag in ["ENABLE_CONAN", "BUILD_SHARED_LIBS", "BUILD_TESTING"] {
        let prefix = format!("-D{flag}=");
        let count = invocation
            .args()
            .iter()
            .filter(|a| a.starts_with(&prefix))
            .count();
        assert_eq!(count, 1, "expected one {flag} token");
    }
}

#[rstest]
fn install_prefix_with_spaces_is_quoted(settings: PlatformSettings) {
    let set = options(&[]);
    let invocation = configure(&set, &settings, &FixedTranslator, "/opt/my packages/desa");

    assert_eq!(
        invocation.args().last().map(String::as_str),
        Some("-DCMAKE_INSTALL_PREFIX=\"/opt/my packages/desa\"")
    );
}

#[rstest]
#[case::dollar("/opt/pkg$HOME")]
#[case::backticks("/opt/pkg`echo X`")]
#[case::quote_and_backslash("/opt/pkg\"\\x")]
fn process_receives_paths_verbatim(settings: PlatformSettings, #[case] prefix: &str) {
    let set = options(&[]);
    let invocation = configure(&set, &settings, &FixedTranslator, prefix);
    let argv = invocation.argv();

    assert_eq!(argv.first().map(String::as_str), Some("/src"));
    assert_eq!(
        argv.last(),
        Some(&format!("-DCMAKE_INSTALL_PREFIX={prefix}"))
    );
    assert_eq!(
        invocation.args().last(),
        Some(&format!("-DCMAKE_INSTALL_PREFIX=\"{prefix}\""))
    );
}

#[test]
fn quoted_argument_renders_with_quotes_only_for_display() {
    let arg = Arg::quoted("-G", "Unix Makefiles");

    assert_eq!(arg.to_string(), "-G\"Unix Makefiles\"");
    assert_eq!(arg.raw(), "-GUnix Makefiles");
    assert_eq!(Arg::plain("--build").raw(), "--build");
}

#[rstest]
fn settings_prefix_precedes_option_flags(settings: PlatformSettings) {
    let set = options(&[]);
    let invocation = configure(&set, &settings, &CmakeSettingsTranslator, "/pkg");
    let args = invocation.args();

    let position = |needle: &str| args.iter().position(|a| a.starts_with(needle));
    let build_type = position("-DCMAKE_BUILD_TYPE=").expect("build type token");
    let first_option = position("-DENABLE_CONAN=").expect("option token");
    assert!(build_type < first_option);
}

#[rstest]
fn fingerprint_changes_with_options(settings: PlatformSettings) {
    let a = configure(&options(&[]), &settings, &FixedTranslator, "/pkg");
    let b = configure(&options(&[("shared", "True")]), &settings, &FixedTranslator, "/pkg");

    assert_ne!(a.fingerprint(), b.fingerprint());
    assert_eq!(a.fingerprint().len(), 64);
}

#[rstest]
fn build_command_drives_configured_tree(settings: PlatformSettings) {
    let config = BuildConfig::new("cmake", Utf8Path::new("/build"), &settings, &CmakeSettingsTranslator);
    let invocation = assemble_build_command(&config);

    assert_eq!(invocation.command_line(), "cmake --build .");
    assert_eq!(invocation.working_dir(), Utf8Path::new("/build"));
    assert_eq!(invocation.source_dir(), None);
}

#[rstest]
fn multi_config_build_selects_configuration(settings: PlatformSettings) {
    let settings = PlatformSettings {
        os: Os::Windows,
        compiler: Compiler::VisualStudio,
        ..settings
    };
    let config = BuildConfig::new("cmake", Utf8Path::new("/build"), &settings, &CmakeSettingsTranslator);

    assert_eq!(
        assemble_build_command(&config).command_line(),
        "cmake --build . --config Release"
    );
    assert_eq!(
        assemble_install_command(&config).command_line(),
        "cmake --build . --target install --config Release"
    );
}

#[rstest]
fn install_command_targets_install(settings: PlatformSettings) {
    let config = BuildConfig::new("cmake", Utf8Path::new("/build"), &settings, &FixedTranslator);
    let invocation = assemble_install_command(&config);

    assert_eq!(invocation.args(), &["--build", ".", "--target", "install", "<config>"]);
}

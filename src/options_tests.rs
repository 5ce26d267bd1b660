//! Unit tests for option resolution.

use super::*;
use rstest::rstest;

fn overrides(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|&(k, v)| (k.to_owned(), v.to_owned()))
        .collect()
}

#[test]
fn defaults_fill_every_declared_option() {
    let schema = OptionSchema::for_version(SchemaVersion::V2);
    let set = resolve(&schema, &BTreeMap::new()).expect("defaults resolve");

    let names: Vec<&str> = set.iter().map(ResolvedOption::name).collect();
    assert_eq!(names, vec![ENABLE_CONAN, SHARED, BUILD_TESTS]);
    assert!(set.is_enabled(ENABLE_CONAN));
    assert!(!set.is_enabled(SHARED));
    assert!(!set.is_enabled(BUILD_TESTS));
}

#[test]
fn legacy_schema_has_no_test_option() {
    let schema = OptionSchema::for_version(SchemaVersion::V1);
    assert!(schema.get(BUILD_TESTS).is_none());

    let err = resolve(&schema, &overrides(&[(BUILD_TESTS, "True")]))
        .expect_err("build_tests is not declared in v1");
    assert!(matches!(err, InvalidOptionError::UnknownOption { .. }));
}

#[rstest]
#[case::title_case("True", true)]
#[case::lower_case("false", false)]
#[case::upper_case("TRUE", true)]
#[case::digit_one("1", true)]
#[case::digit_zero("0", false)]
fn boolean_spellings_are_canonicalised(#[case] raw: &str, #[case] expected: bool) {
    let schema = OptionSchema::default();
    let set = resolve(&schema, &overrides(&[(SHARED, raw)])).expect("valid boolean");

    assert_eq!(set.get(SHARED), Some(&OptionValue::Bool(expected)));
    let rendered = set.get(SHARED).map(ToString::to_string);
    assert_eq!(rendered.as_deref(), Some(if expected { "True" } else { "False" }));
}

#[rstest]
#[case::word("maybe")]
#[case::empty("")]
#[case::number("2")]
fn out_of_domain_boolean_is_rejected(#[case] raw: &str) {
    let schema = OptionSchema::default();
    let err = resolve(&schema, &overrides(&[(SHARED, raw)])).expect_err("value out of domain");

    assert!(matches!(
        err,
        InvalidOptionError::ValueOutOfDomain { ref name, .. } if name == SHARED
    ));
}

#[test]
fn unknown_override_is_rejected_before_values_are_checked() {
    let schema = OptionSchema::default();
    let err = resolve(&schema, &overrides(&[("lto", "True"), (SHARED, "nope")]))
        .expect_err("unknown option");

    match err {
        InvalidOptionError::UnknownOption { name, declared } => {
            assert_eq!(name, "lto");
            assert!(declared.contains(BUILD_TESTS));
        }
        other => panic!("expected UnknownOption, got {other:?}"),
    }
}

#[test]
fn choice_options_accept_only_declared_values() {
    let decl = OptionDecl::choice(
        "sanitizer",
        vec!["none".to_owned(), "address".to_owned()],
        "none",
    )
    .expect("default is in domain");
    let schema = OptionSchema::default()
        .with_option(decl)
        .expect("new option name");

    let set = resolve(&schema, &overrides(&[("sanitizer", "address")])).expect("valid choice");
    assert_eq!(
        set.get("sanitizer"),
        Some(&OptionValue::Choice("address".to_owned()))
    );

    let err = resolve(&schema, &overrides(&[("sanitizer", "thread")])).expect_err("bad choice");
    assert!(matches!(err, InvalidOptionError::ValueOutOfDomain { .. }));
}

#[test]
fn choice_default_must_be_in_domain() {
    let result = OptionDecl::choice("sanitizer", vec!["none".to_owned()], "memory");
    assert!(result.is_err());
}

#[rstest]
#[case::enable_conan(ENABLE_CONAN)]
#[case::shared(SHARED)]
#[case::build_tests(BUILD_TESTS)]
fn built_in_declarations_cannot_be_replaced(#[case] name: &str) {
    let err = OptionSchema::default()
        .with_option(OptionDecl::boolean(name, true))
        .expect_err("redeclaration");

    assert_eq!(
        err,
        InvalidOptionError::AlreadyDeclared {
            name: name.to_owned(),
            version: "v2".to_owned(),
        }
    );
}

#[test]
fn declared_flags_use_build_tool_aliases() {
    let schema = OptionSchema::default();
    let flags: Vec<&str> = schema.decls().iter().map(OptionDecl::flag).collect();
    assert_eq!(flags, vec!["ENABLE_CONAN", "BUILD_SHARED_LIBS", "BUILD_TESTING"]);
}

#[rstest]
#[case::plain("shared=True", "shared", "True")]
#[case::spaces(" build_tests = 0 ", "build_tests", "0")]
#[case::empty_value("shared=", "shared", "")]
fn overrides_split_on_first_equals(#[case] raw: &str, #[case] name: &str, #[case] value: &str) {
    let (n, v) = parse_override(raw).expect("well-formed override");
    assert_eq!(n, name);
    assert_eq!(v, value);
}

#[rstest]
#[case::no_equals("shared")]
#[case::no_name("=True")]
fn malformed_overrides_are_rejected(#[case] raw: &str) {
    assert!(matches!(
        parse_override(raw),
        Err(InvalidOptionError::MalformedOverride { .. })
    ));
}

#[rstest]
#[case::v1("v1", SchemaVersion::V1)]
#[case::v2_upper("V2", SchemaVersion::V2)]
#[case::digit("2", SchemaVersion::V2)]
fn schema_versions_parse(#[case] raw: &str, #[case] expected: SchemaVersion) {
    assert_eq!(raw.parse::<SchemaVersion>(), Ok(expected));
}

//! Target-directory and prefix normalization cases.
//!
//! Each `#[case]` is isolated: no shared state.

use fsconsul_core::Mapping;
use rstest::rstest;

#[rstest]
#[case::plain("/tmp/out", "/tmp/out/")]
#[case::trailing_slash("/tmp/out/", "/tmp/out/")]
#[case::many_slashes("/tmp/out////", "/tmp/out/")]
#[case::stray_double_quote("/tmp/out/\"", "/tmp/out/")]
#[case::stray_single_quote("/tmp/out'", "/tmp/out/")]
#[case::relative("conf", "conf/")]
#[case::root("/", "/")]
fn target_directory_normalization(#[case] raw: &str, #[case] expected: &str) {
    let mapping = Mapping::new("prefix", raw, None).expect("valid mapping");
    assert_eq!(mapping.target_directory().to_str(), Some(expected));
}

#[rstest]
#[case::plain("simple_file", "simple_file")]
#[case::nested("nested/file", "nested/file")]
#[case::leading_slash("/gotest", "gotest")]
#[case::trailing_slash("gotest/", "gotest")]
fn prefix_normalization(#[case] raw: &str, #[case] expected: &str) {
    let mapping = Mapping::new(raw, "/tmp", None).expect("valid mapping");
    assert_eq!(mapping.source_prefix().as_str(), expected);
}

#[test]
fn normalizing_a_normalized_path_changes_nothing() {
    let first = Mapping::new("p", "/tmp/out\"", None).expect("first");
    let target = first.target_directory().to_string_lossy().into_owned();
    let second = Mapping::new("p", &target, None).expect("second");
    assert_eq!(first.target_directory(), second.target_directory());
}

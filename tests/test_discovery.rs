mod common;

use common::Suite;
use xsltest::discovery::{TestCaseId, TestDiscoverer};

#[test]
fn discovers_one_case_per_input_fixture() {
    let suite = Suite::new();
    suite
        .stylesheet("report", "<x/>")
        .input("report", "basic", "<a/>")
        .expected("report", "basic", "<a/>")
        .input("report", "empty", "<a/>")
        .expected("report", "empty", "<a/>");

    let cases = TestDiscoverer::discover(&suite.config()).unwrap();
    assert_eq!(
        cases,
        vec![
            TestCaseId::new("report", "basic"),
            TestCaseId::new("report", "empty"),
        ]
    );
}

#[test]
fn expected_file_is_not_needed_for_discovery() {
    let suite = Suite::new();
    suite.stylesheet("report", "<x/>").input("report", "orphan", "<a/>");

    let cases = TestDiscoverer::discover(&suite.config()).unwrap();
    assert_eq!(cases, vec![TestCaseId::new("report", "orphan")]);
}

#[test]
fn stylesheets_without_fixtures_contribute_nothing() {
    let suite = Suite::new();
    suite
        .stylesheet("lonely", "<x/>")
        .stylesheet("report", "<x/>")
        .input("report", "basic", "<a/>");

    let cases = TestDiscoverer::discover(&suite.config()).unwrap();
    assert_eq!(cases, vec![TestCaseId::new("report", "basic")]);
}

#[test]
fn fixtures_without_stylesheet_are_not_discovered() {
    let suite = Suite::new();
    suite.input("ghost", "basic", "<a/>");

    assert!(TestDiscoverer::discover(&suite.config()).unwrap().is_empty());
}

#[test]
fn similar_prefixes_do_not_leak_between_stylesheets() {
    let suite = Suite::new();
    suite
        .stylesheet("a", "<x/>")
        .stylesheet("ab", "<x/>")
        .input("ab", "one", "<a/>")
        .input("a", "two", "<a/>")
        .write("xslt/notes.txt", "not a stylesheet");

    let cases = TestDiscoverer::discover(&suite.config()).unwrap();
    assert_eq!(
        cases,
        vec![TestCaseId::new("a", "two"), TestCaseId::new("ab", "one")]
    );
}

#[test]
fn missing_directories_yield_an_empty_matrix() {
    let dir = tempfile::tempdir().unwrap();
    let config = xsltest::config::HarnessConfig::new(dir.path());
    assert!(TestDiscoverer::discover(&config).unwrap().is_empty());
}

#[test]
fn configured_directories_are_used() {
    let suite = Suite::new();
    std::fs::create_dir(suite.path("sheets")).unwrap();
    suite
        .write("xsltest.yaml", "xslt_dir: sheets\n")
        .write("sheets/report.xsl", "<x/>")
        .input("report", "basic", "<a/>");

    let config = xsltest::config::HarnessConfig::load(suite.root()).unwrap();
    let cases = TestDiscoverer::discover(&config).unwrap();
    assert_eq!(cases, vec![TestCaseId::new("report", "basic")]);
}

#[cfg(unix)]
#[test]
fn symlinked_stylesheets_and_fixtures_are_discovered() {
    let suite = Suite::new();
    suite
        .write("shared.xsl", "<x/>")
        .write("shared-input.xml", "<a/>");
    std::os::unix::fs::symlink(suite.path("shared.xsl"), suite.path("xslt/identity.xsl")).unwrap();
    std::os::unix::fs::symlink(
        suite.path("shared-input.xml"),
        suite.path("test/identity--linked--input.xml"),
    )
    .unwrap();
    std::os::unix::fs::symlink(
        suite.path("missing.xml"),
        suite.path("test/identity--dangling--input.xml"),
    )
    .unwrap();

    let cases = TestDiscoverer::discover(&suite.config()).unwrap();
    assert_eq!(cases, vec![TestCaseId::new("identity", "linked")]);
}

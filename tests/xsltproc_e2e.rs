// Runs the real `xsltproc`. Ignored by default: `cargo test -- --ignored`.

mod common;

use common::{Suite, IDENTITY_XSL};
use xsltest::discovery::TestCaseId;
use xsltest::engine::XsltprocEngine;
use xsltest::runner::{run_test_case, TestResult};

const ECHO_PARAM_XSL: &str = r#"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform">
  <xsl:param name="CoupledResourceLookUp" select="'enabled'"/>
  <xsl:template match="/">
    <lookup><xsl:value-of select="$CoupledResourceLookUp"/></lookup>
  </xsl:template>
</xsl:stylesheet>
"#;

fn engine() -> XsltprocEngine {
    let engine = XsltprocEngine::default();
    assert!(engine.is_available(), "xsltproc is not on PATH");
    engine
}

#[test]
#[ignore = "needs xsltproc on PATH"]
fn identity_stylesheet_passes_and_fails_as_expected() {
    let engine = engine();
    let suite = Suite::new();
    suite
        .stylesheet("identity", IDENTITY_XSL)
        .input("identity", "passthrough", "<a><b/></a>")
        .expected("identity", "passthrough", "<a><b/></a>")
        .input("identity", "changed", "<a><b/></a>")
        .expected("identity", "changed", "<a><c/></a>");
    let config = suite.config();

    let pass = run_test_case(&engine, &config, &TestCaseId::new("identity", "passthrough"));
    assert!(matches!(pass, TestResult::Pass { .. }), "{:?}", pass);

    let fail = run_test_case(&engine, &config, &TestCaseId::new("identity", "changed"));
    let TestResult::Fail { diff, .. } = fail else {
        panic!("expected a failure, got {:?}", fail);
    };
    assert!(diff.removed().any(|line| line.contains("<b/>")));
    assert!(diff.added().any(|line| line.contains("<c/>")));
}

#[test]
#[ignore = "needs xsltproc on PATH"]
fn coupled_resource_lookup_is_disabled() {
    let engine = engine();
    let suite = Suite::new();
    suite
        .stylesheet("echo", ECHO_PARAM_XSL)
        .input("echo", "param", "<ignored/>")
        .expected("echo", "param", "<lookup>disabled</lookup>");

    let result = run_test_case(&engine, &suite.config(), &TestCaseId::new("echo", "param"));
    assert!(matches!(result, TestResult::Pass { .. }), "{:?}", result);
}

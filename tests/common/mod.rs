//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use xsltest::config::HarnessConfig;
use xsltest::document::Document;
use xsltest::engine::{Parameters, XsltEngine};
use xsltest::HarnessResult;

pub const IDENTITY_XSL: &str = r#"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform">
  <xsl:template match="@*|node()">
    <xsl:copy><xsl:apply-templates select="@*|node()"/></xsl:copy>
  </xsl:template>
</xsl:stylesheet>
"#;

/// A suite root in a temporary directory.
pub struct Suite {
    dir: TempDir,
}

impl Suite {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("xslt")).unwrap();
        fs::create_dir(dir.path().join("test")).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> HarnessConfig {
        let mut config = HarnessConfig::new(self.root());
        config.use_colors = false;
        config
    }

    pub fn stylesheet(&self, name: &str, content: &str) -> &Self {
        self.write(&format!("xslt/{}.xsl", name), content)
    }

    pub fn input(&self, xslt: &str, case: &str, content: &str) -> &Self {
        self.write(&format!("test/{}--{}--input.xml", xslt, case), content)
    }

    pub fn expected(&self, xslt: &str, case: &str, content: &str) -> &Self {
        self.write(&format!("test/{}--{}--expected.xml", xslt, case), content)
    }

    pub fn write(&self, relative: &str, content: &str) -> &Self {
        fs::write(self.path(relative), content).unwrap();
        self
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }
}

/// Engine that checks the stylesheet is well-formed and copies its input.
pub struct IdentityEngine;

impl XsltEngine for IdentityEngine {
    type Stylesheet = Document;

    fn name(&self) -> &str {
        "identity"
    }

    fn compile(&self, path: &Path) -> HarnessResult<Document> {
        Document::from_path(path)
    }

    fn transform(
        &self,
        _stylesheet: &Document,
        input: &Document,
        params: &Parameters,
    ) -> HarnessResult<Document> {
        assert_eq!(params.get("CoupledResourceLookUp"), Some("'disabled'"));
        Ok(input.clone())
    }
}

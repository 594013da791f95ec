use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::HarnessConfig;
use crate::errors::{HarnessError, HarnessResult};

/// Separator between the parts of a fixture file name.
pub const DELIMITER: &str = "--";

const STYLESHEET_EXTENSION: &str = "xsl";
const INPUT_SUFFIX: &str = "--input.xml";

/// Identifies one case: a stylesheet and the name of one of its fixtures.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TestCaseId {
    pub xslt_name: String,
    pub test_name: String,
}

impl TestCaseId {
    pub fn new(xslt_name: impl Into<String>, test_name: impl Into<String>) -> Self {
        Self {
            xslt_name: xslt_name.into(),
            test_name: test_name.into(),
        }
    }
}

impl fmt::Display for TestCaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.xslt_name, DELIMITER, self.test_name)
    }
}

/// Builds the test matrix from the stylesheet and fixture directories.
///
/// For each `<xslt>.xsl`, every fixture named `<xslt>--*--input.xml` yields a
/// case whose name is the text between the first and second `--` of the file
/// stem. Whether the expected file (or the stylesheet itself, later on)
/// exists is left to [`crate::runner::preflight`].
#[derive(Debug)]
pub struct TestDiscoverer;

impl TestDiscoverer {
    pub fn discover(config: &HarnessConfig) -> HarnessResult<Vec<TestCaseId>> {
        let stylesheets = Self::list_files(&config.stylesheet_dir())?;
        let fixtures = Self::list_files(&config.fixture_dir())?;

        let mut cases = Vec::new();
        for stylesheet in &stylesheets {
            let Some(xslt_name) = Self::stylesheet_name(stylesheet) else {
                continue;
            };
            let before = cases.len();
            for fixture in &fixtures {
                let Some(file_name) = fixture.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                if let Some(test_name) = Self::case_name(xslt_name, file_name) {
                    cases.push(TestCaseId::new(xslt_name, test_name));
                }
            }
            if cases.len() == before {
                debug!(stylesheet = xslt_name, "no fixtures found for stylesheet");
            }
        }
        debug!(count = cases.len(), "discovered test cases");
        Ok(cases)
    }

    /// Returns the case name if `file_name` is an input fixture of `xslt_name`.
    ///
    /// `report--basic--input.xml` under `report` yields `basic`.
    pub fn case_name<'a>(xslt_name: &str, file_name: &'a str) -> Option<&'a str> {
        let prefix_len = xslt_name.len() + DELIMITER.len();
        let matches_prefix = file_name.starts_with(xslt_name)
            && file_name[xslt_name.len()..].starts_with(DELIMITER);
        if !matches_prefix
            || !file_name.ends_with(INPUT_SUFFIX)
            || file_name.len() < prefix_len + INPUT_SUFFIX.len()
        {
            return None;
        }
        let stem = file_name.strip_suffix(".xml")?;
        stem.split(DELIMITER).nth(1)
    }

    /// Stem of a `.xsl` file, if `path` is one.
    fn stylesheet_name(path: &Path) -> Option<&str> {
        if path.extension()? != STYLESHEET_EXTENSION {
            return None;
        }
        path.file_stem()?.to_str()
    }

    /// Files directly inside `dir`, symlinked ones included, sorted by name.
    fn list_files(dir: &Path) -> HarnessResult<Vec<PathBuf>> {
        if !dir.is_dir() {
            warn!(dir = %dir.display(), "directory not found, no cases from it");
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|source| HarnessError::Walk {
                path: dir.to_path_buf(),
                source,
            })?;
            // `Path::is_file` follows symlinks; a dangling link is skipped.
            if !entry.path().is_file() {
                continue;
            }
            files.push(entry.path().to_path_buf());
        }
        files.sort();
        Ok(files)
    }
}

//! Runs discovered cases: preflight, transform, compare.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use miette::{GraphicalReportHandler, GraphicalTheme};
use serde::Serialize;
use tracing::{debug, info, info_span};

use crate::canonical::{self, TextDiff};
use crate::config::HarnessConfig;
use crate::discovery::{TestCaseId, TestDiscoverer};
use crate::document::Document;
use crate::engine::XsltEngine;
use crate::errors::{HarnessError, HarnessResult};

/// Files backing one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CasePaths {
    pub stylesheet: PathBuf,
    pub input: PathBuf,
    pub expected: PathBuf,
}

impl CasePaths {
    pub fn resolve(config: &HarnessConfig, case: &TestCaseId) -> Self {
        Self {
            stylesheet: config.stylesheet_path(&case.xslt_name),
            input: config.fixture_path(&case.xslt_name, &case.test_name, "input"),
            expected: config.fixture_path(&case.xslt_name, &case.test_name, "expected"),
        }
    }

    /// `<stylesheet file>/<input file>`, the short failure label.
    pub fn label(&self) -> String {
        format!("{}/{}", file_name(&self.stylesheet), file_name(&self.input))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Outcome of checking a case's files before running it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preflight {
    Run(CasePaths),
    Skip { missing: PathBuf },
}

/// Checks that the stylesheet and both fixtures exist.
///
/// Missing files make the case a skip. An existence check the file system
/// refuses to answer is an error.
pub fn preflight(config: &HarnessConfig, case: &TestCaseId) -> HarnessResult<Preflight> {
    let paths = CasePaths::resolve(config, case);
    for path in [&paths.stylesheet, &paths.input, &paths.expected] {
        match fs::metadata(path) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(case = %case, missing = %path.display(), "skipping case");
                return Ok(Preflight::Skip {
                    missing: path.clone(),
                });
            }
            Err(source) => {
                return Err(HarnessError::Probe {
                    path: path.clone(),
                    source,
                })
            }
        }
    }
    Ok(Preflight::Run(paths))
}

/// Result of one case.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum TestResult {
    Pass {
        id: String,
    },
    /// The output did not match the expected document.
    Fail {
        id: String,
        label: String,
        diff: TextDiff,
    },
    /// Something other than a mismatch went wrong.
    Error {
        id: String,
        category: String,
        error: String,
    },
    Skipped {
        id: String,
        reason: String,
    },
}

impl TestResult {
    pub fn id(&self) -> &str {
        match self {
            TestResult::Pass { id }
            | TestResult::Fail { id, .. }
            | TestResult::Error { id, .. }
            | TestResult::Skipped { id, .. } => id,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TestResult::Fail { .. } | TestResult::Error { .. })
    }
}

/// Counts per outcome.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TestSummary {
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub skipped: usize,
}

impl TestSummary {
    pub fn from_results(results: &[TestResult]) -> Self {
        let mut summary = Self::default();
        for result in results {
            match result {
                TestResult::Pass { .. } => summary.passed += 1,
                TestResult::Fail { .. } => summary.failed += 1,
                TestResult::Error { .. } => summary.errored += 1,
                TestResult::Skipped { .. } => summary.skipped += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.errored + self.skipped
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.errored > 0
    }
}

/// Transforms the input of an existing case and compares the result.
///
/// `Ok(None)` means the output matched.
pub fn execute<E: XsltEngine>(
    engine: &E,
    config: &HarnessConfig,
    paths: &CasePaths,
) -> HarnessResult<Option<TextDiff>> {
    let stylesheet = engine.compile(&paths.stylesheet)?;
    let input = Document::from_path(&paths.input)?;
    let actual = engine.transform(&stylesheet, &input, &config.parameters())?;
    let expected = Document::from_path(&paths.expected)?;
    Ok(canonical::compare(&actual, &expected))
}

/// Runs one case end to end and classifies the outcome.
pub fn run_test_case<E: XsltEngine>(
    engine: &E,
    config: &HarnessConfig,
    case: &TestCaseId,
) -> TestResult {
    let id = case.to_string();
    let _span = info_span!("case", %id).entered();

    let paths = match preflight(config, case) {
        Ok(Preflight::Run(paths)) => paths,
        Ok(Preflight::Skip { missing }) => {
            return TestResult::Skipped {
                id,
                reason: format!("Missing path: {}", missing.display()),
            }
        }
        Err(e) => return error_result(id, &e),
    };

    match execute(engine, config, &paths) {
        Ok(None) => TestResult::Pass { id },
        Ok(Some(diff)) => TestResult::Fail {
            id,
            label: paths.label(),
            diff,
        },
        Err(e) => error_result(id, &e),
    }
}

fn error_result(id: String, error: &HarnessError) -> TestResult {
    TestResult::Error {
        id,
        category: error.category().to_string(),
        error: render_error(error),
    }
}

/// Renders the diagnostic without colors so it can be stored and replayed.
fn render_error(error: &HarnessError) -> String {
    let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor());
    let mut rendered = String::new();
    match handler.render_report(&mut rendered, error) {
        Ok(()) => rendered.trim_end().to_string(),
        Err(_) => render_chain(error),
    }
}

/// The error message followed by its causes.
fn render_chain(error: &HarnessError) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(&format!(": {}", cause));
        source = cause.source();
    }
    message
}

/// Discovers every case under `config` and runs them in order.
///
/// Cases whose id does not contain `filter` are reported as skipped.
pub fn run_all_tests<E: XsltEngine>(
    engine: &E,
    config: &HarnessConfig,
    filter: Option<&str>,
) -> HarnessResult<Vec<TestResult>> {
    let cases = TestDiscoverer::discover(config)?;
    info!(cases = cases.len(), engine = engine.name(), "running test matrix");

    let results = cases
        .iter()
        .map(|case| match filter {
            Some(f) if !case.to_string().contains(f) => TestResult::Skipped {
                id: case.to_string(),
                reason: format!("Filtered out by substring: {}", f),
            },
            _ => run_test_case(engine, config, case),
        })
        .collect();
    Ok(results)
}

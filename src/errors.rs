//! Error handling for the xsltest harness.
//!
//! Every failure mode of the harness is a variant of [`HarnessError`]. Errors
//! are `miette` diagnostics so the CLI can render them with codes, help text
//! and, for XML parse failures, a labelled excerpt of the offending document.
//!
//! Missing files are *not* errors: they are reported by
//! [`crate::runner::preflight`] as a skip.

use std::path::PathBuf;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Result alias used across the crate.
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Unified error type for all harness failure modes.
#[derive(Error, Diagnostic, Debug)]
pub enum HarnessError {
    #[error("Failed to read '{path}'")]
    #[diagnostic(code(xsltest::io::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to check whether '{path}' exists")]
    #[diagnostic(
        code(xsltest::io::probe),
        help("the path exists but could not be inspected; check its permissions")
    )]
    Probe {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk directory '{path}'")]
    #[diagnostic(code(xsltest::io::walk))]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Malformed XML: {message}")]
    #[diagnostic(code(xsltest::xml::malformed))]
    MalformedXml {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Failed to start XSLT engine '{program}'")]
    #[diagnostic(
        code(xsltest::engine::spawn),
        help("install the engine or point `engine.program` in xsltest.yaml at it")
    )]
    EngineSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Lost the pipe to XSLT engine '{program}'")]
    #[diagnostic(code(xsltest::engine::io))]
    EngineIo {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("XSLT engine failed on '{stylesheet}' ({status}): {stderr}")]
    #[diagnostic(code(xsltest::engine::transform))]
    Transform {
        stylesheet: PathBuf,
        status: String,
        stderr: String,
    },

    #[error("Invalid configuration in '{path}'")]
    #[diagnostic(code(xsltest::config::invalid))]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to write report: {0}")]
    #[diagnostic(code(xsltest::report))]
    Report(String),
}

impl HarnessError {
    /// Builds a [`HarnessError::MalformedXml`] pointing at `offset` in `source`.
    pub fn malformed_xml(
        name: impl AsRef<str>,
        source: &str,
        offset: usize,
        message: impl Into<String>,
    ) -> Self {
        let offset = offset.min(source.len());
        let len = usize::from(offset < source.len());
        HarnessError::MalformedXml {
            message: message.into(),
            src: NamedSource::new(name, source.to_string()),
            span: (offset, len).into(),
        }
    }

    /// Short, single-line category used in text and JSON reports.
    pub fn category(&self) -> &'static str {
        match self {
            HarnessError::Read { .. } | HarnessError::Probe { .. } | HarnessError::Walk { .. } => {
                "io"
            }
            HarnessError::MalformedXml { .. } => "malformed",
            HarnessError::EngineSpawn { .. }
            | HarnessError::EngineIo { .. }
            | HarnessError::Transform { .. } => "engine",
            HarnessError::Config { .. } => "config",
            HarnessError::Report(_) => "report",
        }
    }
}

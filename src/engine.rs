//! XSLT engine abstraction and the external `xsltproc` implementation.
//!
//! The harness never interprets stylesheets itself. It compiles one per test
//! case through an [`XsltEngine`] and applies it to the parsed input with a
//! fixed parameter set.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use tracing::{debug, instrument};

use crate::document::Document;
use crate::errors::{HarnessError, HarnessResult};

/// Name of the parameter that switches off coupled resource lookup.
pub const COUPLED_RESOURCE_LOOKUP: &str = "CoupledResourceLookUp";

/// XPath string literal passed for [`COUPLED_RESOURCE_LOOKUP`].
pub const COUPLED_RESOURCE_LOOKUP_DISABLED: &str = "'disabled'";

/// Ordered stylesheet parameters. Values are XPath expressions, so string
/// values must carry their own quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameters {
    entries: Vec<(String, String)>,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            entries: vec![(
                COUPLED_RESOURCE_LOOKUP.to_string(),
                COUPLED_RESOURCE_LOOKUP_DISABLED.to_string(),
            )],
        }
    }
}

impl Parameters {
    /// Adds or replaces a parameter. The coupled resource lookup switch is
    /// fixed and cannot be replaced.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        if name == COUPLED_RESOURCE_LOOKUP {
            return self;
        }
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

/// A transformation engine the harness can drive.
pub trait XsltEngine {
    /// A stylesheet ready to be applied.
    type Stylesheet;

    /// Short name for logs and reports.
    fn name(&self) -> &str;

    /// Loads and checks the stylesheet at `path`.
    fn compile(&self, path: &Path) -> HarnessResult<Self::Stylesheet>;

    /// Applies a compiled stylesheet to `input`.
    fn transform(
        &self,
        stylesheet: &Self::Stylesheet,
        input: &Document,
        params: &Parameters,
    ) -> HarnessResult<Document>;
}

/// A stylesheet checked for well-formedness, applied by file path.
#[derive(Debug, Clone)]
pub struct StylesheetFile {
    pub path: PathBuf,
    pub document: Document,
}

/// Runs the libxslt command line processor.
#[derive(Debug, Clone)]
pub struct XsltprocEngine {
    program: String,
}

impl Default for XsltprocEngine {
    fn default() -> Self {
        Self::new("xsltproc")
    }
}

impl XsltprocEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// True when the program can be started at all.
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
    }

    fn command(&self, stylesheet: &Path, input: &Document, params: &Parameters) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--nonet");
        // The input arrives on stdin without a base URI; let relative
        // `document()` lookups fall back to the fixture's directory.
        if let Some(dir) = input.base_dir().filter(|dir| !dir.as_os_str().is_empty()) {
            cmd.arg("--path").arg(dir);
        }
        for (name, value) in params.iter() {
            cmd.arg("--param").arg(name).arg(value);
        }
        cmd.arg(stylesheet).arg("-");
        cmd
    }
}

impl XsltEngine for XsltprocEngine {
    type Stylesheet = StylesheetFile;

    fn name(&self) -> &str {
        &self.program
    }

    fn compile(&self, path: &Path) -> HarnessResult<StylesheetFile> {
        let document = Document::from_path(path)?;
        Ok(StylesheetFile {
            path: path.to_path_buf(),
            document,
        })
    }

    #[instrument(level = "debug", skip_all, fields(stylesheet = %stylesheet.path.display()))]
    fn transform(
        &self,
        stylesheet: &StylesheetFile,
        input: &Document,
        params: &Parameters,
    ) -> HarnessResult<Document> {
        let mut child = self
            .command(&stylesheet.path, input, params)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| HarnessError::EngineSpawn {
                program: self.program.clone(),
                source,
            })?;
        let pipe_error = |source| HarnessError::EngineIo {
            program: self.program.clone(),
            source,
        };

        // The engine may exit before reading all of its input (a stylesheet it
        // rejects, say), so stdin is fed from its own thread while stdout and
        // stderr are drained here.
        let stdin = child.stdin.take();
        let input = input.to_xml().into_bytes();
        let writer = thread::spawn(move || match stdin {
            Some(mut stdin) => stdin.write_all(&input),
            None => Ok(()),
        });
        let output = child.wait_with_output().map_err(pipe_error)?;
        let written = writer
            .join()
            .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked")));
        debug!(status = %output.status, bytes = output.stdout.len(), "engine finished");

        if !output.status.success() {
            return Err(HarnessError::Transform {
                stylesheet: stylesheet.path.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if let Err(e) = written {
            if e.kind() != io::ErrorKind::BrokenPipe {
                return Err(pipe_error(e));
            }
        }

        let name = format!("{} output", stylesheet.path.display());
        Document::parse_str(&name, &String::from_utf8_lossy(&output.stdout))
    }
}

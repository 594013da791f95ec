//! Harness configuration.
//!
//! A run is rooted at one directory. Layout and engine settings come from
//! defaults, then an optional `xsltest.yaml` in the root, then CLI overrides.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::engine::{Parameters, XsltprocEngine};
use crate::errors::{HarnessError, HarnessResult};

/// File looked up in the root directory.
pub const CONFIG_FILE_NAME: &str = "xsltest.yaml";

pub const DEFAULT_XSLT_DIR: &str = "xslt";
pub const DEFAULT_TEST_DIR: &str = "test";
pub const DEFAULT_ENGINE: &str = "xsltproc";

/// Everything a run needs to know about where things live.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub root: PathBuf,
    /// Stylesheet directory, relative to `root` unless absolute.
    pub xslt_dir: PathBuf,
    /// Fixture directory, relative to `root` unless absolute.
    pub test_dir: PathBuf,
    pub engine_program: String,
    /// Extra stylesheet parameters on top of the fixed ones.
    pub params: BTreeMap<String, String>,
    pub use_colors: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

/// On-disk shape of `xsltest.yaml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    xslt_dir: Option<PathBuf>,
    test_dir: Option<PathBuf>,
    #[serde(default)]
    engine: EngineSection,
    #[serde(default)]
    params: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct EngineSection {
    program: Option<String>,
}

impl HarnessConfig {
    /// Defaults rooted at `root`, without reading any file.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            xslt_dir: PathBuf::from(DEFAULT_XSLT_DIR),
            test_dir: PathBuf::from(DEFAULT_TEST_DIR),
            engine_program: DEFAULT_ENGINE.to_string(),
            params: BTreeMap::new(),
            use_colors: atty::is(atty::Stream::Stdout),
        }
    }

    /// Defaults rooted at `root`, overlaid with `root/xsltest.yaml` if present.
    pub fn load(root: impl Into<PathBuf>) -> HarnessResult<Self> {
        let mut config = Self::new(root);
        let path = config.root.join(CONFIG_FILE_NAME);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(config),
            Err(source) => return Err(HarnessError::Read { path, source }),
        };
        debug!(path = %path.display(), "loading configuration");
        config.apply_yaml(&path, &content)?;
        Ok(config)
    }

    fn apply_yaml(&mut self, path: &Path, content: &str) -> HarnessResult<()> {
        // An empty file deserializes to unit, not to a mapping.
        if content.trim().is_empty() {
            return Ok(());
        }
        let file: ConfigFile =
            serde_yaml::from_str(content).map_err(|source| HarnessError::Config {
                path: path.to_path_buf(),
                source,
            })?;
        if let Some(dir) = file.xslt_dir {
            self.xslt_dir = dir;
        }
        if let Some(dir) = file.test_dir {
            self.test_dir = dir;
        }
        if let Some(program) = file.engine.program {
            self.engine_program = program;
        }
        self.params.extend(file.params);
        Ok(())
    }

    pub fn stylesheet_dir(&self) -> PathBuf {
        self.root.join(&self.xslt_dir)
    }

    pub fn fixture_dir(&self) -> PathBuf {
        self.root.join(&self.test_dir)
    }

    /// Path of the stylesheet named `xslt_name`.
    pub fn stylesheet_path(&self, xslt_name: &str) -> PathBuf {
        self.stylesheet_dir().join(format!("{}.xsl", xslt_name))
    }

    /// Path of a fixture file; `role` is `input` or `expected`.
    pub fn fixture_path(&self, xslt_name: &str, test_name: &str, role: &str) -> PathBuf {
        self.fixture_dir()
            .join(format!("{}--{}--{}.xml", xslt_name, test_name, role))
    }

    /// Fixed parameters plus the configured ones.
    pub fn parameters(&self) -> Parameters {
        let mut params = Parameters::default();
        for (name, value) in &self.params {
            params.set(name.clone(), value.clone());
        }
        params
    }

    pub fn engine(&self) -> XsltprocEngine {
        XsltprocEngine::new(self.engine_program.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_naming_convention() {
        let config = HarnessConfig::new("/suite");
        assert_eq!(
            config.stylesheet_path("report"),
            PathBuf::from("/suite/xslt/report.xsl")
        );
        assert_eq!(
            config.fixture_path("report", "basic", "input"),
            PathBuf::from("/suite/test/report--basic--input.xml")
        );
    }

    #[test]
    fn yaml_overrides_defaults() {
        let mut config = HarnessConfig::new("/suite");
        let yaml = "xslt_dir: sheets\nengine:\n  program: /opt/bin/xsltproc\nparams:\n  lang: \"'en'\"\n";
        config
            .apply_yaml(Path::new("xsltest.yaml"), yaml)
            .unwrap();
        assert_eq!(config.stylesheet_dir(), PathBuf::from("/suite/sheets"));
        assert_eq!(config.fixture_dir(), PathBuf::from("/suite/test"));
        assert_eq!(config.engine_program, "/opt/bin/xsltproc");
        assert_eq!(config.parameters().get("lang"), Some("'en'"));
        assert_eq!(
            config.parameters().get(crate::engine::COUPLED_RESOURCE_LOOKUP),
            Some("'disabled'")
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut config = HarnessConfig::new("/suite");
        let err = config
            .apply_yaml(Path::new("xsltest.yaml"), "xsl_dir: typo\n")
            .unwrap_err();
        assert!(matches!(err, HarnessError::Config { .. }));
    }

    #[test]
    fn empty_file_keeps_defaults() {
        let mut config = HarnessConfig::new("/suite");
        config.apply_yaml(Path::new("xsltest.yaml"), "\n").unwrap();
        assert_eq!(config.xslt_dir, PathBuf::from(DEFAULT_XSLT_DIR));
    }
}

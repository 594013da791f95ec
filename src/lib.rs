//! xsltest: a fixture-driven test harness for XSLT stylesheets.
//!
//! Stylesheets live in `<root>/xslt/<name>.xsl`; fixtures in
//! `<root>/test/<name>--<case>--input.xml` and `--expected.xml`. Every case
//! is transformed with an external engine and compared to the expected
//! document after canonical pretty-printing.

pub use crate::errors::{HarnessError, HarnessResult};

pub mod canonical;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod document;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod runner;

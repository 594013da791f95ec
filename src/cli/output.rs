//! Handles all user-facing output for the CLI.
//!
//! Reports go to the stream passed in, so the same code prints to a terminal
//! and into a buffer in tests.

use std::io::{self, Write};

use serde::Serialize;
use termcolor::{Color, ColorSpec, WriteColor};

use crate::canonical::{LineTag, TextDiff};
use crate::runner::{TestResult, TestSummary};

// ============================================================================
// TEXT REPORT
// ============================================================================

/// Writes one line per result, failure details, and the summary.
pub fn write_report<W: WriteColor>(out: &mut W, results: &[TestResult]) -> io::Result<()> {
    for result in results {
        write_result(out, result)?;
    }
    let summary = TestSummary::from_results(results);
    writeln!(out)?;
    write_summary(out, &summary)?;

    if summary.has_failures() {
        writeln!(out, "\nFailed tests:")?;
        for result in results.iter().filter(|r| r.is_failure()) {
            writeln!(out, "  - {}", result.id())?;
        }
    }
    Ok(())
}

pub fn write_result<W: WriteColor>(out: &mut W, result: &TestResult) -> io::Result<()> {
    match result {
        TestResult::Pass { id } => {
            write_tag(out, "PASS", Color::Green)?;
            writeln!(out, " {}", id)
        }
        TestResult::Fail { id, label, diff } => {
            write_tag(out, "FAIL", Color::Red)?;
            writeln!(out, " {}", id)?;
            write_diff(out, diff)?;
            writeln!(out, "  {}", label)
        }
        TestResult::Error {
            id,
            category,
            error,
        } => {
            write_tag(out, "ERROR", Color::Magenta)?;
            writeln!(out, " {} ({})", id, category)?;
            for line in error.lines() {
                writeln!(out, "  {}", line)?;
            }
            Ok(())
        }
        TestResult::Skipped { id, reason } => {
            write_tag(out, "SKIP", Color::Yellow)?;
            writeln!(out, " {} ({})", id, reason)
        }
    }
}

/// Writes an annotated diff, removed lines red and added lines green.
pub fn write_diff<W: WriteColor>(out: &mut W, diff: &TextDiff) -> io::Result<()> {
    for line in &diff.lines {
        match line.tag {
            LineTag::Same => out.reset()?,
            LineTag::Removed => out.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?,
            LineTag::Added => out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?,
        }
        write!(out, "{}{}", line.tag.marker(), line.text)?;
        out.reset()?;
        writeln!(out)?;
    }
    Ok(())
}

pub fn write_summary<W: WriteColor>(out: &mut W, summary: &TestSummary) -> io::Result<()> {
    writeln!(
        out,
        "Test summary: total {}, passed {}, failed {}, errored {}, skipped {}",
        summary.total(),
        summary.passed,
        summary.failed,
        summary.errored,
        summary.skipped
    )
}

fn write_tag<W: WriteColor>(out: &mut W, tag: &str, color: Color) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    write!(out, "{}", tag)?;
    out.reset()
}

// ============================================================================
// JSON REPORT
// ============================================================================

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: TestSummary,
    results: &'a [TestResult],
}

pub fn write_json<W: Write>(out: &mut W, results: &[TestResult]) -> serde_json::Result<()> {
    let report = JsonReport {
        summary: TestSummary::from_results(results),
        results,
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out).map_err(serde_json::Error::io)
}

//! Destinations for report lines.
//!
//! The comparator never opens a log itself; it writes each line to a
//! [`ReportSink`] supplied by the caller.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{CompareError, Result};

/// Receives complete report lines, without trailing newline.
pub trait ReportSink {
    fn write_line(&mut self, line: &str) -> Result<()>;
}

impl<S: ReportSink + ?Sized> ReportSink for &mut S {
    fn write_line(&mut self, line: &str) -> Result<()> {
        (**self).write_line(line)
    }
}

impl<S: ReportSink + ?Sized> ReportSink for Box<S> {
    fn write_line(&mut self, line: &str) -> Result<()> {
        (**self).write_line(line)
    }
}

/// Append-only text log shared by every comparison in a run.
///
/// The file is opened in append mode and closed again for every line, and
/// each line (newline included) goes out in a single `write_all`, so runs
/// appending to the same log interleave whole lines only. No locking is
/// done; this relies on a single writer at a time.
#[derive(Debug, Clone)]
pub struct LogFileSink {
    path: PathBuf,
}

impl LogFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportSink for LogFileSink {
    fn write_line(&mut self, line: &str) -> Result<()> {
        let report_err = |source| CompareError::Report {
            path: self.path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(report_err)?;

        let mut buffer = String::with_capacity(line.len() + 1);
        buffer.push_str(line);
        buffer.push('\n');
        file.write_all(buffer.as_bytes()).map_err(report_err)?;
        file.flush().map_err(report_err)
    }
}

/// Prints each line to stdout for the operator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl ReportSink for ConsoleSink {
    fn write_line(&mut self, line: &str) -> Result<()> {
        println!("{}", line);
        Ok(())
    }
}

/// Collects lines in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Vec<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

impl ReportSink for MemorySink {
    fn write_line(&mut self, line: &str) -> Result<()> {
        self.lines.push(line.to_string());
        Ok(())
    }
}

/// Writes every line to each inner sink in order, stopping at the first error.
#[derive(Default)]
pub struct TeeSink<'a> {
    sinks: Vec<Box<dyn ReportSink + 'a>>,
}

impl<'a> TeeSink<'a> {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with(mut self, sink: impl ReportSink + 'a) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl ReportSink for TeeSink<'_> {
    fn write_line(&mut self, line: &str) -> Result<()> {
        for sink in &mut self.sinks {
            sink.write_line(line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_appends_across_sinks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("comparison_results.txt");
        std::fs::write(&path, "earlier run\n").unwrap();

        let mut first = LogFileSink::new(&path);
        first.write_line("Data of variable 'a' differs.").unwrap();
        let mut second = LogFileSink::new(&path);
        second.write_line("Data of variable 'b' differs.").unwrap();
        first.write_line("Global attribute 'c' differs.").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "earlier run\n\
             Data of variable 'a' differs.\n\
             Data of variable 'b' differs.\n\
             Global attribute 'c' differs.\n"
        );
    }

    #[test]
    fn test_log_file_in_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = LogFileSink::new(dir.path().join("missing/log.txt"));
        assert!(matches!(
            sink.write_line("x"),
            Err(CompareError::Report { .. })
        ));
    }

    #[test]
    fn test_tee_writes_to_every_sink() {
        let mut a = MemorySink::new();
        let mut b = MemorySink::new();
        {
            let mut tee = TeeSink::new().with(&mut a).with(&mut b);
            tee.write_line("one").unwrap();
            tee.write_line("two").unwrap();
        }
        assert_eq!(a.lines(), &["one".to_string(), "two".to_string()]);
        assert_eq!(a.lines(), b.lines());
    }
}

use crate::output::{OutputError, OutputResult};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// A destination for result lines
pub trait ResultSink: Send {
    /// Name used in diagnostics
    fn name(&self) -> &str;

    /// Writes one result followed by a newline
    fn write_result(&mut self, result: &str) -> OutputResult<()>;

    /// Flushes buffered output at end-of-stream
    fn finish(&mut self) -> OutputResult<()>;
}

/// Sink backed by any [`Write`] implementation
pub struct WriterSink<W> {
    name: String,
    writer: W,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(name: impl Into<String>, writer: W) -> Self {
        Self {
            name: name.into(),
            writer,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_error(&self, source: io::Error) -> OutputError {
        OutputError::Write {
            sink: self.name.clone(),
            source,
        }
    }
}

impl WriterSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new("stdout", io::stdout())
    }
}

impl<W: Write + Send> ResultSink for WriterSink<W> {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_result(&mut self, result: &str) -> OutputResult<()> {
        writeln!(self.writer, "{}", result).map_err(|e| self.write_error(e))
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.writer.flush().map_err(|e| self.write_error(e))
    }
}

/// Opens a file for appending results, creating it if needed
pub fn open_append(path: &Path) -> OutputResult<WriterSink<BufWriter<File>>> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| OutputError::Open {
            path: path.display().to_string(),
            source,
        })?;

    Ok(WriterSink::new(
        path.display().to_string(),
        BufWriter::new(file),
    ))
}

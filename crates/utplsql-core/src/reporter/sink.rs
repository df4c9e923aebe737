//! Output sinks and the per-reporter drain.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;
use utplsql_session::{DatabaseSession, OutputChannel};

use super::{OutputBuffer, ReportRequest, ReporterHandle, SinkTarget};
use crate::error::{DrainError, SinkError};
use crate::obs;

/// Process console. Flushed after a drain, never closed.
#[derive(Debug, Clone, Default)]
pub enum Console {
    #[default]
    Stdout,
    /// Shared in-memory buffer, for embedding and tests.
    Captured(Arc<Mutex<Vec<u8>>>),
}

impl Console {
    pub fn captured() -> Self {
        Console::Captured(Arc::new(Mutex::new(Vec::new())))
    }

    /// Bytes written so far. Always empty for stdout.
    pub fn contents(&self) -> Vec<u8> {
        match self {
            Console::Stdout => Vec::new(),
            Console::Captured(buffer) => buffer.lock().map(|b| b.clone()).unwrap_or_default(),
        }
    }

    fn write_all(&self, bytes: &[u8]) -> io::Result<()> {
        match self {
            Console::Stdout => io::stdout().lock().write_all(bytes),
            Console::Captured(buffer) => buffer
                .lock()
                .map_err(|_| io::Error::new(io::ErrorKind::Other, "console buffer poisoned"))?
                .write_all(bytes),
        }
    }

    fn flush(&self) -> io::Result<()> {
        match self {
            Console::Stdout => io::stdout().lock().flush(),
            Console::Captured(_) => Ok(()),
        }
    }
}

/// One destination for a reporter's lines.
#[derive(Debug)]
pub enum Sink {
    Console(Console),
    File { path: PathBuf, writer: BufWriter<File> },
}

impl Sink {
    /// Create (or truncate) a report file, creating missing parent directories.
    pub fn open_file(path: &Path) -> Result<Self, SinkError> {
        let open_err = |source| SinkError::Open {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                debug!(directory = %parent.display(), "creating report directory");
                fs::create_dir_all(parent).map_err(open_err)?;
            }
        }
        let file = File::create(path).map_err(open_err)?;
        Ok(Sink::File {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    pub fn target(&self) -> SinkTarget {
        match self {
            Sink::Console(_) => SinkTarget::Console,
            Sink::File { path, .. } => SinkTarget::File { path: path.clone() },
        }
    }

    pub fn write_line(&mut self, line: &str) -> Result<(), SinkError> {
        let mut bytes = Vec::with_capacity(line.len() + 1);
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(b'\n');
        let written = match self {
            Sink::Console(console) => console.write_all(&bytes),
            Sink::File { writer, .. } => writer.write_all(&bytes),
        };
        written.map_err(|source| self.write_error(source))
    }

    pub fn flush(&mut self) -> Result<(), SinkError> {
        let flushed = match self {
            Sink::Console(console) => console.flush(),
            Sink::File { writer, .. } => writer.flush(),
        };
        flushed.map_err(|source| self.write_error(source))
    }

    /// Flush and release. Files are closed; the console stays open.
    pub fn close(mut self) -> Result<(), SinkError> {
        self.flush()?;
        if let Sink::File { writer, path } = self {
            let file = writer.into_inner().map_err(|e| SinkError::Write {
                target: path.display().to_string(),
                source: e.into_error(),
            })?;
            file.sync_all().map_err(|source| SinkError::Write {
                target: path.display().to_string(),
                source,
            })?;
        }
        Ok(())
    }

    fn write_error(&self, source: io::Error) -> SinkError {
        SinkError::Write {
            target: self.target().to_string(),
            source,
        }
    }
}

/// What one successful drain produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainSummary {
    pub reporter: String,
    pub channel: OutputChannel,
    pub targets: Vec<SinkTarget>,
    pub lines: usize,
}

/// Drains reporters into their configured sinks.
#[derive(Debug, Clone)]
pub struct SinkWriter {
    target_dir: PathBuf,
    console: Console,
}

impl SinkWriter {
    pub fn new(target_dir: impl Into<PathBuf>, console: Console) -> Self {
        Self {
            target_dir: target_dir.into(),
            console,
        }
    }

    /// Drain one reporter. Every sink sees the same lines in the same order.
    ///
    /// File sinks are closed before this returns, on success and on failure.
    pub async fn write(
        &self,
        session: &dyn DatabaseSession,
        handle: &ReporterHandle,
    ) -> Result<DrainSummary, DrainError> {
        self.drain(session, handle)
            .await
            .map_err(|source| DrainError {
                reporter: handle.name().to_string(),
                source,
            })
    }

    async fn drain(
        &self,
        session: &dyn DatabaseSession,
        handle: &ReporterHandle,
    ) -> Result<DrainSummary, SinkError> {
        let version = session.framework_version().await?;
        let buffer = OutputBuffer::compatible(&version, &handle.reporter);

        let mut sinks = self.open_sinks(&handle.request)?;
        let printed = buffer.print_available(session, &mut sinks).await;

        let targets: Vec<SinkTarget> = sinks.iter().map(Sink::target).collect();
        let mut closed = Ok(());
        for sink in sinks {
            if let Err(e) = sink.close() {
                if closed.is_ok() {
                    closed = Err(e);
                }
            }
        }
        let lines = printed?;
        closed?;

        obs::emit_reporter_drained(handle.name(), lines, targets.len());
        Ok(DrainSummary {
            reporter: handle.name().to_string(),
            channel: buffer.channel(),
            targets,
            lines,
        })
    }

    fn open_sinks(&self, request: &ReportRequest) -> Result<Vec<Sink>, SinkError> {
        let mut sinks = Vec::new();
        if let Some(path) = request.output_path(&self.target_dir) {
            sinks.push(Sink::open_file(&path)?);
            obs::emit_file_sink_opened(&request.name, &path);
        }
        if request.effective_console_output() {
            sinks.push(Sink::Console(self.console.clone()));
            obs::emit_console_sink_opened(&request.name);
        }
        Ok(sinks)
    }
}

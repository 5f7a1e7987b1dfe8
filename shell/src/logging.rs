use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::mem;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::writer::MakeWriter;

/// Where formatted log events go.
///
/// Stdout is reserved for query output, so events go to stderr and, with `--log`, are
/// also appended to a file shared by every event writer.
#[derive(Clone, Default)]
pub(crate) struct LogSink {
    stderr: bool,
    file: Option<Arc<Mutex<File>>>,
}

impl LogSink {
    /// Sink for the shell: stderr, plus the log file at `path` when given.
    pub(crate) fn open(path: Option<&Path>) -> io::Result<Self> {
        let sink = Self {
            stderr: true,
            file: None,
        };
        match path {
            Some(path) => sink.append_to(path),
            None => Ok(sink),
        }
    }

    /// Also append events to `path`, creating it if needed. Earlier runs are kept.
    pub(crate) fn append_to(mut self, path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        self.file = Some(Arc::new(Mutex::new(file)));
        Ok(self)
    }

    fn emit(&self, line: &[u8]) -> io::Result<()> {
        if self.stderr {
            io::stderr().lock().write_all(line)?;
        }
        if let Some(file) = &self.file {
            let mut file = file.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            file.write_all(line)?;
            file.flush()?;
        }
        Ok(())
    }
}

/// Collects one formatted event and hands it to the sink in a single write when dropped,
/// so lines from concurrent events never interleave.
pub(crate) struct EventLine {
    sink: LogSink,
    buf: Vec<u8>,
}

impl EventLine {
    fn deliver(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let line = mem::take(&mut self.buf);
        self.sink.emit(&line)
    }
}

impl<'a> MakeWriter<'a> for LogSink {
    type Writer = EventLine;

    fn make_writer(&'a self) -> Self::Writer {
        EventLine {
            sink: self.clone(),
            buf: Vec::with_capacity(256),
        }
    }
}

impl Write for EventLine {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.deliver()
    }
}

impl Drop for EventLine {
    fn drop(&mut self) {
        // Nowhere left to report a failed log write.
        let _ = self.deliver();
    }
}

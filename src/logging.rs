use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use tracing_subscriber::fmt::MakeWriter;

use crate::platform::{NativePlatform, Platform};

/// Log lines go to stderr so command output on stdout stays pipeable,
/// and are mirrored into the console log file when one is configured.
#[derive(Clone)]
pub(crate) struct ConsoleMakeWriter {
    pub file: Option<Arc<Mutex<File>>>,
    pub suppress_stderr: bool,
}

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter {
            file: self.file.clone(),
            suppress_stderr: self.suppress_stderr,
        }
    }
}

pub(crate) struct ConsoleWriter {
    file: Option<Arc<Mutex<File>>>,
    suppress_stderr: bool,
}

impl Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Some(file) = &self.file {
            let mut file = file.lock().unwrap_or_else(|e| e.into_inner());
            file.write_all(buf)?;
        }
        if !self.suppress_stderr {
            std::io::stderr().write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if let Some(file) = &self.file {
            file.lock().unwrap_or_else(|e| e.into_inner()).flush()?;
        }
        if !self.suppress_stderr {
            std::io::stderr().flush()?;
        }
        Ok(())
    }
}

pub fn parse_level(value: &str) -> Level {
    match value.trim().to_ascii_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored by `tracing`. Without `echo_stderr` the log file is the only
/// sink, unless there is no file to write to.
pub fn init_logging(level: Level, log_file: Option<&Path>, echo_stderr: bool) {
    let file = log_file.and_then(|path| {
        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return None;
            }
            NativePlatform::restrict_dir_permissions(parent);
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
            .map(|f| Arc::new(Mutex::new(f)))
    });

    let make_writer = ConsoleMakeWriter {
        suppress_stderr: !echo_stderr && file.is_some(),
        file,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(make_writer)
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

//! Rolling Logger
//!
//! File logger with size-based rotation and an in-memory circular buffer
//! of the most recent lines.
//!
//! `init_logger` installs a global `tracing` subscriber. Records emitted
//! through the `log` facade are bridged into it, so backend code can use
//! either API.

use std::collections::VecDeque;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Rotate once the active file grows past this many bytes
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;
/// Rotated files kept next to the active one (`app.log.1` .. `app.log.N`)
pub const DEFAULT_MAX_FILES: usize = 3;
/// Lines kept in memory for `recent_lines`
pub const DEFAULT_BUFFER_LINES: usize = 500;

static LOGGER: OnceLock<Arc<Shared>> = OnceLock::new();

// ========================
// Rolling file
// ========================

/// Append-only log file that rotates when it exceeds `max_size`
pub struct RollingFile {
    dir: PathBuf,
    base_name: String,
    max_size: u64,
    max_files: usize,
    file: Option<File>,
    written: u64,
}

impl RollingFile {
    pub fn open(dir: &Path, app_name: &str, max_size: u64, max_files: usize) -> io::Result<Self> {
        let mut rolling = Self {
            dir: dir.to_path_buf(),
            base_name: format!("{}.log", app_name),
            max_size,
            max_files,
            file: None,
            written: 0,
        };
        rolling.reopen()?;
        Ok(rolling)
    }

    /// Path of the active log file
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.base_name)
    }

    fn rotated_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{}.{}", self.base_name, index))
    }

    fn reopen(&mut self) -> io::Result<()> {
        let path = self.path();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        self.written = file.metadata().map(|m| m.len()).unwrap_or(0);
        self.file = Some(file);
        Ok(())
    }

    fn rotate(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
        }

        if self.max_files == 0 {
            fs::remove_file(self.path())?;
            return self.reopen();
        }

        let oldest = self.rotated_path(self.max_files);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for index in (1..self.max_files).rev() {
            let from = self.rotated_path(index);
            if from.exists() {
                fs::rename(&from, self.rotated_path(index + 1))?;
            }
        }
        fs::rename(self.path(), self.rotated_path(1))?;
        self.reopen()
    }
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_size {
            self.rotate()?;
        }
        let file = match self.file.as_mut() {
            Some(file) => file,
            None => return Err(io::Error::new(io::ErrorKind::Other, "log file closed")),
        };
        let n = file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

// ========================
// Circular buffer
// ========================

/// Fixed-capacity buffer of log lines; the oldest line is dropped first
#[derive(Debug)]
pub struct LogBuffer {
    lines: VecDeque<String>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, line: String) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// Last `n` lines, oldest first
    pub fn recent(&self, n: usize) -> Vec<String> {
        let skip = self.lines.len().saturating_sub(n);
        self.lines.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// ========================
// Subscriber plumbing
// ========================

struct Shared {
    file: Mutex<RollingFile>,
    buffer: Mutex<LogBuffer>,
}

impl Shared {
    fn new(file: RollingFile, buffer_lines: usize) -> Self {
        Self {
            file: Mutex::new(file),
            buffer: Mutex::new(LogBuffer::new(buffer_lines)),
        }
    }

    fn write_record(&self, buf: &[u8]) -> io::Result<()> {
        {
            let mut file = self
                .file
                .lock()
                .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))?;
            file.write_all(buf)?;
        }

        if let Ok(mut buffer) = self.buffer.lock() {
            for line in String::from_utf8_lossy(buf).lines() {
                if !line.trim().is_empty() {
                    buffer.push(line.to_string());
                }
            }
        }
        Ok(())
    }
}

/// `MakeWriter` handing out cheap handles to the shared file + buffer
#[derive(Clone)]
struct SharedWriter(Arc<Shared>);

impl Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write_record(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.0.file.lock() {
            Ok(mut file) => file.flush(),
            Err(_) => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for SharedWriter {
    type Writer = SharedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Local wall-clock timestamps, millisecond precision
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

// ========================
// Public API
// ========================

/// Initialize the global logger, writing to `<log_dir>/<app_name>.log`
///
/// Can only succeed once per process.
pub fn init_logger(log_dir: impl AsRef<Path>, app_name: &str) -> Result<(), String> {
    let log_dir = log_dir.as_ref();
    fs::create_dir_all(log_dir).map_err(|e| format!("Failed to create log dir: {}", e))?;

    let file = RollingFile::open(log_dir, app_name, DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_FILES)
        .map_err(|e| format!("Failed to open log file: {}", e))?;
    let shared = Arc::new(Shared::new(file, DEFAULT_BUFFER_LINES));

    if LOGGER.set(shared.clone()).is_err() {
        return Err("Logger already initialized".to_string());
    }

    tracing_subscriber::registry()
        .with(LevelFilter::INFO)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_timer(LocalTimer)
                .with_writer(SharedWriter(shared)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init()
        .map_err(|e| format!("Failed to install subscriber: {}", e))?;

    Ok(())
}

/// Emit a message at the given level
pub fn write(level: log::Level, msg: &str) -> Result<(), String> {
    if LOGGER.get().is_none() {
        return Err("Logger not initialized".to_string());
    }
    match level {
        log::Level::Error => tracing::error!("{}", msg),
        log::Level::Warn => tracing::warn!("{}", msg),
        log::Level::Info => tracing::info!("{}", msg),
        log::Level::Debug => tracing::debug!("{}", msg),
        log::Level::Trace => tracing::trace!("{}", msg),
    }
    Ok(())
}

pub fn info(msg: &str) -> Result<(), String> {
    write(log::Level::Info, msg)
}

pub fn warn(msg: &str) -> Result<(), String> {
    write(log::Level::Warn, msg)
}

pub fn error(msg: &str) -> Result<(), String> {
    write(log::Level::Error, msg)
}

/// The last `n` lines written since `init_logger`, oldest first
pub fn recent_lines(n: usize) -> Vec<String> {
    LOGGER
        .get()
        .and_then(|shared| shared.buffer.lock().ok().map(|buffer| buffer.recent(n)))
        .unwrap_or_default()
}

/// Path of the active log file, if initialized
pub fn log_file_path() -> Option<PathBuf> {
    LOGGER
        .get()
        .and_then(|shared| shared.file.lock().ok().map(|file| file.path()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_drops_oldest() {
        let mut buffer = LogBuffer::new(2);
        buffer.push("a".to_string());
        buffer.push("b".to_string());
        buffer.push("c".to_string());

        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.recent(10), vec!["b".to_string(), "c".to_string()]);
        assert_eq!(buffer.recent(1), vec!["c".to_string()]);
    }

    #[test]
    fn test_zero_capacity_buffer_stays_empty() {
        let mut buffer = LogBuffer::new(0);
        buffer.push("ignored".to_string());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_rolling_file_rotates() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = RollingFile::open(dir.path(), "Test", 16, 2).unwrap();

        file.write_all(b"0123456789\n").unwrap();
        file.write_all(b"abcdefghij\n").unwrap();
        file.write_all(b"ABCDEFGHIJ\n").unwrap();
        file.flush().unwrap();

        let active = fs::read_to_string(dir.path().join("Test.log")).unwrap();
        let first = fs::read_to_string(dir.path().join("Test.log.1")).unwrap();
        let second = fs::read_to_string(dir.path().join("Test.log.2")).unwrap();

        assert_eq!(active, "ABCDEFGHIJ\n");
        assert_eq!(first, "abcdefghij\n");
        assert_eq!(second, "0123456789\n");
    }

    #[test]
    fn test_rolling_file_drops_beyond_max_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = RollingFile::open(dir.path(), "Test", 4, 1).unwrap();

        file.write_all(b"one\n").unwrap();
        file.write_all(b"two\n").unwrap();
        file.write_all(b"six\n").unwrap();

        assert!(!dir.path().join("Test.log.2").exists());
        let first = fs::read_to_string(dir.path().join("Test.log.1")).unwrap();
        assert_eq!(first, "two\n");
    }

    #[test]
    fn test_shared_writer_feeds_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let file = RollingFile::open(dir.path(), "Shared", DEFAULT_MAX_FILE_SIZE, 1).unwrap();
        let mut writer = SharedWriter(Arc::new(Shared::new(file, 8)));

        writer.write_all(b"first line\nsecond line\n\n").unwrap();

        let lines = writer.0.buffer.lock().unwrap().recent(8);
        assert_eq!(lines, vec!["first line".to_string(), "second line".to_string()]);
        let on_disk = fs::read_to_string(dir.path().join("Shared.log")).unwrap();
        assert!(on_disk.contains("second line"));
    }

    #[test]
    fn test_init_logger_once() {
        let dir = tempfile::tempdir().unwrap();
        init_logger(dir.path(), "Once").unwrap();

        info("logger ready").unwrap();
        log::warn!("bridged from log");

        let lines = recent_lines(50);
        assert!(lines.iter().any(|l| l.contains("logger ready")));
        assert!(lines.iter().any(|l| l.contains("bridged from log")));
        assert_eq!(log_file_path(), Some(dir.path().join("Once.log")));

        assert!(init_logger(dir.path(), "Twice").is_err());
    }
}

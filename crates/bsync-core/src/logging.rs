//! Logging init: append to a file under the XDG state dir, falling back to
//! stderr when the file cannot be opened or cloned.

use anyhow::Result;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,bsync=debug";

/// Where log records end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    File(PathBuf),
    Stderr,
}

enum FileOrStderr {
    File(fs::File),
    Stderr,
}

impl io::Write for FileOrStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            FileOrStderr::File(f) => f.write(buf),
            FileOrStderr::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            FileOrStderr::File(f) => f.flush(),
            FileOrStderr::Stderr => io::stderr().lock().flush(),
        }
    }
}

struct SharedFile(fs::File);

impl<'a> MakeWriter<'a> for SharedFile {
    type Writer = FileOrStderr;

    fn make_writer(&'a self) -> Self::Writer {
        self.0
            .try_clone()
            .map(FileOrStderr::File)
            .unwrap_or(FileOrStderr::Stderr)
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Default log file: `~/.local/state/bsync/bsync.log`.
pub fn default_log_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("bsync")?;
    Ok(xdg_dirs.get_state_home().join("bsync").join("bsync.log"))
}

/// Open (append) the log file at `path`, creating parent directories.
fn open_log_file(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(fs::OpenOptions::new().create(true).append(true).open(path)?)
}

/// Initialize structured logging to the default log file, or to stderr if the
/// file cannot be opened. Returns where records go.
pub fn init_logging() -> LogTarget {
    let opened = default_log_path().and_then(|path| open_log_file(&path).map(|f| (path, f)));
    match opened {
        Ok((path, file)) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(BoxMakeWriter::new(SharedFile(file)))
                .with_ansi(false)
                .init();
            tracing::info!("bsync logging initialized at {}", path.display());
            LogTarget::File(path)
        }
        Err(err) => {
            init_logging_stderr();
            tracing::warn!("log file unavailable ({:#}); logging to stderr", err);
            LogTarget::Stderr
        }
    }
}

/// Initialize logging to stderr only.
pub fn init_logging_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

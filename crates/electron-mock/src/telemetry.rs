//! Logging setup and the spans that tie log lines to sessions and mocks.

use std::io::IsTerminal;
use std::path::Path;
use std::path::PathBuf;

use electron_mock_ipc::MockTarget;
use tracing::Span;
use tracing::debug_span;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

const LOG_FILE_ENV: &str = "ELECTRON_MOCK_LOG";

/// Keeps the file writer alive; drop it last.
#[derive(Debug)]
pub struct TelemetryGuard {
    _guard: Option<WorkerGuard>,
    log_file_error: Option<String>,
}

impl TelemetryGuard {
    /// Why the requested log file could not be used, if it could not.
    pub fn log_file_error(&self) -> Option<&str> {
        self.log_file_error.as_deref()
    }
}

/// Installs the global subscriber; `RUST_LOG` overrides `default_level`.
///
/// Logs go to stderr unless `ELECTRON_MOCK_LOG` names a file. Calling this
/// more than once is harmless: later calls keep the first subscriber.
pub fn init_tracing(default_level: &str) -> TelemetryGuard {
    init_tracing_to(default_level, log_file_path_from_env().as_deref())
}

/// Like [`init_tracing`], with the log file given explicitly.
pub fn init_tracing_to(default_level: &str, log_file: Option<&Path>) -> TelemetryGuard {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (writer, guard, log_file_error) = match log_file {
        Some(path) => match open_log_file(path) {
            Ok((writer, guard)) => (writer, Some(guard), None),
            Err(err) => (
                BoxMakeWriter::new(std::io::stderr),
                None,
                Some(format!("failed to open log file {}: {}", path.display(), err)),
            ),
        },
        None => (BoxMakeWriter::new(std::io::stderr), None, None),
    };

    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_ansi(log_file.is_none() && std::io::stderr().is_terminal())
        .with_writer(writer)
        .try_init()
        .is_ok();

    // Reported only now, so it reaches whichever subscriber is in place.
    if let Some(message) = &log_file_error {
        tracing::warn!("{}, logging to stderr", message);
        if !installed {
            eprintln!("Warning: {}", message);
        }
    }

    TelemetryGuard {
        _guard: if installed { guard } else { None },
        log_file_error,
    }
}

fn open_log_file(path: &Path) -> std::io::Result<(BoxMakeWriter, WorkerGuard)> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file);
    Ok((BoxMakeWriter::new(non_blocking), guard))
}

fn log_file_path_from_env() -> Option<PathBuf> {
    std::env::var(LOG_FILE_ENV).ok().map(PathBuf::from)
}

/// Span for everything one attached session does.
pub fn session_span(session: u64) -> Span {
    debug_span!("electron_session", session)
}

/// Span for one remote operation on a mock.
pub fn mock_span(session: u64, target: &MockTarget, operation: &'static str) -> Span {
    debug_span!(
        "mock_op",
        session,
        mock = %target.label(),
        operation
    )
}

/// Span for one forwarded API call.
pub fn api_span(session: u64, command: &str, method: &str) -> Span {
    debug_span!("api_call", session, command, method)
}

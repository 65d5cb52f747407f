use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// Initialise logging. Without debug logging the level is fixed at `info`;
/// with it the default is `debug` and `RUST_LOG` may override it.
///
/// When `log_file` is given, output goes to that file instead of stdout.
pub fn init(debug: bool, log_file: Option<PathBuf>) {
    let (writer, ansi) = match log_file.as_deref().and_then(file_writer) {
        Some(writer) => (writer, false),
        None => (BoxMakeWriter::new(std::io::stdout), true),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(debug))
        .with_ansi(ansi)
        .with_writer(writer)
        .try_init();
}

// A stray `RUST_LOG` only counts once debug logging was asked for.
fn env_filter(debug: bool) -> EnvFilter {
    if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    }
}

/// Directory the log file lands in. A bare file name means the working
/// directory.
fn log_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn file_writer(path: &Path) -> Option<BoxMakeWriter> {
    let file_name = path.file_name()?.to_owned();
    let dir = log_dir(path);
    if let Err(err) = std::fs::create_dir_all(&dir) {
        eprintln!("cannot create log directory {}: {err}", dir.display());
        return None;
    }
    Some(BoxMakeWriter::new(tracing_appender::rolling::never(
        dir, file_name,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    #[serial]
    fn rust_log_needs_debug() {
        std::env::set_var("RUST_LOG", "trace");
        let quiet = env_filter(false).max_level_hint();
        let verbose = env_filter(true).max_level_hint();
        std::env::remove_var("RUST_LOG");
        assert_eq!(quiet, Some(LevelFilter::INFO));
        assert_eq!(verbose, Some(LevelFilter::TRACE));
    }

    #[test]
    #[serial]
    fn debug_defaults_without_rust_log() {
        std::env::remove_var("RUST_LOG");
        assert_eq!(env_filter(true).max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn bare_file_name_uses_working_dir() {
        assert_eq!(log_dir(Path::new("backpack.log")), PathBuf::from("."));
        assert_eq!(
            log_dir(Path::new("logs/backpack.log")),
            PathBuf::from("logs")
        );
    }

    #[test]
    fn directory_path_has_no_writer() {
        assert!(file_writer(Path::new("/")).is_none());
    }
}

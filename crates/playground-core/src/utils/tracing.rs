use chrono::Local;
use std::io;
use tracing_appender::rolling;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    prelude::*,
};

fn set_global<S>(subscriber: S) -> io::Result<()>
where
    S: tracing::Subscriber + Send + Sync + 'static,
{
    tracing::subscriber::set_global_default(subscriber).map_err(io::Error::other)
}

/// Initialize tracing with a file logger writing to a timestamp-named file.
///
/// Falls back to stderr when no data directory is available. The filter comes
/// from `RUST_LOG`.
pub fn init_tracing() -> io::Result<()> {
    let filter = EnvFilter::from_default_env();

    let Some(log_dir) = super::log_dir() else {
        let subscriber = tracing_subscriber::registry()
            .with(
                fmt::Layer::default()
                    .with_writer(io::stderr)
                    .with_ansi(true)
                    .with_target(true),
            )
            .with(filter);
        set_global(subscriber)?;

        tracing::debug!(
            target: "playground::utils::tracing",
            "Tracing initialized with stderr output"
        );
        return Ok(());
    };

    std::fs::create_dir_all(&log_dir)?;
    let file_name = format!("{}.log", Local::now().format("%Y%m%d_%H%M%S"));
    let file_appender = rolling::never(&log_dir, &file_name);

    let subscriber = tracing_subscriber::registry()
        .with(
            fmt::Layer::new()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_span_events(FmtSpan::CLOSE)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter);
    set_global(subscriber)?;

    tracing::debug!(
        target: "playground::utils::tracing",
        path = %log_dir.join(&file_name).display(),
        "Tracing initialized with file output"
    );
    Ok(())
}

pub mod tracing;

use std::path::PathBuf;

/// Directory holding playground log files, if the platform has a data dir.
pub fn log_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("playground").join("logs"))
}

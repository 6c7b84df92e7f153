use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("no targets given: pass process names with -n or PIDs with -p")]
    NoTargets,
    #[error("invalid PID: {0}")]
    InvalidPid(String),
    #[error("interval must be at least 1 ms")]
    ZeroInterval,
    #[error("cannot open output file {}: {source}", path.display())]
    OutputFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[allow(dead_code)]
    #[error("connection table query failed with status {0}")]
    TableQuery(u32),
    #[error("connection table kept growing after {0} attempts")]
    TableUnstable(usize),
    #[error("Platform error: {0}")]
    Platform(String),
    #[allow(dead_code)]
    #[error("connection tables are not supported on this platform")]
    Unsupported,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WatchError>;

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::{Command, WatchArgs};
use crate::error::{Result, WatchError};
use crate::filter::TargetSpec;

/// What to report on each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Only changes between successive samples.
    Monitor,
    /// Every matched connection.
    Snapshot,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Monitor => write!(f, "monitor"),
            Mode::Snapshot => write!(f, "snapshot"),
        }
    }
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub mode: Mode,
    pub targets: TargetSpec,
    pub interval: Duration,
    pub output: Option<PathBuf>,
    pub count: Option<u64>,
}

impl WatchConfig {
    pub fn from_cli(command: &Command) -> Result<Self> {
        let (mode, args) = match command {
            Command::Monitor(args) => (Mode::Monitor, args),
            Command::Snapshot(args) => (Mode::Snapshot, args),
        };
        Self::from_args(mode, args)
    }

    fn from_args(mode: Mode, args: &WatchArgs) -> Result<Self> {
        let targets = TargetSpec::from_lists(args.names.as_deref(), args.pids.as_deref())?;
        if args.interval == 0 {
            return Err(WatchError::ZeroInterval);
        }
        Ok(WatchConfig {
            mode,
            targets,
            interval: Duration::from_millis(args.interval),
            output: args.output.clone(),
            count: args.count,
        })
    }
}

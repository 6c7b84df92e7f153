use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "tcpwatch",
    version,
    about = "Watch the TCP connections owned by selected processes",
    after_help = "Example: tcpwatch monitor -n java.exe -i 200"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Report connections that appear, change state or close
    Monitor(WatchArgs),
    /// List every matched connection on each tick
    Snapshot(WatchArgs),
}

#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    /// Process names to watch (comma-separated, case-insensitive)
    #[arg(short = 'n', long = "names", value_name = "NAMES")]
    pub names: Option<String>,

    /// PIDs to watch (comma-separated, '0' watches every process)
    #[arg(short = 'p', long = "pids", value_name = "PIDS")]
    pub pids: Option<String>,

    /// Also append the report to this file
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Sampling interval in milliseconds
    #[arg(short = 'i', long = "interval", value_name = "MS", default_value_t = 1000)]
    pub interval: u64,

    /// Stop after this many samples
    #[arg(short = 'c', long = "count", value_name = "N")]
    pub count: Option<u64>,
}

impl CliArgs {
    /// Parse the process arguments. Usage errors exit with status 1,
    /// `--help` and `--version` with status 0.
    pub fn parse_or_exit() -> Self {
        match CliArgs::try_parse() {
            Ok(args) => args,
            Err(e) => {
                let code = if e.use_stderr() { 1 } else { 0 };
                if let Err(io) = e.print() {
                    eprintln!("Error: {}", io);
                    std::process::exit(1);
                }
                std::process::exit(code);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliArgs, clap::Error> {
        CliArgs::try_parse_from(args)
    }

    #[test]
    fn test_monitor_flags() {
        let args = parse(&["tcpwatch", "monitor", "-n", "java.exe", "-i", "200"]).unwrap();
        match args.command {
            Command::Monitor(w) => {
                assert_eq!(w.names.as_deref(), Some("java.exe"));
                assert_eq!(w.pids, None);
                assert_eq!(w.interval, 200);
                assert_eq!(w.output, None);
            }
            other => panic!("expected monitor, got {:?}", other),
        }
    }

    #[test]
    fn test_snapshot_defaults() {
        let args = parse(&["tcpwatch", "snapshot", "-p", "0", "-o", "out.log"]).unwrap();
        match args.command {
            Command::Snapshot(w) => {
                assert_eq!(w.pids.as_deref(), Some("0"));
                assert_eq!(w.interval, 1000);
                assert_eq!(w.count, None);
                assert_eq!(w.output, Some(PathBuf::from("out.log")));
            }
            other => panic!("expected snapshot, got {:?}", other),
        }
    }

    #[test]
    fn test_subcommand_required() {
        assert!(parse(&["tcpwatch"]).is_err());
        assert!(parse(&["tcpwatch", "watch", "-n", "x"]).is_err());
    }

    #[test]
    fn test_help_is_not_a_usage_error() {
        let help = parse(&["tcpwatch", "--help"]).unwrap_err();
        assert!(!help.use_stderr());
        let usage = parse(&["tcpwatch", "snapshot", "--bogus"]).unwrap_err();
        assert!(usage.use_stderr());
    }

    #[test]
    fn test_interval_must_be_numeric() {
        assert!(parse(&["tcpwatch", "monitor", "-n", "x", "-i", "fast"]).is_err());
    }
}

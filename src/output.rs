use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, TimeZone};

use crate::config::Mode;
use crate::diff::ChangeEvent;
use crate::error::{Result, WatchError};
use crate::model::{Connection, ConnectionSet};

const RULE: &str = "-----------------------------------";

/// Writes report lines to stdout and, optionally, appends them to a file.
pub struct Reporter {
    file: Option<File>,
}

impl Reporter {
    /// Open the reporter; an output file is created if missing and appended to.
    pub fn open(output: Option<&Path>) -> Result<Self> {
        let file = match output {
            Some(path) => Some(
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|source| WatchError::OutputFile {
                        path: path.to_path_buf(),
                        source,
                    })?,
            ),
            None => None,
        };
        Ok(Reporter { file })
    }

    pub fn emit(&mut self, lines: &[String]) -> io::Result<()> {
        if lines.is_empty() {
            return Ok(());
        }
        let mut stdout = io::stdout().lock();
        for line in lines {
            writeln!(stdout, "{}", line)?;
        }
        stdout.flush()?;
        if let Some(file) = self.file.as_mut() {
            for line in lines {
                writeln!(file, "{}", line)?;
            }
            file.flush()?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Startup banner: mode, targets and interval.
pub fn format_banner(mode: Mode, targets: &str, interval: Duration) -> Vec<String> {
    vec![
        format!("--- {} mode started ---", mode),
        format!("Targets: {}", targets),
        format!("Interval: {} ms (Ctrl+C to stop)", interval.as_millis()),
    ]
}

fn owner(conn: &Connection) -> String {
    format!("Process: {} (PID: {})", conn.process_name, conn.pid)
}

/// Full listing of one sample, or a single notice when nothing matched.
pub fn format_snapshot<Tz>(set: &ConnectionSet, at: &DateTime<Tz>) -> Vec<String>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let time = at.format("%H:%M:%S");
    if set.is_empty() {
        return vec![format!("--- {} no connections match the targets ---", time)];
    }

    let mut lines = Vec::with_capacity(set.len() + 2);
    lines.push(format!("--- {} matched connections ({}) ---", time, set.len()));
    for (key, conn) in set {
        lines.push(format!(
            "{} | Process: {:<15} (PID: {:<5}) | State: {:<12}",
            key, conn.process_name, conn.pid, conn.state
        ));
    }
    lines.push(RULE.to_string());
    lines
}

/// Change log for one tick. Empty when nothing changed, header included.
pub fn format_changes<Tz>(events: &[ChangeEvent], at: &DateTime<Tz>) -> Vec<String>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    if events.is_empty() {
        return Vec::new();
    }

    let mut lines = Vec::with_capacity(events.len() + 1);
    lines.push(format!("--- {} state changes ---", at.format("%H:%M:%S%.3f")));
    for event in events {
        lines.push(match event {
            ChangeEvent::New { key, connection } => format!(
                "[NEW] {} | {} | State: {}",
                key,
                owner(connection),
                connection.state
            ),
            ChangeEvent::Changed {
                key,
                previous_state,
                connection,
            } => format!(
                "[CHANGE] {} | {} | State: {} -> {}",
                key,
                owner(connection),
                previous_state,
                connection.state
            ),
            ChangeEvent::Closed { key, connection } => format!(
                "[CLOSED] {} | {} | Last state: {}",
                key,
                owner(connection),
                connection.state
            ),
        });
    }
    lines
}

pub fn format_sample_error(err: &WatchError) -> Vec<String> {
    vec![format!("Error: failed to fetch connections: {}", err)]
}

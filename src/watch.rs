use chrono::Local;
use tokio::time::{self, MissedTickBehavior};

use crate::config::{Mode, WatchConfig};
use crate::diff::ChangeTracker;
use crate::error::Result;
use crate::output::{format_changes, format_sample_error, format_snapshot, Reporter};
use crate::sampler::Sampler;

/// Turns successive samples into report lines for one mode.
pub struct Session {
    mode: Mode,
    tracker: ChangeTracker,
}

impl Session {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            tracker: ChangeTracker::new(),
        }
    }

    /// Run one sample and render its report. A failed sample renders an
    /// error line and leaves the previous set in place.
    pub fn tick(&mut self, sampler: &mut Sampler) -> Vec<String> {
        let now = Local::now();
        match sampler.sample() {
            Ok(set) => match self.mode {
                Mode::Snapshot => format_snapshot(&set, &now),
                Mode::Monitor => {
                    let events = self.tracker.observe(set);
                    for event in &events {
                        tracing::trace!(key = %event.key(), "connection changed");
                    }
                    format_changes(&events, &now)
                }
            },
            Err(e) => {
                tracing::debug!(error = %e, "sample failed, keeping previous connections");
                format_sample_error(&e)
            }
        }
    }
}

/// Sample every `config.interval` until Ctrl+C or `config.count` ticks.
///
/// Passes that overrun the interval skip the missed ticks instead of
/// queueing them. A report that cannot be written is logged and dropped.
pub async fn run(config: &WatchConfig, mut sampler: Sampler, mut reporter: Reporter) -> Result<()> {
    let mut session = Session::new(config.mode);
    let mut ticker = time::interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut ticks = 0u64;
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::debug!(ticks, "interrupted");
                break;
            }
            _ = ticker.tick() => {
                let lines = session.tick(&mut sampler);
                if let Err(e) = reporter.emit(&lines) {
                    tracing::warn!(error = %e, "failed to write report");
                }
                ticks += 1;
                if config.count.is_some_and(|limit| ticks >= limit) {
                    break;
                }
            }
        }
    }
    Ok(())
}

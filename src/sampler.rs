use crate::error::{Result, WatchError};
use crate::filter::TargetSpec;
use crate::model::ConnectionSet;
use crate::platform::{TableSource, TableStatus};
use crate::projector::project_rows;
use crate::resolver::ProcessNameResolver;
use crate::table::decode_rows;

/// Upper bound on size-query/fetch round trips for one sample.
pub const MAX_FETCH_ATTEMPTS: usize = 8;

/// Query the table source, growing the buffer until it holds a full table.
///
/// Returns the entry count and the buffer holding the table image.
pub fn fetch_table(source: &mut dyn TableSource) -> Result<(u32, Vec<u8>)> {
    let mut buf = Vec::new();
    for attempt in 1..=MAX_FETCH_ATTEMPTS {
        match source.fetch(&mut buf)? {
            TableStatus::Complete { entries } => {
                tracing::debug!(entries, bytes = buf.len(), attempt, "connection table fetched");
                return Ok((entries, buf));
            }
            TableStatus::InsufficientBuffer { required } => {
                tracing::debug!(required, attempt, "growing connection table buffer");
                buf.resize(required.max(buf.len() + 1), 0);
            }
        }
    }
    Err(WatchError::TableUnstable(MAX_FETCH_ATTEMPTS))
}

/// Produces one filtered `ConnectionSet` per call.
pub struct Sampler {
    source: Box<dyn TableSource>,
    resolver: ProcessNameResolver,
    targets: TargetSpec,
}

impl Sampler {
    pub fn new(source: Box<dyn TableSource>, resolver: ProcessNameResolver, targets: TargetSpec) -> Self {
        Self {
            source,
            resolver,
            targets,
        }
    }

    pub fn sample(&mut self) -> Result<ConnectionSet> {
        let (entries, buf) = fetch_table(self.source.as_mut())?;
        let set = project_rows(decode_rows(&buf, entries), &self.targets, &self.resolver);
        tracing::debug!(
            entries,
            matched = set.len(),
            cached_names = self.resolver.cached(),
            "sample complete"
        );
        Ok(set)
    }
}

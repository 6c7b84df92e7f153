use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::model::connection::UNRESOLVED_NAME;
use crate::platform::ProcessSource;

/// Memoizing pid -> process name lookup.
///
/// Every pid is scanned for at most once per run: misses and listing
/// failures are cached as `"N/A"`. Entries are never evicted, so a reused
/// pid keeps the name it was first seen with.
pub struct ProcessNameResolver {
    source: Box<dyn ProcessSource>,
    cache: Mutex<HashMap<u32, String>>,
}

impl ProcessNameResolver {
    pub fn new(source: Box<dyn ProcessSource>) -> Self {
        Self {
            source,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn resolve(&self, pid: u32) -> String {
        if let Some(name) = self.lock().get(&pid) {
            return name.clone();
        }

        // The scan runs unlocked; a concurrent miss on the same pid may scan
        // twice, but both commit the same answer.
        let name = self.scan(pid);
        self.lock().entry(pid).or_insert(name).clone()
    }

    /// Number of pids with a cached answer.
    pub fn cached(&self) -> usize {
        self.lock().len()
    }

    fn scan(&self, pid: u32) -> String {
        match self.source.processes() {
            Ok(procs) => procs
                .into_iter()
                .find(|p| p.pid == pid)
                .map(|p| p.name)
                .unwrap_or_else(|| UNRESOLVED_NAME.to_string()),
            Err(e) => {
                tracing::warn!(pid, error = %e, "process listing failed");
                UNRESOLVED_NAME.to_string()
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u32, String>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

use crate::error::Result;

/// Outcome of one connection-table query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    /// The buffer now holds a table image with this many rows.
    Complete { entries: u32 },
    /// The buffer was too small; retry with at least `required` bytes.
    InsufficientBuffer { required: usize },
}

/// Provider of the OS IPv4 TCP connection table, with owning pids.
///
/// Follows the OS "query size, then fetch" pattern: callers start with any
/// buffer and grow it to `required` until the query completes.
pub trait TableSource: Send {
    fn fetch(&mut self, buf: &mut [u8]) -> Result<TableStatus>;
}

/// A running process as seen by the process listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
}

pub trait ProcessSource: Send + Sync {
    fn processes(&self) -> Result<Vec<ProcessEntry>>;
}

mod process;
#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "windows")]
mod windows;

pub use process::SysinfoProcesses;

pub fn create_table_source() -> Result<Box<dyn TableSource>> {
    #[cfg(target_os = "linux")]
    {
        Ok(Box::new(linux::ProcNetTable::new()))
    }
    #[cfg(target_os = "windows")]
    {
        Ok(Box::new(windows::IpHelperTable::new()))
    }
    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Err(crate::error::WatchError::Unsupported)
    }
}

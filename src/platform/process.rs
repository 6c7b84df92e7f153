use std::path::Path;

use sysinfo::System;

use super::{ProcessEntry, ProcessSource};
use crate::error::Result;

/// Process listing backed by `sysinfo`; takes a fresh snapshot per call.
#[derive(Debug, Default)]
pub struct SysinfoProcesses;

impl SysinfoProcesses {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessSource for SysinfoProcesses {
    fn processes(&self) -> Result<Vec<ProcessEntry>> {
        let mut sys = System::new();
        sys.refresh_processes();

        Ok(sys
            .processes()
            .iter()
            .map(|(pid, proc_info)| ProcessEntry {
                pid: pid.as_u32(),
                name: executable_name(proc_info.exe(), proc_info.name()),
            })
            .collect())
    }
}

/// File name of the executable, or `short_name` when the path is unknown.
///
/// On Linux `short_name` is the kernel `comm`, cut to 15 bytes.
fn executable_name(exe: Option<&Path>, short_name: &str) -> String {
    exe.and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| short_name.to_string())
}

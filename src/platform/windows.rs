use std::ffi::c_void;

use windows_sys::Win32::Foundation::{ERROR_INSUFFICIENT_BUFFER, NO_ERROR};
use windows_sys::Win32::NetworkManagement::IpHelper::{GetExtendedTcpTable, TCP_TABLE_OWNER_PID_ALL};
use windows_sys::Win32::Networking::WinSock::AF_INET;

use super::{TableSource, TableStatus};
use crate::error::{Result, WatchError};
use crate::table::entry_count;

/// Table source backed by `GetExtendedTcpTable(AF_INET, TCP_TABLE_OWNER_PID_ALL)`.
///
/// The API writes `MIB_TCPTABLE_OWNER_PID` directly, which is the table
/// image layout the decoder expects.
#[derive(Debug, Default)]
pub struct IpHelperTable;

impl IpHelperTable {
    pub fn new() -> Self {
        Self
    }
}

impl TableSource for IpHelperTable {
    fn fetch(&mut self, buf: &mut [u8]) -> Result<TableStatus> {
        let mut size = u32::try_from(buf.len())
            .map_err(|_| WatchError::Platform("table buffer larger than 4 GiB".to_string()))?;
        let table: *mut c_void = if buf.is_empty() {
            std::ptr::null_mut()
        } else {
            buf.as_mut_ptr().cast()
        };

        // SAFETY: `table` is either null with `size == 0` or points to `size`
        // writable bytes owned by `buf` for the duration of the call.
        let ret = unsafe {
            GetExtendedTcpTable(
                table,
                &mut size,
                0,
                AF_INET as u32,
                TCP_TABLE_OWNER_PID_ALL,
                0,
            )
        };

        match ret {
            NO_ERROR => {
                let entries = entry_count(buf).ok_or_else(|| {
                    WatchError::Platform("GetExtendedTcpTable returned no header".to_string())
                })?;
                Ok(TableStatus::Complete { entries })
            }
            ERROR_INSUFFICIENT_BUFFER => Ok(TableStatus::InsufficientBuffer {
                required: size as usize,
            }),
            code => Err(WatchError::TableQuery(code)),
        }
    }
}

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use super::{TableSource, TableStatus};
use crate::error::{Result, WatchError};
use crate::model::TcpState;
use crate::table::{wire_addr, wire_port, RawConnectionRow, TableBuilder};

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

/// Map a `procfs::net::TcpState` to our `TcpState`.
fn map_tcp_state(state: &procfs::net::TcpState) -> TcpState {
    match state {
        procfs::net::TcpState::Established => TcpState::Established,
        procfs::net::TcpState::SynSent => TcpState::SynSent,
        procfs::net::TcpState::SynRecv => TcpState::SynRecv,
        procfs::net::TcpState::FinWait1 => TcpState::FinWait1,
        procfs::net::TcpState::FinWait2 => TcpState::FinWait2,
        procfs::net::TcpState::TimeWait => TcpState::TimeWait,
        procfs::net::TcpState::Close => TcpState::Closed,
        procfs::net::TcpState::CloseWait => TcpState::CloseWait,
        procfs::net::TcpState::LastAck => TcpState::LastAck,
        procfs::net::TcpState::Listen => TcpState::Listen,
        procfs::net::TcpState::Closing => TcpState::Closing,
        _ => TcpState::Unknown,
    }
}

fn v4(addr: &SocketAddr) -> Option<Ipv4Addr> {
    match addr.ip() {
        IpAddr::V4(ip) => Some(ip),
        IpAddr::V6(_) => None,
    }
}

/// Build a map from socket inode -> owning pid by walking `/proc/*/fd`.
///
/// Processes we may not inspect are skipped; their sockets end up with pid 0.
fn socket_owners() -> Result<HashMap<u64, u32>> {
    let mut owners = HashMap::new();

    let all_procs = procfs::process::all_processes()
        .map_err(|e| WatchError::Platform(e.to_string()))?;

    for proc_result in all_procs {
        let proc = match proc_result {
            Ok(p) => p,
            Err(_) => continue,
        };

        let fds = match proc.fd() {
            Ok(fds) => fds,
            Err(_) => continue,
        };

        for fd_info in fds {
            let fd_info = match fd_info {
                Ok(fi) => fi,
                Err(_) => continue,
            };

            if let procfs::process::FDTarget::Socket(inode) = fd_info.target {
                owners.entry(inode).or_insert(proc.pid as u32);
            }
        }
    }

    Ok(owners)
}

/// Render `/proc/net/tcp` into a connection-table image.
fn build_table() -> Result<TableBuilder> {
    let entries = procfs::net::tcp().map_err(|e| WatchError::Platform(e.to_string()))?;
    let owners = socket_owners()?;

    let mut table = TableBuilder::new();
    for entry in entries {
        let (Some(local), Some(remote)) = (v4(&entry.local_address), v4(&entry.remote_address))
        else {
            continue;
        };
        table.push(RawConnectionRow {
            state: map_tcp_state(&entry.state).code(),
            local_addr: wire_addr(local),
            local_port: wire_port(entry.local_address.port()),
            remote_addr: wire_addr(remote),
            remote_port: wire_port(entry.remote_address.port()),
            owning_pid: owners.get(&entry.inode).copied().unwrap_or(0),
        });
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// ProcNetTable
// ---------------------------------------------------------------------------

/// Table source reading `/proc/net/tcp`.
///
/// When the caller's buffer is too small the rendered image is kept and
/// served by the follow-up call, so one sample reads `/proc` once.
#[derive(Debug, Default)]
pub struct ProcNetTable {
    pending: Option<(u32, Vec<u8>)>,
}

impl ProcNetTable {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TableSource for ProcNetTable {
    fn fetch(&mut self, buf: &mut [u8]) -> Result<TableStatus> {
        let (entries, image) = match self.pending.take() {
            Some(pending) => pending,
            None => {
                let table = build_table()?;
                (table.entries(), table.finish())
            }
        };

        if buf.len() < image.len() {
            let required = image.len();
            self.pending = Some((entries, image));
            return Ok(TableStatus::InsufficientBuffer { required });
        }

        buf[..image.len()].copy_from_slice(&image);
        Ok(TableStatus::Complete { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::decode_rows;

    #[test]
    fn test_two_phase_fetch() {
        let mut source = ProcNetTable::new();
        let mut buf = Vec::new();
        let required = match source.fetch(&mut buf).unwrap() {
            TableStatus::InsufficientBuffer { required } => required,
            other => panic!("expected a size query, got {:?}", other),
        };
        buf.resize(required, 0);
        match source.fetch(&mut buf).unwrap() {
            TableStatus::Complete { entries } => {
                assert_eq!(decode_rows(&buf, entries).count(), entries as usize);
            }
            other => panic!("expected a complete table, got {:?}", other),
        }
    }

    #[test]
    fn test_sees_own_listener() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let table = build_table().unwrap();
        let buf = table.finish();
        let found = decode_rows(&buf, table.entries()).any(|row| {
            crate::table::decode_port(row.local_port) == port
                && TcpState::from_code(row.state) == TcpState::Listen
        });
        assert!(found, "listener on port {} not in /proc/net/tcp", port);
    }
}

use std::collections::BTreeMap;
use std::fmt;
use std::net::Ipv4Addr;

use super::state::TcpState;

/// Name reported for a pid the process listing could not resolve.
pub const UNRESOLVED_NAME: &str = "N/A";

/// One matched TCP connection, owned by a process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub process_name: String,
    pub pid: u32,
    pub local_addr: Ipv4Addr,
    pub local_port: u16,
    pub remote_addr: Ipv4Addr,
    pub remote_port: u16,
    pub state: TcpState,
}

impl Connection {
    pub fn key(&self) -> ConnectionKey {
        ConnectionKey::new(
            self.local_addr,
            self.local_port,
            self.remote_addr,
            self.remote_port,
        )
    }
}

/// Canonical `local:port -> remote:port` identity of a connection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionKey(String);

impl ConnectionKey {
    pub fn new(local_addr: Ipv4Addr, local_port: u16, remote_addr: Ipv4Addr, remote_port: u16) -> Self {
        ConnectionKey(format!(
            "{}:{} -> {}:{}",
            local_addr, local_port, remote_addr, remote_port
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// All matched connections of one sample, keyed by 4-tuple.
pub type ConnectionSet = BTreeMap<ConnectionKey, Connection>;

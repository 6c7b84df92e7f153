//! Binary connection-table image and its decoder.
//!
//! The image mirrors `MIB_TCPTABLE_OWNER_PID`: a native-endian `u32` entry
//! count followed by fixed 24-byte rows of six native-endian `u32` fields
//! (state, local address, local port, remote address, remote port, owning
//! pid). Windows hands this layout back directly; other providers render
//! into it with [`TableBuilder`].

use std::net::Ipv4Addr;

/// Size of the entry-count header.
pub const HEADER_LEN: usize = 4;
/// Size of one row.
pub const ROW_LEN: usize = 24;

const STATE: usize = 0;
const LOCAL_ADDR: usize = 1;
const LOCAL_PORT: usize = 2;
const REMOTE_ADDR: usize = 3;
const REMOTE_PORT: usize = 4;
const OWNING_PID: usize = 5;

/// One row as it sits in the table, fields still in wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawConnectionRow {
    pub state: u32,
    pub local_addr: u32,
    pub local_port: u32,
    pub remote_addr: u32,
    pub remote_port: u32,
    pub owning_pid: u32,
}

impl RawConnectionRow {
    /// Parse one `ROW_LEN`-sized record. Returns `None` if the record is short.
    fn parse(record: &[u8]) -> Option<Self> {
        Some(RawConnectionRow {
            state: read_field(record, STATE)?,
            local_addr: read_field(record, LOCAL_ADDR)?,
            local_port: read_field(record, LOCAL_PORT)?,
            remote_addr: read_field(record, REMOTE_ADDR)?,
            remote_port: read_field(record, REMOTE_PORT)?,
            owning_pid: read_field(record, OWNING_PID)?,
        })
    }

    #[cfg_attr(not(any(target_os = "linux", test)), allow(dead_code))]
    fn write(&self, out: &mut Vec<u8>) {
        for field in [
            self.state,
            self.local_addr,
            self.local_port,
            self.remote_addr,
            self.remote_port,
            self.owning_pid,
        ] {
            out.extend_from_slice(&field.to_ne_bytes());
        }
    }
}

/// Bounds-checked read of the `index`-th `u32` in a record.
fn read_field(record: &[u8], index: usize) -> Option<u32> {
    let start = index * 4;
    let bytes: [u8; 4] = record.get(start..start + 4)?.try_into().ok()?;
    Some(u32::from_ne_bytes(bytes))
}

/// Entry count stored in the header of a table image.
#[cfg_attr(not(any(target_os = "windows", test)), allow(dead_code))]
pub fn entry_count(buf: &[u8]) -> Option<u32> {
    read_field(buf, 0)
}

/// Lazily decode up to `entries` rows from a table image, in table order.
///
/// Never reads past `buf`: a buffer holding fewer rows than declared just
/// yields fewer rows.
pub fn decode_rows(buf: &[u8], entries: u32) -> impl Iterator<Item = RawConnectionRow> + '_ {
    let body = buf.get(HEADER_LEN..).unwrap_or_default();
    let available = body.len() / ROW_LEN;
    let declared = entries as usize;
    if available < declared {
        tracing::debug!(declared, available, "connection table shorter than its entry count");
    }
    body.chunks_exact(ROW_LEN)
        .take(declared)
        .filter_map(RawConnectionRow::parse)
}

/// Dotted-quad address from its wire form (first byte in memory is the
/// first octet).
pub fn decode_addr(wire: u32) -> Ipv4Addr {
    Ipv4Addr::from(wire.to_ne_bytes())
}

/// Host port from its wire form: the low 16 bits hold the port in network
/// byte order.
pub fn decode_port(wire: u32) -> u16 {
    (wire as u16).swap_bytes()
}

#[cfg_attr(not(any(target_os = "linux", test)), allow(dead_code))]
pub fn wire_addr(addr: Ipv4Addr) -> u32 {
    u32::from_ne_bytes(addr.octets())
}

#[cfg_attr(not(any(target_os = "linux", test)), allow(dead_code))]
pub fn wire_port(port: u16) -> u32 {
    u32::from(port.swap_bytes())
}

/// Renders rows into a table image.
#[derive(Debug, Default)]
#[cfg_attr(not(any(target_os = "linux", test)), allow(dead_code))]
pub struct TableBuilder {
    rows: Vec<RawConnectionRow>,
}

#[cfg_attr(not(any(target_os = "linux", test)), allow(dead_code))]
impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: RawConnectionRow) -> &mut Self {
        self.rows.push(row);
        self
    }

    pub fn entries(&self) -> u32 {
        self.rows.len() as u32
    }

    pub fn finish(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.rows.len() * ROW_LEN);
        out.extend_from_slice(&self.entries().to_ne_bytes());
        for row in &self.rows {
            row.write(&mut out);
        }
        out
    }
}

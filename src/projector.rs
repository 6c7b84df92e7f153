use std::net::Ipv4Addr;

use crate::filter::{TargetSpec, Verdict};
use crate::model::{Connection, ConnectionKey, ConnectionSet, TcpState};
use crate::resolver::ProcessNameResolver;
use crate::table::{decode_addr, decode_port, RawConnectionRow};

/// Turn a matched row into a keyed connection.
///
/// Yields nothing for rows that did not match and for rows without a peer
/// (remote 0.0.0.0, i.e. listening or unbound sockets).
pub fn project(row: &RawConnectionRow, verdict: Verdict) -> Option<(ConnectionKey, Connection)> {
    if !verdict.matched {
        return None;
    }

    let remote_addr = decode_addr(row.remote_addr);
    if remote_addr == Ipv4Addr::UNSPECIFIED {
        return None;
    }

    let conn = Connection {
        process_name: verdict.name,
        pid: row.owning_pid,
        local_addr: decode_addr(row.local_addr),
        local_port: decode_port(row.local_port),
        remote_addr,
        remote_port: decode_port(row.remote_port),
        state: TcpState::from_code(row.state),
    };
    Some((conn.key(), conn))
}

/// Match and project every row into one sample's connection set.
///
/// Rows sharing a 4-tuple collapse; the last one wins.
pub fn project_rows<I>(rows: I, targets: &TargetSpec, resolver: &ProcessNameResolver) -> ConnectionSet
where
    I: IntoIterator<Item = RawConnectionRow>,
{
    let mut set = ConnectionSet::new();
    for row in rows {
        let verdict = targets.matches(row.owning_pid, resolver);
        if let Some((key, conn)) = project(&row, verdict) {
            set.insert(key, conn);
        }
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::tests::FakeProcesses;
    use crate::table::{decode_rows, wire_addr, wire_port, TableBuilder};

    fn row(state: u32, local: (Ipv4Addr, u16), remote: (Ipv4Addr, u16), pid: u32) -> RawConnectionRow {
        RawConnectionRow {
            state,
            local_addr: wire_addr(local.0),
            local_port: wire_port(local.1),
            remote_addr: wire_addr(remote.0),
            remote_port: wire_port(remote.1),
            owning_pid: pid,
        }
    }

    fn matched(name: &str) -> Verdict {
        Verdict {
            name: name.to_string(),
            matched: true,
        }
    }

    const LOCAL: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 5);
    const PEER: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 9);

    #[test]
    fn test_project_decodes_fields() {
        let raw = row(5, (LOCAL, 51000), (PEER, 8080), 300);
        let (key, conn) = project(&raw, matched("java.exe")).unwrap();

        assert_eq!(key.as_str(), "10.0.0.5:51000 -> 10.0.0.9:8080");
        assert_eq!(conn.process_name, "java.exe");
        assert_eq!(conn.pid, 300);
        assert_eq!(conn.remote_port, 8080);
        assert_eq!(conn.state, TcpState::Established);
    }

    #[test]
    fn test_project_skips_non_matching() {
        let raw = row(5, (LOCAL, 51000), (PEER, 8080), 300);
        let verdict = Verdict {
            name: "other".to_string(),
            matched: false,
        };
        assert!(project(&raw, verdict).is_none());
    }

    #[test]
    fn test_project_drops_unspecified_remote() {
        let listener = row(2, (Ipv4Addr::UNSPECIFIED, 22), (Ipv4Addr::UNSPECIFIED, 0), 1);
        assert!(project(&listener, matched("sshd")).is_none());

        let half_bound = row(5, (LOCAL, 22), (Ipv4Addr::UNSPECIFIED, 443), 1);
        assert!(project(&half_bound, matched("sshd")).is_none());
    }

    #[test]
    fn test_duplicate_tuple_last_wins() {
        let mut table = TableBuilder::new();
        table
            .push(row(5, (LOCAL, 40000), (PEER, 443), 10))
            .push(row(8, (LOCAL, 40000), (PEER, 443), 11));
        let buf = table.finish();

        let targets = TargetSpec::from_lists(None, Some("0")).unwrap();
        let resolver = ProcessNameResolver::new(Box::new(FakeProcesses::new(&[(10, "a"), (11, "b")])));
        let set = project_rows(decode_rows(&buf, table.entries()), &targets, &resolver);

        assert_eq!(set.len(), 1);
        let conn = set.values().next().unwrap();
        assert_eq!(conn.pid, 11);
        assert_eq!(conn.process_name, "b");
        assert_eq!(conn.state, TcpState::CloseWait);
    }

    #[test]
    fn test_project_rows_filters_targets_and_listeners() {
        let mut table = TableBuilder::new();
        table
            .push(row(5, (LOCAL, 40000), (PEER, 443), 10))
            .push(row(5, (LOCAL, 40001), (PEER, 443), 20))
            .push(row(2, (LOCAL, 8080), (Ipv4Addr::UNSPECIFIED, 0), 10))
            .push(row(99, (LOCAL, 40002), (PEER, 5432), 10));
        let buf = table.finish();

        let targets = TargetSpec::from_lists(Some("Java.exe"), None).unwrap();
        let resolver = ProcessNameResolver::new(Box::new(FakeProcesses::new(&[
            (10, "java.exe"),
            (20, "chrome.exe"),
        ])));
        let set = project_rows(decode_rows(&buf, table.entries()), &targets, &resolver);

        let keys: Vec<&str> = set.keys().map(ConnectionKey::as_str).collect();
        assert_eq!(
            keys,
            vec!["10.0.0.5:40000 -> 10.0.0.9:443", "10.0.0.5:40002 -> 10.0.0.9:5432"]
        );
        assert!(set.values().all(|c| c.remote_addr != Ipv4Addr::UNSPECIFIED));
        assert_eq!(set.values().last().unwrap().state.to_string(), "UNKNOWN");
    }
}

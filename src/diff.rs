use crate::model::{Connection, ConnectionKey, ConnectionSet, TcpState};

/// One difference between two successive samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    New {
        key: ConnectionKey,
        connection: Connection,
    },
    Changed {
        key: ConnectionKey,
        previous_state: TcpState,
        connection: Connection,
    },
    /// Carries the last snapshot taken before the connection disappeared.
    Closed {
        key: ConnectionKey,
        connection: Connection,
    },
}

impl ChangeEvent {
    pub fn key(&self) -> &ConnectionKey {
        match self {
            ChangeEvent::New { key, .. }
            | ChangeEvent::Changed { key, .. }
            | ChangeEvent::Closed { key, .. } => key,
        }
    }
}

/// Classify every key of `current` and `previous` as new, changed or closed.
///
/// Unchanged connections produce no event. The order of the returned events
/// carries no meaning.
pub fn diff(current: &ConnectionSet, previous: &ConnectionSet) -> Vec<ChangeEvent> {
    let mut events = Vec::new();

    for (key, conn) in current {
        match previous.get(key) {
            None => events.push(ChangeEvent::New {
                key: key.clone(),
                connection: conn.clone(),
            }),
            Some(prev) if prev.state != conn.state => events.push(ChangeEvent::Changed {
                key: key.clone(),
                previous_state: prev.state,
                connection: conn.clone(),
            }),
            Some(_) => {}
        }
    }

    for (key, prev) in previous {
        if !current.contains_key(key) {
            events.push(ChangeEvent::Closed {
                key: key.clone(),
                connection: prev.clone(),
            });
        }
    }

    events
}

/// Holds the last successfully sampled set between ticks.
#[derive(Debug, Default)]
pub struct ChangeTracker {
    previous: ConnectionSet,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff `current` against the last observed set, then keep `current`.
    pub fn observe(&mut self, current: ConnectionSet) -> Vec<ChangeEvent> {
        let events = diff(&current, &self.previous);
        self.previous = current;
        events
    }
}

pub mod connection;
pub mod state;

pub use connection::{Connection, ConnectionKey, ConnectionSet};
pub use state::TcpState;

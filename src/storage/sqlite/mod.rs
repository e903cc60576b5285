//! Shared `SQLite` infrastructure for the symbol store.
//!
//! ## Module Structure
//!
//! - [`connection`]: Connection handling ([`Mutex<Connection>`](rusqlite::Connection), lock acquisition, configuration)
//! - [`metrics`]: Shared metrics recording helpers

mod connection;
mod metrics;

pub use connection::{acquire_lock, configure_connection, in_immediate_transaction};
pub use metrics::record_operation_metrics;

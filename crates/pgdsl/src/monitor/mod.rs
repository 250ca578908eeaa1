//! Statement logging and timeouts.
//!
//! [`InstrumentedClient`] wraps any [`GenericClient`](crate::GenericClient) and emits a
//! `tracing` event on target `pgdsl.sql` for every statement: `debug` on completion, `warn`
//! for slow statements and failures.
//!
//! # Example
//!
//! ```rust,ignore
//! use pgdsl::monitor::{InstrumentedClient, MonitorConfig};
//! use std::time::Duration;
//!
//! let config = MonitorConfig::new()
//!     .with_query_timeout(Duration::from_secs(30))
//!     .with_slow_query_threshold(Duration::from_millis(200));
//!
//! let client = InstrumentedClient::new(db_client).with_config(config);
//! let people = select_from(&PERSON).fetch(&client).await?;
//! ```

mod config;
mod instrumented;


pub use config::MonitorConfig;
pub use instrumented::InstrumentedClient;

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

//! Starter application for `pgdsl`.
//!
//! Ships the schema bindings of a small conference database (persons, events, locations and a
//! person/event log), the SQL migration that creates it, and helpers to seed it.

pub mod config;
pub mod fixtures;
pub mod migrate;
pub mod schema;

pub use config::{PoolRecycling, StarterConfig};
pub use schema::{EVENT, LOCATION, PERSON, PERSON_EVENT_LOG};

//! Shared fixtures for unit tests: a small schema and a scripted client.

use crate::client::{GenericClient, RowStream, StreamingClient};
use crate::error::OrmResult;
use crate::value::Value;
use futures_core::Stream;
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

crate::table! {
    pub struct Person => "public"."person" {
        #[primary_key]
        id: i64 = "id",
        first_name: String = "first_name",
        last_name: String = "last_name" [nullable],
    }
}

crate::table! {
    pub struct Event => "public"."event" {
        #[primary_key]
        id: i64 = "id",
        name: String = "name",
    }
}

crate::table! {
    pub struct PersonEventLog => "public"."person_event_log" {
        #[primary_key]
        id: i64 = "id",
        person_id: i64 = "person_id",
        event_id: i64 = "event_id",
    }
}

pub const PERSON: Person = Person::new();
pub const EVENT: Event = Event::new();
pub const PERSON_EVENT_LOG: PersonEventLog = PersonEventLog::new();

pub fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

/// A client that records every statement and answers from queued responses.
#[derive(Default)]
pub struct MockClient {
    rows: Mutex<VecDeque<Vec<Vec<Value>>>>,
    affected: Mutex<VecDeque<u64>>,
    streams: Mutex<VecDeque<Vec<OrmResult<Vec<Value>>>>>,
    log: Mutex<Vec<(String, Vec<Value>)>>,
    released: Arc<AtomicUsize>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the rows returned by the next `query`.
    pub fn with_rows(self, rows: Vec<Vec<Value>>) -> Self {
        self.rows.lock().unwrap().push_back(rows);
        self
    }

    /// Queue the count returned by the next `execute`.
    pub fn with_affected(self, n: u64) -> Self {
        self.affected.lock().unwrap().push_back(n);
        self
    }

    /// Queue the items yielded by the next `query_stream`.
    pub fn with_stream(self, items: Vec<OrmResult<Vec<Value>>>) -> Self {
        self.streams.lock().unwrap().push_back(items);
        self
    }

    /// Every statement issued so far, with its parameters.
    pub fn statements(&self) -> Vec<(String, Vec<Value>)> {
        self.log.lock().unwrap().clone()
    }

    pub fn sql(&self) -> Vec<String> {
        self.statements().into_iter().map(|(sql, _)| sql).collect()
    }

    /// Number of row streams dropped so far.
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    fn record(&self, sql: &str, params: &[Value]) {
        self.log
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
    }
}

impl GenericClient for MockClient {
    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Vec<Value>>> {
        self.record(sql, params);
        Ok(self.rows.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        self.record(sql, params);
        Ok(self.affected.lock().unwrap().pop_front().unwrap_or(0))
    }
}

impl StreamingClient for MockClient {
    async fn query_stream(&self, sql: &str, params: &[Value]) -> OrmResult<RowStream> {
        self.record(sql, params);
        let items = self.streams.lock().unwrap().pop_front().unwrap_or_default();
        Ok(RowStream::new(TrackedStream {
            inner: futures_util::stream::iter(items),
            released: Arc::clone(&self.released),
        }))
    }
}

/// Counts its own drop, so tests can assert a stream was released exactly once.
struct TrackedStream<S> {
    inner: S,
    released: Arc<AtomicUsize>,
}

impl<S: Stream + Unpin> Stream for TrackedStream<S> {
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl<S> Drop for TrackedStream<S> {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

//! The execution boundary: clients that run rendered SQL.
//!
//! Statements never talk to a connection directly. They render themselves with the
//! client's [`RenderSettings`] and hand SQL plus [`Value`] parameters to a [`GenericClient`],
//! which returns decoded rows. Implementations are provided for `tokio-postgres` clients and
//! transactions, `deadpool-postgres` pooled clients, and references to any client.

use crate::error::{OrmError, OrmResult};
use crate::render::RenderSettings;
use crate::row::decode_row;
use crate::value::Value;
use futures_core::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_postgres::types::ToSql;

fn param_refs(params: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

/// A trait that unifies database clients and transactions.
///
/// This allows statements to run against either a direct connection or a transaction.
pub trait GenericClient: Send + Sync {
    /// Execute a query and return all rows, decoded.
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Vec<Vec<Value>>>> + Send;

    /// Execute a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<u64>> + Send;

    /// Dialect settings statements must render with for this client.
    fn render_settings(&self) -> RenderSettings {
        RenderSettings::postgres()
    }

    /// Return a cancellation token for the underlying connection, if supported.
    ///
    /// Used by [`InstrumentedClient`](crate::monitor::InstrumentedClient) to cancel a query
    /// server-side when its timeout fires.
    fn cancel_token(&self) -> Option<tokio_postgres::CancelToken> {
        None
    }
}

impl GenericClient for tokio_postgres::Client {
    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Vec<Value>>> {
        let rows = tokio_postgres::Client::query(self, sql, &param_refs(params)).await?;
        rows.iter().map(decode_row).collect()
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        Ok(tokio_postgres::Client::execute(self, sql, &param_refs(params)).await?)
    }

    fn cancel_token(&self) -> Option<tokio_postgres::CancelToken> {
        Some(tokio_postgres::Client::cancel_token(self))
    }
}

impl GenericClient for tokio_postgres::Transaction<'_> {
    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Vec<Value>>> {
        let rows = tokio_postgres::Transaction::query(self, sql, &param_refs(params)).await?;
        rows.iter().map(decode_row).collect()
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        Ok(tokio_postgres::Transaction::execute(self, sql, &param_refs(params)).await?)
    }

    fn cancel_token(&self) -> Option<tokio_postgres::CancelToken> {
        Some(tokio_postgres::Transaction::cancel_token(self))
    }
}

/// A stream of decoded rows.
///
/// Type-erased so that every client returns the same streaming type.
#[must_use]
pub struct RowStream {
    inner: Pin<Box<dyn Stream<Item = OrmResult<Vec<Value>>> + Send>>,
}

impl RowStream {
    /// Create a new `RowStream` from any compatible stream.
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = OrmResult<Vec<Value>>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }
}

impl Stream for RowStream {
    type Item = OrmResult<Vec<Value>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// Streaming query support.
///
/// Separate from [`GenericClient`] so that only clients able to stream rows incrementally
/// (via `tokio-postgres`'s `query_raw`) need to implement it. Cursors require it.
pub trait StreamingClient: GenericClient {
    /// Execute a query and return a stream over its rows.
    fn query_stream(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<RowStream>> + Send;
}

struct DecodeRowStream<S> {
    inner: Pin<Box<S>>,
}

impl<S> DecodeRowStream<S> {
    fn new(stream: S) -> Self {
        Self {
            inner: Box::pin(stream),
        }
    }
}

impl<S> Stream for DecodeRowStream<S>
where
    S: Stream<Item = Result<tokio_postgres::Row, tokio_postgres::Error>> + Send + 'static,
{
    type Item = OrmResult<Vec<Value>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(row))) => Poll::Ready(Some(decode_row(&row))),
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(OrmError::from(e)))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl StreamingClient for tokio_postgres::Client {
    async fn query_stream(&self, sql: &str, params: &[Value]) -> OrmResult<RowStream> {
        let stream = tokio_postgres::Client::query_raw(self, sql, params.iter()).await?;
        Ok(RowStream::new(DecodeRowStream::new(stream)))
    }
}

impl StreamingClient for tokio_postgres::Transaction<'_> {
    async fn query_stream(&self, sql: &str, params: &[Value]) -> OrmResult<RowStream> {
        let stream = tokio_postgres::Transaction::query_raw(self, sql, params.iter()).await?;
        Ok(RowStream::new(DecodeRowStream::new(stream)))
    }
}

// ===== deadpool-postgres support =====

#[cfg(feature = "pool")]
impl GenericClient for deadpool_postgres::Client {
    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Vec<Value>>> {
        // Delegate to the deref target (ClientWrapper).
        GenericClient::query(&**self, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        GenericClient::execute(&**self, sql, params).await
    }

    fn cancel_token(&self) -> Option<tokio_postgres::CancelToken> {
        GenericClient::cancel_token(&**self)
    }
}

#[cfg(feature = "pool")]
impl GenericClient for deadpool_postgres::ClientWrapper {
    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Vec<Value>>> {
        GenericClient::query(&**self, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        GenericClient::execute(&**self, sql, params).await
    }

    fn cancel_token(&self) -> Option<tokio_postgres::CancelToken> {
        GenericClient::cancel_token(&**self)
    }
}

#[cfg(feature = "pool")]
impl GenericClient for deadpool_postgres::Transaction<'_> {
    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Vec<Value>>> {
        GenericClient::query(&**self, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        GenericClient::execute(&**self, sql, params).await
    }

    fn cancel_token(&self) -> Option<tokio_postgres::CancelToken> {
        GenericClient::cancel_token(&**self)
    }
}

#[cfg(feature = "pool")]
impl StreamingClient for deadpool_postgres::Client {
    async fn query_stream(&self, sql: &str, params: &[Value]) -> OrmResult<RowStream> {
        StreamingClient::query_stream(&**self, sql, params).await
    }
}

#[cfg(feature = "pool")]
impl StreamingClient for deadpool_postgres::ClientWrapper {
    async fn query_stream(&self, sql: &str, params: &[Value]) -> OrmResult<RowStream> {
        StreamingClient::query_stream(&**self, sql, params).await
    }
}

#[cfg(feature = "pool")]
impl StreamingClient for deadpool_postgres::Transaction<'_> {
    async fn query_stream(&self, sql: &str, params: &[Value]) -> OrmResult<RowStream> {
        StreamingClient::query_stream(&**self, sql, params).await
    }
}

// ===== Reference implementations =====
// These allow InstrumentedClient to wrap &Client instead of owned Client

impl<C: GenericClient> GenericClient for &C {
    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Vec<Value>>> {
        (*self).query(sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        (*self).execute(sql, params).await
    }

    fn render_settings(&self) -> RenderSettings {
        (*self).render_settings()
    }

    fn cancel_token(&self) -> Option<tokio_postgres::CancelToken> {
        (*self).cancel_token()
    }
}

impl<C: StreamingClient> StreamingClient for &C {
    async fn query_stream(&self, sql: &str, params: &[Value]) -> OrmResult<RowStream> {
        (*self).query_stream(sql, params).await
    }
}

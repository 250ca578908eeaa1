//! Lazy, forward-only iteration over a query result.

use crate::client::RowStream;
use crate::error::OrmResult;
use crate::result::Record;
use crate::schema::Field;
use futures_core::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// A scoped cursor over a streaming query.
///
/// The cursor owns the underlying row stream and releases it exactly once: when the stream is
/// exhausted, when it yields an error, on [`Cursor::close`], or when the cursor is dropped,
/// whichever comes first. Pulling from a released cursor yields `None`.
#[must_use]
pub struct Cursor {
    fields: Arc<[Field]>,
    inner: Option<RowStream>,
    fetched: u64,
}

impl Cursor {
    pub(crate) fn new(fields: Arc<[Field]>, stream: RowStream) -> Self {
        Self {
            fields,
            inner: Some(stream),
            fetched: 0,
        }
    }

    /// Projection of every record this cursor yields.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Number of records pulled so far.
    pub fn fetched(&self) -> u64 {
        self.fetched
    }

    /// Whether the underlying stream has been released.
    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    /// Pull the next record. `Ok(None)` once the cursor is exhausted or closed.
    pub async fn fetch_next(&mut self) -> OrmResult<Option<Record>> {
        std::future::poll_fn(|cx| Pin::new(&mut *self).poll_next(cx))
            .await
            .transpose()
    }

    /// Release the underlying stream without reading the remaining rows.
    pub fn close(&mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(stream) = self.inner.take() {
            drop(stream);
            tracing::trace!(target: "pgdsl.sql", fetched = self.fetched, "cursor released");
        }
    }
}

impl Stream for Cursor {
    type Item = OrmResult<Record>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(stream) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };
        match Pin::new(stream).poll_next(cx) {
            Poll::Ready(Some(Ok(values))) => match Record::new(Arc::clone(&this.fields), values) {
                Ok(record) => {
                    this.fetched += 1;
                    Poll::Ready(Some(Ok(record)))
                }
                Err(e) => {
                    this.release();
                    Poll::Ready(Some(Err(e)))
                }
            },
            Poll::Ready(Some(Err(e))) => {
                this.release();
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.release();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("fields", &self.fields)
            .field("fetched", &self.fetched)
            .field("closed", &self.is_closed())
            .finish()
    }
}

use super::config::MonitorConfig;
use super::truncate_sql_bytes;
use crate::client::{GenericClient, RowStream, StreamingClient};
use crate::error::{OrmError, OrmResult};
use crate::qb::StatementKind;
use crate::render::RenderSettings;
use crate::value::Value;
use std::borrow::Cow;
use std::time::{Duration, Instant};

/// A database client wrapper that logs every statement and enforces an optional timeout.
pub struct InstrumentedClient<C> {
    client: C,
    config: MonitorConfig,
}

impl<C: GenericClient> InstrumentedClient<C> {
    /// Wrap `client` with the default configuration.
    pub fn new(client: C) -> Self {
        Self {
            client,
            config: MonitorConfig::default(),
        }
    }

    /// Set the monitor configuration.
    pub fn with_config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the query timeout.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.config.query_timeout = Some(timeout);
        self
    }

    /// Set the slow query threshold.
    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.config.slow_query_threshold = Some(threshold);
        self
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn inner(&self) -> &C {
        &self.client
    }

    pub fn into_inner(self) -> C {
        self.client
    }

    fn display_sql<'a>(&self, sql: &'a str) -> Cow<'a, str> {
        match self.config.max_sql_length {
            Some(max) if sql.len() > max => {
                Cow::Owned(format!("{}...", truncate_sql_bytes(sql, max)))
            }
            _ => Cow::Borrowed(sql),
        }
    }

    async fn with_timeout<T, F>(&self, future: F) -> OrmResult<T>
    where
        F: std::future::Future<Output = OrmResult<T>> + Send,
    {
        let Some(timeout) = self.config.query_timeout else {
            return future.await;
        };
        match tokio::time::timeout(timeout, future).await {
            Ok(result) => result,
            Err(_) => {
                if let Some(cancel_token) = self.client.cancel_token() {
                    tokio::spawn(async move {
                        let _ = cancel_token.cancel_query(tokio_postgres::NoTls).await;
                    });
                }
                Err(OrmError::Timeout(timeout))
            }
        }
    }

    async fn run<T, F>(
        &self,
        sql: &str,
        params: usize,
        future: F,
        rows: impl Fn(&T) -> Option<u64>,
    ) -> OrmResult<T>
    where
        F: std::future::Future<Output = OrmResult<T>> + Send,
    {
        let kind = StatementKind::from_sql(sql).as_str();
        let start = Instant::now();
        let result = self.with_timeout(future).await;
        let elapsed = start.elapsed();
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        let sql = self.display_sql(sql);

        match &result {
            Ok(value) => {
                let rows = rows(value);
                let slow = self
                    .config
                    .slow_query_threshold
                    .is_some_and(|threshold| elapsed > threshold);
                if slow {
                    tracing::warn!(
                        target: "pgdsl.sql",
                        kind,
                        params,
                        rows,
                        elapsed_ms,
                        sql = %sql,
                        "slow statement"
                    );
                } else {
                    tracing::debug!(
                        target: "pgdsl.sql",
                        kind,
                        params,
                        rows,
                        elapsed_ms,
                        sql = %sql,
                        "statement complete"
                    );
                }
            }
            Err(error) => {
                tracing::warn!(
                    target: "pgdsl.sql",
                    kind,
                    params,
                    elapsed_ms,
                    error = %error,
                    sql = %sql,
                    "statement failed"
                );
            }
        }

        result
    }
}

impl<C: GenericClient> GenericClient for InstrumentedClient<C> {
    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Vec<Value>>> {
        self.run(sql, params.len(), self.client.query(sql, params), |rows| {
            Some(rows.len() as u64)
        })
        .await
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        self.run(sql, params.len(), self.client.execute(sql, params), |n| {
            Some(*n)
        })
        .await
    }

    fn render_settings(&self) -> RenderSettings {
        self.client.render_settings()
    }

    fn cancel_token(&self) -> Option<tokio_postgres::CancelToken> {
        self.client.cancel_token()
    }
}

impl<C: StreamingClient> StreamingClient for InstrumentedClient<C> {
    /// The timeout covers opening the stream; rows are pulled by the caller afterwards.
    async fn query_stream(&self, sql: &str, params: &[Value]) -> OrmResult<RowStream> {
        self.run(sql, params.len(), self.client.query_stream(sql, params), |_| None)
            .await
    }
}

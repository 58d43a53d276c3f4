//! Traced database connection wrapper.
//!
//! Introspection and DDL go through [`Connection`] so a plan can be applied
//! on a plain client or inside a caller's transaction. Every call made through
//! [`TracedConn`] gets a debug span carrying the SQL.

use std::future::Future;
use std::pin::Pin;

use tokio_postgres::types::ToSql;
use tokio_postgres::{Error, Row};
use tracing::Instrument;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, Error>> + Send + 'a>>;

/// Borrowed connection whose calls are wrapped in `db.*` spans.
///
/// ```ignore
/// use strata::ConnectionExt;
///
/// client.traced().batch_execute(&plan.to_sql(&dialect)).await?;
/// ```
pub struct TracedConn<'a, C: Connection> {
    conn: &'a C,
}

impl<'a, C: Connection> TracedConn<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Execute a query, returning all rows.
    pub async fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Error> {
        let span = tracing::debug_span!(
            "db.query",
            sql = %sql,
            params = params.len(),
            rows = tracing::field::Empty,
        );
        let rows = self
            .conn
            .query(sql, params)
            .instrument(span.clone())
            .await?;
        span.record("rows", rows.len());
        Ok(rows)
    }

    /// Execute one or more statements separated by semicolons.
    pub async fn batch_execute(&self, sql: &str) -> Result<(), Error> {
        let span = tracing::debug_span!(
            "db.batch_execute",
            sql = %sql,
            statements = sql.matches(';').count(),
        );
        self.conn.batch_execute(sql).instrument(span).await
    }
}

/// Extension trait to get a traced wrapper from a connection.
pub trait ConnectionExt: Connection + Sized {
    /// Wrap this connection in a `TracedConn` for query logging.
    fn traced(&self) -> TracedConn<'_, Self> {
        TracedConn::new(self)
    }
}

impl<C: Connection> ConnectionExt for C {}

/// Trait for database connections that can run catalog queries and DDL.
///
/// Implemented for `tokio_postgres::Client` and `tokio_postgres::Transaction`.
pub trait Connection: Send + Sync {
    /// Execute a query, returning all rows.
    fn query<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [&'a (dyn ToSql + Sync)],
    ) -> BoxFuture<'a, Vec<Row>>;

    /// Execute a batch of statements without parameters.
    fn batch_execute<'a>(&'a self, sql: &'a str) -> BoxFuture<'a, ()>;
}

macro_rules! impl_connection {
    ($($ty:ty),* $(,)?) => {$(
        impl Connection for $ty {
            fn query<'a>(
                &'a self,
                sql: &'a str,
                params: &'a [&'a (dyn ToSql + Sync)],
            ) -> BoxFuture<'a, Vec<Row>> {
                Box::pin(<$ty>::query(self, sql, params))
            }

            fn batch_execute<'a>(&'a self, sql: &'a str) -> BoxFuture<'a, ()> {
                Box::pin(<$ty>::batch_execute(self, sql))
            }
        }
    )*};
}

impl_connection!(tokio_postgres::Client, tokio_postgres::Transaction<'_>);

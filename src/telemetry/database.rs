use std::time::Instant;

use tracing::{Instrument, debug, info_span, warn};

/// Runs a store query inside a `store_query` span and logs its latency.
/// `row_counter` reports how many rows the operation touched, when that
/// is meaningful for the result type.
pub async fn log_query<F, T, E, R>(op: &str, query: F, row_counter: R) -> Result<T, E>
where
    F: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Debug,
    R: Fn(&T) -> Option<u64>,
{
    let span = info_span!("store_query", op = %op);
    let start = Instant::now();
    let result = query.instrument(span.clone()).await;
    let latency_ms = start.elapsed().as_millis();

    span.in_scope(|| match &result {
        Ok(value) => match row_counter(value) {
            Some(rows) => debug!(latency_ms = %latency_ms, rows = %rows, "Store query completed"),
            None => debug!(latency_ms = %latency_ms, "Store query completed"),
        },
        Err(error) => {
            warn!(latency_ms = %latency_ms, error = ?error, "Store query failed");
        }
    });

    result
}

#[macro_export]
macro_rules! log_query {
    ($name:expr, $query:expr) => {
        $crate::telemetry::database::log_query($name, $query, |_| None).await
    };
}

#[macro_export]
macro_rules! log_query_execute {
    ($name:expr, $query:expr) => {
        $crate::telemetry::database::log_query($name, $query, |result| {
            Some(result.rows_affected())
        })
        .await
    };
}

#[macro_export]
macro_rules! log_query_fetch_all {
    ($name:expr, $query:expr) => {
        $crate::telemetry::database::log_query($name, $query, |rows| Some(rows.len() as u64))
            .await
    };
}

#[macro_export]
macro_rules! log_query_fetch_optional {
    ($name:expr, $query:expr) => {
        $crate::telemetry::database::log_query($name, $query, |row| {
            Some(u64::from(row.is_some()))
        })
        .await
    };
}

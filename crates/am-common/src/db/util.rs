#![allow(async_fn_in_trait)]

use std::{sync::OnceLock, time::Instant};

use deadpool_postgres::GenericClient;
use tokio_postgres::{Row, types::ToSql};
use tracing::warn;

type Params<'a> = &'a [&'a (dyn ToSql + Sync)];

fn parse_threshold(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|ms| *ms > 0)
}

/// `AM_DB_LOG_MIN_DURATION_MS`, read once. Unset or zero disables slow-query logs.
fn slow_query_threshold_ms() -> Option<u64> {
    static THRESHOLD: OnceLock<Option<u64>> = OnceLock::new();

    *THRESHOLD.get_or_init(|| {
        parse_threshold(std::env::var("AM_DB_LOG_MIN_DURATION_MS").ok().as_deref())
    })
}

fn log_if_slow(label: &str, started: Instant) {
    let Some(threshold_ms) = slow_query_threshold_ms() else {
        return;
    };

    let elapsed_ms = started.elapsed().as_millis() as u64;
    if elapsed_ms >= threshold_ms {
        warn!(query = label, elapsed_ms, threshold_ms, "slow query");
    }
}

/// Prepared-statement helpers that log queries slower than the configured threshold.
pub trait TimedClientExt: GenericClient {
    async fn timed_query(
        &self,
        sql: &str,
        params: Params<'_>,
        label: &str,
    ) -> Result<Vec<Row>, tokio_postgres::Error> {
        let started = Instant::now();
        let stmt = self.prepare_cached(sql).await?;
        let result = self.query(&stmt, params).await;
        log_if_slow(label, started);
        result
    }

    async fn timed_query_opt(
        &self,
        sql: &str,
        params: Params<'_>,
        label: &str,
    ) -> Result<Option<Row>, tokio_postgres::Error> {
        let started = Instant::now();
        let stmt = self.prepare_cached(sql).await?;
        let result = self.query_opt(&stmt, params).await;
        log_if_slow(label, started);
        result
    }

    async fn timed_query_one(
        &self,
        sql: &str,
        params: Params<'_>,
        label: &str,
    ) -> Result<Row, tokio_postgres::Error> {
        let started = Instant::now();
        let stmt = self.prepare_cached(sql).await?;
        let result = self.query_one(&stmt, params).await;
        log_if_slow(label, started);
        result
    }

    async fn timed_execute(
        &self,
        sql: &str,
        params: Params<'_>,
        label: &str,
    ) -> Result<u64, tokio_postgres::Error> {
        let started = Instant::now();
        let stmt = self.prepare_cached(sql).await?;
        let result = self.execute(&stmt, params).await;
        log_if_slow(label, started);
        result
    }
}

impl<T: GenericClient + ?Sized> TimedClientExt for T {}

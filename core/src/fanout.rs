//! Scatter-gather over independent sub-requests.
//!
//! # Design
//! A logical query that spans several discrete sub-queries (a range of
//! years, the pages of the team listing) is expanded into one future per
//! sub-query. All of them are polled concurrently on the calling task with
//! `join_all`, so no sub-request is spawned or cancelled: each runs to
//! completion or failure. Results are then flattened in input order, never
//! completion order. If any sub-request failed, the whole gather fails with
//! the first failure in input order and no partial result is returned.
//!
//! There is no concurrency limit and no timeout at this layer; a per-request
//! timeout can be set on the client configuration.

use std::collections::BTreeMap;
use std::future::Future;
use std::ops::{Range, RangeInclusive};

use futures::future::join_all;
use tracing::debug;

use crate::cache::Fetched;
use crate::error::ApiError;

/// Number of pages swept when the team listing is requested without a page.
pub const TEAM_PAGE_COUNT: u32 = 20;
/// Teams the service returns per listing page.
pub const TEAMS_PER_PAGE: u32 = 500;

/// A single season or a contiguous span of seasons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Years {
    Single(u16),
    /// Half-open, like `2020..2023` covering 2020, 2021 and 2022.
    Span(Range<u16>),
}

impl Years {
    /// Ascending list of the covered years.
    pub fn to_vec(&self) -> Vec<u16> {
        match self {
            Years::Single(year) => vec![*year],
            Years::Span(range) => range.clone().collect(),
        }
    }

    pub fn contains(&self, year: u16) -> bool {
        match self {
            Years::Single(single) => *single == year,
            Years::Span(range) => range.contains(&year),
        }
    }
}

impl From<u16> for Years {
    fn from(year: u16) -> Self {
        Years::Single(year)
    }
}

impl From<Range<u16>> for Years {
    fn from(range: Range<u16>) -> Self {
        Years::Span(range)
    }
}

impl From<RangeInclusive<u16>> for Years {
    fn from(range: RangeInclusive<u16>) -> Self {
        let (start, end) = range.into_inner();
        Years::Span(start..end.saturating_add(1))
    }
}

/// Runs one sub-request per item concurrently and concatenates their
/// sequences in item order.
///
/// The returned ETag is the last one, in item order, that a sub-response
/// carried.
pub async fn scatter_gather<I, F, Fut, T>(items: I, fetch: F) -> Result<Fetched<Vec<T>>, ApiError>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = Result<Fetched<Vec<T>>, ApiError>>,
{
    let pending: Vec<Fut> = items.into_iter().map(fetch).collect();
    debug!(sub_requests = pending.len(), "dispatching fan-out batch");

    let mut data = Vec::new();
    let mut etag = None;
    for outcome in join_all(pending).await {
        let fetched = outcome?;
        data.extend(fetched.data);
        if fetched.etag.is_some() {
            etag = fetched.etag;
        }
    }
    Ok(Fetched { data, etag })
}

/// Runs one sub-request per year of `years`, flattened in ascending year
/// order. A single year issues exactly one sub-request.
pub async fn gather_years<F, Fut, T>(years: &Years, fetch: F) -> Result<Fetched<Vec<T>>, ApiError>
where
    F: FnMut(u16) -> Fut,
    Fut: Future<Output = Result<Fetched<Vec<T>>, ApiError>>,
{
    scatter_gather(years.to_vec(), fetch).await
}

/// Runs the full team-listing sweep, pages `0..TEAM_PAGE_COUNT`, flattened
/// in page order.
pub async fn gather_pages<F, Fut, T>(fetch: F) -> Result<Fetched<Vec<T>>, ApiError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Fetched<Vec<T>>, ApiError>>,
{
    scatter_gather(0..TEAM_PAGE_COUNT, fetch).await
}

/// Keeps the first item for each key and returns them sorted by key.
pub fn unique_sorted_by_key<T, K, F>(items: Vec<T>, key: F) -> Vec<T>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut unique = BTreeMap::new();
    for item in items {
        unique.entry(key(&item)).or_insert(item);
    }
    unique.into_values().collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    fn ok<T>(data: Vec<T>, etag: Option<&str>) -> Result<Fetched<Vec<T>>, ApiError> {
        Ok(Fetched::new(data, etag.map(str::to_string)))
    }

    #[test]
    fn years_expand_in_ascending_order() {
        assert_eq!(Years::from(2022).to_vec(), vec![2022]);
        assert_eq!(Years::from(2020..2023).to_vec(), vec![2020, 2021, 2022]);
        assert_eq!(Years::from(2020..=2022).to_vec(), vec![2020, 2021, 2022]);
        assert!(Years::from(2020..2023).contains(2022));
        assert!(!Years::from(2020..2023).contains(2023));
    }

    #[tokio::test(start_paused = true)]
    async fn year_order_survives_reversed_completion() {
        let years = Years::from(2020..2023);
        let gathered = gather_years(&years, |year| async move {
            // Earlier years finish last.
            tokio::time::sleep(Duration::from_millis(u64::from(2030 - year) * 10)).await;
            ok(vec![year], None)
        })
        .await
        .unwrap();
        assert_eq!(gathered.data, vec![2020, 2021, 2022]);
    }

    #[tokio::test(start_paused = true)]
    async fn one_failure_fails_the_whole_gather() {
        let finished = AtomicUsize::new(0);
        let years = Years::from(2020..2023);
        let result = gather_years(&years, |year| {
            let finished = &finished;
            async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                finished.fetch_add(1, Ordering::SeqCst);
                if year == 2021 {
                    Err(ApiError::Tba("2021 failed".into()))
                } else {
                    ok(vec![year], None)
                }
            }
        })
        .await;

        let err = result.unwrap_err();
        assert!(matches!(err, ApiError::Tba(msg) if msg == "2021 failed"));
        assert_eq!(finished.load(Ordering::SeqCst), 3, "siblings run to completion");
    }

    #[tokio::test]
    async fn first_failure_in_input_order_is_reported() {
        let result: Result<Fetched<Vec<u32>>, _> = scatter_gather(0..3u32, |i| async move {
            match i {
                1 => Err(ApiError::Tba("one".into())),
                2 => Err(ApiError::NotModified),
                _ => ok(vec![i], None),
            }
        })
        .await;
        assert!(matches!(result.unwrap_err(), ApiError::Tba(msg) if msg == "one"));
    }

    #[tokio::test]
    async fn page_sweep_issues_twenty_requests_in_page_order() {
        let calls = AtomicUsize::new(0);
        let gathered = gather_pages(|page| {
            let calls = &calls;
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                ok(vec![page * 10, page * 10 + 1], None)
            }
        })
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 20);
        assert_eq!(gathered.data.len(), 40);
        assert!(gathered.data.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(gathered.data.first(), Some(&0));
        assert_eq!(gathered.data.last(), Some(&191));
    }

    #[tokio::test]
    async fn last_etag_in_input_order_wins() {
        let gathered = scatter_gather(0..3u32, |i| async move {
            match i {
                0 => ok(vec![i], Some("\"a\"")),
                1 => ok(vec![i], Some("\"b\"")),
                _ => ok(vec![i], None),
            }
        })
        .await
        .unwrap();
        assert_eq!(gathered.etag.as_deref(), Some("\"b\""));
    }

    #[tokio::test]
    async fn empty_input_gathers_nothing() {
        let gathered: Fetched<Vec<u32>> = scatter_gather(Vec::<u32>::new(), |i| async move { ok(vec![i], None) })
            .await
            .unwrap();
        assert!(gathered.data.is_empty());
        assert_eq!(gathered.etag, None);
    }

    #[test]
    fn unique_sorted_keeps_first_and_orders_by_key() {
        let items = vec![(254, "a"), (4099, "b"), (254, "c"), (1, "d")];
        let unique = unique_sorted_by_key(items, |(number, _)| *number);
        assert_eq!(unique, vec![(1, "d"), (254, "a"), (4099, "b")]);
    }
}

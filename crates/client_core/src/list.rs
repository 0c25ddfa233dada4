use std::{collections::HashSet, sync::Arc};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use shared::{
    domain::{CompanyUser, Driver, Order, Vehicle},
    error::{ApiError, ErrorCode},
    protocol::ListQuery,
};

use crate::{error::RemoteError, transport::RemoteService};

/// Identity key used for de-duplication across adjacent pages.
pub trait Keyed {
    fn identity_key(&self) -> &str;
}

impl Keyed for Driver {
    fn identity_key(&self) -> &str {
        self.id.as_str()
    }
}

impl Keyed for CompanyUser {
    fn identity_key(&self) -> &str {
        self.id.as_str()
    }
}

impl Keyed for Order {
    fn identity_key(&self) -> &str {
        self.id.as_str()
    }
}

impl Keyed for Vehicle {
    fn identity_key(&self) -> &str {
        self.id.as_str()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A page was fetched and merged; `appended` counts items actually added
    /// after de-duplication.
    Fetched { appended: usize },
    /// The call was a no-op: exhausted, a fetch already in flight, or a
    /// latched error awaiting a manual `refresh`.
    Skipped,
    /// The fetch completed after cancellation; its page was discarded.
    Cancelled,
}

struct ListState<T> {
    accumulated: Vec<T>,
    seen: HashSet<String>,
    next_offset: u64,
    exhausted: bool,
    last_error: Option<RemoteError>,
    in_flight: bool,
}

impl<T> ListState<T> {
    fn empty() -> Self {
        Self {
            accumulated: Vec::new(),
            seen: HashSet::new(),
            next_offset: 0,
            exhausted: false,
            last_error: None,
            in_flight: false,
        }
    }
}

/// Presents a remote collection as a single growing, de-duplicated,
/// append-only view: `refresh` for pull-to-refresh, `load_more` for infinite
/// scroll. Each screen owns its own fetcher; there is no shared state across
/// screens.
pub struct ListFetcher<T> {
    service: Arc<dyn RemoteService>,
    collection: String,
    base: ListQuery,
    state: Mutex<ListState<T>>,
    cancel: CancellationToken,
}

impl<T> ListFetcher<T>
where
    T: DeserializeOwned + Keyed + Clone + Send,
{
    pub fn new(service: Arc<dyn RemoteService>, collection: impl Into<String>, base: ListQuery) -> Self {
        Self {
            service,
            collection: collection.into(),
            base,
            state: Mutex::new(ListState::empty()),
            cancel: CancellationToken::new(),
        }
    }

    /// Token observed before any post-fetch state commit; cancel it when the
    /// owning screen goes away so an in-flight response is discarded.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn items(&self) -> Vec<T> {
        self.state.lock().await.accumulated.clone()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.accumulated.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.accumulated.is_empty()
    }

    pub async fn is_exhausted(&self) -> bool {
        self.state.lock().await.exhausted
    }

    pub async fn next_offset(&self) -> u64 {
        self.state.lock().await.next_offset
    }

    pub async fn last_error(&self) -> Option<RemoteError> {
        self.state.lock().await.last_error.clone()
    }

    /// Full reset: drops the accumulator and requests the first page. A
    /// failure leaves the accumulator empty with the error latched; a success
    /// clears any previous error.
    pub async fn refresh(&self) -> Result<FetchOutcome, RemoteError> {
        {
            let mut state = self.state.lock().await;
            if state.in_flight {
                return Ok(FetchOutcome::Skipped);
            }
            *state = ListState::empty();
            state.in_flight = true;
        }

        let fetched = self.fetch_page(0).await;

        let mut state = self.state.lock().await;
        state.in_flight = false;
        if self.cancel.is_cancelled() {
            return Ok(FetchOutcome::Cancelled);
        }

        match fetched {
            Ok(page) => {
                let appended = page.items.len();
                state.seen = page
                    .items
                    .iter()
                    .map(|item| item.identity_key().to_string())
                    .collect();
                state.accumulated = page.items;
                state.next_offset = page.fetched as u64;
                state.exhausted = page.is_last;
                Ok(FetchOutcome::Fetched { appended })
            }
            Err(err) => {
                warn!(collection = %self.collection, error = %err, "refresh failed");
                state.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Incremental append. No-op while exhausted, while a fetch is in
    /// flight, or while an error is latched (the caller must `refresh` to
    /// clear it; load-more never auto-retries). The offset advances by the
    /// number of items fetched, not appended, so server-side arithmetic
    /// stays correct when duplicates are filtered.
    pub async fn load_more(&self) -> Result<FetchOutcome, RemoteError> {
        let skip = {
            let mut state = self.state.lock().await;
            if state.exhausted || state.in_flight || state.last_error.is_some() {
                return Ok(FetchOutcome::Skipped);
            }
            state.in_flight = true;
            state.next_offset
        };

        let fetched = self.fetch_page(skip).await;

        let mut state = self.state.lock().await;
        state.in_flight = false;
        if self.cancel.is_cancelled() {
            return Ok(FetchOutcome::Cancelled);
        }

        match fetched {
            Ok(page) => {
                let mut appended = 0;
                for item in page.items {
                    if state.seen.insert(item.identity_key().to_string()) {
                        state.accumulated.push(item);
                        appended += 1;
                    }
                }
                state.next_offset += page.fetched as u64;
                state.exhausted = page.is_last;
                Ok(FetchOutcome::Fetched { appended })
            }
            Err(err) => {
                warn!(collection = %self.collection, error = %err, "load_more failed");
                state.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    async fn fetch_page(&self, skip: u64) -> Result<FetchedPage<T>, RemoteError> {
        let query = self.base.clone().with_skip(skip);
        let page = self.service.find(&self.collection, &query).await?;
        let fetched = page.data.len();
        let is_last = page.is_last();

        let mut items = Vec::with_capacity(fetched);
        for value in page.data {
            items.push(decode_record(&self.collection, value)?);
        }

        Ok(FetchedPage {
            items,
            fetched,
            is_last,
        })
    }
}

struct FetchedPage<T> {
    items: Vec<T>,
    fetched: usize,
    is_last: bool,
}

fn decode_record<T: DeserializeOwned>(collection: &str, value: Value) -> Result<T, RemoteError> {
    serde_json::from_value(value).map_err(|err| {
        RemoteError::Server(ApiError::new(
            ErrorCode::Internal,
            format!("malformed record in '{collection}' page: {err}"),
        ))
    })
}

#[cfg(test)]
#[path = "tests/list_tests.rs"]
mod tests;

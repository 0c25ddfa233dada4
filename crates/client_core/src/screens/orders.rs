use std::sync::Arc;

use shared::{
    domain::{Order, RegionId},
    protocol::ListQuery,
};

use crate::{
    error::RemoteError,
    list::{FetchOutcome, ListFetcher},
    screens::PAGE_LIMIT,
    transport::RemoteService,
};

/// Incoming transfer orders open for bidding, newest first, optionally
/// narrowed to one region.
pub struct OrdersScreen {
    fetcher: ListFetcher<Order>,
}

impl OrdersScreen {
    pub fn new(service: Arc<dyn RemoteService>, region: Option<RegionId>) -> Self {
        let mut query = ListQuery::new(PAGE_LIMIT)
            .filtered("status", "AwaitingPrice")
            .sorted_desc("createdAt");
        if let Some(region) = region {
            query = query.filtered("meta.regionId", region.as_str());
        }
        Self {
            fetcher: ListFetcher::new(service, "orders", query),
        }
    }

    pub fn fetcher(&self) -> &ListFetcher<Order> {
        &self.fetcher
    }

    pub async fn refresh(&self) -> Result<FetchOutcome, RemoteError> {
        self.fetcher.refresh().await
    }

    pub async fn load_more(&self) -> Result<FetchOutcome, RemoteError> {
        self.fetcher.load_more().await
    }

    pub async fn orders(&self) -> Vec<Order> {
        self.fetcher.items().await
    }
}

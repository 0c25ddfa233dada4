use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;
use url::Url;

use shared::{
    error::ApiError,
    protocol::{AuthRequest, AuthResult, ListPage, ListQuery},
};

use crate::{error::RemoteError, session::SessionTokens};

/// The remote collection service consumed by every screen. Collections are
/// addressed by name; payloads stay JSON at this seam and are typed one
/// layer up.
#[async_trait]
pub trait RemoteService: Send + Sync {
    async fn find(&self, collection: &str, query: &ListQuery)
        -> Result<ListPage<Value>, RemoteError>;
    async fn create(&self, collection: &str, payload: Value) -> Result<Value, RemoteError>;
    /// `id` is `None` for collection-level patches (the uploads append call).
    async fn patch(
        &self,
        collection: &str,
        id: Option<&str>,
        payload: Value,
    ) -> Result<Value, RemoteError>;
    async fn update(
        &self,
        collection: &str,
        id: Option<&str>,
        payload: Value,
    ) -> Result<Value, RemoteError>;
    async fn authenticate(&self, request: &AuthRequest) -> Result<AuthResult, RemoteError>;
    async fn logout(&self) -> Result<(), RemoteError>;
}

/// reqwest-backed implementation speaking the backend's REST dialect:
/// `GET /{collection}` with `$limit`/`$skip`/`$sort[field]` query params,
/// `POST`/`PATCH`/`PUT` for mutations, bearer session token on every call.
pub struct HttpRemoteService {
    http: reqwest::Client,
    base_url: Url,
    tokens: SessionTokens,
}

impl HttpRemoteService {
    pub fn new(base_url: &str, tokens: SessionTokens) -> Result<Self, RemoteError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| RemoteError::Network(format!("invalid base url '{base_url}': {err}")))?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            tokens,
        })
    }

    fn endpoint(&self, collection: &str, id: Option<&str>) -> Result<Url, RemoteError> {
        let mut path = collection.to_string();
        if let Some(id) = id {
            path.push('/');
            path.push_str(id);
        }
        self.base_url
            .join(&path)
            .map_err(|err| RemoteError::Network(format!("invalid endpoint '{path}': {err}")))
    }

    async fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.tokens.current().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send_json(&self, request: reqwest::RequestBuilder) -> Result<Value, RemoteError> {
        let response = self
            .authorized(request)
            .await
            .send()
            .await
            .map_err(|err| RemoteError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.json::<ApiError>().await.ok();
            return Err(RemoteError::from_response(status.as_u16(), body));
        }

        response
            .json::<Value>()
            .await
            .map_err(|err| RemoteError::Network(format!("invalid response body: {err}")))
    }
}

fn query_pairs(query: &ListQuery) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(query.filter.len() + query.sort.len() + 2);
    pairs.push(("$limit".to_string(), query.limit.to_string()));
    pairs.push(("$skip".to_string(), query.skip.to_string()));
    for (field, dir) in &query.sort {
        pairs.push((format!("$sort[{field}]"), dir.as_wire().to_string()));
    }
    for (key, value) in &query.filter {
        let rendered = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        pairs.push((key.clone(), rendered));
    }
    pairs
}

#[async_trait]
impl RemoteService for HttpRemoteService {
    async fn find(
        &self,
        collection: &str,
        query: &ListQuery,
    ) -> Result<ListPage<Value>, RemoteError> {
        let url = self.endpoint(collection, None)?;
        let request = self.http.get(url).query(&query_pairs(query));
        let body = self.send_json(request).await?;
        serde_json::from_value(body)
            .map_err(|err| RemoteError::Network(format!("invalid page for '{collection}': {err}")))
    }

    async fn create(&self, collection: &str, payload: Value) -> Result<Value, RemoteError> {
        let url = self.endpoint(collection, None)?;
        self.send_json(self.http.post(url).json(&payload)).await
    }

    async fn patch(
        &self,
        collection: &str,
        id: Option<&str>,
        payload: Value,
    ) -> Result<Value, RemoteError> {
        let url = self.endpoint(collection, id)?;
        self.send_json(self.http.patch(url).json(&payload)).await
    }

    async fn update(
        &self,
        collection: &str,
        id: Option<&str>,
        payload: Value,
    ) -> Result<Value, RemoteError> {
        let url = self.endpoint(collection, id)?;
        self.send_json(self.http.put(url).json(&payload)).await
    }

    async fn authenticate(&self, request: &AuthRequest) -> Result<AuthResult, RemoteError> {
        let url = self.endpoint("authentication", None)?;
        let body = self
            .send_json(self.http.post(url).json(request))
            .await?;
        serde_json::from_value(body)
            .map_err(|err| RemoteError::Network(format!("invalid auth response: {err}")))
    }

    async fn logout(&self) -> Result<(), RemoteError> {
        let url = self.endpoint("authentication", None)?;
        let response = self
            .authorized(self.http.delete(url))
            .await
            .send()
            .await
            .map_err(|err| RemoteError::Network(err.to_string()))?;
        if !response.status().is_success() {
            warn!(status = %response.status(), "remote logout rejected");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;

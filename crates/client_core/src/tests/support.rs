use std::{collections::VecDeque, sync::Mutex, time::Duration};

use async_trait::async_trait;
use serde_json::{json, Value};

use shared::{
    domain::{AuthenticatedUser, UserId, UserRole},
    protocol::{AuthRequest, AuthResult, ListPage, ListQuery},
};

use crate::{
    error::{IdentityError, RemoteError},
    session::IdentityProvider,
    transport::RemoteService,
};

/// Scripted in-memory stand-in for the remote service. Responses are queued
/// per operation; every call is recorded for assertions.
#[derive(Default)]
pub struct FakeRemoteService {
    pub find_delay: Mutex<Option<Duration>>,
    pub pages: Mutex<VecDeque<Result<ListPage<Value>, RemoteError>>>,
    pub find_calls: Mutex<Vec<(String, ListQuery)>>,
    pub create_responses: Mutex<VecDeque<Result<Value, RemoteError>>>,
    pub create_calls: Mutex<Vec<(String, Value)>>,
    pub patch_responses: Mutex<VecDeque<Result<Value, RemoteError>>>,
    pub patch_calls: Mutex<Vec<(String, Option<String>, Value)>>,
    pub update_responses: Mutex<VecDeque<Result<Value, RemoteError>>>,
    pub update_calls: Mutex<Vec<(String, Option<String>, Value)>>,
    pub auth_responses: Mutex<VecDeque<Result<AuthResult, RemoteError>>>,
    pub auth_calls: Mutex<Vec<AuthRequest>>,
    pub logout_calls: Mutex<u32>,
}

impl FakeRemoteService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_page(&self, page: ListPage<Value>) {
        self.pages.lock().unwrap().push_back(Ok(page));
    }

    pub fn push_page_err(&self, err: RemoteError) {
        self.pages.lock().unwrap().push_back(Err(err));
    }

    pub fn push_create(&self, value: Value) {
        self.create_responses.lock().unwrap().push_back(Ok(value));
    }

    pub fn push_create_err(&self, err: RemoteError) {
        self.create_responses.lock().unwrap().push_back(Err(err));
    }

    pub fn push_patch(&self, value: Value) {
        self.patch_responses.lock().unwrap().push_back(Ok(value));
    }

    pub fn push_patch_err(&self, err: RemoteError) {
        self.patch_responses.lock().unwrap().push_back(Err(err));
    }

    pub fn push_update(&self, value: Value) {
        self.update_responses.lock().unwrap().push_back(Ok(value));
    }

    pub fn push_auth(&self, result: AuthResult) {
        self.auth_responses.lock().unwrap().push_back(Ok(result));
    }

    pub fn push_auth_err(&self, err: RemoteError) {
        self.auth_responses.lock().unwrap().push_back(Err(err));
    }
}

/// Identity provider that hands out a fixed token, or a scripted rejection.
pub struct FakeIdentity {
    pub token: String,
    pub reject_with: Mutex<Option<IdentityError>>,
    pub sign_in_calls: Mutex<Vec<(String, String)>>,
    pub sign_up_calls: Mutex<Vec<(String, String)>>,
}

impl FakeIdentity {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
            reject_with: Mutex::new(None),
            sign_in_calls: Mutex::new(Vec::new()),
            sign_up_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting(err: IdentityError) -> Self {
        let identity = Self::new("unused");
        *identity.reject_with.lock().unwrap() = Some(err);
        identity
    }

    fn answer(&self) -> Result<String, IdentityError> {
        match self.reject_with.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(self.token.clone()),
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<String, IdentityError> {
        self.sign_in_calls
            .lock()
            .unwrap()
            .push((email.to_string(), password.to_string()));
        self.answer()
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<String, IdentityError> {
        self.sign_up_calls
            .lock()
            .unwrap()
            .push((email.to_string(), password.to_string()));
        self.answer()
    }
}

fn no_script(op: &str) -> RemoteError {
    RemoteError::Network(format!("no scripted {op} response"))
}

#[async_trait]
impl RemoteService for FakeRemoteService {
    async fn find(
        &self,
        collection: &str,
        query: &ListQuery,
    ) -> Result<ListPage<Value>, RemoteError> {
        let delay = *self.find_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.find_calls
            .lock()
            .unwrap()
            .push((collection.to_string(), query.clone()));
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(no_script("find")))
    }

    async fn create(&self, collection: &str, payload: Value) -> Result<Value, RemoteError> {
        self.create_calls
            .lock()
            .unwrap()
            .push((collection.to_string(), payload));
        self.create_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(no_script("create")))
    }

    async fn patch(
        &self,
        collection: &str,
        id: Option<&str>,
        payload: Value,
    ) -> Result<Value, RemoteError> {
        self.patch_calls.lock().unwrap().push((
            collection.to_string(),
            id.map(str::to_string),
            payload,
        ));
        self.patch_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(no_script("patch")))
    }

    async fn update(
        &self,
        collection: &str,
        id: Option<&str>,
        payload: Value,
    ) -> Result<Value, RemoteError> {
        self.update_calls.lock().unwrap().push((
            collection.to_string(),
            id.map(str::to_string),
            payload,
        ));
        self.update_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(no_script("update")))
    }

    async fn authenticate(&self, request: &AuthRequest) -> Result<AuthResult, RemoteError> {
        self.auth_calls.lock().unwrap().push(request.clone());
        self.auth_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(no_script("authenticate")))
    }

    async fn logout(&self) -> Result<(), RemoteError> {
        *self.logout_calls.lock().unwrap() += 1;
        Ok(())
    }
}

/// A page of minimal records (`{"_id": ..., "createdAt": ...}`) in the given
/// order.
pub fn record_page(ids: &[&str], total: u64, limit: u32, skip: u64) -> ListPage<Value> {
    let data = ids
        .iter()
        .enumerate()
        .map(|(index, id)| json!({ "_id": id, "createdAt": 1_737_000_000_000i64 - index as i64 }))
        .collect();
    ListPage {
        data,
        total,
        limit,
        skip,
    }
}

pub fn auth_result(user_id: &str, token: &str) -> AuthResult {
    AuthResult {
        access_token: token.to_string(),
        user: AuthenticatedUser {
            id: UserId(user_id.to_string()),
            first_name: "Dana".to_string(),
            last_name: "Ops".to_string(),
            email: "dana@example.com".to_string(),
            phone: None,
            role: UserRole::Company,
            company_id: None,
        },
    }
}

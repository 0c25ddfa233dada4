use std::sync::Arc;

use serde_json::json;

use shared::{
    domain::{CompanyId, CompanyUser},
    error::{ApiError, ErrorCode},
    protocol::ListQuery,
};

use crate::{
    error::RemoteError,
    list::{FetchOutcome, ListFetcher},
    screens::{ScreenError, PAGE_LIMIT},
    transport::RemoteService,
    validate::{require, require_email, require_phone, ValidationErrors},
};

#[derive(Debug, Clone)]
pub struct UserForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl UserForm {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require(&mut errors, "firstName", &self.first_name);
        require(&mut errors, "lastName", &self.last_name);
        require_email(&mut errors, "email", &self.email);
        if let Some(phone) = &self.phone {
            require_phone(&mut errors, "phone", phone);
        }
        errors.into_result()
    }
}

/// Company staff roster.
pub struct UsersScreen {
    service: Arc<dyn RemoteService>,
    fetcher: ListFetcher<CompanyUser>,
    company_id: CompanyId,
}

impl UsersScreen {
    pub fn new(service: Arc<dyn RemoteService>, company_id: CompanyId) -> Self {
        let query = ListQuery::new(PAGE_LIMIT)
            .filtered("companyId", company_id.as_str())
            .sorted_desc("createdAt");
        Self {
            fetcher: ListFetcher::new(Arc::clone(&service), "users", query),
            service,
            company_id,
        }
    }

    pub fn fetcher(&self) -> &ListFetcher<CompanyUser> {
        &self.fetcher
    }

    pub async fn refresh(&self) -> Result<FetchOutcome, RemoteError> {
        self.fetcher.refresh().await
    }

    pub async fn load_more(&self) -> Result<FetchOutcome, RemoteError> {
        self.fetcher.load_more().await
    }

    pub async fn users(&self) -> Vec<CompanyUser> {
        self.fetcher.items().await
    }

    pub async fn create_user(&self, form: UserForm) -> Result<CompanyUser, ScreenError> {
        form.validate()?;

        let created = self
            .service
            .create(
                "users",
                json!({
                    "firstName": form.first_name,
                    "lastName": form.last_name,
                    "email": form.email,
                    "phone": form.phone,
                    "companyId": self.company_id,
                    "role": "company",
                }),
            )
            .await?;

        serde_json::from_value(created).map_err(|err| {
            ScreenError::Remote(RemoteError::Server(ApiError::new(
                ErrorCode::Internal,
                format!("malformed user record: {err}"),
            )))
        })
    }
}

use std::{path::PathBuf, sync::Arc};

use serde_json::json;

use shared::{
    domain::{CompanyId, Driver, DriverId},
    error::{ApiError, ErrorCode},
    protocol::ListQuery,
};

use crate::{
    error::RemoteError,
    list::{FetchOutcome, ListFetcher},
    screens::{ScreenError, PAGE_LIMIT},
    transport::RemoteService,
    upload::MultipartUploader,
    validate::{require, require_email, require_phone, ValidationErrors},
};

#[derive(Debug, Clone)]
pub struct DriverForm {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub license_front: PathBuf,
    pub license_back: PathBuf,
}

impl DriverForm {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require(&mut errors, "firstName", &self.first_name);
        require(&mut errors, "lastName", &self.last_name);
        require_phone(&mut errors, "phone", &self.phone);
        require_email(&mut errors, "email", &self.email);
        errors.into_result()
    }
}

/// Driver roster for one company: newest first, infinite scroll, and the
/// create form including the license-image upload pipeline.
pub struct DriversScreen {
    service: Arc<dyn RemoteService>,
    uploader: MultipartUploader,
    fetcher: ListFetcher<Driver>,
    company_id: CompanyId,
}

impl DriversScreen {
    pub fn new(service: Arc<dyn RemoteService>, company_id: CompanyId) -> Self {
        let query = ListQuery::new(PAGE_LIMIT)
            .filtered("companyId", company_id.as_str())
            .sorted_desc("createdAt");
        Self {
            uploader: MultipartUploader::new(Arc::clone(&service)),
            fetcher: ListFetcher::new(Arc::clone(&service), "drivers", query),
            service,
            company_id,
        }
    }

    pub fn fetcher(&self) -> &ListFetcher<Driver> {
        &self.fetcher
    }

    pub async fn refresh(&self) -> Result<FetchOutcome, RemoteError> {
        self.fetcher.refresh().await
    }

    pub async fn load_more(&self) -> Result<FetchOutcome, RemoteError> {
        self.fetcher.load_more().await
    }

    pub async fn drivers(&self) -> Vec<Driver> {
        self.fetcher.items().await
    }

    /// Validates, uploads both license images, then creates the record.
    /// A failed upload aborts the whole submission; nothing is created.
    pub async fn create_driver(&self, form: DriverForm) -> Result<Driver, ScreenError> {
        form.validate()?;

        let front = self.uploader.upload_file(&form.license_front, None).await?;
        let back = self.uploader.upload_file(&form.license_back, None).await?;

        let created = self
            .service
            .create(
                "drivers",
                json!({
                    "firstName": form.first_name,
                    "lastName": form.last_name,
                    "phone": form.phone,
                    "email": form.email,
                    "licenseFront": front,
                    "licenseBack": back,
                    "companyId": self.company_id,
                    "isActive": true,
                }),
            )
            .await?;

        serde_json::from_value(created).map_err(|err| {
            ScreenError::Remote(RemoteError::Server(ApiError::new(
                ErrorCode::Internal,
                format!("malformed driver record: {err}"),
            )))
        })
    }

    /// Last-write-wins activation toggle.
    pub async fn set_active(&self, driver: &DriverId, active: bool) -> Result<Driver, ScreenError> {
        let patched = self
            .service
            .patch("drivers", Some(driver.as_str()), json!({ "isActive": active }))
            .await?;
        serde_json::from_value(patched).map_err(|err| {
            ScreenError::Remote(RemoteError::Server(ApiError::new(
                ErrorCode::Internal,
                format!("malformed driver record: {err}"),
            )))
        })
    }
}

#[cfg(test)]
#[path = "../tests/drivers_screen_tests.rs"]
mod tests;

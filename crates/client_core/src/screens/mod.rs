//! Thin screen controllers: each one composes a list fetcher, the upload
//! pipeline and client-side validation for a single console screen. No
//! rendering lives here.

use thiserror::Error;

use crate::{
    error::{RemoteError, SignupError, UploadError},
    validate::ValidationErrors,
};

mod company_form;
mod drivers;
mod order_bid;
mod orders;
mod users;

pub use company_form::{CompanyFormScreen, CompanySubmitOutcome};
pub use drivers::{DriverForm, DriversScreen};
pub use order_bid::{BidForm, OrderBidScreen};
pub use orders::OrdersScreen;
pub use users::{UserForm, UsersScreen};

pub const PAGE_LIMIT: u32 = 20;

#[derive(Debug, Error)]
pub enum ScreenError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Signup(#[from] SignupError),
}

impl From<ValidationErrors> for ScreenError {
    fn from(value: ValidationErrors) -> Self {
        ScreenError::Validation(value)
    }
}

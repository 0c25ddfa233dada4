//! Client core for the transfer-marketplace company console: remote
//! collection access with paginated de-duplicating list state, the chunked
//! multipart upload pipeline, the signup wizard, session handling and the
//! thin screen controllers on top.

pub mod config;
pub mod error;
pub mod geocode;
pub mod list;
pub mod screens;
pub mod session;
pub mod signup;
pub mod transport;
pub mod upload;
pub mod validate;
pub mod wizard;

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

pub use config::{load_settings, Settings};
pub use error::{
    GeocodeError, IdentityError, RemoteError, SessionError, SignupError, UploadError, WizardError,
};
pub use geocode::{GeoPlace, GeocodeClient};
pub use list::{FetchOutcome, Keyed, ListFetcher};
pub use session::{
    IdentityProvider, MissingIdentityProvider, SessionManager, SessionTokens, SESSION_TOKEN_KEY,
};
pub use transport::{HttpRemoteService, RemoteService};
pub use upload::{MultipartUploader, UploadSession, CHUNK_SIZE};
pub use validate::ValidationErrors;
pub use wizard::{CompanyDraft, RegistrationData, SignupWizard, Step1Data};

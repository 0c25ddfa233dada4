use shared::error::{ApiError, ErrorCode};
use thiserror::Error;

/// Failure of a single remote call. `Auth` means the session is invalid and
/// the caller must force a logout; everything else is retryable by explicit
/// user action.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    #[error("network error: {0}")]
    Network(String),
    #[error("session rejected: {}", .0.message)]
    Auth(ApiError),
    #[error("server error: {}", .0.message)]
    Server(ApiError),
}

impl RemoteError {
    pub fn from_response(status: u16, body: Option<ApiError>) -> Self {
        let api_error =
            body.unwrap_or_else(|| ApiError::new(ErrorCode::from_status(status), format!("request failed with status {status}")));
        match status {
            401 | 403 => RemoteError::Auth(api_error),
            _ => RemoteError::Server(api_error),
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, RemoteError::Auth(_))
    }
}

#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    #[error("identity provider rejected the credentials: {0}")]
    Rejected(String),
    #[error("identity provider unreachable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("token store failure: {0}")]
    Store(String),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("refusing to upload an empty file")]
    EmptyFile,
    #[error("failed reading source file: {0}")]
    Io(#[from] std::io::Error),
    #[error("upload rejected at initiation: {0}")]
    Init(RemoteError),
    #[error("failed to upload part {part_number}: {source}")]
    Chunk {
        part_number: u32,
        source: RemoteError,
    },
    #[error("upload parts are not contiguous from 1")]
    NonContiguousParts,
    #[error("failed to finalize upload: {0}")]
    Finalize(RemoteError),
    #[error("upload cancelled")]
    Cancelled,
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoding request failed: {0}")]
    Network(String),
    #[error("geocoding provider returned status {0}")]
    Status(u16),
    #[error("unexpected geocoding response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("step 1 must be completed before entering company data")]
    StepOrder,
    #[error("step 1 is missing required fields")]
    IncompleteStep1,
    #[error("password must be at least 6 characters")]
    PasswordTooShort,
    #[error("company data has not been entered")]
    MissingCompanyData,
}

#[derive(Debug, Error)]
pub enum SignupError {
    #[error("a company with this name already exists. Please use a different company name.")]
    CompanyNameTaken,
    #[error("this email is already registered. Please use a different email or log in.")]
    EmailTaken,
    #[error("unable to create account. Please try again.")]
    AccountCreation(String),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Wizard(#[from] WizardError),
}

impl SignupError {
    /// Maps known backend rejection phrases onto friendlier variants;
    /// anything unrecognized is surfaced verbatim.
    pub fn from_server_message(error: RemoteError) -> Self {
        let message = match &error {
            RemoteError::Auth(api) | RemoteError::Server(api) => api.message.to_lowercase(),
            RemoteError::Network(_) => return SignupError::Remote(error),
        };

        if message.contains("company")
            && (message.contains("already exists") || message.contains("already exist"))
        {
            return SignupError::CompanyNameTaken;
        }
        if message.contains("email")
            && (message.contains("duplicate")
                || message.contains("already exist")
                || message.contains("unique")
                || message.contains("already used"))
        {
            return SignupError::EmailTaken;
        }
        SignupError::Remote(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_401_maps_to_auth() {
        let err = RemoteError::from_response(401, None);
        assert!(err.is_auth());
    }

    #[test]
    fn http_500_maps_to_server() {
        let err = RemoteError::from_response(500, Some(ApiError::new(ErrorCode::Internal, "boom")));
        assert!(matches!(err, RemoteError::Server(api) if api.message == "boom"));
    }

    #[test]
    fn duplicate_company_message_maps_to_company_name_taken() {
        let err = RemoteError::Server(ApiError::new(
            ErrorCode::Validation,
            "Company 'Acme Transfers' already exists",
        ));
        assert!(matches!(
            SignupError::from_server_message(err),
            SignupError::CompanyNameTaken
        ));
    }

    #[test]
    fn duplicate_email_message_maps_to_email_taken() {
        let err = RemoteError::Server(ApiError::new(
            ErrorCode::Validation,
            "email must be unique",
        ));
        assert!(matches!(
            SignupError::from_server_message(err),
            SignupError::EmailTaken
        ));
    }

    #[test]
    fn unknown_server_message_passes_through() {
        let err = RemoteError::Server(ApiError::new(ErrorCode::Internal, "quota exceeded"));
        assert!(matches!(
            SignupError::from_server_message(err),
            SignupError::Remote(RemoteError::Server(api)) if api.message == "quota exceeded"
        ));
    }
}

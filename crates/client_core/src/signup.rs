use serde_json::json;
use tracing::info;

use shared::protocol::{
    AuthRequest, AuthResult, GeoJsonPoint, RegistrationCompanyData, RegistrationUserData,
};

use crate::{
    error::{IdentityError, SignupError},
    session::IdentityProvider,
    transport::RemoteService,
    wizard::RegistrationData,
};

const LEGAL_ENTITY: &str = "legal-entity";
const COMPANY_ROLE: &str = "company";

/// Registers a company account: creates the identity-provider account, then
/// exchanges its token together with user and company data for a session.
/// Known rejection phrases come back as friendly variants; the caller keeps
/// the wizard intact on any failure so the user can retry.
pub async fn submit_registration(
    service: &dyn RemoteService,
    identity: &dyn IdentityProvider,
    data: &RegistrationData,
) -> Result<AuthResult, SignupError> {
    let identity_token = identity
        .sign_up(&data.step1.email, &data.step1.password)
        .await
        .map_err(|err| match err {
            IdentityError::Rejected(detail) | IdentityError::Unavailable(detail) => {
                SignupError::AccountCreation(detail)
            }
        })?;

    let user_data = RegistrationUserData {
        first_name: data.step1.first_name.clone(),
        last_name: data.step1.last_name.clone(),
        phone: data.step1.phone.clone(),
        user_type: LEGAL_ENTITY.to_string(),
        role: COMPANY_ROLE.to_string(),
    };
    let company_data = RegistrationCompanyData {
        company_name: data.company.company_name.clone(),
        company_type: data.company.company_type,
        location: GeoJsonPoint::from(data.company.location),
        address: data.company.address.clone(),
    };

    let result = service
        .authenticate(&AuthRequest {
            strategy: "identity".to_string(),
            access_token: identity_token,
            user_data: Some(json!(user_data)),
            company_data: Some(json!(company_data)),
        })
        .await
        .map_err(SignupError::from_server_message)?;

    info!(user = %result.user.id, company = %data.company.company_name, "registration completed");
    Ok(result)
}

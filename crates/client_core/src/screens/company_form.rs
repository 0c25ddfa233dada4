use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::warn;

use shared::domain::{Address, AuthenticatedUser};

use crate::{
    error::GeocodeError,
    geocode::GeocodeClient,
    screens::ScreenError,
    session::IdentityProvider,
    signup::submit_registration,
    transport::RemoteService,
    validate::{require, ValidationErrors},
    wizard::{CompanyDraft, SignupWizard},
};

#[derive(Debug)]
pub enum CompanySubmitOutcome {
    Registered(AuthenticatedUser),
    /// Step 2 was entered without a completed step 1; the wizard has been
    /// reset and the user must start over at step 1.
    RedirectToStep1,
}

/// Signup step 2: company details on top of the wizard. The wizard survives
/// a failed submission so the user can retry without re-entering anything.
pub struct CompanyFormScreen {
    service: Arc<dyn RemoteService>,
    identity: Arc<dyn IdentityProvider>,
    geocode: GeocodeClient,
    wizard: Arc<Mutex<SignupWizard>>,
}

impl CompanyFormScreen {
    pub fn new(
        service: Arc<dyn RemoteService>,
        identity: Arc<dyn IdentityProvider>,
        geocode: GeocodeClient,
        wizard: Arc<Mutex<SignupWizard>>,
    ) -> Self {
        Self {
            service,
            identity,
            geocode,
            wizard,
        }
    }

    pub fn validate(draft: &CompanyDraft) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require(&mut errors, "companyName", &draft.company_name);
        require(&mut errors, "country", &draft.address.country);
        require(&mut errors, "city", &draft.address.city);
        errors.into_result()
    }

    /// Fills the address fields from picked map coordinates.
    pub async fn resolve_address(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Address, GeocodeError> {
        self.geocode.reverse(latitude, longitude).await
    }

    pub async fn cancel(&self) {
        self.wizard.lock().await.reset();
    }

    /// Validates and submits the registration. Entering this screen with an
    /// incomplete step 1 is an invalid transition: the wizard is reset and
    /// the caller is told to redirect, without any remote call.
    pub async fn submit(&self, draft: CompanyDraft) -> Result<CompanySubmitOutcome, ScreenError> {
        let data = {
            let mut wizard = self.wizard.lock().await;
            if !wizard.step1_completed() {
                warn!("company form entered without completed step 1, resetting wizard");
                wizard.reset();
                return Ok(CompanySubmitOutcome::RedirectToStep1);
            }

            Self::validate(&draft)?;
            wizard.set_company_data(draft).map_err(ScreenError::from)?;
            wizard.submission().map_err(ScreenError::from)?
        };

        let result =
            submit_registration(self.service.as_ref(), self.identity.as_ref(), &data).await?;

        // Only a confirmed success clears the wizard.
        self.wizard.lock().await.reset();
        Ok(CompanySubmitOutcome::Registered(result.user))
    }
}

impl From<crate::error::WizardError> for ScreenError {
    fn from(value: crate::error::WizardError) -> Self {
        ScreenError::Signup(value.into())
    }
}

#[cfg(test)]
#[path = "../tests/company_form_tests.rs"]
mod tests;

use shared::domain::{Address, CompanyType, GeoPoint};

use crate::{
    error::WizardError,
    validate::{require_password, ValidationErrors},
};

/// Step-1 fields as entered so far. Credentials and personal info arrive
/// from separate inputs, so everything stays optional until the step is
/// completed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Step1Draft {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step1Data {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompanyDraft {
    pub company_name: String,
    pub company_type: CompanyType,
    pub location: GeoPoint,
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationData {
    pub step1: Step1Data,
    pub company: CompanyDraft,
}

/// In-memory state for the two-step company signup. Owned by the signup flow
/// for its duration; never persisted. Step ordering is enforced here:
/// company data is rejected until step 1 completes. A failed submission must
/// NOT reset the wizard (the user retries without re-entering); only
/// success, explicit cancel, or invalid-state detection clears it.
#[derive(Debug, Default)]
pub struct SignupWizard {
    draft: Step1Draft,
    step1: Option<Step1Data>,
    company: Option<CompanyDraft>,
}

impl SignupWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step1_completed(&self) -> bool {
        self.step1.is_some()
    }

    pub fn has_company_draft(&self) -> bool {
        self.company.is_some()
    }

    pub fn set_credentials(&mut self, email: impl Into<String>, password: impl Into<String>) {
        self.draft.email = Some(email.into());
        self.draft.password = Some(password.into());
    }

    pub fn set_personal_info(
        &mut self,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        phone: impl Into<String>,
    ) {
        self.draft.first_name = first_name.into();
        self.draft.last_name = last_name.into();
        self.draft.phone = phone.into();
    }

    /// Snapshots the draft into completed step-1 data. Every field must be
    /// present and non-empty, and the password must meet the minimum length.
    pub fn complete_step1(&mut self) -> Result<(), WizardError> {
        let email = self.draft.email.clone().filter(|v| !v.trim().is_empty());
        let password = self.draft.password.clone().filter(|v| !v.is_empty());
        let (Some(email), Some(password)) = (email, password) else {
            return Err(WizardError::IncompleteStep1);
        };
        if self.draft.first_name.trim().is_empty()
            || self.draft.last_name.trim().is_empty()
            || self.draft.phone.trim().is_empty()
        {
            return Err(WizardError::IncompleteStep1);
        }

        let mut password_check = ValidationErrors::new();
        require_password(&mut password_check, "password", &password);
        if !password_check.is_empty() {
            return Err(WizardError::PasswordTooShort);
        }

        self.step1 = Some(Step1Data {
            email,
            password,
            first_name: self.draft.first_name.clone(),
            last_name: self.draft.last_name.clone(),
            phone: self.draft.phone.clone(),
        });
        Ok(())
    }

    pub fn set_company_data(&mut self, company: CompanyDraft) -> Result<(), WizardError> {
        if !self.step1_completed() {
            return Err(WizardError::StepOrder);
        }
        self.company = Some(company);
        Ok(())
    }

    /// Both steps combined into a registration payload. The wizard keeps its
    /// data: the caller resets it only after the submission succeeds.
    pub fn submission(&self) -> Result<RegistrationData, WizardError> {
        let step1 = self.step1.clone().ok_or(WizardError::StepOrder)?;
        let company = self.company.clone().ok_or(WizardError::MissingCompanyData)?;
        Ok(RegistrationData { step1, company })
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
#[path = "tests/wizard_tests.rs"]
mod tests;

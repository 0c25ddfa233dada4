use std::collections::BTreeMap;

/// Field-level validation failures accumulated client-side. These block
/// submission and are rendered inline; they are never sent to the remote
/// service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, message) in &self.errors {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

pub fn require(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, "is required");
    }
}

pub fn require_email(errors: &mut ValidationErrors, field: &str, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, "is required");
        return;
    }
    let well_formed = value
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.starts_with('.'))
        .unwrap_or(false);
    if !well_formed {
        errors.add(field, "is not a valid email address");
    }
}

pub fn require_phone(errors: &mut ValidationErrors, field: &str, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, "is required");
        return;
    }
    let digits = value.chars().filter(char::is_ascii_digit).count();
    let shape_ok = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'));
    if digits < 7 || !shape_ok {
        errors.add(field, "is not a valid phone number");
    }
}

pub fn require_password(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.len() < 6 {
        errors.add(field, "must be at least 6 characters");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_value_is_required() {
        let mut errors = ValidationErrors::new();
        require(&mut errors, "firstName", "  ");
        assert_eq!(errors.get("firstName"), Some("is required"));
    }

    #[test]
    fn accepts_plain_email() {
        let mut errors = ValidationErrors::new();
        require_email(&mut errors, "email", "ops@example.com");
        assert!(errors.is_empty());
    }

    #[test]
    fn rejects_email_without_domain_dot() {
        let mut errors = ValidationErrors::new();
        require_email(&mut errors, "email", "ops@example");
        assert_eq!(errors.get("email"), Some("is not a valid email address"));
    }

    #[test]
    fn accepts_international_phone() {
        let mut errors = ValidationErrors::new();
        require_phone(&mut errors, "phone", "+998 90 123 45 67");
        assert!(errors.is_empty());
    }

    #[test]
    fn rejects_short_phone() {
        let mut errors = ValidationErrors::new();
        require_phone(&mut errors, "phone", "12345");
        assert!(!errors.is_empty());
    }

    #[test]
    fn rejects_short_password() {
        let mut errors = ValidationErrors::new();
        require_password(&mut errors, "password", "12345");
        assert_eq!(
            errors.get("password"),
            Some("must be at least 6 characters")
        );

        let mut errors = ValidationErrors::new();
        require_password(&mut errors, "password", "123456");
        assert!(errors.is_empty());
    }

    #[test]
    fn first_message_per_field_wins() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "is required");
        errors.add("email", "is not a valid email address");
        assert_eq!(errors.get("email"), Some("is required"));
    }

    #[test]
    fn display_joins_fields() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "is required");
        errors.add("phone", "is required");
        assert_eq!(errors.to_string(), "email: is required; phone: is required");
    }
}

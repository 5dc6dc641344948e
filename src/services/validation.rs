//! Shallow pre-flight validation run by the stores before hitting the
//! network. Authorization and deep integrity checks stay server-side.

use std::fmt;

use crate::models::{
    Manager, NewDonation, NewDonor, NewManager, Role, User, MAX_DONOR_AGE, MAX_HEMOGLOBIN_G_DL,
    MAX_VOLUME_ML, MIN_DONOR_AGE, MIN_HEMOGLOBIN_G_DL, MIN_VOLUME_ML, SAFE_HEMOGLOBIN_G_DL,
};

/// Ordered field-level failures from a single validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl std::error::Error for ValidationErrors {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationErrors {
    fn new() -> Self {
        ValidationErrors { errors: Vec::new() }
    }

    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", err.field, err.message)?;
        }
        Ok(())
    }
}

// Good enough to catch typos before the round trip; the registry service
// performs real address validation.
fn looks_like_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

pub fn validate_donor(draft: &NewDonor) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if draft.full_name.trim().is_empty() {
        errors.push("full_name", "full name is required");
    }
    if draft.email.trim().is_empty() {
        errors.push("email", "email is required");
    } else if !looks_like_email(draft.email.trim()) {
        errors.push("email", "email is not a valid address");
    }
    if draft.phone.trim().is_empty() {
        errors.push("phone", "phone number is required");
    }
    if draft.location.trim().is_empty() {
        errors.push("location", "location is required");
    }
    if draft.age < MIN_DONOR_AGE || draft.age > MAX_DONOR_AGE {
        errors.push(
            "age",
            format!(
                "age must be between {} and {}",
                MIN_DONOR_AGE, MAX_DONOR_AGE
            ),
        );
    }
    errors.into_result()
}

pub fn validate_donation(draft: &NewDonation) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if draft.collection_site.trim().is_empty() {
        errors.push("collection_site", "collection site is required");
    }
    if draft.volume_ml < MIN_VOLUME_ML || draft.volume_ml > MAX_VOLUME_ML {
        errors.push(
            "volume_ml",
            format!(
                "volume must be between {} and {} ml",
                MIN_VOLUME_ML, MAX_VOLUME_ML
            ),
        );
    }
    if let Some(hb) = draft.hemoglobin_g_dl {
        if !(MIN_HEMOGLOBIN_G_DL..=MAX_HEMOGLOBIN_G_DL).contains(&hb) {
            errors.push(
                "hemoglobin_g_dl",
                format!(
                    "hemoglobin must be between {} and {} g/dL",
                    MIN_HEMOGLOBIN_G_DL, MAX_HEMOGLOBIN_G_DL
                ),
            );
        }
    }
    errors.into_result()
}

pub fn validate_manager_registration(
    draft: &NewManager,
    password_confirmation: &str,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if draft.full_name.trim().is_empty() {
        errors.push("full_name", "full name is required");
    }
    if draft.email.trim().is_empty() {
        errors.push("email", "email is required");
    } else if !looks_like_email(draft.email.trim()) {
        errors.push("email", "email is not a valid address");
    }
    if draft.phone_number.trim().is_empty() {
        errors.push("phone_number", "phone number is required");
    }
    if draft.password.len() < 8 {
        errors.push("password", "password must be at least 8 characters");
    }
    if draft.password != password_confirmation {
        errors.push("password_confirmation", "passwords do not match");
    }
    errors.into_result()
}

/// Whether the signed-in user may open the edit form for `manager`.
///
/// UI convenience only; the account service re-checks ownership on every
/// write.
pub fn can_edit_manager(user: &User, manager: &Manager) -> bool {
    user.role == Role::Admin || user.email.eq_ignore_ascii_case(&manager.email)
}

/// Screening threshold applied when a donation records hemoglobin.
pub fn hemoglobin_is_safe(hemoglobin_g_dl: f64) -> bool {
    hemoglobin_g_dl >= SAFE_HEMOGLOBIN_G_DL
}

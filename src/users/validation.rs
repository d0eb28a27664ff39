use std::collections::BTreeMap;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use validator::ValidateEmail;

use crate::users::dto::{NewUser, UpdatableFields};

pub const PASSWORD_MIN_LEN: usize = 8;
pub const NAME_MAX_LEN: usize = 25;
pub const CITY_MAX_LEN: usize = 25;

/// Per-field validation failures, one message per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `message` for `field` unless an earlier rule already failed for it.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    #[cfg(test)]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    fn check(&mut self, field: &'static str, outcome: Result<(), String>) {
        if let Err(message) = outcome {
            self.add(field, message);
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// RFC-style address check plus a dotted domain ending in an alphabetic TLD.
pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref DOMAIN_TLD_RE: Regex = Regex::new(r"\.[A-Za-z]{2,}$").unwrap();
    }
    let Some((_, domain)) = email.rsplit_once('@') else {
        return false;
    };
    email.validate_email() && DOMAIN_TLD_RE.is_match(domain)
}

pub(crate) fn duplicate_email_message(email: &str) -> String {
    format!("{email} is already in use")
}

fn check_email(email: Option<&str>) -> Result<(), String> {
    match email {
        None | Some("") => Err("Email is required".into()),
        Some(email) if !is_valid_email(email) => Err(format!("{email} is not valid email")),
        Some(_) => Ok(()),
    }
}

fn check_password(password: Option<&str>) -> Result<(), String> {
    let password = match password {
        None | Some("") => return Err("Password is required".into()),
        Some(p) => p,
    };
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(format!(
            "Password must contain at least {PASSWORD_MIN_LEN} characters"
        ));
    }
    let alphanumeric = password.chars().all(|c| c.is_ascii_alphanumeric());
    let has_capital = password.chars().any(|c| c.is_ascii_uppercase());
    if !alphanumeric || !has_capital {
        return Err("Password must contain only alphanumeric characters(at least 8) with at least one capital letter".into());
    }
    Ok(())
}

fn check_name(label: &str, value: Option<&str>) -> Result<(), String> {
    match value {
        None | Some("") => Err(format!("{label} is required")),
        Some(v) if v.chars().count() > NAME_MAX_LEN => {
            Err(format!("{label} must be at most {NAME_MAX_LEN} characters"))
        }
        Some(_) => Ok(()),
    }
}

fn check_city(city: &str) -> Result<(), String> {
    let len = city.chars().count();
    if len == 0 {
        Err("City must contain at least 1 character".into())
    } else if len > CITY_MAX_LEN {
        Err(format!("City must be at most {CITY_MAX_LEN} characters"))
    } else {
        Ok(())
    }
}

/// Full validation for a new record. Expects trimmed input.
pub fn validate_new_user(input: &NewUser) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    errors.check("email", check_email(input.email.as_deref()));
    errors.check("password", check_password(input.password.as_deref()));
    errors.check("first_name", check_name("First Name", input.first_name.as_deref()));
    errors.check("last_name", check_name("Last Name", input.last_name.as_deref()));
    if let Some(city) = input.city.as_deref() {
        errors.check("city", check_city(city));
    }
    errors.into_result()
}

/// Validates only the fields present in `changes`. Expects trimmed input.
pub fn validate_update(changes: &UpdatableFields) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if let Some(email) = changes.email.as_deref() {
        errors.check("email", check_email(Some(email)));
    }
    if let Some(first_name) = changes.first_name.as_deref() {
        errors.check("first_name", check_name("First Name", Some(first_name)));
    }
    if let Some(last_name) = changes.last_name.as_deref() {
        errors.check("last_name", check_name("Last Name", Some(last_name)));
    }
    if let Some(city) = changes.city.as_deref() {
        errors.check("city", check_city(city));
    }
    errors.into_result()
}

pub fn validate_password(password: Option<&str>) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    errors.check("password", check_password(password));
    errors.into_result()
}

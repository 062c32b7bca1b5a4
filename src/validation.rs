//! Client-side checks for the auth and profile forms. They only catch obvious mistakes;
//! the auth service still validates everything it receives.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[1-9]\d{0,15}$").expect("valid phone regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Field {
    FullName,
    Email,
    PhoneNumber,
    Password,
    ConfirmPassword,
}

/// Per-field error messages. Empty means the form is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, &'static str>);

impl FieldErrors {
    pub fn get(&self, field: Field) -> Option<&'static str> {
        self.0.get(&field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &'static str)> + '_ {
        self.0.iter().map(|(f, m)| (*f, *m))
    }

    /// Forget the error on a field, e.g. once the user edits it.
    pub fn clear(&mut self, field: Field) {
        self.0.remove(&field);
    }

    fn check(&mut self, field: Field, result: Result<(), &'static str>) {
        if let Err(message) = result {
            self.0.insert(field, message);
        }
    }

    fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// Spaces, dashes and parentheses are ignored.
pub fn is_valid_phone(phone: &str) -> bool {
    let digits: String = phone
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')'))
        .collect();
    PHONE_RE.is_match(&digits)
}

fn email(value: &str) -> Result<(), &'static str> {
    if value.trim().is_empty() {
        Err("Email is required")
    } else if !is_valid_email(value) {
        Err("Email is not valid")
    } else {
        Ok(())
    }
}

fn full_name(value: &str) -> Result<(), &'static str> {
    if value.trim().is_empty() {
        Err("Full name is required")
    } else {
        Ok(())
    }
}

fn phone(value: &str, required: bool) -> Result<(), &'static str> {
    if value.trim().is_empty() {
        if required {
            Err("Phone number is required")
        } else {
            Ok(())
        }
    } else if !is_valid_phone(value) {
        Err("Phone number is not valid")
    } else {
        Ok(())
    }
}

fn password(value: &str) -> Result<(), &'static str> {
    if value.is_empty() {
        Err("Password is required")
    } else if value.chars().count() < MIN_PASSWORD_LEN {
        Err("Password must be at least 6 characters")
    } else {
        Ok(())
    }
}

fn confirmation(password: &str, confirm: &str) -> Result<(), &'static str> {
    if confirm.is_empty() {
        Err("Confirm your password")
    } else if password != confirm {
        Err("Passwords do not match")
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.check(Field::Email, email(&self.email));
        errors.check(Field::Password, password(&self.password));
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignUpForm {
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignUpForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.check(Field::FullName, full_name(&self.full_name));
        errors.check(Field::Email, email(&self.email));
        errors.check(Field::PhoneNumber, phone(&self.phone_number, true));
        errors.check(Field::Password, password(&self.password));
        errors.check(
            Field::ConfirmPassword,
            confirmation(&self.password, &self.confirm_password),
        );
        errors.into_result()
    }

    /// The request to send once the form validates.
    pub fn to_request(&self) -> crate::model::SignUpRequest {
        crate::model::SignUpRequest {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            full_name: Some(self.full_name.trim().to_string()),
            phone_number: Some(self.phone_number.trim().to_string()),
        }
    }
}

/// Profile edit. The phone number may be left blank.
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub full_name: String,
    pub phone_number: String,
}

impl ProfileForm {
    /// Prefill from the signed-in user.
    pub fn for_user(user: &crate::model::User) -> Self {
        Self {
            full_name: user.user_metadata.full_name.clone().unwrap_or_default(),
            phone_number: user.user_metadata.phone_number.clone().unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.check(Field::FullName, full_name(&self.full_name));
        errors.check(Field::PhoneNumber, phone(&self.phone_number, false));
        errors.into_result()
    }

    pub fn to_update(&self) -> crate::model::ProfileUpdate {
        crate::model::ProfileUpdate {
            full_name: self.full_name.trim().to_string(),
            phone_number: self.phone_number.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ForgotPasswordForm {
    pub email: String,
}

impl ForgotPasswordForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.check(Field::Email, email(&self.email));
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResetPasswordForm {
    pub password: String,
    pub confirm_password: String,
}

impl ResetPasswordForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.check(Field::Password, password(&self.password));
        errors.check(
            Field::ConfirmPassword,
            confirmation(&self.password, &self.confirm_password),
        );
        errors.into_result()
    }
}

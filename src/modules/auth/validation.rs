use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use super::notice::FieldErrors;
use crate::OTP_LENGTH;

lazy_static! {
    static ref EMAIL_PATTERN: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
    static ref NAME_PATTERN: Regex = Regex::new(r"^[a-zA-Z\s]*$").unwrap();
}

const PASSWORD_MIN_LENGTH: usize = 8;
const NAME_MIN_LENGTH: usize = 2;
const SPECIAL_CHARS: &str = "!@#$%^&*";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmailError {
    #[error("Email is required")]
    Required,
    #[error("Invalid email format")]
    InvalidFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordError {
    #[error("Password is required")]
    Required,
    #[error("Password must be at least 8 characters")]
    TooShort,
    #[error("Password must contain at least one uppercase letter")]
    NoUppercase,
    #[error("Password must contain at least one lowercase letter")]
    NoLowercase,
    #[error("Password must contain at least one number")]
    NoNumber,
    #[error("Password must contain at least one special character")]
    NoSpecialChar,
}

/// Login form wording differs from the registration rules
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginPasswordError {
    #[error("Password is required")]
    Required,
    #[error("Password must be at least 8 characters long")]
    TooShort,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfirmPasswordError {
    #[error("Please confirm your password")]
    Required,
    #[error("Passwords do not match")]
    Mismatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("{0} must be at least 2 characters")]
    TooShort(&'static str),
    #[error("{0} can only contain letters and spaces")]
    InvalidCharacters(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OtpError {
    #[error("OTP is required")]
    Required,
    #[error("OTP must be 6 digits")]
    WrongFormat,
}

/// Registration form values as typed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    /// Copy with every field trimmed, as submitted
    pub fn trimmed(&self) -> Self {
        Self {
            firstname: self.firstname.trim().to_string(),
            lastname: self.lastname.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.trim().to_string(),
            confirm_password: self.confirm_password.trim().to_string(),
        }
    }
}

pub fn validate_email(email: &str) -> Result<(), EmailError> {
    if email.is_empty() {
        return Err(EmailError::Required);
    }
    if !EMAIL_PATTERN.is_match(email) {
        return Err(EmailError::InvalidFormat);
    }
    Ok(())
}

/// Function to validate password strength
pub fn validate_password(password: &str) -> Result<(), PasswordError> {
    if password.is_empty() {
        return Err(PasswordError::Required);
    }
    if password.chars().count() < PASSWORD_MIN_LENGTH {
        return Err(PasswordError::TooShort);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(PasswordError::NoUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(PasswordError::NoLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PasswordError::NoNumber);
    }
    if !password.chars().any(|c| SPECIAL_CHARS.contains(c)) {
        return Err(PasswordError::NoSpecialChar);
    }
    Ok(())
}

/// Sign-in only checks presence and length; strength is a registration rule
pub fn validate_login_password(password: &str) -> Result<(), LoginPasswordError> {
    if password.is_empty() {
        return Err(LoginPasswordError::Required);
    }
    if password.chars().count() < PASSWORD_MIN_LENGTH {
        return Err(LoginPasswordError::TooShort);
    }
    Ok(())
}

pub fn validate_confirm_password(
    password: &str,
    confirm_password: &str,
) -> Result<(), ConfirmPasswordError> {
    if confirm_password.is_empty() {
        return Err(ConfirmPasswordError::Required);
    }
    if password != confirm_password {
        return Err(ConfirmPasswordError::Mismatch);
    }
    Ok(())
}

/// `field` is the human label, e.g. "First name"
pub fn validate_name(name: &str, field: &'static str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::Required(field));
    }
    if name.chars().count() < NAME_MIN_LENGTH {
        return Err(NameError::TooShort(field));
    }
    if !NAME_PATTERN.is_match(name) {
        return Err(NameError::InvalidCharacters(field));
    }
    Ok(())
}

pub fn validate_otp(code: &str) -> Result<(), OtpError> {
    if code.is_empty() {
        return Err(OtpError::Required);
    }
    if code.len() != OTP_LENGTH || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(OtpError::WrongFormat);
    }
    Ok(())
}

/// Keeps only digits and caps the code at the OTP length
pub fn sanitize_otp_input(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(OTP_LENGTH)
        .collect()
}

/// Validates every registration field. Expects already-trimmed values.
pub fn validate_registration_form(form: &RegistrationForm) -> FieldErrors {
    FieldErrors {
        firstname: validate_name(&form.firstname, "First name")
            .err()
            .map(|e| e.to_string()),
        lastname: validate_name(&form.lastname, "Last name")
            .err()
            .map(|e| e.to_string()),
        email: validate_email(&form.email).err().map(|e| e.to_string()),
        password: validate_password(&form.password)
            .err()
            .map(|e| e.to_string()),
        confirm_password: validate_confirm_password(&form.password, &form.confirm_password)
            .err()
            .map(|e| e.to_string()),
        code: None,
    }
}

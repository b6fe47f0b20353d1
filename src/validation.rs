//! Request validation for the auth and contact endpoints.
//!
//! Validation runs before any store access and produces a field-keyed error
//! map (HTTP 400), distinct from authentication failures (HTTP 401).

use crate::error::FieldErrors;

pub const MIN_PASSWORD_LEN: usize = 8;

/// `local@domain.tld` shape: an `@` with something on both sides, a `.`
/// somewhere after it, and no whitespace anywhere.
pub fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.find('@') {
        Some(at) if at > 0 => {
            let domain = &email[at + 1..];
            match domain.find('.') {
                // Reject empty domain labels on either side of the dot.
                Some(dot) => dot > 0 && dot + 1 < domain.len() && !domain.contains('@'),
                None => false,
            }
        }
        _ => false,
    }
}

fn check_email(errors: &mut FieldErrors, email: &str) {
    if email.is_empty() {
        errors.insert("email".into(), "Email is required".into());
    } else if !is_valid_email(email) {
        errors.insert("email".into(), "Please enter a valid email address".into());
    }
}

/// Signup: email shape, password strength, required display name.
pub fn validate_signup(email: &str, password: &str, full_name: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    check_email(&mut errors, email);
    if password.is_empty() {
        errors.insert("password".into(), "Password is required".into());
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.insert(
            "password".into(),
            "Password must be at least 8 characters long".into(),
        );
    }
    if full_name.trim().is_empty() {
        errors.insert("full_name".into(), "Full name is required".into());
    }
    errors
}

/// Login re-checks presence and email shape only, never strength.
pub fn validate_login(email: &str, password: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    check_email(&mut errors, email);
    if password.is_empty() {
        errors.insert("password".into(), "Password is required".into());
    }
    errors
}

/// Contact form: all fields required except phone.
pub fn validate_contact(name: &str, email: &str, subject: &str, message: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if name.trim().is_empty() {
        errors.insert("name".into(), "Name is required".into());
    }
    check_email(&mut errors, email);
    if subject.trim().is_empty() {
        errors.insert("subject".into(), "Subject is required".into());
    }
    if message.trim().is_empty() {
        errors.insert("message".into(), "Message is required".into());
    }
    errors
}

use std::sync::LazyLock;

use regex::Regex;

use crate::errors::AppError;
use crate::models::{ContactForm, NewsletterSignup};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern is valid")
});

const MIN_MESSAGE_CHARS: usize = 10;
const MAX_FIELD_CHARS: usize = 5000;

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'));
    allowed && (7..=15).contains(&digits)
}

pub fn validate_contact(form: &ContactForm) -> Result<(), AppError> {
    if form.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }
    if !is_valid_email(&form.email) {
        return Err(AppError::Validation("a valid email is required".into()));
    }
    if let Some(phone) = form.phone.as_deref().filter(|p| !p.trim().is_empty()) {
        if !is_valid_phone(phone) {
            return Err(AppError::Validation("phone number looks invalid".into()));
        }
    }
    let message_chars = form.message.trim().chars().count();
    if message_chars < MIN_MESSAGE_CHARS {
        return Err(AppError::Validation(format!(
            "message must be at least {MIN_MESSAGE_CHARS} characters"
        )));
    }
    if message_chars > MAX_FIELD_CHARS {
        return Err(AppError::Validation("message is too long".into()));
    }
    Ok(())
}

/// Validates and records a contact enquiry. Nothing is stored or forwarded.
pub fn submit_contact(form: &ContactForm) -> Result<(), AppError> {
    validate_contact(form)?;
    tracing::info!(
        name = form.name.trim(),
        email = form.email.trim(),
        company = form.company.as_deref().unwrap_or(""),
        service = form.service.as_deref().unwrap_or(""),
        "contact form submitted"
    );
    Ok(())
}

pub fn submit_newsletter(signup: &NewsletterSignup) -> Result<(), AppError> {
    if !is_valid_email(&signup.email) {
        return Err(AppError::Validation("a valid email is required".into()));
    }
    tracing::info!(email = signup.email.trim(), "newsletter signup");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ContactForm {
        ContactForm {
            name: "Priya".to_string(),
            email: "priya@example.com".to_string(),
            phone: Some("+91 98765-43210".to_string()),
            company: None,
            service: Some("seo".to_string()),
            message: "We need help with local SEO.".to_string(),
        }
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email(" first.last+tag@mail.example.org "));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_valid_contact() {
        assert!(submit_contact(&form()).is_ok());
    }

    #[test]
    fn test_contact_rejects_blank_name() {
        let mut f = form();
        f.name = "  ".into();
        assert!(matches!(validate_contact(&f), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_contact_rejects_short_message() {
        let mut f = form();
        f.message = "hi".into();
        assert!(matches!(validate_contact(&f), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_contact_phone_rules() {
        let mut f = form();
        f.phone = Some("call me".into());
        assert!(validate_contact(&f).is_err());
        f.phone = Some("".into());
        assert!(validate_contact(&f).is_ok());
        f.phone = None;
        assert!(validate_contact(&f).is_ok());
    }

    #[test]
    fn test_newsletter() {
        assert!(submit_newsletter(&NewsletterSignup { email: "x@y.io".into() }).is_ok());
        assert!(submit_newsletter(&NewsletterSignup { email: "nope".into() }).is_err());
    }
}

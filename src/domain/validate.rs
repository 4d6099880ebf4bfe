//! Business validation for inbound entity fields.
//!
//! These checks run before any write reaches a repository, so the
//! stores only ever see structurally valid input. Uniqueness is not
//! checked here; that invariant belongs to the store boundary.

use crate::domain::error::DomainError;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 32;
const PASSWORD_MIN: usize = 8;
const TITLE_MAX: usize = 200;

pub fn post_title(title: &str) -> Result<(), DomainError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("post title must not be empty"));
    }
    if trimmed.chars().count() > TITLE_MAX {
        return Err(DomainError::validation(format!(
            "post title exceeds {TITLE_MAX} characters"
        )));
    }
    Ok(())
}

pub fn comment_body(body: &str) -> Result<(), DomainError> {
    if body.trim().is_empty() {
        return Err(DomainError::validation("comment body must not be empty"));
    }
    Ok(())
}

pub fn username(username: &str) -> Result<(), DomainError> {
    let len = username.chars().count();
    if len < USERNAME_MIN || len > USERNAME_MAX {
        return Err(DomainError::validation(format!(
            "username must be between {USERNAME_MIN} and {USERNAME_MAX} characters"
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(DomainError::validation(
            "username may only contain letters, digits, '-', '_' and '.'",
        ));
    }
    Ok(())
}

pub fn email(email: &str) -> Result<(), DomainError> {
    let malformed = || DomainError::validation(format!("malformed email address `{email}`"));

    let (local, domain) = email.split_once('@').ok_or_else(malformed)?;
    if local.is_empty() || domain.is_empty() || email.contains(char::is_whitespace) {
        return Err(malformed());
    }
    // Require a dot-separated domain with non-empty labels.
    if !domain.contains('.') || domain.split('.').any(str::is_empty) {
        return Err(malformed());
    }
    Ok(())
}

pub fn password(password: &str) -> Result<(), DomainError> {
    if password.chars().count() < PASSWORD_MIN {
        return Err(DomainError::validation(format!(
            "password must be at least {PASSWORD_MIN} characters"
        )));
    }
    let has_letter = password.chars().any(|c| c.is_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        return Err(DomainError::validation(
            "password must contain at least one letter and one digit",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_title_is_rejected() {
        assert!(post_title("").is_err());
        assert!(post_title("   ").is_err());
        assert!(post_title("Hello World").is_ok());
    }

    #[test]
    fn overlong_title_is_rejected() {
        let title = "x".repeat(TITLE_MAX + 1);
        assert!(post_title(&title).is_err());
    }

    #[test]
    fn username_bounds() {
        assert!(username("ab").is_err());
        assert!(username("teacherAndy").is_ok());
        assert!(username("bad name").is_err());
        assert!(username(&"a".repeat(USERNAME_MAX + 1)).is_err());
    }

    #[test]
    fn email_shapes() {
        assert!(email("teacher.andy@example.com").is_ok());
        assert!(email("no-at-sign").is_err());
        assert!(email("@example.com").is_err());
        assert!(email("andy@").is_err());
        assert!(email("andy@localhost").is_err());
        assert!(email("andy@exa mple.com").is_err());
        assert!(email("andy@example..com").is_err());
    }

    #[test]
    fn weak_passwords_are_rejected() {
        assert!(password("short1").is_err());
        assert!(password("alllowercase").is_err());
        assert!(password("12345678901").is_err());
        assert!(password("correcth0rse").is_ok());
    }
}

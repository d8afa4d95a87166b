//! Client-side input checks run before anything is sent to the backend.

use crate::types::{QuestError, Result, TaskDraft};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_TITLE_LEN: usize = 120;

fn invalid(msg: impl Into<String>) -> QuestError {
    QuestError::Validation(msg.into())
}

pub fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(invalid("email is required"));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => Ok(()),
        _ => Err(invalid(format!("'{}' is not a valid email address", email))),
    }
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(invalid(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(invalid("name is required"));
    }
    Ok(())
}

/// Login only checks presence; the backend decides whether they match
pub fn validate_credentials(email: &str, password: &str) -> Result<()> {
    if email.trim().is_empty() {
        return Err(invalid("email is required"));
    }
    if password.is_empty() {
        return Err(invalid("password is required"));
    }
    Ok(())
}

pub fn validate_title(title: &str) -> Result<()> {
    let title = title.trim();
    if title.is_empty() {
        return Err(invalid("title is required"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(invalid(format!("title must be at most {} characters", MAX_TITLE_LEN)));
    }
    Ok(())
}

pub fn validate_deadline(deadline: Option<&str>) -> Result<()> {
    match deadline {
        Some(raw) => chrono::DateTime::parse_from_rfc3339(raw.trim())
            .map(|_| ())
            .map_err(|_| invalid(format!("deadline '{}' is not an RFC 3339 timestamp", raw))),
        None => Ok(()),
    }
}

pub fn validate_draft(draft: &TaskDraft) -> Result<()> {
    validate_title(&draft.title)?;
    validate_deadline(draft.deadline.as_deref())?;
    if matches!(draft.duration, Some(secs) if secs < 0) {
        return Err(invalid("duration cannot be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email() {
        assert!(validate_email("ann@example.com").is_ok());
        assert!(validate_email("  ann@example.com ").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("ann").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ann@").is_err());
        assert!(validate_email("a@b@c").is_err());
    }

    #[test]
    fn test_password_length() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
        let err = validate_password("abc").unwrap_err();
        assert!(err.to_string().contains("at least 6"));
    }

    #[test]
    fn test_title() {
        assert!(validate_title("   ").is_err());
        assert!(validate_title("Water plants").is_ok());
        assert!(validate_title(&"x".repeat(MAX_TITLE_LEN + 1)).is_err());
    }

    #[test]
    fn test_draft_deadline_and_duration() {
        let mut draft = TaskDraft::new("Run");
        draft.deadline = Some("tomorrow".into());
        assert!(validate_draft(&draft).is_err());

        draft.deadline = Some("2026-11-01T09:00:00Z".into());
        assert!(validate_draft(&draft).is_ok());

        draft.duration = Some(-5);
        assert!(validate_draft(&draft).is_err());
    }
}

//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

/// Longest accepted password; keeps hashing cost bounded
pub const MAX_PASSWORD_LEN: usize = 128;

/// Longest accepted caption
pub const MAX_CAPTION_LEN: usize = 500;

/// Validate username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    if username.len() < 3 {
        return Err("Username must be at least 3 characters long".to_string());
    }

    if username.len() > 32 {
        return Err("Username must be at most 32 characters long".to_string());
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("Failed to compile username regex"));

    if !regex.is_match(username) {
        return Err("Username can only contain letters, numbers, and underscores".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() > MAX_PASSWORD_LEN {
        return Err(format!(
            "Password must be at most {} characters long",
            MAX_PASSWORD_LEN
        ));
    }

    Ok(())
}

/// Validate caption
pub fn validate_caption(caption: &str) -> Result<(), String> {
    if caption.chars().count() > MAX_CAPTION_LEN {
        return Err(format!(
            "Caption must be at most {} characters long",
            MAX_CAPTION_LEN
        ));
    }

    Ok(())
}

/// Extension to keep on a stored name, derived from the uploaded filename
///
/// Returns `None` unless the extension is short and plain ASCII alphanumeric.
pub fn sanitize_extension(original_filename: &str) -> Option<String> {
    let (stem, ext) = original_filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > 10 {
        return None;
    }

    if !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }

    Some(ext.to_ascii_lowercase())
}

use crate::error::AppError;

use super::config::IngestLimits;

/// Validates an upload against `create_upload`'s stated limits (spec.md
/// §4.5): `too_large` when the payload exceeds `max_upload_bytes`,
/// `unsupported_mime` when the declared content type isn't allow-listed,
/// `empty_payload` for a zero-byte body.
pub fn validate_upload(
    limits: &IngestLimits,
    byte_len: u64,
    mime: &str,
) -> Result<(), AppError> {
    if byte_len == 0 {
        return Err(AppError::EmptyPayload);
    }

    let max_bytes = limits.max_upload_bytes();
    if byte_len > max_bytes {
        return Err(AppError::TooLarge {
            limit_bytes: max_bytes,
        });
    }

    if !limits.allow_mime.iter().any(|allowed| allowed == mime) {
        return Err(AppError::UnsupportedMime(mime.to_string()));
    }

    Ok(())
}

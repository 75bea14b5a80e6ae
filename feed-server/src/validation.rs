//! # Input Validation
//!
//! Size limits and the filename/hostname checks applied to uploads and to
//! server startup parameters.

use tracing::warn;

use crate::error::{FeedError, FeedResult};

/// Maximum allowed package archive size (100 MB)
pub const MAX_UPLOAD_SIZE: u64 = 100 * 1024 * 1024;

/// Maximum allowed size of an archive's inflated `.nuspec` manifest (1 MB)
pub const MAX_MANIFEST_SIZE: u64 = 1024 * 1024;

/// Maximum allowed number of multipart fields in one push
pub const MAX_MULTIPART_FIELDS: usize = 10;

/// Maximum allowed filename length
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Maximum allowed hostname length
pub const MAX_HOSTNAME_LENGTH: usize = 253;

const RESERVED_WINDOWS_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Validates a filename or single path component.
///
/// Rejects empty and overlong names, null bytes, control characters, parent
/// directory references, path separators and reserved Windows device names.
///
/// # Examples
///
/// ```
/// # use feed_server::validation::validate_filename;
/// assert!(validate_filename("MyTestPackage.1.0.1.nupkg").is_ok());
/// assert!(validate_filename("../etc/passwd").is_err());
/// assert!(validate_filename("dir/file.nupkg").is_err());
/// ```
pub fn validate_filename(filename: &str) -> FeedResult<()> {
    if filename.is_empty() {
        warn!("Empty filename provided");
        return Err(FeedError::BadRequest("Filename cannot be empty".to_string()));
    }

    if filename.len() > MAX_FILENAME_LENGTH {
        warn!(filename = %filename, length = filename.len(), "Filename too long");
        return Err(FeedError::BadRequest(format!(
            "Filename too long: {} characters (max: {})",
            filename.len(),
            MAX_FILENAME_LENGTH
        )));
    }

    if filename.chars().any(|c| c.is_control()) {
        warn!(filename = %filename, "Control character detected in filename");
        return Err(FeedError::BadRequest(
            "Filename contains control characters".to_string(),
        ));
    }

    if filename.contains("..") {
        warn!(filename = %filename, "Path traversal attempt detected (..)");
        return Err(FeedError::BadRequest(
            "Filename contains parent directory reference (..)".to_string(),
        ));
    }

    if filename.contains('/') || filename.contains('\\') || filename.contains(':') {
        warn!(filename = %filename, "Path separator detected in filename");
        return Err(FeedError::BadRequest(
            "Filename cannot contain path separators".to_string(),
        ));
    }

    let base_name = filename.split('.').next().unwrap_or(filename);
    if RESERVED_WINDOWS_NAMES
        .iter()
        .any(|reserved| base_name.eq_ignore_ascii_case(reserved))
    {
        warn!(filename = %filename, "Reserved Windows filename detected");
        return Err(FeedError::BadRequest(format!(
            "Filename '{base_name}' is reserved on Windows systems"
        )));
    }

    Ok(())
}

/// Rejects uploads larger than `max_size` bytes.
pub fn validate_upload_size(size: u64, max_size: u64) -> FeedResult<()> {
    if size > max_size {
        warn!(size, max_size, "Upload exceeds size limit");
        return Err(FeedError::BadRequest(format!(
            "Package too large: {size} bytes (max: {max_size} bytes)"
        )));
    }
    Ok(())
}

/// Validates a bind hostname or IP address.
pub fn validate_hostname(host: &str) -> FeedResult<()> {
    if host.is_empty() || host.len() > MAX_HOSTNAME_LENGTH {
        return Err(FeedError::BadRequest(format!(
            "Invalid hostname length: {}",
            host.len()
        )));
    }

    if !host
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | ':' | '[' | ']'))
    {
        return Err(FeedError::BadRequest(format!(
            "Hostname '{host}' contains invalid characters"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_filenames() {
        assert!(validate_filename("MyTestPackage.1.0.1.nupkg").is_ok());
        assert!(validate_filename("serilog.sinks.file.5.0.0-beta.1.nupkg").is_ok());
    }

    #[test]
    fn test_dangerous_filenames() {
        assert!(validate_filename("").is_err());
        assert!(validate_filename("../../etc/passwd").is_err());
        assert!(validate_filename("/absolute.nupkg").is_err());
        assert!(validate_filename("C:evil.nupkg").is_err());
        assert!(validate_filename("dir\\file.nupkg").is_err());
        assert!(validate_filename("file\0name.nupkg").is_err());
        assert!(validate_filename(&"a".repeat(MAX_FILENAME_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_reserved_windows_names() {
        assert!(validate_filename("CON.nupkg").is_err());
        assert!(validate_filename("lpt1").is_err());
        assert!(validate_filename("console.nupkg").is_ok());
    }

    #[test]
    fn test_upload_size() {
        assert!(validate_upload_size(1024, MAX_UPLOAD_SIZE).is_ok());
        assert!(validate_upload_size(MAX_UPLOAD_SIZE, MAX_UPLOAD_SIZE).is_ok());
        assert!(validate_upload_size(MAX_UPLOAD_SIZE + 1, MAX_UPLOAD_SIZE).is_err());
    }

    #[test]
    fn test_hostnames() {
        assert!(validate_hostname("localhost").is_ok());
        assert!(validate_hostname("0.0.0.0").is_ok());
        assert!(validate_hostname("::1").is_ok());
        assert!(validate_hostname("").is_err());
        assert!(validate_hostname("host with spaces").is_err());
        assert!(validate_hostname("host;rm").is_err());
    }
}

use std::path::Path;

use crate::BYTES_PER_MB;

/// Client-side checks applied before a file is queued.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationRules {
    /// Accepted extensions (`"png"` or `".png"`, case-insensitive).
    /// Empty accepts everything.
    pub allowed_extensions: Vec<String>,
    /// Upper size bound in megabytes.
    pub max_file_size_mb: Option<u64>,
}

/// Why a file was rejected before upload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("File size exceeds {limit_mb}MB limit")]
    TooLarge { limit_mb: u64 },

    #[error("File type not allowed. Allowed: {allowed}")]
    ExtensionNotAllowed { allowed: String },
}

/// Checks `name` and `size` against `rules`.
///
/// Size is checked before extension. Pure: the same input always yields the
/// same verdict.
pub fn validate_file(name: &str, size: u64, rules: &ValidationRules) -> Result<(), ValidationError> {
    if let Some(limit_mb) = rules.max_file_size_mb
        && size > limit_mb.saturating_mul(BYTES_PER_MB)
    {
        return Err(ValidationError::TooLarge { limit_mb });
    }

    if rules.allowed_extensions.is_empty() {
        return Ok(());
    }

    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let allowed: Vec<String> = rules
        .allowed_extensions
        .iter()
        .map(|e| normalize_extension(e))
        .filter(|e| !e.is_empty())
        .collect();

    if allowed.is_empty() || (!ext.is_empty() && allowed.iter().any(|a| *a == ext)) {
        return Ok(());
    }

    Err(ValidationError::ExtensionNotAllowed {
        allowed: allowed
            .iter()
            .map(|e| format!(".{e}"))
            .collect::<Vec<_>>()
            .join(", "),
    })
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(exts: &[&str], max_mb: Option<u64>) -> ValidationRules {
        ValidationRules {
            allowed_extensions: exts.iter().map(|e| e.to_string()).collect(),
            max_file_size_mb: max_mb,
        }
    }

    #[test]
    fn accepts_everything_by_default() {
        let r = ValidationRules::default();
        assert!(validate_file("anything.xyz", 10 * BYTES_PER_MB * 1024, &r).is_ok());
        assert!(validate_file("noext", 0, &r).is_ok());
    }

    #[test]
    fn rejects_oversized_file() {
        let r = rules(&[], Some(10));
        let err = validate_file("big.bin", 10 * BYTES_PER_MB + 1, &r).unwrap_err();
        assert_eq!(err, ValidationError::TooLarge { limit_mb: 10 });
        assert_eq!(err.to_string(), "File size exceeds 10MB limit");
    }

    #[test]
    fn accepts_file_at_exact_limit() {
        let r = rules(&[], Some(10));
        assert!(validate_file("edge.bin", 10 * BYTES_PER_MB, &r).is_ok());
    }

    #[test]
    fn rejects_disallowed_extension() {
        let r = rules(&[".png", "jpg"], None);
        let err = validate_file("script.exe", 1, &r).unwrap_err();
        assert_eq!(err.to_string(), "File type not allowed. Allowed: .png, .jpg");
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let r = rules(&[".PNG", " Jpg "], None);
        assert!(validate_file("photo.png", 1, &r).is_ok());
        assert!(validate_file("PHOTO.JPG", 1, &r).is_ok());
    }

    #[test]
    fn missing_extension_rejected_when_list_set() {
        let r = rules(&["txt"], None);
        assert!(validate_file("README", 1, &r).is_err());
    }

    #[test]
    fn size_checked_before_extension() {
        let r = rules(&["png"], Some(1));
        let err = validate_file("x.exe", 2 * BYTES_PER_MB, &r).unwrap_err();
        assert!(matches!(err, ValidationError::TooLarge { .. }));
    }

    #[test]
    fn validation_is_idempotent() {
        let r = rules(&["png"], Some(1));
        for (name, size) in [("a.png", 10), ("a.gif", 10), ("a.png", 3 * BYTES_PER_MB)] {
            let first = validate_file(name, size, &r);
            let second = validate_file(name, size, &r);
            assert_eq!(first, second);
        }
    }
}

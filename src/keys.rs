//! Key input: resolving the CLI input, loading key files, local validation.

use crate::KeycheckError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

static KEY_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_\-]{20,}$").expect("key shape regex is valid"));

/// Where candidate keys come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// A single key given on the command line.
    Inline(String),
    /// A file with one key per line.
    File(PathBuf),
}

impl KeySource {
    /// Resolve the positional input and `--key` flag into a source.
    ///
    /// A positional input naming an existing file is read as a key file;
    /// anything else is taken as the key itself.
    pub fn resolve(input: Option<&str>, key: Option<&str>) -> Result<Self, KeycheckError> {
        match (input, key) {
            (Some(_), Some(_)) => Err(KeycheckError::ConflictingInput),
            (None, None) => Err(KeycheckError::NoKeys),
            (None, Some(key)) => Ok(KeySource::Inline(key.to_string())),
            (Some(input), None) => {
                let path = Path::new(input);
                if path.is_file() {
                    Ok(KeySource::File(path.to_path_buf()))
                } else {
                    Ok(KeySource::Inline(input.to_string()))
                }
            }
        }
    }

    /// Load the candidate keys.
    pub fn load(&self) -> Result<Vec<String>, KeycheckError> {
        match self {
            KeySource::Inline(key) => Ok(vec![key.clone()]),
            KeySource::File(path) => load_key_file(path),
        }
    }
}

/// Read a key file, one key per line.
///
/// Blank lines are skipped. Other lines are kept verbatim (minus the line
/// terminator) so that stray whitespace is reported by validation.
pub fn load_key_file(path: &Path) -> Result<Vec<String>, KeycheckError> {
    let contents = fs::read_to_string(path).map_err(|e| {
        KeycheckError::KeyFileIO(format!("Failed to read {}: {}", path.display(), e))
    })?;

    let keys: Vec<String> = contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(String::from)
        .collect();

    if keys.is_empty() {
        return Err(KeycheckError::EmptyKeyFile);
    }
    Ok(keys)
}

/// Check a key before any network call.
///
/// # Errors
/// * `InvalidKey` - Key is empty, contains whitespace, or (when `strict`)
///   does not look like an API key
pub fn validate_key(key: &str, strict: bool) -> Result<(), KeycheckError> {
    if key.trim().is_empty() {
        return Err(KeycheckError::InvalidKey {
            reason: "key is empty".to_string(),
        });
    }
    if key.chars().any(char::is_whitespace) {
        return Err(KeycheckError::InvalidKey {
            reason: "key contains whitespace".to_string(),
        });
    }
    if strict && !KEY_SHAPE.is_match(key) {
        return Err(KeycheckError::InvalidKey {
            reason: "key does not look like an API key".to_string(),
        });
    }
    Ok(())
}

/// Short SHA-256 fingerprint of a key, safe to log.
pub fn key_fingerprint(key: &str) -> String {
    use sha2::{Digest, Sha256};
    let hash = Sha256::digest(key.as_bytes());
    hex::encode(&hash[..6])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    const GOOD_KEY: &str = "AIzaSyA1234567890abcdefghij_-XY";

    #[test]
    fn test_resolve_requires_exactly_one_input() {
        assert!(matches!(
            KeySource::resolve(Some("a"), Some("b")),
            Err(KeycheckError::ConflictingInput)
        ));
        assert!(matches!(
            KeySource::resolve(None, None),
            Err(KeycheckError::NoKeys)
        ));
    }

    #[test]
    fn test_resolve_key_flag_is_inline() {
        let source = KeySource::resolve(None, Some(GOOD_KEY)).unwrap();
        assert_eq!(source, KeySource::Inline(GOOD_KEY.to_string()));
        assert_eq!(source.load().unwrap(), vec![GOOD_KEY.to_string()]);
    }

    #[test]
    fn test_resolve_positional_non_file_is_inline() {
        let source = KeySource::resolve(Some(GOOD_KEY), None).unwrap();
        assert_eq!(source, KeySource::Inline(GOOD_KEY.to_string()));
    }

    #[test]
    fn test_resolve_positional_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", GOOD_KEY).unwrap();
        let path = file.path().to_str().unwrap();

        let source = KeySource::resolve(Some(path), None).unwrap();
        assert_eq!(source, KeySource::File(file.path().to_path_buf()));
        assert_eq!(source.load().unwrap(), vec![GOOD_KEY.to_string()]);
    }

    #[test]
    fn test_load_key_file_skips_blank_lines_and_crlf() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "key-one\r\n\r\n   \nkey-two\n\n").unwrap();

        let keys = load_key_file(file.path()).unwrap();
        assert_eq!(keys, vec!["key-one".to_string(), "key-two".to_string()]);
    }

    #[test]
    fn test_load_key_file_keeps_stray_whitespace() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, " padded ").unwrap();

        let keys = load_key_file(file.path()).unwrap();
        assert_eq!(keys, vec![" padded ".to_string()]);
    }

    #[test]
    fn test_load_empty_file() {
        let file = NamedTempFile::new().unwrap();
        assert!(matches!(
            load_key_file(file.path()),
            Err(KeycheckError::EmptyKeyFile)
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = load_key_file(&dir.path().join("missing.txt"));
        assert!(matches!(result, Err(KeycheckError::KeyFileIO(_))));
    }

    #[test]
    fn test_validate_empty_and_whitespace() {
        for key in ["", "   ", "\t"] {
            let err = validate_key(key, false).unwrap_err();
            assert_eq!(err.to_string(), "key is empty");
        }
        let err = validate_key("abc def", false).unwrap_err();
        assert_eq!(err.to_string(), "key contains whitespace");
        assert!(validate_key(" abc", false).is_err());
    }

    #[test]
    fn test_validate_shape_only_when_strict() {
        assert!(validate_key("A", false).is_ok());
        assert!(validate_key("A", true).is_err());
        assert!(validate_key("short$key", false).is_ok());
        assert!(validate_key(GOOD_KEY, true).is_ok());
        assert!(validate_key("AIzaSyA1234567890abcdefghij$", true).is_err());
    }

    #[test]
    fn test_fingerprint_is_stable_and_short() {
        let a = key_fingerprint(GOOD_KEY);
        assert_eq!(a.len(), 12);
        assert_eq!(a, key_fingerprint(GOOD_KEY));
        assert_ne!(a, key_fingerprint("other"));
        assert!(!a.contains(GOOD_KEY));
    }
}

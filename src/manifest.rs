//! Plugin descriptor (manifest) reading.
//!
//! Release artifacts are named after the version string stored in the plugin's
//! `.uplugin` descriptor, a JSON document with a `VersionName` field.

use crate::error::{ManifestError, Result};
use std::path::Path;

/// Descriptor field holding the human readable release version
pub const VERSION_FIELD: &str = "VersionName";

/// Read the string value of `field` from the JSON manifest at `manifest_path`.
///
/// Fails with [`ManifestError::Malformed`] when the file cannot be read or parsed,
/// when the field is absent, or when it is not a string.
pub async fn read_version(manifest_path: &Path, field: &str) -> Result<String> {
    let malformed = |reason: String| ManifestError::Malformed {
        path: manifest_path.to_path_buf(),
        reason,
    };

    let content = tokio::fs::read_to_string(manifest_path)
        .await
        .map_err(|e| malformed(format!("unable to read: {}", e)))?;

    let version = parse_field(&content, field).map_err(malformed)?;
    log::debug!(
        "{} = {} in {}",
        field,
        version,
        manifest_path.display()
    );
    Ok(version)
}

fn parse_field(content: &str, field: &str) -> std::result::Result<String, String> {
    // Editor-written descriptors may start with a byte order mark
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|e| format!("invalid JSON: {}", e))?;

    match value.get(field) {
        Some(serde_json::Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(format!("field '{}' is not a string: {}", field, other)),
        None => Err(format!("field '{}' is missing", field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_field_string() {
        assert_eq!(
            parse_field(r#"{"VersionName": "1.2.3"}"#, VERSION_FIELD),
            Ok("1.2.3".to_string())
        );
    }

    #[test]
    fn test_parse_field_with_bom() {
        assert_eq!(
            parse_field("\u{feff}{\"VersionName\": \"2.0\"}", VERSION_FIELD),
            Ok("2.0".to_string())
        );
    }

    #[test]
    fn test_parse_field_missing() {
        let err = parse_field(r#"{"Version": 3}"#, VERSION_FIELD).unwrap_err();
        assert!(err.contains("missing"));
    }

    #[test]
    fn test_parse_field_not_string() {
        let err = parse_field(r#"{"VersionName": 3}"#, VERSION_FIELD).unwrap_err();
        assert!(err.contains("not a string"));
    }

    #[test]
    fn test_parse_field_invalid_json() {
        assert!(parse_field("{ VersionName: ", VERSION_FIELD).is_err());
        assert!(parse_field(r#"["VersionName"]"#, VERSION_FIELD).is_err());
    }
}

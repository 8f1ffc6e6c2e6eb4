//! Parser for the `metadata.txt` file shipped inside a plugin directory.

use tracing::debug;

use crate::{MetadataError, MetadataResult};

const GENERAL_SECTION: &str = "general";

/// Maps a `metadata.txt` key onto a schema field name.
fn field_for_key(key: &str) -> Option<&'static str> {
    let field = match key {
        "name" => "name",
        "description" => "description",
        "about" => "about",
        "category" => "category",
        "tags" => "tags",
        "changelog" => "changelog",
        "homepage" => "homepage",
        "tracker" => "tracker",
        "icon" => "icon",
        "experimental" => "experimental",
        "deprecated" => "deprecated",
        "plugin_dependencies" => "plugin_dependencies",
        "author" => "author_name",
        "email" => "author_email",
        "repository" => "code_repository",
        "version" => "version_installed",
        _ => return None,
    };
    Some(field)
}

/// Extracts the schema fields from the `[general]` section.
///
/// Keys are case-insensitive. Keys without a schema counterpart (such as
/// `qgisMinimumVersion`) are skipped.
pub(super) fn parse_fields(text: &str) -> MetadataResult<Vec<(&'static str, String)>> {
    let mut section: Option<String> = None;
    let mut seen_general = false;
    let mut entries: Vec<(String, String)> = Vec::new();
    let mut continuing = false;

    for (lineno, line) in text.lines().enumerate() {
        let lineno = lineno + 1;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continuing = false;
            continue;
        }
        if trimmed.starts_with(';') || trimmed.starts_with('#') {
            continue;
        }

        if line.starts_with(char::is_whitespace) && continuing {
            if section.as_deref() == Some(GENERAL_SECTION)
                && let Some((_, value)) = entries.last_mut()
            {
                value.push('\n');
                value.push_str(trimmed);
            }
            continue;
        }
        continuing = false;

        if let Some(name) = trimmed.strip_prefix('[') {
            let name = name.strip_suffix(']').ok_or_else(|| {
                MetadataError::InvalidMetadataTxt(format!("line {lineno}: unterminated section"))
            })?;
            let name = name.trim().to_lowercase();
            seen_general |= name == GENERAL_SECTION;
            section = Some(name);
            continue;
        }

        let Some(current) = section.as_deref() else {
            return Err(MetadataError::InvalidMetadataTxt(format!(
                "line {lineno}: entry before the first section header"
            )));
        };

        let (key, value) = trimmed
            .split_once(['=', ':'])
            .ok_or_else(|| {
                MetadataError::InvalidMetadataTxt(format!(
                    "line {lineno}: expected \"key = value\""
                ))
            })?;

        continuing = true;
        if current != GENERAL_SECTION {
            continue;
        }

        let key = key.trim().to_lowercase();
        if entries.iter().any(|(existing, _)| *existing == key) {
            return Err(MetadataError::InvalidMetadataTxt(format!(
                "line {lineno}: duplicate key \"{key}\""
            )));
        }
        entries.push((key, value.trim().to_string()));
    }

    if !seen_general {
        return Err(MetadataError::InvalidMetadataTxt(
            "missing [general] section".to_string(),
        ));
    }

    Ok(entries
        .into_iter()
        .filter_map(|(key, value)| match field_for_key(&key) {
            Some(field) => Some((field, value)),
            None => {
                debug!(key = %key, "ignoring metadata.txt key");
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use crate::{ErrorKind, Metadata};

    const SAMPLE: &str = "\
; the first section is what counts
[general]
name=Contour Tools
qgisMinimumVersion=3.0
description=Generate contour lines
Version = 1.4.2
author=Jane Doe
email=jane@example.com
changelog=1.4.2 fixed labels
    1.4.1 faster interpolation
experimental=False
deprecated=yes
repository=https://example.com/contour.git

[extra]
name=ignored
";

    #[test]
    fn test_parse_general_section() {
        let meta = Metadata::from_metadatatxt("contour_tools", SAMPLE).unwrap();

        assert_eq!(meta.id(), "contour_tools");
        assert_eq!(meta.get_str("name").unwrap(), Some("Contour Tools"));
        assert_eq!(meta.get_str("version_installed").unwrap(), Some("1.4.2"));
        assert_eq!(meta.get_str("author_name").unwrap(), Some("Jane Doe"));
        assert_eq!(
            meta.get_str("author_email").unwrap(),
            Some("jane@example.com")
        );
        assert_eq!(
            meta.get_str("code_repository").unwrap(),
            Some("https://example.com/contour.git")
        );
        assert_eq!(meta.get_bool("experimental").unwrap(), Some(false));
        assert_eq!(meta.get_bool("deprecated").unwrap(), Some(true));
    }

    #[test]
    fn test_continuation_lines() {
        let meta = Metadata::from_metadatatxt("contour_tools", SAMPLE).unwrap();
        assert_eq!(
            meta.get_str("changelog").unwrap(),
            Some("1.4.2 fixed labels\n1.4.1 faster interpolation")
        );
    }

    #[test]
    fn test_continuation_lines_in_other_sections() {
        let text = "\
[general]
name=Demo
version=1.0

[extra]
notes=first line
    second line
";
        let meta = Metadata::from_metadatatxt("demo", text).unwrap();
        assert_eq!(meta.get_str("name").unwrap(), Some("Demo"));
        assert_eq!(meta.get_str("version_installed").unwrap(), Some("1.0"));
        assert_eq!(meta.get_str("about").unwrap(), None);
    }

    #[test]
    fn test_missing_general_section() {
        let err = Metadata::from_metadatatxt("x", "[other]\nname=x\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);
    }

    #[test]
    fn test_entry_before_section() {
        let err = Metadata::from_metadatatxt("x", "name=x\n[general]\n").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_missing_name_is_a_requirement_error() {
        let err = Metadata::from_metadatatxt("x", "[general]\nversion=1.0\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Requirement);
    }

    #[test]
    fn test_invalid_boolean() {
        let err =
            Metadata::from_metadatatxt("x", "[general]\nname=x\nexperimental=maybe\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn test_duplicate_key() {
        let err = Metadata::from_metadatatxt("x", "[General]\nname=a\nNAME=b\n").unwrap_err();
        assert!(err.to_string().contains("duplicate key"));
    }
}

//! The metadata field schema.

use super::MetaValue;

/// Declared type of a metadata field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Str,
    Bool,
}

impl FieldType {
    /// Returns the type name used in error messages.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Str => "string",
            Self::Bool => "bool",
        }
    }
}

/// Static default value of a metadata field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    Str(&'static str),
    Bool(bool),
}

impl DefaultValue {
    /// Returns the type of this default.
    pub const fn field_type(self) -> FieldType {
        match self {
            Self::Str(_) => FieldType::Str,
            Self::Bool(_) => FieldType::Bool,
        }
    }

    pub(crate) fn to_value(self) -> MetaValue {
        match self {
            Self::Str(s) => MetaValue::Str(s.to_string()),
            Self::Bool(b) => MetaValue::Bool(b),
        }
    }
}

/// Declaration of one metadata field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    name: &'static str,
    dtype: FieldType,
    required: bool,
    default: Option<DefaultValue>,
    i18n: bool,
    comment: &'static str,
}

impl FieldSpec {
    const fn text(name: &'static str, comment: &'static str) -> Self {
        Self {
            name,
            dtype: FieldType::Str,
            required: false,
            default: None,
            i18n: false,
            comment,
        }
    }

    const fn flag(name: &'static str, comment: &'static str) -> Self {
        Self {
            dtype: FieldType::Bool,
            ..Self::text(name, comment)
        }
    }

    const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    const fn translatable(mut self) -> Self {
        self.i18n = true;
        self
    }

    const fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Returns the field name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the declared type.
    pub const fn dtype(&self) -> FieldType {
        self.dtype
    }

    /// Returns `true` if the field must have a value.
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Returns the default value, if any.
    pub const fn default_value(&self) -> Option<DefaultValue> {
        self.default
    }

    /// Returns `true` if the field holds translatable text.
    pub const fn is_translatable(&self) -> bool {
        self.i18n
    }

    /// Returns the human-readable description of the field.
    pub const fn comment(&self) -> &'static str {
        self.comment
    }
}

/// Every metadata field, in declaration order.
pub(crate) static FIELDS: [FieldSpec; 33] = [
    FieldSpec::text("id", "module name").required(),
    FieldSpec::text("name", "human readable plugin name")
        .required()
        .translatable(),
    FieldSpec::text("description", "short description of the plugin purpose only").translatable(),
    FieldSpec::text(
        "about",
        "longer description: how does it work, where does it install, how to run it?",
    )
    .translatable(),
    FieldSpec::text("category", "will be removed?"),
    FieldSpec::text("tags", "comma separated, spaces allowed").translatable(),
    FieldSpec::text("changelog", "may be multiline"),
    FieldSpec::text("author_name", ""),
    FieldSpec::text("author_email", ""),
    FieldSpec::text("homepage", "url to the plugin homepage"),
    FieldSpec::text("tracker", "url to a tracker site"),
    FieldSpec::text("code_repository", "url to the source code repository"),
    FieldSpec::text("version_installed", "installed instance version"),
    FieldSpec::text("library", "absolute path to the installed library / module"),
    FieldSpec::text("icon", "path to the first:(INSTALLED | AVAILABLE) icon"),
    FieldSpec::flag("pythonic", "true if Python plugin").with_default(DefaultValue::Bool(true)),
    FieldSpec::flag("readonly", "true if core plugin"),
    FieldSpec::flag("installed", "true if installed"),
    FieldSpec::flag("available", "true if available in repositories"),
    FieldSpec::text(
        "status",
        "( not installed | new ) | ( installed | upgradeable | orphan | newer )",
    ),
    FieldSpec::text("error", "NULL | broken | incompatible | dependent"),
    FieldSpec::text("error_details", "error description"),
    FieldSpec::flag("experimental", "true if experimental, false if stable"),
    FieldSpec::flag("deprecated", "true if deprecated, false if actual"),
    FieldSpec::flag("trusted", "true if trusted, false if not trusted"),
    FieldSpec::text("version_available", "available version"),
    FieldSpec::text("zip_repository", "the remote repository id"),
    FieldSpec::text("download_url", "url for downloading the plugin"),
    FieldSpec::text("filename", "the zip file name to be unzipped after downloaded"),
    FieldSpec::text("downloads", "number of downloads"),
    FieldSpec::text("average_vote", "average vote"),
    FieldSpec::text("rating_votes", "number of votes"),
    FieldSpec::text(
        "plugin_dependencies",
        "PIP-style comma separated list of plugin dependencies",
    ),
];

/// Returns the position of a field in [`FIELDS`].
pub(crate) fn field_index(name: &str) -> Option<usize> {
    FIELDS.iter().position(|spec| spec.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_field_names_are_unique() {
        let names: HashSet<_> = FIELDS.iter().map(FieldSpec::name).collect();
        assert_eq!(names.len(), FIELDS.len());
    }

    #[test]
    fn test_defaults_match_declared_types() {
        for spec in &FIELDS {
            if let Some(default) = spec.default_value() {
                assert_eq!(default.field_type(), spec.dtype(), "{}", spec.name());
            }
        }
    }

    #[test]
    fn test_only_id_and_name_are_required() {
        let required: Vec<_> = FIELDS
            .iter()
            .filter(|spec| spec.is_required())
            .map(FieldSpec::name)
            .collect();
        assert_eq!(required, vec!["id", "name"]);
    }

    #[test]
    fn test_boolean_fields() {
        let flags: Vec<_> = FIELDS
            .iter()
            .filter(|spec| spec.dtype() == FieldType::Bool)
            .map(FieldSpec::name)
            .collect();
        assert_eq!(
            flags,
            vec![
                "pythonic",
                "readonly",
                "installed",
                "available",
                "experimental",
                "deprecated",
                "trusted"
            ]
        );
    }

    #[test]
    fn test_pythonic_defaults_to_true() {
        let spec = &FIELDS[field_index("pythonic").unwrap()];
        assert_eq!(spec.default_value(), Some(DefaultValue::Bool(true)));
    }

    #[test]
    fn test_translatable_fields() {
        let i18n: Vec<_> = FIELDS
            .iter()
            .filter(|spec| spec.is_translatable())
            .map(FieldSpec::name)
            .collect();
        assert_eq!(i18n, vec!["name", "description", "about", "tags"]);
    }
}

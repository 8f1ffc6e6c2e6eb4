//! Plugin metadata records.
//!
//! A [`Metadata`] record describes one plugin with a fixed set of typed
//! fields (see [`Metadata::schema`]). Records are validated once, when they
//! are built, and are immutable afterwards.

mod metadatatxt;
mod schema;

use std::fmt;

use plugdex_config::str_to_bool;

use crate::{MetadataError, MetadataResult};

pub use schema::{DefaultValue, FieldSpec, FieldType};
use schema::{FIELDS, field_index};

/// Value of a metadata field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaValue {
    Str(String),
    Bool(bool),
}

impl MetaValue {
    /// Returns the field type this value satisfies.
    pub const fn field_type(&self) -> FieldType {
        match self {
            Self::Str(_) => FieldType::Str,
            Self::Bool(_) => FieldType::Bool,
        }
    }

    /// Returns the string, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Bool(_) => None,
        }
    }

    /// Returns the boolean, if this is a boolean value.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Str(_) => None,
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<bool> for MetaValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// One field of a record: its declaration and current value.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Field {
    spec: &'static FieldSpec,
    value: Option<MetaValue>,
}

impl Field {
    fn new(spec: &'static FieldSpec) -> Self {
        Self {
            spec,
            value: spec.default_value().map(DefaultValue::to_value),
        }
    }

    /// Assigns a value, converting lexicon strings for boolean fields.
    fn set(&mut self, value: MetaValue) -> MetadataResult<()> {
        let value = match (self.spec.dtype(), value) {
            (FieldType::Bool, MetaValue::Str(s)) => {
                let b = str_to_bool(&s).map_err(|source| MetadataError::NotABool {
                    field: self.spec.name(),
                    value: s.clone(),
                    source,
                })?;
                MetaValue::Bool(b)
            }
            (_, value) => value,
        };

        if value.field_type() != self.spec.dtype() {
            return Err(MetadataError::TypeMismatch {
                field: self.spec.name(),
                expected: self.spec.dtype().name(),
                actual: value.field_type().name(),
            });
        }

        self.value = Some(value);
        Ok(())
    }
}

/// Metadata of one plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    id: String,
    fields: Vec<Field>,
}

impl Metadata {
    /// Builds a record from field name / value pairs.
    ///
    /// Boolean fields accept strings from the boolean lexicon
    /// (`"true"`, `"False"`, `"yes"`, ...).
    ///
    /// # Errors
    ///
    /// Returns an error if a name is not a schema field, a value has the wrong
    /// type, or a required field ends up without a value.
    pub fn new<I, K, V>(values: I) -> MetadataResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<MetaValue>,
    {
        let mut fields: Vec<Field> = FIELDS.iter().map(Field::new).collect();

        for (name, value) in values {
            let name = name.as_ref();
            let index =
                field_index(name).ok_or_else(|| MetadataError::UnknownField(name.to_string()))?;
            fields[index].set(value.into())?;
        }

        if let Some(missing) = fields
            .iter()
            .find(|field| field.spec.is_required() && field.value.is_none())
        {
            return Err(MetadataError::MissingRequiredField(missing.spec.name()));
        }

        let id = match &fields[0].value {
            Some(MetaValue::Str(id)) => id.clone(),
            _ => return Err(MetadataError::MissingRequiredField("id")),
        };

        Ok(Self { id, fields })
    }

    /// Parses the `[general]` section of a plugin's `metadata.txt`.
    ///
    /// `id` is the plugin's module name, which `metadata.txt` does not carry.
    ///
    /// # Errors
    ///
    /// Returns an error if the text cannot be parsed or the resulting fields
    /// fail validation.
    pub fn from_metadatatxt(id: &str, text: &str) -> MetadataResult<Self> {
        let mut values = vec![("id".to_string(), MetaValue::from(id))];
        values.extend(
            metadatatxt::parse_fields(text)?
                .into_iter()
                .map(|(name, value)| (name.to_string(), MetaValue::Str(value))),
        );
        Self::new(values)
    }

    /// Returns the field schema.
    pub fn schema() -> &'static [FieldSpec] {
        &FIELDS
    }

    /// Returns the plugin id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the value of a field.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is not a schema field.
    pub fn get(&self, name: &str) -> MetadataResult<Option<&MetaValue>> {
        let index =
            field_index(name).ok_or_else(|| MetadataError::UnknownField(name.to_string()))?;
        Ok(self.fields[index].value.as_ref())
    }

    /// Returns the value of a string field.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is not a schema field or not a string field.
    pub fn get_str(&self, name: &str) -> MetadataResult<Option<&str>> {
        self.typed(name, FieldType::Str)
            .map(|value| value.and_then(MetaValue::as_str))
    }

    /// Returns the value of a boolean field.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is not a schema field or not a boolean field.
    pub fn get_bool(&self, name: &str) -> MetadataResult<Option<bool>> {
        self.typed(name, FieldType::Bool)
            .map(|value| value.and_then(MetaValue::as_bool))
    }

    /// Returns the fields that have a value, in schema order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &MetaValue)> {
        self.fields
            .iter()
            .filter_map(|field| field.value.as_ref().map(|value| (field.spec.name(), value)))
    }

    fn typed(&self, name: &str, dtype: FieldType) -> MetadataResult<Option<&MetaValue>> {
        let index =
            field_index(name).ok_or_else(|| MetadataError::UnknownField(name.to_string()))?;
        let field = &self.fields[index];
        if field.spec.dtype() != dtype {
            return Err(MetadataError::TypeMismatch {
                field: field.spec.name(),
                expected: field.spec.dtype().name(),
                actual: dtype.name(),
            });
        }
        Ok(field.value.as_ref())
    }
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<metadata id=\"{}\">", self.id)
    }
}

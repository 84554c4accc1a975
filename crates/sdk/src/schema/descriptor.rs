//! Declarative schema for one document type.
//!
//! A [`DocumentSchema`] is an ordered table of field name to
//! [`FieldDescriptor`]. It is consulted before every write (validation) and
//! after every read (type coercion back from tag strings).

use snafu::ensure;

use crate::error::{Result, ValidationSnafu};
use crate::schema::document::{FieldValue, Fields};

/// Declared runtime kind of a document field.
#[allow(missing_docs)] // Variant names are the kind names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    Boolean,
}

impl FieldKind {
    /// Lowercase name used in validation messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }

    /// True when `value` carries this kind.
    #[must_use]
    pub fn matches(self, value: &FieldValue) -> bool {
        matches!(
            (self, value),
            (Self::String, FieldValue::Str(_))
                | (Self::Number, FieldValue::Number(_))
                | (Self::Boolean, FieldValue::Bool(_))
        )
    }
}

/// Description of one schema field.
///
/// # Example
///
/// ```
/// use tessera_gateway_sdk::schema::{FieldDescriptor, FieldKind};
///
/// let descriptor = FieldDescriptor::builder()
///     .kind(FieldKind::String)
///     .required(false)
///     .build();
/// assert!(descriptor.indexed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Declared kind.
    pub kind: FieldKind,
    /// Whether create and update must supply the field.
    pub required: bool,
    /// Whether the field is stored as a searchable tag. A non-indexed field
    /// lives in the entry payload and needs an explicit
    /// [`get_data`](crate::schema::Collection::get_data) fetch.
    pub indexed: bool,
}

#[bon::bon]
impl FieldDescriptor {
    /// Creates a descriptor. `required` and `indexed` default to true.
    #[builder]
    pub fn new(
        kind: FieldKind,
        #[builder(default = true)] required: bool,
        #[builder(default = true)] indexed: bool,
    ) -> Self {
        Self { kind, required, indexed }
    }
}

/// Shorthand for a required, indexed field of the given kind.
impl From<FieldKind> for FieldDescriptor {
    fn from(kind: FieldKind) -> Self {
        Self { kind, required: true, indexed: true }
    }
}

/// Ordered field table for one document type.
///
/// Declaration order is preserved and determines the order validation
/// reports problems in.
///
/// # Example
///
/// ```
/// use tessera_gateway_sdk::schema::{DocumentSchema, FieldDescriptor, FieldKind};
///
/// let schema = DocumentSchema::new()
///     .field("age", FieldKind::Number)
///     .field("name", FieldKind::String)
///     .field("mentor", FieldDescriptor::builder().kind(FieldKind::String).required(false).build());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentSchema {
    fields: Vec<(String, FieldDescriptor)>,
}

impl DocumentSchema {
    /// An empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a field, replacing any earlier declaration of the same name.
    #[must_use]
    pub fn field(
        mut self,
        name: impl Into<String>,
        descriptor: impl Into<FieldDescriptor>,
    ) -> Self {
        let name = name.into();
        let descriptor = descriptor.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = descriptor,
            None => self.fields.push((name, descriptor)),
        }
        self
    }

    /// Looks up a declared field.
    #[must_use]
    pub fn descriptor(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|(field, _)| field == name).map(|(_, descriptor)| descriptor)
    }

    /// Iterates declarations in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldDescriptor)> {
        self.fields.iter().map(|(name, descriptor)| (name.as_str(), descriptor))
    }

    /// Number of declared fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when no fields are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True when every declared field is indexed. Such documents carry no
    /// recoverable payload.
    #[must_use]
    pub fn is_fully_indexed(&self) -> bool {
        self.fields.iter().all(|(_, descriptor)| descriptor.indexed)
    }

    /// Checks a candidate field map against the table.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::Validation`](crate::error::SdkError::Validation)
    /// naming the offending field when a required field is missing, a value
    /// has the wrong kind, a number is not finite, or a field was never
    /// declared.
    pub fn validate(&self, fields: &Fields) -> Result<()> {
        for (name, descriptor) in self.iter() {
            ensure!(
                !descriptor.required || fields.contains_key(name),
                ValidationSnafu { field: name, reason: "required field is missing" }
            );
        }

        for (name, value) in fields {
            let Some(descriptor) = self.descriptor(name) else {
                return ValidationSnafu { field: name.as_str(), reason: "field is not declared" }
                    .fail();
            };
            ensure!(
                descriptor.kind.matches(value),
                ValidationSnafu {
                    field: name.as_str(),
                    reason: format!("expected a {}", descriptor.kind.name()),
                }
            );
            if let FieldValue::Number(number) = value {
                ensure!(
                    number.is_finite(),
                    ValidationSnafu { field: name.as_str(), reason: "number must be finite" }
                );
            }
        }

        Ok(())
    }
}

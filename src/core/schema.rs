//! Immutable-field preservation
//!
//! A [`ResourceSchema`] is an explicit list of field descriptors for one
//! resource type, built once when the type is registered. On update, the
//! dispatcher uses it to copy every immutable field of the stored instance
//! onto the client-submitted instance, overwriting whatever the client sent.
//!
//! Embedded sub-structures carry their own schema, so immutability composes
//! through struct composition. A type with derived or computed immutable
//! fields can bypass the descriptor list entirely with a custom copier.
//!
//! # Example
//!
//! ```rust,ignore
//! let schema = ResourceSchema::<Fish>::builder()
//!     .immutable("id", |existing, incoming| incoming.id = existing.id)
//!     .immutable("create_date", |existing, incoming| incoming.create_date = existing.create_date)
//!     .mutable("color")
//!     .build();
//!
//! // or, equivalently for the immutable part:
//! let schema = immutable_fields!(Fish => [id, create_date]).mutable("color").build();
//! ```

use crate::core::error::{ConfigError, PreservationError};
use std::collections::HashSet;
use std::fmt;

type CopyFn<T> = Box<dyn Fn(&T, &mut T) -> Result<(), PreservationError> + Send + Sync>;

/// Escape hatch for types whose immutable state cannot be described field by field.
///
/// When a schema is built with [`ResourceSchemaBuilder::with_copier`], this
/// implementation replaces the descriptor list.
pub trait CopyImmutableAttributes {
    fn copy_immutable_attributes_to(&self, dest: &mut Self) -> Result<(), PreservationError>;
}

/// Kind of a field descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Copied from the stored instance on update
    Immutable,
    /// Left as submitted by the client
    Mutable,
    /// A sub-structure preserved according to its own schema
    Embedded,
}

/// One field of a resource schema
pub struct FieldDescriptor<T> {
    name: &'static str,
    kind: FieldKind,
    copy: Option<CopyFn<T>>,
}

impl<T> FieldDescriptor<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn is_immutable(&self) -> bool {
        self.kind == FieldKind::Immutable
    }
}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Field descriptor list for one resource type
pub struct ResourceSchema<T> {
    fields: Vec<FieldDescriptor<T>>,
    custom: Option<CopyFn<T>>,
}

impl<T> fmt::Debug for ResourceSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceSchema")
            .field("fields", &self.fields)
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

impl<T> Default for ResourceSchema<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> ResourceSchema<T> {
    /// A schema with no immutable fields; preservation is a no-op
    pub fn empty() -> Self {
        Self {
            fields: Vec::new(),
            custom: None,
        }
    }

    pub fn builder() -> ResourceSchemaBuilder<T> {
        ResourceSchemaBuilder {
            fields: Vec::new(),
            custom: None,
        }
    }

    pub fn fields(&self) -> &[FieldDescriptor<T>] {
        &self.fields
    }

    /// Names of the top-level immutable fields
    pub fn immutable_fields(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| f.is_immutable())
            .map(|f| f.name)
            .collect()
    }

    pub fn has_custom_copier(&self) -> bool {
        self.custom.is_some()
    }

    /// Copy immutable fields from `existing` onto `incoming`.
    ///
    /// Both instances must be present. The custom copier, if any, takes over
    /// completely; otherwise each immutable field is overwritten and each
    /// embedded sub-structure is preserved recursively. Mutable fields are
    /// never touched.
    pub fn preserve(
        &self,
        existing: Option<&T>,
        incoming: Option<&mut T>,
    ) -> Result<(), PreservationError> {
        let existing = existing.ok_or(PreservationError::NilSource)?;
        let incoming = incoming.ok_or(PreservationError::NilDestination)?;
        self.copy_immutable(existing, incoming)
    }

    /// [`preserve`](Self::preserve) for instances already known to be present
    pub fn copy_immutable(&self, existing: &T, incoming: &mut T) -> Result<(), PreservationError> {
        if let Some(custom) = &self.custom {
            return custom(existing, incoming);
        }

        for field in &self.fields {
            if let Some(copy) = &field.copy {
                copy(existing, incoming)?;
            }
        }
        Ok(())
    }

    /// Reject empty or duplicate field names. Run once at registration.
    pub fn check(&self, resource: &'static str) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(ConfigError::InvalidSchema {
                    resource,
                    message: "field name cannot be empty".to_string(),
                });
            }
            if !seen.insert(field.name) {
                return Err(ConfigError::InvalidSchema {
                    resource,
                    message: format!("field '{}' is declared twice", field.name),
                });
            }
        }
        Ok(())
    }
}

/// Builder for [`ResourceSchema`]
pub struct ResourceSchemaBuilder<T> {
    fields: Vec<FieldDescriptor<T>>,
    custom: Option<CopyFn<T>>,
}

impl<T: 'static> ResourceSchemaBuilder<T> {
    /// Declare an immutable field and how to copy it from the stored instance
    pub fn immutable<F>(mut self, name: &'static str, copy: F) -> Self
    where
        F: Fn(&T, &mut T) + Send + Sync + 'static,
    {
        self.fields.push(FieldDescriptor {
            name,
            kind: FieldKind::Immutable,
            copy: Some(Box::new(move |existing, incoming| {
                copy(existing, incoming);
                Ok(())
            })),
        });
        self
    }

    /// Declare a field the client may change
    pub fn mutable(mut self, name: &'static str) -> Self {
        self.fields.push(FieldDescriptor {
            name,
            kind: FieldKind::Mutable,
            copy: None,
        });
        self
    }

    /// Declare an embedded sub-structure preserved by its own schema
    pub fn embedded<U: 'static>(
        mut self,
        name: &'static str,
        get: fn(&T) -> &U,
        get_mut: fn(&mut T) -> &mut U,
        schema: ResourceSchema<U>,
    ) -> Self {
        self.fields.push(FieldDescriptor {
            name,
            kind: FieldKind::Embedded,
            copy: Some(Box::new(move |existing, incoming| {
                schema.copy_immutable(get(existing), get_mut(incoming))
            })),
        });
        self
    }

    /// Replace the descriptor list with a custom copier
    pub fn custom<F>(mut self, copier: F) -> Self
    where
        F: Fn(&T, &mut T) -> Result<(), PreservationError> + Send + Sync + 'static,
    {
        self.custom = Some(Box::new(copier));
        self
    }

    /// Replace the descriptor list with the type's [`CopyImmutableAttributes`] impl
    pub fn with_copier(self) -> Self
    where
        T: CopyImmutableAttributes,
    {
        self.custom(|existing: &T, incoming: &mut T| existing.copy_immutable_attributes_to(incoming))
    }

    pub fn build(self) -> ResourceSchema<T> {
        ResourceSchema {
            fields: self.fields,
            custom: self.custom,
        }
    }
}

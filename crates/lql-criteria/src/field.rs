use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use lql_types::{RecordRef, RecordType};

use crate::compile::compile;
use crate::error::ProjectionError;
use crate::expression::Expression;
use crate::predicate::Predicate;
use crate::value::{FieldValue, Projectable};

/// Record-level attributes that live outside the payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordAttribute {
    Reference,
    BackReference,
    RecordType,
    LinearId,
    ExternalId,
}

impl fmt::Display for RecordAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Reference => "reference",
            Self::BackReference => "back_reference",
            Self::RecordType => "record_type",
            Self::LinearId => "linear_id",
            Self::ExternalId => "external_id",
        };
        write!(f, "@{s}")
    }
}

/// Where a compiled expression reads its left-hand value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldPath {
    /// Dotted path into the record payload.
    Payload(String),
    Attribute(RecordAttribute),
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Payload(path) => write!(f, "{path}"),
            Self::Attribute(attr) => write!(f, "{attr}"),
        }
    }
}

/// A named field of type `V` together with the projection used to turn
/// operands into [`FieldValue`]s.
pub struct Field<V> {
    path: FieldPath,
    projection: fn(&V) -> Option<FieldValue>,
    _marker: PhantomData<fn(&V)>,
}

impl<V: Projectable> Field<V> {
    /// Payload field using the type's default projection.
    pub fn new(path: impl Into<String>) -> Self {
        Self::with_projection(FieldPath::Payload(path.into()), V::project)
    }

    pub fn attribute(attribute: RecordAttribute) -> Self {
        Self::with_projection(FieldPath::Attribute(attribute), V::project)
    }
}

impl<V> Field<V> {
    pub fn with_projection(path: FieldPath, projection: fn(&V) -> Option<FieldValue>) -> Self {
        Self {
            path,
            projection,
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    pub fn project(&self, value: &V) -> Option<FieldValue> {
        (self.projection)(value)
    }

    /// Compile `predicate` against this field.
    pub fn matches(&self, predicate: &Predicate<V>) -> Result<Expression, ProjectionError> {
        compile(predicate, self)
    }
}

impl Field<RecordRef> {
    /// The record's own reference.
    pub fn reference() -> Self {
        Self::attribute(RecordAttribute::Reference)
    }

    /// The reference of the record's immediate predecessor.
    pub fn back_reference() -> Self {
        Self::attribute(RecordAttribute::BackReference)
    }
}

impl Field<RecordType> {
    pub fn record_type() -> Self {
        Self::attribute(RecordAttribute::RecordType)
    }
}

impl Field<uuid::Uuid> {
    pub fn linear_id() -> Self {
        Self::attribute(RecordAttribute::LinearId)
    }
}

impl Field<String> {
    pub fn external_id() -> Self {
        Self::attribute(RecordAttribute::ExternalId)
    }
}

impl<V> Clone for Field<V> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            projection: self.projection,
            _marker: PhantomData,
        }
    }
}

impl<V> fmt::Debug for Field<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Field({})", self.path)
    }
}

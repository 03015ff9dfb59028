use std::fmt;

use serde::{Deserialize, Serialize};

use crate::field::FieldPath;
use crate::value::FieldValue;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::GreaterThan => ">",
            Self::GreaterOrEqual => ">=",
            Self::LessThan => "<",
            Self::LessOrEqual => "<=",
        };
        write!(f, "{s}")
    }
}

/// Backend-neutral boolean expression over one record.
///
/// Leaf operators other than `IsNull` never match a record whose field is
/// absent; null handling is made explicit by the compiler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    IsNull(FieldPath),
    NotNull(FieldPath),
    Compare {
        field: FieldPath,
        op: CompareOp,
        value: FieldValue,
        case_insensitive: bool,
    },
    /// Inclusive range.
    Between {
        field: FieldPath,
        low: FieldValue,
        high: FieldValue,
    },
    In {
        field: FieldPath,
        values: Vec<FieldValue>,
        case_insensitive: bool,
    },
    NotIn {
        field: FieldPath,
        values: Vec<FieldValue>,
        case_insensitive: bool,
    },
    Like {
        field: FieldPath,
        pattern: String,
        case_insensitive: bool,
    },
    NotLike {
        field: FieldPath,
        pattern: String,
        case_insensitive: bool,
    },
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
    Not(Box<Expression>),
}

impl Expression {
    pub fn and(self, other: Expression) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Expression) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Fold with AND. `None` for an empty input.
    pub fn all(expressions: impl IntoIterator<Item = Expression>) -> Option<Self> {
        expressions.into_iter().reduce(Self::and)
    }

    /// Fold with OR. `None` for an empty input.
    pub fn any(expressions: impl IntoIterator<Item = Expression>) -> Option<Self> {
        expressions.into_iter().reduce(Self::or)
    }
}

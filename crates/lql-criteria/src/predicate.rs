/// A comparison intent over one value or a set of values.
///
/// The set of operators is closed; the compiler matches on it exhaustively.
/// Single-operand variants hold `Option<V>` so that "compare against null"
/// is expressible and gets a defined meaning (or a defined failure).
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate<V> {
    EqualTo {
        value: Option<V>,
        case_insensitive: bool,
    },
    NotEqualTo {
        value: Option<V>,
        case_insensitive: bool,
    },
    GreaterThan(Option<V>),
    GreaterOrEqual(Option<V>),
    LessThan(Option<V>),
    LessOrEqual(Option<V>),
    Between(Option<V>, Option<V>),
    Within {
        values: Vec<V>,
        case_insensitive: bool,
    },
    NotWithin {
        values: Vec<V>,
        case_insensitive: bool,
    },
    /// SQL-style pattern: `%` matches any run, `_` one character.
    Like {
        pattern: V,
        case_insensitive: bool,
    },
    NotLike {
        pattern: V,
        case_insensitive: bool,
    },
}

impl<V> Predicate<V> {
    pub fn equal_to(value: V) -> Self {
        Self::EqualTo {
            value: Some(value),
            case_insensitive: false,
        }
    }

    pub fn not_equal_to(value: V) -> Self {
        Self::NotEqualTo {
            value: Some(value),
            case_insensitive: false,
        }
    }

    pub fn is_null() -> Self {
        Self::EqualTo {
            value: None,
            case_insensitive: false,
        }
    }

    pub fn is_not_null() -> Self {
        Self::NotEqualTo {
            value: None,
            case_insensitive: false,
        }
    }

    pub fn greater_than(value: V) -> Self {
        Self::GreaterThan(Some(value))
    }

    pub fn greater_or_equal(value: V) -> Self {
        Self::GreaterOrEqual(Some(value))
    }

    pub fn less_than(value: V) -> Self {
        Self::LessThan(Some(value))
    }

    pub fn less_or_equal(value: V) -> Self {
        Self::LessOrEqual(Some(value))
    }

    /// Inclusive on both ends.
    pub fn between(low: V, high: V) -> Self {
        Self::Between(Some(low), Some(high))
    }

    pub fn within(values: impl IntoIterator<Item = V>) -> Self {
        Self::Within {
            values: values.into_iter().collect(),
            case_insensitive: false,
        }
    }

    pub fn not_within(values: impl IntoIterator<Item = V>) -> Self {
        Self::NotWithin {
            values: values.into_iter().collect(),
            case_insensitive: false,
        }
    }

    /// Name used in error messages.
    pub fn operator_name(&self) -> &'static str {
        match self {
            Self::EqualTo { .. } => "EqualTo",
            Self::NotEqualTo { .. } => "NotEqualTo",
            Self::GreaterThan(_) => "GreaterThan",
            Self::GreaterOrEqual(_) => "GreaterOrEqual",
            Self::LessThan(_) => "LessThan",
            Self::LessOrEqual(_) => "LessOrEqual",
            Self::Between(_, _) => "Between",
            Self::Within { .. } => "Within",
            Self::NotWithin { .. } => "NotWithin",
            Self::Like { .. } => "Like",
            Self::NotLike { .. } => "NotLike",
        }
    }
}

impl Predicate<String> {
    pub fn equal_to_ignoring_case(value: impl Into<String>) -> Self {
        Self::EqualTo {
            value: Some(value.into()),
            case_insensitive: true,
        }
    }

    pub fn not_equal_to_ignoring_case(value: impl Into<String>) -> Self {
        Self::NotEqualTo {
            value: Some(value.into()),
            case_insensitive: true,
        }
    }

    pub fn within_ignoring_case(values: impl IntoIterator<Item = String>) -> Self {
        Self::Within {
            values: values.into_iter().collect(),
            case_insensitive: true,
        }
    }

    pub fn like(pattern: impl Into<String>) -> Self {
        Self::Like {
            pattern: pattern.into(),
            case_insensitive: false,
        }
    }

    pub fn like_ignoring_case(pattern: impl Into<String>) -> Self {
        Self::Like {
            pattern: pattern.into(),
            case_insensitive: true,
        }
    }

    pub fn not_like(pattern: impl Into<String>) -> Self {
        Self::NotLike {
            pattern: pattern.into(),
            case_insensitive: false,
        }
    }
}

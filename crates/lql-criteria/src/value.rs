use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use lql_types::{Party, RecordRef, RecordType, TransactionId};

/// Backend-neutral scalar a field is compared against.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// Read a stored JSON value. `null` is absent; arrays and objects compare
    /// as their canonical JSON text.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float)),
            Value::String(s) => Some(Self::Text(s.clone())),
            other => Some(Self::Text(other.to_string())),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Order two values of compatible kinds. Integers and floats compare
    /// numerically; mismatched kinds are unordered.
    pub fn compare(&self, other: &Self, case_insensitive: bool) -> Option<Ordering> {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Int(a), Self::Float(b)) => int_cmp_float(*a, *b),
            (Self::Float(a), Self::Int(b)) => int_cmp_float(*b, *a).map(Ordering::reverse),
            (Self::Text(a), Self::Text(b)) if case_insensitive => {
                Some(a.to_lowercase().cmp(&b.to_lowercase()))
            }
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    pub fn equals(&self, other: &Self, case_insensitive: bool) -> bool {
        self.compare(other, case_insensitive) == Some(Ordering::Equal)
    }

    /// Total order for sorting: booleans, then numbers, then text. NaN sorts
    /// after every other number.
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        self.kind_rank()
            .cmp(&other.kind_rank())
            .then_with(|| match (self, other) {
                (Self::Float(a), Self::Float(b)) => a
                    .partial_cmp(b)
                    .unwrap_or_else(|| a.is_nan().cmp(&b.is_nan())),
                (Self::Int(_), Self::Float(b)) if b.is_nan() => Ordering::Less,
                (Self::Float(a), Self::Int(_)) if a.is_nan() => Ordering::Greater,
                _ => self.compare(other, false).unwrap_or(Ordering::Equal),
            })
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Self::Bool(_) => 0,
            Self::Int(_) | Self::Float(_) => 1,
            Self::Text(_) => 2,
        }
    }
}

/// Exact comparison of an integer with a float; `None` for NaN.
fn int_cmp_float(int: i64, float: f64) -> Option<Ordering> {
    // 2^63: the first float above every i64.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if float.is_nan() {
        return None;
    }
    if float >= LIMIT {
        return Some(Ordering::Less);
    }
    if float < -LIMIT {
        return Some(Ordering::Greater);
    }
    let whole = float.trunc();
    // In range and integral, so the cast is exact.
    Some(int.cmp(&(whole as i64)).then_with(|| {
        if float > whole {
            Ordering::Less
        } else if float < whole {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }))
}

/// Default projection of an operand into a [`FieldValue`].
///
/// The projection of a value must equal what the backend reads from the
/// stored field holding that value, so types project the same way they
/// serialize.
pub trait Projectable {
    fn project(&self) -> Option<FieldValue>;
}

macro_rules! project_int {
    ($($t:ty),*) => {
        $(impl Projectable for $t {
            fn project(&self) -> Option<FieldValue> {
                Some(FieldValue::Int(i64::from(*self)))
            }
        })*
    };
}

project_int!(i8, i16, i32, i64, u8, u16, u32);

impl Projectable for u64 {
    fn project(&self) -> Option<FieldValue> {
        Some(match i64::try_from(*self) {
            Ok(n) => FieldValue::Int(n),
            Err(_) => FieldValue::Float(*self as f64),
        })
    }
}

impl Projectable for f64 {
    fn project(&self) -> Option<FieldValue> {
        Some(FieldValue::Float(*self))
    }
}

impl Projectable for bool {
    fn project(&self) -> Option<FieldValue> {
        Some(FieldValue::Bool(*self))
    }
}

impl Projectable for String {
    fn project(&self) -> Option<FieldValue> {
        Some(FieldValue::Text(self.clone()))
    }
}

impl Projectable for &str {
    fn project(&self) -> Option<FieldValue> {
        Some(FieldValue::Text((*self).to_string()))
    }
}

impl Projectable for RecordRef {
    fn project(&self) -> Option<FieldValue> {
        Some(FieldValue::Text(self.to_string()))
    }
}

impl Projectable for TransactionId {
    fn project(&self) -> Option<FieldValue> {
        Some(FieldValue::Text(self.to_hex()))
    }
}

impl Projectable for Party {
    fn project(&self) -> Option<FieldValue> {
        Some(FieldValue::Text(self.name().to_string()))
    }
}

impl Projectable for RecordType {
    fn project(&self) -> Option<FieldValue> {
        Some(FieldValue::Text(self.name().to_string()))
    }
}

impl Projectable for uuid::Uuid {
    fn project(&self) -> Option<FieldValue> {
        Some(FieldValue::Text(self.to_string()))
    }
}

impl<T: Projectable> Projectable for Option<T> {
    fn project(&self) -> Option<FieldValue> {
        self.as_ref().and_then(Projectable::project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_null_is_absent() {
        assert_eq!(FieldValue::from_json(&Value::Null), None);
        assert_eq!(FieldValue::from_json(&json!(3)), Some(FieldValue::Int(3)));
        assert_eq!(
            FieldValue::from_json(&json!(2.5)),
            Some(FieldValue::Float(2.5))
        );
        assert_eq!(
            FieldValue::from_json(&json!("x")),
            Some(FieldValue::Text("x".into()))
        );
    }

    #[test]
    fn ints_and_floats_compare_numerically() {
        assert_eq!(
            FieldValue::Int(2).compare(&FieldValue::Float(2.5), false),
            Some(Ordering::Less)
        );
        assert!(FieldValue::Float(3.0).equals(&FieldValue::Int(3), false));
    }

    #[test]
    fn large_ints_compare_exactly_with_floats() {
        let big = FieldValue::Int(9_007_199_254_740_993);
        let float = FieldValue::Float(9_007_199_254_740_992.0);
        assert_eq!(big.compare(&float, false), Some(Ordering::Greater));
        assert!(!big.equals(&float, false));
        assert_eq!(float.compare(&big, false), Some(Ordering::Less));
        assert_eq!(
            FieldValue::Int(i64::MAX).compare(&FieldValue::Float(9.3e18), false),
            Some(Ordering::Less)
        );
        assert_eq!(
            FieldValue::Int(-3).compare(&FieldValue::Float(-2.5), false),
            Some(Ordering::Less)
        );
        assert_eq!(FieldValue::Int(1).compare(&FieldValue::Float(f64::NAN), false), None);
    }

    #[test]
    fn sort_order_is_total_across_kinds() {
        let mut values = vec![
            FieldValue::Text("s".into()),
            FieldValue::Int(3),
            FieldValue::Float(f64::NAN),
            FieldValue::Bool(true),
            FieldValue::Float(1.5),
            FieldValue::Text("a".into()),
            FieldValue::Int(-1),
            FieldValue::Bool(false),
        ];
        values.sort_by(FieldValue::sort_cmp);
        let order: Vec<String> = values.iter().map(|v| format!("{v:?}")).collect();
        assert_eq!(
            order,
            vec![
                "Bool(false)",
                "Bool(true)",
                "Int(-1)",
                "Float(1.5)",
                "Int(3)",
                "Float(NaN)",
                "Text(\"a\")",
                "Text(\"s\")",
            ]
        );
        assert_eq!(
            FieldValue::Int(0).sort_cmp(&FieldValue::Float(-0.0)),
            Ordering::Equal
        );
    }

    #[test]
    fn mismatched_kinds_are_unordered() {
        assert_eq!(
            FieldValue::Int(1).compare(&FieldValue::Text("1".into()), false),
            None
        );
        assert!(!FieldValue::Bool(true).equals(&FieldValue::Int(1), false));
    }

    #[test]
    fn case_insensitive_text_equality() {
        let a = FieldValue::Text("Alice".into());
        let b = FieldValue::Text("ALICE".into());
        assert!(!a.equals(&b, false));
        assert!(a.equals(&b, true));
    }

    #[test]
    fn record_ref_projects_like_it_serializes() {
        let r = RecordRef::new(TransactionId::from_bytes(b"p"), 1);
        let stored = serde_json::to_value(r).unwrap();
        assert_eq!(FieldValue::from_json(&stored), r.project());
    }

    #[test]
    fn none_projects_to_absent() {
        let missing: Option<i64> = None;
        assert_eq!(missing.project(), None);
        assert_eq!(Some(4i64).project(), Some(FieldValue::Int(4)));
    }
}

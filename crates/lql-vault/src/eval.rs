//! Evaluation of [`Criteria`] and [`Sort`] against stored records.

use std::cmp::Ordering;

use lql_criteria::{
    CompareOp, Criteria, Expression, FieldPath, FieldValue, LinearFilter, RecordAttribute,
    StructuralFilter,
};
use lql_types::{Sort, SortDirection, SortKey, StoredRecord};

/// Whether `record` satisfies `criteria`, status included.
pub fn matches(criteria: &Criteria, record: &StoredRecord) -> bool {
    eval_criteria(criteria, record, true)
}

/// Whether `record` satisfies `criteria` with every status filter treated as
/// `All`. Used to route updates, where consumed and produced records are both
/// delivered and status is applied by the consumer.
pub fn matches_ignoring_status(criteria: &Criteria, record: &StoredRecord) -> bool {
    eval_criteria(criteria, record, false)
}

fn eval_criteria(criteria: &Criteria, record: &StoredRecord, check_status: bool) -> bool {
    match criteria {
        Criteria::Structural(filter) => eval_structural(filter, record, check_status),
        Criteria::Linear(filter) => eval_linear(filter, record),
        Criteria::Expression(expression) => eval_expression(expression, record),
        Criteria::And(left, right) => {
            eval_criteria(left, record, check_status) && eval_criteria(right, record, check_status)
        }
        Criteria::Or(left, right) => {
            eval_criteria(left, record, check_status) || eval_criteria(right, record, check_status)
        }
        Criteria::Not(inner) => !eval_criteria(inner, record, check_status),
    }
}

fn eval_structural(filter: &StructuralFilter, record: &StoredRecord, check_status: bool) -> bool {
    if check_status && !filter.status.admits(record.status) {
        return false;
    }
    if let Some(types) = &filter.record_types {
        if !types.iter().any(|t| record.is_assignable_to(t)) {
            return false;
        }
    }
    if let Some(references) = &filter.references {
        if !references.contains(&record.reference) {
            return false;
        }
    }
    if let Some(participants) = &filter.participants {
        if !record.participants.iter().any(|p| participants.contains(p)) {
            return false;
        }
    }
    filter.relevancy.admits(record.relevant)
}

fn eval_linear(filter: &LinearFilter, record: &StoredRecord) -> bool {
    filter.admits(record.linear_id.as_ref())
}

/// Read the left-hand value of a leaf. `None` means the field is null or
/// absent.
pub fn read_field(record: &StoredRecord, path: &FieldPath) -> Option<FieldValue> {
    match path {
        FieldPath::Payload(path) => record.field(path).and_then(FieldValue::from_json),
        FieldPath::Attribute(attribute) => match attribute {
            RecordAttribute::Reference => Some(FieldValue::Text(record.reference.to_string())),
            RecordAttribute::BackReference => record
                .back_reference
                .map(|r| FieldValue::Text(r.to_string())),
            RecordAttribute::RecordType => {
                Some(FieldValue::Text(record.record_type().name().to_string()))
            }
            RecordAttribute::LinearId => record
                .linear_id
                .as_ref()
                .map(|l| FieldValue::Text(l.id.to_string())),
            RecordAttribute::ExternalId => record
                .linear_id
                .as_ref()
                .and_then(|l| l.external_id.clone())
                .map(FieldValue::Text),
        },
    }
}

fn eval_expression(expression: &Expression, record: &StoredRecord) -> bool {
    match expression {
        Expression::IsNull(path) => read_field(record, path).is_none(),
        Expression::NotNull(path) => read_field(record, path).is_some(),
        Expression::Compare {
            field,
            op,
            value,
            case_insensitive,
        } => read_field(record, field)
            .is_some_and(|actual| compare_holds(&actual, *op, value, *case_insensitive)),
        Expression::Between { field, low, high } => read_field(record, field).is_some_and(|v| {
            matches!(
                v.compare(low, false),
                Some(Ordering::Greater | Ordering::Equal)
            ) && matches!(v.compare(high, false), Some(Ordering::Less | Ordering::Equal))
        }),
        Expression::In {
            field,
            values,
            case_insensitive,
        } => read_field(record, field)
            .is_some_and(|v| values.iter().any(|c| v.equals(c, *case_insensitive))),
        Expression::NotIn {
            field,
            values,
            case_insensitive,
        } => read_field(record, field)
            .is_some_and(|v| !values.iter().any(|c| v.equals(c, *case_insensitive))),
        Expression::Like {
            field,
            pattern,
            case_insensitive,
        } => read_field(record, field)
            .as_ref()
            .and_then(FieldValue::as_text)
            .is_some_and(|text| like(text, pattern, *case_insensitive)),
        Expression::NotLike {
            field,
            pattern,
            case_insensitive,
        } => read_field(record, field)
            .as_ref()
            .and_then(FieldValue::as_text)
            .is_some_and(|text| !like(text, pattern, *case_insensitive)),
        Expression::And(left, right) => {
            eval_expression(left, record) && eval_expression(right, record)
        }
        Expression::Or(left, right) => {
            eval_expression(left, record) || eval_expression(right, record)
        }
        Expression::Not(inner) => !eval_expression(inner, record),
    }
}

fn compare_holds(actual: &FieldValue, op: CompareOp, expected: &FieldValue, ci: bool) -> bool {
    let ordering = actual.compare(expected, ci);
    match op {
        CompareOp::Equal => ordering == Some(Ordering::Equal),
        CompareOp::NotEqual => ordering != Some(Ordering::Equal),
        CompareOp::GreaterThan => ordering == Some(Ordering::Greater),
        CompareOp::GreaterOrEqual => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        CompareOp::LessThan => ordering == Some(Ordering::Less),
        CompareOp::LessOrEqual => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
    }
}

/// SQL `LIKE`: `%` matches any run of characters, `_` exactly one.
pub fn like(text: &str, pattern: &str, case_insensitive: bool) -> bool {
    let fold = |s: &str| -> Vec<char> {
        if case_insensitive {
            s.to_lowercase().chars().collect()
        } else {
            s.chars().collect()
        }
    };
    let text = fold(text);
    let pattern = fold(pattern);

    let (mut t, mut p) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;
    while t < text.len() {
        match pattern.get(p) {
            Some('%') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some('_') => {
                t += 1;
                p += 1;
            }
            Some(c) if *c == text[t] => {
                t += 1;
                p += 1;
            }
            _ => match backtrack {
                Some((star, resume)) => {
                    p = star + 1;
                    t = resume + 1;
                    backtrack = Some((star, resume + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|c| *c == '%')
}

/// Total order over records for `sort`. Nulls sort first, then booleans,
/// numbers and text (see [`FieldValue::sort_cmp`]).
pub fn compare_records(sort: &Sort, a: &StoredRecord, b: &StoredRecord) -> Ordering {
    for column in &sort.columns {
        let ordering = match &column.key {
            SortKey::RecordedAt => a.recorded_at.cmp(&b.recorded_at),
            SortKey::ConsumedAt => a.consumed_at.cmp(&b.consumed_at),
            SortKey::Reference => a.reference.cmp(&b.reference),
            SortKey::Field(path) => {
                let left = a.field(path).and_then(FieldValue::from_json);
                let right = b.field(path).and_then(FieldValue::from_json);
                match (left, right) {
                    (None, None) => Ordering::Equal,
                    (None, Some(_)) => Ordering::Less,
                    (Some(_), None) => Ordering::Greater,
                    (Some(l), Some(r)) => l.sort_cmp(&r),
                }
            }
        };
        let ordering = match column.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

use crate::error::ProjectionError;
use crate::expression::{CompareOp, Expression};
use crate::field::Field;
use crate::predicate::Predicate;
use crate::value::FieldValue;

/// Compile a predicate bound to `field` into a backend-neutral expression.
///
/// - `EqualTo(None)` is "field is null"; `NotEqualTo(None)` is "field is not null".
/// - `NotEqualTo(Some(v))` also matches records where the field is null.
/// - Ordering operators and `Between` fail on a null operand.
/// - Set and pattern operators fail if any element projects to null.
pub fn compile<V>(predicate: &Predicate<V>, field: &Field<V>) -> Result<Expression, ProjectionError> {
    let path = field.path().clone();
    let operator = predicate.operator_name();

    let required = |operand: &Option<V>| -> Result<FieldValue, ProjectionError> {
        operand
            .as_ref()
            .and_then(|v| field.project(v))
            .ok_or_else(|| ProjectionError::NullOperand {
                field: path.to_string(),
                operator,
            })
    };

    let elements = |values: &[V]| -> Result<Vec<FieldValue>, ProjectionError> {
        values
            .iter()
            .enumerate()
            .map(|(index, v)| {
                field.project(v).ok_or_else(|| ProjectionError::NullElement {
                    field: path.to_string(),
                    operator,
                    index,
                })
            })
            .collect()
    };

    let text_pattern = |pattern: &V| -> Result<String, ProjectionError> {
        match field.project(pattern) {
            Some(FieldValue::Text(text)) => Ok(text),
            Some(_) => Err(ProjectionError::NonTextPattern {
                field: path.to_string(),
                operator,
            }),
            None => Err(ProjectionError::NullElement {
                field: path.to_string(),
                operator,
                index: 0,
            }),
        }
    };

    let compare = |op: CompareOp, value: FieldValue, case_insensitive: bool| Expression::Compare {
        field: path.clone(),
        op,
        value,
        case_insensitive,
    };

    let expression = match predicate {
        Predicate::EqualTo {
            value,
            case_insensitive,
        } => match value.as_ref().and_then(|v| field.project(v)) {
            None => Expression::IsNull(path.clone()),
            Some(projected) => compare(CompareOp::Equal, projected, *case_insensitive),
        },
        Predicate::NotEqualTo {
            value,
            case_insensitive,
        } => match value.as_ref().and_then(|v| field.project(v)) {
            None => Expression::NotNull(path.clone()),
            Some(projected) => compare(CompareOp::NotEqual, projected, *case_insensitive)
                .or(Expression::IsNull(path.clone())),
        },
        Predicate::GreaterThan(value) => compare(CompareOp::GreaterThan, required(value)?, false),
        Predicate::GreaterOrEqual(value) => {
            compare(CompareOp::GreaterOrEqual, required(value)?, false)
        }
        Predicate::LessThan(value) => compare(CompareOp::LessThan, required(value)?, false),
        Predicate::LessOrEqual(value) => compare(CompareOp::LessOrEqual, required(value)?, false),
        Predicate::Between(low, high) => Expression::Between {
            field: path.clone(),
            low: required(low)?,
            high: required(high)?,
        },
        Predicate::Within {
            values,
            case_insensitive,
        } => Expression::In {
            field: path.clone(),
            values: elements(values)?,
            case_insensitive: *case_insensitive,
        },
        Predicate::NotWithin {
            values,
            case_insensitive,
        } => Expression::NotIn {
            field: path.clone(),
            values: elements(values)?,
            case_insensitive: *case_insensitive,
        },
        Predicate::Like {
            pattern,
            case_insensitive,
        } => Expression::Like {
            field: path.clone(),
            pattern: text_pattern(pattern)?,
            case_insensitive: *case_insensitive,
        },
        Predicate::NotLike {
            pattern,
            case_insensitive,
        } => Expression::NotLike {
            field: path.clone(),
            pattern: text_pattern(pattern)?,
            case_insensitive: *case_insensitive,
        },
    };

    Ok(expression)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldPath;

    fn amount() -> Field<i64> {
        Field::new("amount")
    }

    fn name() -> Field<String> {
        Field::new("name")
    }

    fn path(p: &str) -> FieldPath {
        FieldPath::Payload(p.into())
    }

    #[test]
    fn equal_to_none_is_null_check() {
        let expr = compile(&Predicate::is_null(), &amount()).unwrap();
        assert_eq!(expr, Expression::IsNull(path("amount")));
    }

    #[test]
    fn equal_to_value_compares() {
        let expr = compile(&Predicate::equal_to(5), &amount()).unwrap();
        assert_eq!(
            expr,
            Expression::Compare {
                field: path("amount"),
                op: CompareOp::Equal,
                value: FieldValue::Int(5),
                case_insensitive: false,
            }
        );
    }

    #[test]
    fn not_equal_to_none_is_not_null_check() {
        let expr = compile(&Predicate::is_not_null(), &amount()).unwrap();
        assert_eq!(expr, Expression::NotNull(path("amount")));
    }

    #[test]
    fn not_equal_to_value_includes_nulls() {
        let expr = compile(&Predicate::not_equal_to(5), &amount()).unwrap();
        let expected = Expression::Compare {
            field: path("amount"),
            op: CompareOp::NotEqual,
            value: FieldValue::Int(5),
            case_insensitive: false,
        }
        .or(Expression::IsNull(path("amount")));
        assert_eq!(expr, expected);
    }

    #[test]
    fn ordering_operators_reject_null() {
        let null_ops: Vec<Predicate<i64>> = vec![
            Predicate::GreaterThan(None),
            Predicate::GreaterOrEqual(None),
            Predicate::LessThan(None),
            Predicate::LessOrEqual(None),
            Predicate::Between(Some(1), None),
            Predicate::Between(None, Some(1)),
        ];
        for predicate in null_ops {
            let error = compile(&predicate, &amount()).unwrap_err();
            assert!(matches!(error, ProjectionError::NullOperand { .. }));
        }
    }

    #[test]
    fn ordering_rejects_operand_whose_projection_is_null() {
        let field: Field<Option<i64>> = Field::new("amount");
        let error = compile(&Predicate::GreaterThan(Some(None)), &field).unwrap_err();
        assert_eq!(
            error,
            ProjectionError::NullOperand {
                field: "amount".into(),
                operator: "GreaterThan",
            }
        );
    }

    #[test]
    fn within_rejects_null_elements() {
        let field: Field<Option<i64>> = Field::new("amount");
        let error = compile(&Predicate::within([Some(1), None, Some(3)]), &field).unwrap_err();
        assert_eq!(
            error,
            ProjectionError::NullElement {
                field: "amount".into(),
                operator: "Within",
                index: 1,
            }
        );
    }

    #[test]
    fn like_requires_text_pattern() {
        let error = compile(
            &Predicate::Like {
                pattern: 3,
                case_insensitive: false,
            },
            &amount(),
        )
        .unwrap_err();
        assert!(matches!(error, ProjectionError::NonTextPattern { .. }));
    }

    #[test]
    fn case_insensitivity_is_carried() {
        let expr = compile(&Predicate::like_ignoring_case("al%"), &name()).unwrap();
        assert_eq!(
            expr,
            Expression::Like {
                field: path("name"),
                pattern: "al%".into(),
                case_insensitive: true,
            }
        );
    }

    #[test]
    fn between_projects_both_bounds() {
        let expr = amount().matches(&Predicate::between(2, 3)).unwrap();
        assert_eq!(
            expr,
            Expression::Between {
                field: path("amount"),
                low: FieldValue::Int(2),
                high: FieldValue::Int(3),
            }
        );
    }
}

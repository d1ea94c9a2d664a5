use std::convert::TryFrom;

use minijinja::value::{Value, ValueKind};
use minijinja::Error;

use crate::error::FilterError;

/// Upper bound on the bytes of a repeated string or the items of a repeated sequence.
const MAX_REPEATED_LEN: usize = 100_000_000;

fn arithmetic(operation: &'static str, left: &Value, right: &Value) -> FilterError {
    FilterError::Arithmetic {
        operation,
        left: format!("{:?}", left),
        right: format!("{:?}", right),
    }
}

fn float(value: &Value) -> Option<f64> {
    match value.kind() {
        ValueKind::Number | ValueKind::Bool => f64::try_from(value.clone()).ok(),
        _ => None,
    }
}

/// Numeric product. A string or sequence multiplied by an integer is repeated, up to
/// 100,000,000 bytes or items.
pub fn multiply(value: Value, times: Value) -> Result<Value, Error> {
    match value.kind() {
        ValueKind::String | ValueKind::Seq => {
            let count = times
                .as_i64()
                .ok_or_else(|| arithmetic("multiply", &value, &times))?
                .max(0);
            let count = usize::try_from(count).unwrap_or(usize::MAX);
            let repeated_len = |len: usize| match len.checked_mul(count) {
                Some(total) if total <= MAX_REPEATED_LEN => Ok(total),
                _ => Err(arithmetic("multiply", &value, &times)),
            };
            if let Some(text) = value.as_str() {
                repeated_len(text.len())?;
                return Ok(Value::from(text.repeat(count)));
            }
            let items = value.try_iter()?.collect::<Vec<_>>();
            if items.is_empty() {
                return Ok(Value::from(items));
            }
            let mut repeated = Vec::with_capacity(repeated_len(items.len())?);
            for _ in 0..count {
                repeated.extend(items.iter().cloned());
            }
            Ok(Value::from(repeated))
        }
        _ => {
            if let (Some(left), Some(right)) = (value.as_i64(), times.as_i64()) {
                if let Some(product) = left.checked_mul(right) {
                    return Ok(Value::from(product));
                }
            }
            match (float(&value), float(&times)) {
                (Some(left), Some(right)) => Ok(Value::from(left * right)),
                _ => Err(arithmetic("multiply", &value, &times).into()),
            }
        }
    }
}

/// True division; the result is always a float.
pub fn divide(value: Value, divisor: Value) -> Result<Value, Error> {
    match (float(&value), float(&divisor)) {
        (Some(_), Some(right)) if right == 0.0 => Err(FilterError::DivisionByZero.into()),
        (Some(left), Some(right)) => Ok(Value::from(left / right)),
        _ => Err(arithmetic("divide", &value, &divisor).into()),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use minijinja::context;
    use pretty_assertions::assert_eq;

    use crate::filters::test_support::{render, render_err};

    #[test]
    fn multiplies_numbers() {
        assert_eq!(
            render("{{ myval|multiply(1024) }}", context! { myval => 50 }),
            "51200"
        );
        assert_eq!(
            render("{{ myval|multiply(2) }}", context! { myval => 1.25 }),
            "2.5"
        );
    }

    #[test]
    fn multiplies_strings_and_lists() {
        assert_eq!(
            render("{{ mystr|multiply(8) }}", context! { mystr => "*" }),
            "********"
        );
        assert_eq!(
            render(
                "{{ items|multiply(2)|join(',') }}",
                context! { items => vec![1, 2] }
            ),
            "1,2,1,2"
        );
        assert_eq!(
            render("[{{ mystr|multiply(-1) }}]", context! { mystr => "ab" }),
            "[]"
        );
    }

    #[test]
    fn refuses_oversized_repetition() {
        let err = render_err("{{ 'x'|multiply(1000000000000000000) }}", context! {});
        assert_eq!(err.kind(), minijinja::ErrorKind::InvalidOperation);
        assert!(err.to_string().contains("cannot multiply"));

        let err = render_err(
            "{{ items|multiply(9223372036854775807) }}",
            context! { items => vec![1, 2] },
        );
        assert_eq!(err.kind(), minijinja::ErrorKind::InvalidOperation);

        assert_eq!(
            render("{{ ''|multiply(1000000000000000000) }}", context! {}),
            ""
        );
    }

    #[test]
    fn rejects_bad_operands() {
        let err = render_err("{{ 'a'|multiply('b') }}", context! {});
        assert_eq!(err.kind(), minijinja::ErrorKind::InvalidOperation);
        assert!(multiply(Value::from(()), Value::from(2)).is_err());
    }

    #[test]
    fn divides() {
        assert_eq!(
            render("{{ myval|divide(2) }}", context! { myval => 50 }),
            "25.0"
        );
        assert_eq!(
            render("{{ (myval|divide(3)) | round(2) }}", context! { myval => 100 }),
            "33.33"
        );
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let err = render_err("{{ 1|divide(0) }}", context! {});
        assert_eq!(err.kind(), minijinja::ErrorKind::InvalidOperation);
        assert!(err.to_string().contains("division by zero"));
    }
}

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime};
use minijinja::value::Value;
use minijinja::Error;

use crate::error::FilterError;

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// Reads a template value as a date: ISO date or datetime text, RFC 3339, or unix seconds.
fn to_datetime(value: &Value) -> Result<NaiveDateTime, FilterError> {
    if let Some(text) = value.as_str() {
        let text = text.trim();
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
                return Ok(midnight);
            }
        }
        for format in DATETIME_FORMATS {
            if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
                return Ok(datetime);
            }
        }
        if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
            return Ok(datetime.naive_local());
        }
    } else if let Some(seconds) = value.as_i64() {
        if let Some(datetime) = DateTime::from_timestamp(seconds, 0) {
            return Ok(datetime.naive_utc());
        }
    }
    Err(FilterError::Date(value.to_string()))
}

fn reference_or_now(reference: Option<Value>) -> Result<NaiveDateTime, FilterError> {
    match reference {
        Some(reference) => to_datetime(&reference),
        None => Ok(Local::now().naive_local()),
    }
}

/// Whole years from `birth` to `reference` (today when omitted).
pub fn age(birth: Value, reference: Option<Value>) -> Result<i64, Error> {
    let birth = to_datetime(&birth)?;
    let reference = reference_or_now(reference)?;
    let before_birthday = (reference.month(), reference.day()) < (birth.month(), birth.day());
    Ok(i64::from(reference.year() - birth.year()) - i64::from(before_birthday))
}

/// Rough English distance between two dates, in the coarsest unit that fits. Partial days are
/// dropped in either direction.
pub fn deltaday_human_simple(t1: Value, t2: Option<Value>) -> Result<String, Error> {
    let start = to_datetime(&t1)?;
    let end = reference_or_now(t2)?;
    let days = (end - start).num_days().abs();
    Ok(humanize_days(days))
}

fn humanize_days(days: i64) -> String {
    match days {
        0 => "today".to_string(),
        1 => "one day".to_string(),
        2..=6 => format!("{} days", days),
        7..=13 => "one week".to_string(),
        14..=29 => format!("{} weeks", days / 7),
        30..=59 => "one month".to_string(),
        60..=364 => format!("{} months", days / 30),
        365..=729 => "one year".to_string(),
        _ => format!("{} years", (days as f64 / 365.25) as i64),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use minijinja::context;
    use pretty_assertions::assert_eq;

    use crate::filters::test_support::{render, render_err};

    #[test]
    fn age_in_years() {
        assert_eq!(
            render(
                "{{ user_birthdate|age(mytoday) }} years old",
                context! { user_birthdate => "2006-11-09", mytoday => "2018-01-21" }
            ),
            "11 years old"
        );
        assert_eq!(
            age(Value::from("2000-01-21"), Some(Value::from("2018-01-21"))).unwrap(),
            18
        );
        assert_eq!(
            age(Value::from("2000-01-22"), Some(Value::from("2018-01-21T23:59:59"))).unwrap(),
            17
        );
    }

    #[test]
    fn age_defaults_to_today() {
        let years = age(Value::from("1970-01-01"), None).unwrap();
        assert!(years >= 56);
    }

    #[test]
    fn reads_several_date_shapes() {
        let expected = NaiveDate::from_ymd_opt(2018, 1, 21)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(to_datetime(&Value::from("2018-01-21 10:30")).unwrap(), expected);
        assert_eq!(
            to_datetime(&Value::from("2018-01-21T10:30:00+00:00")).unwrap(),
            expected
        );
        assert_eq!(to_datetime(&Value::from(1_516_530_600)).unwrap(), expected);
    }

    #[test]
    fn rejects_unreadable_dates() {
        let err = render_err("{{ 'soon'|age }}", context! {});
        assert_eq!(err.kind(), minijinja::ErrorKind::InvalidOperation);
        assert!(to_datetime(&Value::from(vec![1, 2])).is_err());
    }

    #[test]
    fn buckets_day_distances() {
        let cases = [
            (0, "today"),
            (1, "one day"),
            (5, "5 days"),
            (7, "one week"),
            (20, "2 weeks"),
            (45, "one month"),
            (200, "6 months"),
            (400, "one year"),
            (83_568, "228 years"),
        ];
        for &(days, expected) in cases.iter() {
            assert_eq!(humanize_days(days), expected, "{} days", days);
        }
    }

    #[test]
    fn deltaday_between_two_dates() {
        assert_eq!(
            render(
                "{{ t1|deltaday_human_simple(t2) }}",
                context! { t1 => "2018-01-01", t2 => "2018-01-21 12:00" }
            ),
            "2 weeks"
        );
        assert_eq!(
            deltaday_human_simple(Value::from("2018-01-21"), Some(Value::from("2018-01-01")))
                .unwrap(),
            "2 weeks"
        );
        assert_eq!(
            deltaday_human_simple(
                Value::from("2018-01-21 08:00"),
                Some(Value::from("2018-01-21 20:00"))
            )
            .unwrap(),
            "today"
        );
    }

    #[test]
    fn partial_days_count_the_same_both_ways() {
        let distance = |t1: &str, t2: &str| {
            deltaday_human_simple(Value::from(t1), Some(Value::from(t2))).unwrap()
        };
        assert_eq!(distance("2018-01-21 10:00:01", "2018-01-21 10:00"), "today");
        assert_eq!(distance("2018-01-21 10:00", "2018-01-21 10:00:01"), "today");
        assert_eq!(distance("2018-01-22 22:00", "2018-01-21 10:00"), "one day");
        assert_eq!(distance("2018-01-21 10:00", "2018-01-22 22:00"), "one day");
    }
}

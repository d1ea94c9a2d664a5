use minijinja::value::Value;
use minijinja::Error;

use crate::config::settings;
use crate::error::FilterError;

/// Picks a css class for `value` from its length, using the `size_css_bisect` table `name`:
///
/// ```jinja
/// <h2 class="{{ size_to_css(topic.title, 'TITLE_SIZE_CSS_BISECT') }}">{{ topic.title }}</h2>
/// ```
pub fn size_to_css(value: Value, name: String) -> Result<String, Error> {
    let len = value
        .len()
        .ok_or_else(|| FilterError::NoLength(value.to_string()))?;

    let settings = settings::current();
    let bisect = settings
        .size_css_bisect
        .get(&name)
        .ok_or_else(|| FilterError::UnknownBisect(name.clone()))?;
    if !bisect.is_well_formed() {
        return Err(FilterError::MalformedBisect(name).into());
    }
    match bisect.css_for(len) {
        Some(css) => Ok(css.to_string()),
        None => Err(FilterError::MalformedBisect(name).into()),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use maplit::hashmap;
    use minijinja::context;
    use pretty_assertions::assert_eq;

    use crate::config::settings::{install, lock_for_test};
    use crate::config::{Settings, SizeCssBisect};
    use crate::filters::test_support::{render, render_err};

    fn with_bisects<T>(run: impl FnOnce() -> T) -> T {
        let _guard = lock_for_test();
        let mut custom = Settings::default();
        custom.size_css_bisect = hashmap! {
            "TITLE_SIZE_CSS_BISECT".to_string() => SizeCssBisect {
                css: vec!["ts-big".into(), "ts-normal".into(), "ts-medium".into(), "ts-small".into()],
                size: vec![30, 50, 70],
            },
            "BROKEN".to_string() => SizeCssBisect {
                css: vec!["only".into()],
                size: vec![10],
            },
        };
        let previous = install(custom);
        let result = run();
        install((*previous).clone());
        result
    }

    #[test]
    fn buckets_string_length() {
        let (thirty, sixty_nine, seventy) = ("x".repeat(30), "x".repeat(69), "x".repeat(70));
        let output = with_bisects(|| {
            ["short", thirty.as_str(), sixty_nine.as_str(), seventy.as_str()]
                .iter()
                .map(|title| {
                    render(
                        "{{ size_to_css(title, 'TITLE_SIZE_CSS_BISECT') }}",
                        context! { title => title },
                    )
                })
                .collect::<Vec<_>>()
        });
        assert_eq!(output, vec!["ts-big", "ts-normal", "ts-medium", "ts-small"]);
    }

    #[test]
    fn counts_sequence_items() {
        let css = with_bisects(|| {
            size_to_css(Value::from(vec![0; 40]), "TITLE_SIZE_CSS_BISECT".into()).unwrap()
        });
        assert_eq!(css, "ts-normal");
    }

    #[test]
    fn reports_bad_tables_and_values() {
        let (unknown, broken, no_len) = with_bisects(|| {
            (
                render_err("{{ size_to_css('x', 'NOPE') }}", context! {}),
                render_err("{{ size_to_css('x', 'BROKEN') }}", context! {}),
                render_err("{{ size_to_css(42, 'TITLE_SIZE_CSS_BISECT') }}", context! {}),
            )
        });
        assert!(unknown.to_string().contains("no size_css_bisect table named \"NOPE\""));
        assert!(broken.to_string().contains("exactly one more css entry"));
        assert!(no_len.to_string().contains("42 has no length"));
    }
}

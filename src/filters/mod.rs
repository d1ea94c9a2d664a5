//! Template filters. [`register`] adds all of them to a minijinja environment.

mod collections;
mod dates;
mod html;
mod json;
mod numbers;
mod strings;

use minijinja::Environment;

pub use self::html::{sanitize_markup, sanitize_markup_with};

pub fn register(env: &mut Environment<'_>) {
    env.add_filter("basename", strings::basename);
    env.add_filter("dirname", strings::dirname);
    env.add_filter("replace_sep", strings::replace_sep);
    env.add_filter("resub", strings::resub);
    env.add_filter("truncat", strings::truncat);

    env.add_filter("multiply", numbers::multiply);
    env.add_filter("divide", numbers::divide);

    env.add_filter("age", dates::age);
    env.add_filter("deltaday_human_simple", dates::deltaday_human_simple);

    env.add_filter("get_key", collections::get_key);
    env.add_filter("listsort", collections::listsort);
    env.add_filter("listsortreversed", collections::listsortreversed);

    env.add_filter("from_json", json::from_json);

    env.add_filter("nl2br", html::nl2br);
    env.add_filter("nbsp", html::nbsp);
    env.add_filter("sanitizetags", html::sanitizetags);
    env.add_filter("sanitize", html::sanitize);
    env.add_filter("sanitize_simple_html", html::sanitize_simple_html);
}

#[cfg(test)]
pub(crate) mod test_support {
    use minijinja::{Environment, Value};

    pub fn environment() -> Environment<'static> {
        let mut env = Environment::new();
        crate::register(&mut env);
        env
    }

    pub fn render(template: &str, ctx: Value) -> String {
        environment().render_str(template, ctx).unwrap()
    }

    pub fn render_err(template: &str, ctx: Value) -> minijinja::Error {
        environment().render_str(template, ctx).unwrap_err()
    }
}

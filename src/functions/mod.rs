//! Global template functions. [`register`] adds all of them to a minijinja environment.

mod query;
mod render;
mod size_css;

use minijinja::Environment;

pub use self::query::{extend_url, update_url};
pub use self::render::render_template;
pub use self::size_css::size_to_css;

pub fn register(env: &mut Environment<'_>) {
    env.add_function("update_url", query::update_url);
    env.add_function("extend_url", query::extend_url);
    env.add_function("render_template", render::render_template);
    env.add_function("reparse", render::render_template);
    env.add_function("size_to_css", size_css::size_to_css);
}

use std::collections::BTreeMap;

use minijinja::value::{Kwargs, Value};
use minijinja::{Error, State};

/// Renders `source` as a template in the calling environment. The outer template's variables
/// stay visible; keyword arguments are layered on top of them.
///
/// ```jinja
/// {{ render_template(mytemplate) }}
/// {{ render_template("Hello {{ name }}", name=user.first_name) }}
/// ```
pub fn render_template(state: &State, source: String, kwargs: Kwargs) -> Result<Value, Error> {
    let mut ctx = BTreeMap::new();
    for name in state.known_variables() {
        if let Some(value) = state.lookup(&name) {
            ctx.insert(name.to_string(), value);
        }
    }

    let keys = kwargs.args().map(str::to_string).collect::<Vec<_>>();
    for key in keys {
        let value = kwargs.get::<Value>(&key)?;
        ctx.insert(key, value);
    }

    // Compiled under the caller's name so the environment picks the same auto escape mode.
    let rendered = state.env().render_named_str(state.name(), &source, ctx)?;
    Ok(if matches!(state.auto_escape(), minijinja::AutoEscape::None) {
        Value::from(rendered)
    } else {
        Value::from_safe_string(rendered)
    })
}

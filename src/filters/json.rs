use minijinja::value::Value;
use minijinja::Error;

use crate::error::FilterError;

/// Parses JSON text into a template value:
///
/// ```jinja
/// {% set people %}[{"name": "Ada"}, {"name": "Alan"}]{% endset %}
/// {% for person in people|from_json %}{{ person.name }}{% endfor %}
/// ```
pub fn from_json(source: String) -> Result<Value, Error> {
    let parsed: serde_json::Value = serde_json::from_str(&source).map_err(FilterError::from)?;
    Ok(Value::from_serialize(&parsed))
}

use minijinja::value::Value;
use minijinja::Error;

const DEFAULT_INDEX: &str = "default_index";

fn lookup(value: &Value, segment: &str) -> Option<Value> {
    let found = |key: Value| value.get_item(&key).ok().filter(|found| !found.is_undefined());
    found(Value::from(segment)).or_else(|| {
        let index = segment.parse::<i64>().ok()?;
        found(Value::from(index))
    })
}

/// Looks `key` up in `object`, where `key` may be a dotted path like `user.emails.0`.
///
/// ```jinja
/// Country: {{ countries|get_key(country) }}
/// ```
///
/// A missing key falls back to `object.default_index`, then to none.
pub fn get_key(object: Value, key: Value) -> Value {
    let path = key.to_string();
    let resolved = path
        .split('.')
        .try_fold(object.clone(), |current, segment| lookup(&current, segment));
    resolved
        .or_else(|| lookup(&object, DEFAULT_INDEX))
        .unwrap_or_else(|| Value::from(()))
}

fn sorted(lst: Value, col: Option<Value>) -> Result<Vec<Value>, Error> {
    if lst.is_undefined() || lst.is_none() || !lst.is_true() {
        return Ok(Vec::new());
    }
    let mut items = lst.try_iter()?.collect::<Vec<_>>();
    match col.and_then(|col| col.as_i64()).filter(|&col| col != 0) {
        Some(col) => {
            let column = Value::from(col);
            let mut keyed = items
                .into_iter()
                .map(|item| (item.get_item(&column).unwrap_or_default(), item))
                .collect::<Vec<_>>();
            keyed.sort_by(|a, b| a.0.cmp(&b.0));
            Ok(keyed.into_iter().map(|(_, item)| item).collect())
        }
        None => {
            items.sort();
            Ok(items)
        }
    }
}

/// Sorts a sequence, or a sequence of rows by column `col`.
pub fn listsort(lst: Value, col: Option<Value>) -> Result<Value, Error> {
    Ok(Value::from(sorted(lst, col)?))
}

pub fn listsortreversed(lst: Value, col: Option<Value>) -> Result<Value, Error> {
    let mut items = sorted(lst, col)?;
    items.reverse();
    Ok(Value::from(items))
}

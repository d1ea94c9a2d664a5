use minijinja::value::{Kwargs, Value, ValueKind};
use minijinja::Error;
use url::form_urlencoded;

/// Query parameters in first-seen key order, each key holding all of its values.
#[derive(Debug, Default, PartialEq)]
struct QueryParams {
    pairs: Vec<(String, Vec<String>)>,
}

impl QueryParams {
    fn parse(query: &str) -> QueryParams {
        let mut params = QueryParams::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            params.values_mut(&key).push(value.into_owned());
        }
        params
    }

    fn values_mut(&mut self, key: &str) -> &mut Vec<String> {
        let index = match self.pairs.iter().position(|(existing, _)| existing == key) {
            Some(index) => index,
            None => {
                self.pairs.push((key.to_string(), Vec::new()));
                self.pairs.len() - 1
            }
        };
        &mut self.pairs[index].1
    }

    fn remove(&mut self, key: &str) {
        self.pairs.retain(|(existing, _)| existing != key);
    }

    fn set(&mut self, key: &str, values: Vec<String>) {
        if values.is_empty() {
            self.remove(key);
        } else {
            *self.values_mut(key) = values;
        }
    }

    fn extend(&mut self, key: &str, values: Vec<String>) {
        let existing = self.values_mut(key);
        for value in values {
            if !existing.contains(&value) {
                existing.push(value);
            }
        }
        if existing.is_empty() {
            self.remove(key);
        }
    }

    fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, values) in self.pairs.iter() {
            for value in values {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }
}

/// A url split around its query; `base` keeps the scheme, authority and path untouched so
/// relative urls work too.
struct SplitUrl<'a> {
    base: &'a str,
    query: &'a str,
    fragment: &'a str,
}

impl<'a> SplitUrl<'a> {
    fn new(url: &'a str) -> SplitUrl<'a> {
        let (rest, fragment) = match url.find('#') {
            Some(index) => (&url[..index], &url[index + 1..]),
            None => (url, ""),
        };
        let (base, query) = match rest.find('?') {
            Some(index) => (&rest[..index], &rest[index + 1..]),
            None => (rest, ""),
        };
        SplitUrl {
            base,
            query,
            fragment,
        }
    }

    fn join(&self, query: &str) -> String {
        let mut url = self.base.to_string();
        if !query.is_empty() {
            url.push('?');
            url.push_str(query);
        }
        if !self.fragment.is_empty() {
            url.push('#');
            url.push_str(self.fragment);
        }
        url
    }
}

/// `None` when the parameter should be deleted.
fn parameter_values(value: &Value) -> Result<Option<Vec<String>>, Error> {
    match value.kind() {
        ValueKind::Undefined | ValueKind::None => Ok(None),
        ValueKind::Seq => Ok(Some(value.try_iter()?.map(|item| item.to_string()).collect())),
        _ => Ok(Some(vec![value.to_string()])),
    }
}

fn rewrite_query(
    url: &str,
    kwargs: &Kwargs,
    apply: fn(&mut QueryParams, &str, Vec<String>),
) -> Result<String, Error> {
    let split = SplitUrl::new(url);
    let mut params = QueryParams::parse(split.query);

    let keys = kwargs.args().map(str::to_string).collect::<Vec<_>>();
    for key in keys.iter() {
        let value = kwargs.get::<Value>(key)?;
        match parameter_values(&value)? {
            Some(values) => apply(&mut params, key, values),
            None => params.remove(key),
        }
    }
    Ok(split.join(&params.encode()))
}

/// `{{ update_url(request_url, page=2, sort=none) }}` replaces each named parameter's values;
/// `none` removes the parameter.
pub fn update_url(url: String, kwargs: Kwargs) -> Result<String, Error> {
    rewrite_query(&url, &kwargs, QueryParams::set)
}

/// Like [`update_url`] but appends to a parameter's existing values, skipping duplicates.
pub fn extend_url(url: String, kwargs: Kwargs) -> Result<String, Error> {
    rewrite_query(&url, &kwargs, QueryParams::extend)
}

#[cfg(test)]
mod test {
    use super::*;

    use minijinja::context;
    use pretty_assertions::assert_eq;

    use crate::filters::test_support::render;

    #[test]
    fn parses_repeated_keys_in_order() {
        let params = QueryParams::parse("b=1&a=x+y&b=2&c=%26");
        assert_eq!(
            params.pairs,
            vec![
                ("b".to_string(), vec!["1".to_string(), "2".to_string()]),
                ("a".to_string(), vec!["x y".to_string()]),
                ("c".to_string(), vec!["&".to_string()]),
            ]
        );
        assert_eq!(params.encode(), "b=1&b=2&a=x+y&c=%26");
    }

    #[test]
    fn splits_relative_and_absolute_urls() {
        let split = SplitUrl::new("/search?q=rust#results");
        assert_eq!((split.base, split.query, split.fragment), ("/search", "q=rust", "results"));
        assert_eq!(split.join(""), "/search#results");

        let split = SplitUrl::new("https://example.com/a#frag?not-a-query");
        assert_eq!(split.base, "https://example.com/a");
        assert_eq!(split.query, "");
        assert_eq!(split.fragment, "frag?not-a-query");
    }

    #[test]
    fn update_url_replaces_values_in_place() {
        assert_eq!(
            render(
                "{{ update_url(url, page=3) }}",
                context! { url => "/list?page=1&sort=name#top" }
            ),
            "/list?page=3&sort=name#top"
        );
        assert_eq!(
            render(
                "{{ update_url(url, tag=['a b', 'c']) }}",
                context! { url => "/list?tag=x&page=1" }
            ),
            "/list?tag=a+b&tag=c&page=1"
        );
    }

    #[test]
    fn update_url_appends_new_keys_and_deletes_none() {
        assert_eq!(
            render("{{ update_url('/list', page=2) }}", context! {}),
            "/list?page=2"
        );
        assert_eq!(
            render("{{ update_url('/list?page=2', page=none) }}", context! {}),
            "/list"
        );
        assert_eq!(
            render("{{ update_url('/list?page=2&q=x', page=[]) }}", context! {}),
            "/list?q=x"
        );
    }

    #[test]
    fn extend_url_merges_without_duplicates() {
        assert_eq!(
            render(
                "{{ extend_url('/list?tag=a', tag=['a', 'b']) }}",
                context! {}
            ),
            "/list?tag=a&tag=b"
        );
        assert_eq!(
            render("{{ extend_url('/list?tag=a&q=1', tag=none) }}", context! {}),
            "/list?q=1"
        );
        assert_eq!(
            render("{{ extend_url('/list', q=1) }}", context! {}),
            "/list?q=1"
        );
    }
}

use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::str::FromStr;

use html5ever::LocalName;

/// Tags a sanitized fragment may keep, and for each tag the attributes it may keep.
///
/// Built from a spec string of whitespace separated `tag:attr1:attr2` tokens. Tag names are
/// lowercased; attribute names are kept exactly as written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllowList {
    attributes_per_element: HashMap<LocalName, HashSet<LocalName>>,
}

impl AllowList {
    pub fn parse(spec: &str) -> AllowList {
        let mut attributes_per_element = HashMap::new();
        for token in spec.split_whitespace() {
            let mut parts = token.split(':');
            let tag = match parts.next() {
                Some(tag) if !tag.is_empty() => LocalName::from(tag.to_lowercase()),
                _ => continue,
            };
            let attributes = parts
                .filter(|part| !part.is_empty())
                .map(LocalName::from)
                .collect::<HashSet<_>>();
            attributes_per_element.insert(tag, attributes);
        }
        AllowList {
            attributes_per_element,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.attributes_per_element.is_empty()
    }

    /// Looks up `tag` case-insensitively.
    pub fn allows_element(&self, tag: &LocalName) -> bool {
        self.attributes_for(tag).is_some()
    }

    pub fn allows_attribute(&self, tag: &LocalName, attribute: &LocalName) -> bool {
        self.attributes_for(tag)
            .map_or(false, |attributes| attributes.contains(attribute))
    }

    pub fn attributes_for(&self, tag: &LocalName) -> Option<&HashSet<LocalName>> {
        if tag.bytes().any(|b| b.is_ascii_uppercase()) {
            self.attributes_per_element
                .get(&LocalName::from(tag.to_ascii_lowercase()))
        } else {
            self.attributes_per_element.get(tag)
        }
    }

    pub fn elements(&self) -> impl Iterator<Item = &LocalName> {
        self.attributes_per_element.keys()
    }
}

impl FromStr for AllowList {
    type Err = Infallible;

    fn from_str(spec: &str) -> Result<AllowList, Infallible> {
        Ok(AllowList::parse(spec))
    }
}

impl From<HashMap<LocalName, HashSet<LocalName>>> for AllowList {
    fn from(attributes_per_element: HashMap<LocalName, HashSet<LocalName>>) -> AllowList {
        AllowList {
            attributes_per_element,
        }
    }
}

use std::cell::RefCell;
use std::collections::HashSet;

use html5ever::serialize::{serialize, SerializeOpts};
use html5ever::{Attribute, LocalName};
use tracing::{debug, trace};

use crate::arena_dom::{parse_fragment_into_arena, NodeData, Ref};
use crate::config::AllowList;
use crate::error::SanitizeError;
use crate::scheme::is_script_scheme;

pub struct Sanitizer {
    config: SanitizerConfig,
}

#[derive(Debug, Clone, Default)]
pub struct SanitizerConfig {
    pub allow_list: AllowList,
    /// Disallowed elements dropped together with their contents instead of being unwrapped.
    pub remove_contents_when_unwrapped: HashSet<LocalName>,
    /// Fail on the first parse error instead of letting html5ever recover.
    pub strict: bool,
}

impl SanitizerConfig {
    pub fn new(allow_list: AllowList) -> SanitizerConfig {
        SanitizerConfig {
            allow_list,
            ..Default::default()
        }
    }
}

impl Sanitizer {
    pub fn new(config: SanitizerConfig) -> Sanitizer {
        Sanitizer { config }
    }

    /// Sanitizer for an allow spec like `"a:href:name b u"`.
    pub fn from_spec(spec: &str) -> Sanitizer {
        Sanitizer::new(SanitizerConfig::new(AllowList::parse(spec)))
    }

    pub fn config(&self) -> &SanitizerConfig {
        &self.config
    }

    /// Parses `input` as a body fragment, drops comments, unwraps elements missing from the allow
    /// list, strips disallowed and script-scheme attributes, and serializes what is left.
    pub fn sanitize_fragment(&self, input: &str) -> Result<String, SanitizeError> {
        let arena = typed_arena::Arena::new();
        let parsed = parse_fragment_into_arena(input, &arena);

        if self.config.strict {
            if let Some(issue) = parsed.issues.first() {
                return Err(SanitizeError::Parse(issue.clone()));
            }
        }
        for issue in parsed.issues.iter() {
            debug!(line = issue.line, message = %issue.message, "recovered from parse error");
        }

        let root = parsed.fragment_root();
        self.traverse(root);
        unwrap_broken_tables(root);
        unwrap_orphaned_table_parts(root, false);

        let mut output = Vec::new();
        serialize(
            &mut output,
            root,
            SerializeOpts {
                scripting_enabled: false,
                ..Default::default()
            },
        )?;
        Ok(String::from_utf8(output)?)
    }

    fn traverse<'arena>(&self, parent: Ref<'arena>) {
        let mut next = parent.first_child.get();
        while let Some(node) = next {
            next = node.next_sibling.get();

            match node.data {
                NodeData::Text { .. } | NodeData::Document => {}
                NodeData::Comment { .. }
                | NodeData::Doctype { .. }
                | NodeData::ProcessingInstruction { .. } => {
                    trace!(node = %node.data, "removing node");
                    node.detach();
                }
                NodeData::Element {
                    ref name,
                    ref attrs,
                    ..
                } => {
                    if self.config.allow_list.allows_element(&name.local) {
                        self.sanitize_attributes(&name.local, attrs);
                        self.traverse(node);
                    } else if self
                        .config
                        .remove_contents_when_unwrapped
                        .contains(&name.local)
                    {
                        trace!(element = %name.local, "removing element and contents");
                        node.detach();
                    } else {
                        trace!(element = %name.local, "unwrapping element");
                        // Promoted children now sit where the element was; visit them next.
                        if let Some(first_promoted) = node.unwrap() {
                            next = Some(first_promoted);
                        }
                    }
                }
            }
        }
    }

    fn sanitize_attributes(&self, element: &LocalName, attrs: &RefCell<Vec<Attribute>>) {
        let allow_list = &self.config.allow_list;
        attrs.borrow_mut().retain(|attr| {
            if attr.name.ns != ns!() || !allow_list.allows_attribute(element, &attr.name.local) {
                debug!(%element, attribute = %attr.name.local, "stripping attribute");
                return false;
            }
            if is_script_scheme(&attr.value) {
                debug!(%element, attribute = %attr.name.local, "stripping script-scheme attribute");
                return false;
            }
            true
        });
    }
}

fn html_element<'arena>(node: Ref<'arena>) -> Option<&'arena LocalName> {
    match node.data {
        NodeData::Element { ref name, .. } if name.ns == ns!(html) => Some(&name.local),
        _ => None,
    }
}

/// Elements that the HTML parser only places inside a table.
fn is_table_part(name: &LocalName) -> bool {
    matches!(
        *name,
        local_name!("caption")
            | local_name!("colgroup")
            | local_name!("col")
            | local_name!("thead")
            | local_name!("tbody")
            | local_name!("tfoot")
            | local_name!("tr")
            | local_name!("td")
            | local_name!("th")
    )
}

/// Tables, sections, rows and column groups, whose children the parser constrains.
fn has_table_content_model(name: &LocalName) -> bool {
    matches!(
        *name,
        local_name!("table")
            | local_name!("thead")
            | local_name!("tbody")
            | local_name!("tfoot")
            | local_name!("tr")
            | local_name!("colgroup")
    )
}

/// Whether `child` may sit directly in `container` without the parser moving it out again.
fn fits_table_container(container: &LocalName, child: &LocalName) -> bool {
    let table = *container == local_name!("table");
    let colgroup = *container == local_name!("colgroup");
    let row = *container == local_name!("tr");
    match *child {
        local_name!("col") => table || colgroup,
        local_name!("template") => true,
        local_name!("script") | local_name!("style") | local_name!("td") | local_name!("th") => {
            !colgroup
        }
        local_name!("tr") => !(colgroup || row),
        local_name!("caption")
        | local_name!("colgroup")
        | local_name!("thead")
        | local_name!("tbody")
        | local_name!("tfoot") => table,
        _ => false,
    }
}

fn holds_table_content<'arena>(node: Ref<'arena>, container: &LocalName) -> bool {
    node.children().all(|child| match child.data {
        NodeData::Text { ref contents } => contents
            .borrow()
            .chars()
            .all(|c| c.is_ascii_whitespace()),
        NodeData::Element { ref name, .. } => {
            name.ns == ns!(html) && fits_table_container(container, &name.local)
        }
        _ => true,
    })
}

/// Unwraps kept tables, sections, rows and column groups holding text or elements the parser
/// would foster parent out of them. Children are settled before their parent is checked.
fn unwrap_broken_tables<'arena>(parent: Ref<'arena>) {
    let mut next = parent.first_child.get();
    while let Some(node) = next {
        next = node.next_sibling.get();
        unwrap_broken_tables(node);
        if let Some(name) = html_element(node) {
            if has_table_content_model(name) && !holds_table_content(node, name) {
                trace!(element = %name, "unwrapping table element with foster parented content");
                node.unwrap();
            }
        }
    }
}

/// Unwraps table parts that lost their table, since re-parsing them outside one drops the tags.
/// Cell and caption contents start outside any table again.
fn unwrap_orphaned_table_parts<'arena>(parent: Ref<'arena>, in_table: bool) {
    let mut next = parent.first_child.get();
    while let Some(node) = next {
        next = node.next_sibling.get();
        let name = match html_element(node) {
            Some(name) => name,
            None => continue,
        };
        if !in_table && is_table_part(name) {
            trace!(element = %name, "unwrapping table part outside a table");
            if let Some(first_promoted) = node.unwrap() {
                next = Some(first_promoted);
            }
            continue;
        }
        let inside = match *name {
            local_name!("table") => true,
            local_name!("td") | local_name!("th") | local_name!("caption") => false,
            _ => in_table,
        };
        unwrap_orphaned_table_parts(node, inside);
    }
}

// Majority of this file is from the html5ever project.
// https://github.com/servo/html5ever/blob/45b2fca5c6/html5ever/examples/arena.rs
//
// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::io;
use std::ptr;

use html5ever::interface::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::serialize::TraversalScope::{ChildrenOnly, IncludeNode};
use html5ever::serialize::{Serialize, Serializer, TraversalScope};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{parse_fragment, Attribute, ExpandedName, ParseOpts, QualName};

pub type Arena<'arena> = &'arena typed_arena::Arena<Node<'arena>>;

pub type Ref<'arena> = &'arena Node<'arena>;

pub type Link<'arena> = Cell<Option<Ref<'arena>>>;

/// A parse error reported by the tree builder, with the input line it was raised on.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseIssue {
    pub line: u64,
    pub message: Cow<'static, str>,
}

/// Result of parsing a fragment: the document node plus every recovered parse error.
pub struct Parsed<'arena> {
    pub document: Ref<'arena>,
    pub issues: Vec<ParseIssue>,
}

impl<'arena> Parsed<'arena> {
    /// The element html5ever wraps fragment content in. Its children are the fragment.
    pub fn fragment_root(&self) -> Ref<'arena> {
        self.document.first_child.get().unwrap_or(self.document)
    }
}

pub struct Sink<'arena> {
    pub arena: Arena<'arena>,
    pub document: Ref<'arena>,
    pub quirks_mode: QuirksMode,
    pub current_line: u64,
    pub issues: Vec<ParseIssue>,
}

#[derive(Debug)]
pub struct Node<'arena> {
    pub parent: Link<'arena>,
    pub next_sibling: Link<'arena>,
    pub previous_sibling: Link<'arena>,
    pub first_child: Link<'arena>,
    pub last_child: Link<'arena>,
    pub data: NodeData,
}

#[derive(Debug)]
pub enum NodeData {
    Document,
    Doctype {
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    },
    Text {
        contents: RefCell<StrTendril>,
    },
    Comment {
        contents: StrTendril,
    },
    Element {
        name: QualName,
        attrs: RefCell<Vec<Attribute>>,
        mathml_annotation_xml_integration_point: bool,
    },
    ProcessingInstruction {
        target: StrTendril,
        contents: StrTendril,
    },
}

/// Parses `input` as the contents of a `<body>` element into `arena`.
///
/// Scripting is reported as disabled to the tree builder so that the contents of `<noscript>`
/// come back as markup rather than as one opaque text node.
pub fn parse_fragment_into_arena<'arena>(input: &str, arena: Arena<'arena>) -> Parsed<'arena> {
    let sink = Sink {
        arena,
        document: arena.alloc(Node::new(NodeData::Document)),
        quirks_mode: QuirksMode::NoQuirks,
        current_line: 1,
        issues: Vec::new(),
    };
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            scripting_enabled: false,
            ..Default::default()
        },
        ..Default::default()
    };
    parse_fragment(
        sink,
        opts,
        QualName::new(None, ns!(html), local_name!("body")),
        vec![],
    )
    .one(input)
}

impl<'arena> Node<'arena> {
    pub fn new(data: NodeData) -> Self {
        Node {
            parent: Cell::new(None),
            previous_sibling: Cell::new(None),
            next_sibling: Cell::new(None),
            first_child: Cell::new(None),
            last_child: Cell::new(None),
            data,
        }
    }

    pub fn detach(&self) {
        let parent = self.parent.take();
        let previous_sibling = self.previous_sibling.take();
        let next_sibling = self.next_sibling.take();

        if let Some(next_sibling) = next_sibling {
            next_sibling.previous_sibling.set(previous_sibling);
        } else if let Some(parent) = parent {
            parent.last_child.set(previous_sibling);
        }

        if let Some(previous_sibling) = previous_sibling {
            previous_sibling.next_sibling.set(next_sibling);
        } else if let Some(parent) = parent {
            parent.first_child.set(next_sibling);
        }
    }

    /// Removes this node from the tree and splices its children into its old position in the
    /// parent's child list. Returns the first promoted child, if there was one.
    pub fn unwrap(&self) -> Option<Ref<'arena>> {
        let parent = self.parent.take();
        let previous_sibling = self.previous_sibling.take();
        let next_sibling = self.next_sibling.take();
        let first_child = self.first_child.take();
        let last_child = self.last_child.take();

        let (first, last) = match (first_child, last_child) {
            (Some(first), Some(last)) => (Some(first), Some(last)),
            _ => (None, None),
        };

        match (last, next_sibling) {
            (Some(last), Some(next_sibling)) => {
                last.next_sibling.set(Some(next_sibling));
                next_sibling.previous_sibling.set(Some(last));
            }
            (Some(last), None) => {
                if let Some(parent) = parent {
                    parent.last_child.set(Some(last));
                }
            }
            (None, Some(next_sibling)) => next_sibling.previous_sibling.set(previous_sibling),
            (None, None) => {
                if let Some(parent) = parent {
                    parent.last_child.set(previous_sibling);
                }
            }
        }

        match (first, previous_sibling) {
            (Some(first), Some(previous_sibling)) => {
                previous_sibling.next_sibling.set(Some(first));
                first.previous_sibling.set(Some(previous_sibling));
            }
            (Some(first), None) => {
                if let Some(parent) = parent {
                    parent.first_child.set(Some(first));
                }
            }
            (None, Some(previous_sibling)) => previous_sibling.next_sibling.set(next_sibling),
            (None, None) => {
                if let Some(parent) = parent {
                    parent.first_child.set(next_sibling);
                }
            }
        }

        let mut child = first;
        while let Some(next_child) = child {
            next_child.parent.set(parent);
            child = if last.map_or(false, |last| ptr::eq::<Node>(last, next_child)) {
                None
            } else {
                next_child.next_sibling.get()
            };
        }

        first
    }

    pub fn append(&'arena self, new_child: &'arena Self) {
        new_child.detach();
        new_child.parent.set(Some(self));
        if let Some(last_child) = self.last_child.take() {
            new_child.previous_sibling.set(Some(last_child));
            debug_assert!(last_child.next_sibling.get().is_none());
            last_child.next_sibling.set(Some(new_child));
        } else {
            debug_assert!(self.first_child.get().is_none());
            self.first_child.set(Some(new_child));
        }
        self.last_child.set(Some(new_child));
    }

    pub fn insert_before(&'arena self, new_sibling: &'arena Self) {
        new_sibling.detach();
        new_sibling.parent.set(self.parent.get());
        new_sibling.next_sibling.set(Some(self));
        if let Some(previous_sibling) = self.previous_sibling.take() {
            new_sibling.previous_sibling.set(Some(previous_sibling));
            debug_assert!(previous_sibling
                .next_sibling
                .get()
                .map_or(false, |next| ptr::eq::<Node>(next, self)));
            previous_sibling.next_sibling.set(Some(new_sibling));
        } else if let Some(parent) = self.parent.get() {
            debug_assert!(parent
                .first_child
                .get()
                .map_or(false, |first| ptr::eq::<Node>(first, self)));
            parent.first_child.set(Some(new_sibling));
        }
        self.previous_sibling.set(Some(new_sibling));
    }

    pub fn children(&self) -> Children<'arena> {
        Children {
            next: self.first_child.get(),
        }
    }
}

/// Iterates over a node's children. The next sibling is read before a child is yielded, so
/// detaching the yielded child does not end the iteration early.
pub struct Children<'arena> {
    next: Option<Ref<'arena>>,
}

impl<'arena> Iterator for Children<'arena> {
    type Item = Ref<'arena>;

    fn next(&mut self) -> Option<Ref<'arena>> {
        let node = self.next?;
        self.next = node.next_sibling.get();
        Some(node)
    }
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeData::Document => write!(f, "Document"),
            NodeData::Doctype { name, .. } => write!(f, "Doctype: {}", name),
            NodeData::Text { contents } => write!(
                f,
                "Text: {}...",
                &contents.borrow().chars().take(10).collect::<String>()
            ),
            NodeData::ProcessingInstruction { .. } => write!(f, "ProcessingInstruction: ..."),
            NodeData::Comment { contents } => write!(
                f,
                "Comment: {}...",
                &contents.chars().take(10).collect::<String>()
            ),
            NodeData::Element { ref name, .. } => write!(f, "Element: {}", &name.local),
        }
    }
}

impl<'arena> Sink<'arena> {
    fn new_node(&self, data: NodeData) -> Ref<'arena> {
        self.arena.alloc(Node::new(data))
    }

    fn append_common<P, A>(&self, child: NodeOrText<Ref<'arena>>, previous: P, append: A)
    where
        P: FnOnce() -> Option<Ref<'arena>>,
        A: FnOnce(Ref<'arena>),
    {
        let new_node = match child {
            NodeOrText::AppendText(text) => {
                // Append to an existing Text node if we have one.
                if let Some(&Node {
                    data: NodeData::Text { ref contents },
                    ..
                }) = previous()
                {
                    contents.borrow_mut().push_tendril(&text);
                    return;
                }
                self.new_node(NodeData::Text {
                    contents: RefCell::new(text),
                })
            }
            NodeOrText::AppendNode(node) => node,
        };

        append(new_node)
    }
}

impl<'arena> TreeSink for Sink<'arena> {
    type Handle = Ref<'arena>;
    type Output = Parsed<'arena>;

    fn finish(self) -> Parsed<'arena> {
        Parsed {
            document: self.document,
            issues: self.issues,
        }
    }

    fn parse_error(&mut self, message: Cow<'static, str>) {
        self.issues.push(ParseIssue {
            line: self.current_line,
            message,
        });
    }

    fn set_current_line(&mut self, line_number: u64) {
        self.current_line = line_number;
    }

    fn get_document(&mut self) -> Ref<'arena> {
        self.document
    }

    fn set_quirks_mode(&mut self, mode: QuirksMode) {
        self.quirks_mode = mode;
    }

    fn same_node(&self, x: &Ref<'arena>, y: &Ref<'arena>) -> bool {
        ptr::eq::<Node>(*x, *y)
    }

    fn elem_name<'a>(&self, target: &'a Ref<'arena>) -> ExpandedName<'a> {
        match target.data {
            NodeData::Element { ref name, .. } => name.expanded(),
            _ => panic!("not an element!"),
        }
    }

    // Template contents live directly under the template element, so that unwrapping a
    // disallowed <template> promotes its contents like any other element.
    fn get_template_contents(&mut self, target: &Ref<'arena>) -> Ref<'arena> {
        *target
    }

    fn is_mathml_annotation_xml_integration_point(&self, target: &Ref<'arena>) -> bool {
        if let NodeData::Element {
            mathml_annotation_xml_integration_point,
            ..
        } = target.data
        {
            mathml_annotation_xml_integration_point
        } else {
            panic!("not an element!")
        }
    }

    fn create_element(
        &mut self,
        name: QualName,
        attrs: Vec<Attribute>,
        flags: ElementFlags,
    ) -> Ref<'arena> {
        self.new_node(NodeData::Element {
            name,
            attrs: RefCell::new(attrs),
            mathml_annotation_xml_integration_point: flags.mathml_annotation_xml_integration_point,
        })
    }

    fn create_comment(&mut self, text: StrTendril) -> Ref<'arena> {
        self.new_node(NodeData::Comment { contents: text })
    }

    fn create_pi(&mut self, target: StrTendril, data: StrTendril) -> Ref<'arena> {
        self.new_node(NodeData::ProcessingInstruction {
            target,
            contents: data,
        })
    }

    fn append(&mut self, parent: &Ref<'arena>, child: NodeOrText<Ref<'arena>>) {
        self.append_common(
            child,
            || parent.last_child.get(),
            |new_node| parent.append(new_node),
        )
    }

    fn append_before_sibling(&mut self, sibling: &Ref<'arena>, child: NodeOrText<Ref<'arena>>) {
        self.append_common(
            child,
            || sibling.previous_sibling.get(),
            |new_node| sibling.insert_before(new_node),
        )
    }

    fn append_based_on_parent_node(
        &mut self,
        element: &Ref<'arena>,
        prev_element: &Ref<'arena>,
        child: NodeOrText<Ref<'arena>>,
    ) {
        if element.parent.get().is_some() {
            self.append_before_sibling(element, child)
        } else {
            self.append(prev_element, child)
        }
    }

    fn append_doctype_to_document(
        &mut self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) {
        self.document.append(self.new_node(NodeData::Doctype {
            name,
            public_id,
            system_id,
        }))
    }

    fn add_attrs_if_missing(&mut self, target: &Ref<'arena>, attrs: Vec<Attribute>) {
        let mut existing = if let NodeData::Element { ref attrs, .. } = target.data {
            attrs.borrow_mut()
        } else {
            panic!("not an element")
        };

        let existing_names = existing
            .iter()
            .map(|attr| attr.name.clone())
            .collect::<HashSet<_>>();
        existing.extend(
            attrs
                .into_iter()
                .filter(|attr| !existing_names.contains(&attr.name)),
        );
    }

    fn remove_from_parent(&mut self, target: &Ref<'arena>) {
        target.detach()
    }

    fn reparent_children(&mut self, node: &Ref<'arena>, new_parent: &Ref<'arena>) {
        let mut next_child = node.first_child.get();
        while let Some(child) = next_child {
            next_child = child.next_sibling.get();
            new_parent.append(child)
        }
    }
}

// Implementation adapted from implementation for RcDom:
// https://github.com/servo/html5ever/blob/45b2fca5c6/markup5ever/rcdom.rs#L410
impl<'arena> Serialize for Node<'arena> {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        match (&traversal_scope, &self.data) {
            (
                _,
                &NodeData::Element {
                    ref name,
                    ref attrs,
                    ..
                },
            ) => {
                if traversal_scope == IncludeNode {
                    let attrs = attrs.borrow();
                    serializer.start_elem(
                        name.clone(),
                        attrs.iter().map(|at| (&at.name, &at.value[..])),
                    )?;
                }

                for child in self.children() {
                    child.serialize(serializer, IncludeNode)?;
                }

                if traversal_scope == IncludeNode {
                    serializer.end_elem(name.clone())?;
                }
                Ok(())
            }

            (&ChildrenOnly(_), &NodeData::Document) => {
                for child in self.children() {
                    child.serialize(serializer, IncludeNode)?;
                }
                Ok(())
            }

            (&ChildrenOnly(_), _) => Ok(()),

            (&IncludeNode, &NodeData::Doctype { ref name, .. }) => serializer.write_doctype(name),
            (&IncludeNode, &NodeData::Text { ref contents }) => {
                serializer.write_text(&contents.borrow())
            }
            (&IncludeNode, &NodeData::Comment { ref contents }) => {
                serializer.write_comment(contents)
            }
            (
                &IncludeNode,
                &NodeData::ProcessingInstruction {
                    ref target,
                    ref contents,
                },
            ) => serializer.write_processing_instruction(target, contents),
            (&IncludeNode, &NodeData::Document) => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "can't serialize a document node itself",
            )),
        }
    }
}

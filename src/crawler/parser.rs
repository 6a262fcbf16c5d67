//! Typed HTML query layer
//!
//! Pages are parsed once with `scraper` and then queried by tag name plus an
//! attribute predicate. Queries come in two shapes:
//! - `find_first`: the first match in document order
//! - `find_all`: every match in document order
//!
//! Callers that need the last match take it from `find_all`.

use scraper::node::Element;
use scraper::{ElementRef, Html};

/// Attribute condition an element must satisfy to match a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrPredicate<'p> {
    /// Any element with the right tag
    Any,
    /// The attribute is present, whatever its value
    Present(&'p str),
    /// The element carries this class
    HasClass(&'p str),
    /// The attribute has exactly this value
    Equals(&'p str, &'p str),
}

impl AttrPredicate<'_> {
    fn matches(&self, element: &Element) -> bool {
        match *self {
            Self::Any => true,
            Self::Present(name) => element.attr(name).is_some(),
            Self::HasClass(class) => element.classes().any(|c| c == class),
            Self::Equals(name, value) => element.attr(name) == Some(value),
        }
    }
}

fn is_match(element: &ElementRef<'_>, tag: &str, predicate: AttrPredicate<'_>) -> bool {
    let value = element.value();
    value.name().eq_ignore_ascii_case(tag) && predicate.matches(value)
}

/// A parsed HTML page
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses raw HTML; malformed markup is repaired, never rejected
    pub fn parse(raw: &str) -> Self {
        Self {
            html: Html::parse_document(raw),
        }
    }

    /// First element in document order matching `tag` and `predicate`
    pub fn find_first(&self, tag: &str, predicate: AttrPredicate<'_>) -> Option<Node<'_>> {
        self.html
            .tree
            .root()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|element| is_match(element, tag, predicate))
            .map(Node::new)
    }

    /// All elements in document order matching `tag` and `predicate`
    pub fn find_all(&self, tag: &str, predicate: AttrPredicate<'_>) -> Vec<Node<'_>> {
        self.html
            .tree
            .root()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|element| is_match(element, tag, predicate))
            .map(Node::new)
            .collect()
    }
}

/// An element inside a [`Document`]
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    element: ElementRef<'a>,
}

impl<'a> Node<'a> {
    fn new(element: ElementRef<'a>) -> Self {
        Self { element }
    }

    /// First descendant (excluding this node) matching `tag` and `predicate`
    pub fn find_first(&self, tag: &str, predicate: AttrPredicate<'_>) -> Option<Node<'a>> {
        self.element
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .find(|element| is_match(element, tag, predicate))
            .map(Node::new)
    }

    /// All descendants (excluding this node) matching `tag` and `predicate`
    pub fn find_all(&self, tag: &str, predicate: AttrPredicate<'_>) -> Vec<Node<'a>> {
        self.element
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .filter(|element| is_match(element, tag, predicate))
            .map(Node::new)
            .collect()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// All text inside this element, concatenated
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Direct text children that come before the first child element
    pub fn leading_text(&self) -> String {
        let mut leading = String::new();

        for child in self.element.children() {
            let value = child.value();
            if let Some(text) = value.as_text() {
                leading.push_str(text);
            } else if value.is_element() {
                break;
            }
        }

        leading
    }
}

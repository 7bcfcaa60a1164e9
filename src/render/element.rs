//! Container element builder
//!
//! The outer wrap step of the pipeline emits a `div` around the rendered
//! markup, carrying the view's identity as CSS classes and data attributes.
//! [`Element`] builds that markup; attribute values are HTML-escaped, the
//! inner content is embedded verbatim (it is already rendered HTML).

use std::collections::BTreeMap;

/// An HTML element with attributes, classes and inner HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    inner_html: String,
}

impl Element {
    /// Create an element with the given tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            classes: Vec::new(),
            inner_html: String::new(),
        }
    }

    /// Create a `div`.
    #[must_use]
    pub fn div() -> Self {
        Self::new("div")
    }

    /// Set an attribute, replacing any previous value. Use
    /// [`Element::add_class`] for classes so they accumulate.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Append a class. Duplicates and empty strings are ignored.
    #[must_use]
    pub fn add_class(mut self, class: impl Into<String>) -> Self {
        let class = class.into();
        if !class.is_empty() && !self.classes.contains(&class) {
            self.classes.push(class);
        }
        self
    }

    /// Set the inner HTML, embedded verbatim.
    #[must_use]
    pub fn inner_html(mut self, html: impl Into<String>) -> Self {
        self.inner_html = html.into();
        self
    }

    /// The accumulated classes, in insertion order.
    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Render the element to markup.
    #[must_use]
    pub fn render(&self) -> String {
        let mut html = String::new();
        html.push('<');
        html.push_str(&self.tag);

        if !self.classes.is_empty() {
            html.push_str(" class=\"");
            html.push_str(&escape_attribute(&self.classes.join(" ")));
            html.push('"');
        }

        for (name, value) in &self.attributes {
            html.push(' ');
            html.push_str(name);
            html.push_str("=\"");
            html.push_str(&escape_attribute(value));
            html.push('"');
        }

        html.push('>');
        html.push_str(&self.inner_html);
        html.push_str("</");
        html.push_str(&self.tag);
        html.push('>');
        html
    }
}

/// Escape a string for inclusion as element text.
#[must_use]
pub fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Escape a value for inclusion in a double-quoted attribute.
fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

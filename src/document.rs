use crate::errors::{Error, Result};
use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

static META_CHARSET: OnceLock<Option<Regex>> = OnceLock::new();

/// How far into a body a `<meta charset>` declaration is looked for.
const CHARSET_PREFIX: usize = 1024;

/// A parsed HTML document.
///
/// The markup is kept as text and re-parsed for every query, so documents are
/// cheap to share between threads and never hold borrowed tree nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    markup: String,
}

impl Document {
    /// Wraps markup that is already text.
    pub fn parse(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
        }
    }

    /// Decodes a response body.
    ///
    /// The charset comes from the `Content-Type` header, then from a
    /// `<meta>` declaration near the top of the markup; UTF-8 otherwise.
    /// A byte order mark overrides both. Malformed sequences are replaced.
    pub fn decode(body: &[u8], content_type: Option<&str>) -> Self {
        let encoding = content_type
            .and_then(header_charset)
            .or_else(|| meta_charset(body))
            .and_then(|label| Encoding::for_label(label.trim().as_bytes()))
            .unwrap_or(UTF_8);
        let (text, used, malformed) = encoding.decode(body);
        if malformed {
            ::log::debug!("Body had malformed {} sequences", used.name());
        }
        Self::parse(text.into_owned())
    }

    /// The markup as received.
    pub fn source(&self) -> &str {
        &self.markup
    }

    /// Returns every element matching the CSS selector, in document order.
    pub fn find(&self, expr: &str) -> Result<Selection> {
        let selector = compile(expr)?;
        let doc = Html::parse_document(&self.markup);
        let elements = doc.select(&selector).map(Element::from_ref).collect::<Vec<_>>();
        ::log::trace!("Selector '{}' matched {} elements", expr, elements.len());
        Ok(Selection { elements })
    }

    /// Text of the first `<title>` element.
    pub fn title(&self) -> String {
        self.first("title").map(|e| e.text).unwrap_or_default()
    }

    /// Inner markup of the `<body>` element.
    pub fn body(&self) -> String {
        self.first("body").map(|e| e.inner_html).unwrap_or_default()
    }

    /// Body text with whitespace collapsed.
    pub fn text(&self) -> String {
        self.first("body")
            .map(|e| normalize_whitespace(&e.text))
            .unwrap_or_default()
    }

    /// Serializes the parsed tree back to markup.
    pub fn html(&self) -> String {
        Html::parse_document(&self.markup).html()
    }

    /// The `content` of the first `<meta http-equiv="refresh">` tag.
    pub fn meta_refresh(&self) -> Option<String> {
        let metas = self.find("meta[http-equiv]").ok()?;
        metas
            .iter()
            .find(|e| {
                e.attr("http-equiv")
                    .is_some_and(|v| v.trim().eq_ignore_ascii_case("refresh"))
            })
            .and_then(|e| e.attr("content").map(str::to_string))
    }

    fn first(&self, expr: &str) -> Option<Element> {
        self.find(expr).ok().and_then(|s| s.first().cloned())
    }
}

/// An owned snapshot of one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    text: String,
    inner_html: String,
    html: String,
}

impl Element {
    fn from_ref(el: ElementRef<'_>) -> Self {
        Self {
            name: el.value().name().to_string(),
            attrs: el
                .value()
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            text: el.text().collect::<String>(),
            inner_html: el.inner_html(),
            html: el.html(),
        }
    }

    /// Lower-case tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is(&self, tag: &str) -> bool {
        self.name.eq_ignore_ascii_case(tag)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether the attribute is present, even with an empty value.
    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Every attribute as name/value pairs.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Concatenated text of the element and its descendants.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Markup of the element's children.
    pub fn inner_html(&self) -> &str {
        &self.inner_html
    }

    /// Markup of the element itself.
    pub fn html(&self) -> &str {
        &self.html
    }

    /// Returns the descendants of this element matching the selector.
    pub fn find(&self, expr: &str) -> Result<Selection> {
        let selector = compile(expr)?;
        let fragment = Html::parse_fragment(&self.html);
        let elements = fragment
            .select(&selector)
            .map(Element::from_ref)
            .filter(|e| e.html != self.html)
            .collect();
        Ok(Selection { elements })
    }
}

/// The elements matched by a selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    elements: Vec<Element>,
}

impl Selection {
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The first match in document order.
    pub fn first(&self) -> Option<&Element> {
        self.elements.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.elements.iter()
    }

    /// Attribute of the first element.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.first().and_then(|e| e.attr(name))
    }

    /// Combined text of every matched element.
    pub fn text(&self) -> String {
        self.elements.iter().map(|e| e.text.as_str()).collect()
    }
}

impl IntoIterator for Selection {
    type Item = Element;
    type IntoIter = std::vec::IntoIter<Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

fn compile(expr: &str) -> Result<Selector> {
    Selector::parse(expr).map_err(|e| Error::InvalidSelector {
        expr: expr.to_string(),
        message: e.to_string(),
    })
}

/// The `charset` parameter of a `Content-Type` value.
fn header_charset(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
    })
}

/// A charset declared by a `<meta>` tag at the start of the markup.
fn meta_charset(body: &[u8]) -> Option<String> {
    let pattern = META_CHARSET
        .get_or_init(|| {
            Regex::new(r#"(?i)<meta[^>]*?charset\s*=\s*["']?\s*([A-Za-z0-9_.:-]+)"#).ok()
        })
        .as_ref()?;
    let prefix = String::from_utf8_lossy(&body[..body.len().min(CHARSET_PREFIX)]);
    let captures = pattern.captures(&prefix)?;
    Some(captures.get(1)?.as_str().to_string())
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

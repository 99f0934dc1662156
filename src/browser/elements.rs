use crate::browser::form::Form;
use crate::document::Document;
use crate::errors::Result;
use serde::Serialize;
use url::Url;

/// A link found on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    /// Value of the id attribute (empty when absent)
    pub id: String,

    /// Absolute target of the link
    pub href: Url,

    /// Text of the anchor
    pub text: String,
}

/// An image found on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Image {
    /// Value of the id attribute (empty when absent)
    pub id: String,

    /// Absolute source of the image
    pub src: Url,

    /// Alternate text
    pub alt: String,

    /// Title attribute
    pub title: String,
}

/// A cookie the browser sends to a site
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

/// Something on a page the browser can act on.
#[derive(Debug, Clone)]
pub enum Target {
    Form(Form),
    Link(Link),
    Image(Image),
}

impl From<Form> for Target {
    fn from(form: Form) -> Self {
        Target::Form(form)
    }
}

impl From<Link> for Target {
    fn from(link: Link) -> Self {
        Target::Link(link)
    }
}

impl From<Image> for Target {
    fn from(image: Image) -> Self {
        Target::Image(image)
    }
}

/// Collects every `<a href>` whose target resolves against `base`.
pub fn links(doc: &Document, base: &Url) -> Result<Vec<Link>> {
    let anchors = doc.find("a[href]")?;
    let mut links = Vec::with_capacity(anchors.len());
    for anchor in anchors.iter() {
        let Some(href) = anchor.attr("href") else {
            continue;
        };
        match base.join(href) {
            Ok(href) => links.push(Link {
                id: anchor.attr("id").unwrap_or_default().to_string(),
                href,
                text: anchor.text().to_string(),
            }),
            Err(e) => ::log::debug!("Skipping link '{}': {}", href, e),
        }
    }

    ::log::debug!("Found {} links in {}", links.len(), base);
    Ok(links)
}

/// Collects every `<img src>` whose source resolves against `base`.
pub fn images(doc: &Document, base: &Url) -> Result<Vec<Image>> {
    let tags = doc.find("img[src]")?;
    let mut images = Vec::with_capacity(tags.len());
    for tag in tags.iter() {
        let Some(src) = tag.attr("src") else {
            continue;
        };
        if let Ok(src) = base.join(src) {
            images.push(Image {
                id: tag.attr("id").unwrap_or_default().to_string(),
                src,
                alt: tag.attr("alt").unwrap_or_default().to_string(),
                title: tag.attr("title").unwrap_or_default().to_string(),
            });
        }
    }
    Ok(images)
}

/// Splits a `Cookie` request header into name/value pairs.
pub fn parse_cookie_header(header: &str) -> Vec<Cookie> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            Some(Cookie {
                name: name.trim().to_string(),
                value: value.trim().to_string(),
            })
        })
        .collect()
}

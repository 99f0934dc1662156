use thiserror::Error;
use url::Url;

/// Errors produced while navigating or querying a page.
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed url '{url}': {source}")]
    MalformedUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("page not loaded: {0}")]
    PageNotLoaded(String),

    #[error("element not found for '{expr}': {detail}")]
    ElementNotFound { expr: String, detail: String },

    #[error("no link found matching '{expr}'")]
    LinkNotFound { expr: String },

    #[error("invalid selector '{expr}': {message}")]
    InvalidSelector { expr: String, message: String },

    #[error("redirects are disabled, cannot follow '{url}'")]
    RedirectBlocked { url: Url },

    #[error("stopped after {0} redirects")]
    TooManyRedirects(usize),

    #[error("invalid header '{name}'")]
    InvalidHeader { name: String },

    #[error("a bookmark does not exist with the name '{0}'")]
    BookmarkNotFound(String),

    #[error("a bookmark with the name '{0}' already exists")]
    BookmarkExists(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn malformed(url: &str, source: url::ParseError) -> Self {
        Error::MalformedUrl {
            url: url.to_string(),
            source,
        }
    }

    pub(crate) fn not_found(expr: &str, detail: impl Into<String>) -> Self {
        Error::ElementNotFound {
            expr: expr.to_string(),
            detail: detail.into(),
        }
    }
}

/// Parses an absolute URL, reporting the offending input on failure.
pub(crate) fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| Error::malformed(raw, e))
}

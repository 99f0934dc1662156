use crate::document::Document;
use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use url::Url;

/// An outgoing request, kept verbatim so it can be replayed by a reload.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl Request {
    /// A request with no headers and no body.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

/// What the transport handed back for one exchange.
#[derive(Debug, Clone)]
pub struct Response {
    /// Status code of the final response.
    pub status: u16,
    /// URL of the final response, after any redirects.
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// Snapshot of one completed navigation.
///
/// Built once per successful exchange and never modified afterwards; the
/// browser and its history share it through `Arc`.
#[derive(Debug)]
pub struct PageState {
    request: Request,
    status: u16,
    url: Url,
    headers: HeaderMap,
    document: Document,
}

impl PageState {
    /// Parses the response body and freezes the exchange.
    pub fn new(request: Request, response: Response) -> Self {
        let content_type = response
            .headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok());
        let document = Document::decode(&response.body, content_type);
        Self {
            request,
            status: response.status,
            url: response.url,
            headers: response.headers,
            document,
        }
    }

    /// The request that produced this page, replayed by a reload.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// The page URL: where the response finally came from.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Status code of the final response.
    pub fn status_code(&self) -> u16 {
        self.status
    }

    /// Headers of the final response.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The decoded and parsed body.
    pub fn document(&self) -> &Document {
        &self.document
    }
}

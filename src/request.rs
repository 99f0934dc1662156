use crate::attributes::{Attribute, Attributes};
use crate::errors::{Error, Result, parse_url};
use crate::page::Request;
use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, REFERER, USER_AGENT};
use std::collections::BTreeMap;
use url::Url;

/// Body type used for urlencoded form submissions.
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Headers every request starts from.
#[derive(Debug, Clone)]
pub struct RequestDefaults {
    pub user_agent: String,
    pub headers: HeaderMap,
}

impl RequestDefaults {
    /// Defaults with no extra headers.
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            headers: HeaderMap::new(),
        }
    }

    /// Appends a header, keeping any existing values under the same name.
    pub fn add_header(&mut self, name: &str, value: &str) -> Result<()> {
        let (name, value) = header_pair(name, value)?;
        self.headers.append(name, value);
        Ok(())
    }

    /// Replaces the whole default header set.
    pub fn set_headers(&mut self, headers: &BTreeMap<String, String>) -> Result<()> {
        let mut map = HeaderMap::with_capacity(headers.len());
        for (name, value) in headers {
            let (name, value) = header_pair(name, value)?;
            map.append(name, value);
        }
        self.headers = map;
        Ok(())
    }
}

fn header_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let invalid = || Error::InvalidHeader {
        name: name.to_string(),
    };
    let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
    let value = HeaderValue::from_str(value).map_err(|_| invalid())?;
    Ok((name, value))
}

/// Assembles one outgoing request.
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    url: Url,
    via: Option<Url>,
    body: Option<(String, Vec<u8>)>,
}

impl RequestBuilder {
    /// Starts a request for an absolute URL.
    pub fn new(method: Method, url: &str) -> Result<Self> {
        Ok(Self::for_url(method, parse_url(url)?))
    }

    /// Starts a request for an already parsed URL.
    pub fn for_url(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            via: None,
            body: None,
        }
    }

    /// The page this navigation starts from, used for the Referer header.
    pub fn via(mut self, via: Option<&Url>) -> Self {
        self.via = via.cloned();
        self
    }

    /// Attaches a body sent with the given Content-Type.
    pub fn body(mut self, body_type: &str, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some((body_type.to_string(), body.into()));
        self
    }

    /// Applies the default headers and the referer policy.
    pub fn finish(self, defaults: &RequestDefaults, attributes: &Attributes) -> Result<Request> {
        let mut request = Request::new(self.method, self.url);
        request.headers = defaults.headers.clone();

        let user_agent = HeaderValue::from_str(&defaults.user_agent).map_err(|_| {
            Error::InvalidHeader {
                name: USER_AGENT.to_string(),
            }
        })?;
        request.headers.insert(USER_AGENT, user_agent);

        if let Some((body_type, body)) = self.body {
            let content_type = HeaderValue::from_str(&body_type).map_err(|_| {
                Error::InvalidHeader {
                    name: CONTENT_TYPE.to_string(),
                }
            })?;
            request.headers.insert(CONTENT_TYPE, content_type);
            request.body = Some(body);
        }

        match self.via {
            Some(via) if attributes.get(Attribute::SendReferer) && !via.as_str().is_empty() => {
                let referer = referer_for(via);
                if let Ok(value) = HeaderValue::from_str(referer.as_str()) {
                    ::log::trace!("Referer {} for {}", referer, request.url);
                    request.headers.insert(REFERER, value);
                }
            }
            _ => {
                request.headers.remove(REFERER);
            }
        }

        Ok(request)
    }
}

/// The page URL as sent in a Referer: no credentials, no fragment.
fn referer_for(mut via: Url) -> Url {
    // Fails only for URLs that cannot carry credentials anyway.
    let _ = via.set_username("");
    let _ = via.set_password(None);
    via.set_fragment(None);
    via
}

/// Encodes name/value pairs as `application/x-www-form-urlencoded`.
pub fn encode_form<I, K, V>(values: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(values)
        .finish()
}

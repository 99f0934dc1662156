use crate::config::BrowserConfig;
use crate::errors::Result;
use crate::page::{Request, Response};
use crate::redirect::RedirectGate;
use crate::transport::Transport;
use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use reqwest::{Client, Method, StatusCode};
use std::sync::Arc;
use url::Url;

/// Transport over a pooled reqwest client.
///
/// Automatic redirects are disabled on the client; `Location` headers are
/// followed here so the gate sees every hop.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Builds a client that stores and sends cookies through `jar`.
    pub fn new(config: &BrowserConfig, jar: Arc<Jar>) -> Result<Self> {
        let mut builder = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .cookie_provider(jar);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &Request, gate: &RedirectGate) -> Result<Response> {
        let mut method = request.method.clone();
        let mut url = request.url.clone();
        let mut headers = request.headers.clone();
        let mut body = request.body.clone();
        let mut followed = 0;

        loop {
            ::log::trace!("{} {}", method, url);
            let mut outgoing = self
                .client
                .request(method.clone(), url.clone())
                .headers(headers.clone());
            if let Some(bytes) = &body {
                outgoing = outgoing.body(bytes.clone());
            }
            let response = outgoing.send().await?;
            let status = response.status();

            if status.is_redirection() {
                if let Some(target) = location(&response) {
                    gate.check(&target, followed)?;
                    followed += 1;
                    if switches_to_get(status, &method) {
                        method = Method::GET;
                        body = None;
                        headers.remove(CONTENT_TYPE);
                        headers.remove(CONTENT_LENGTH);
                    }
                    url = target;
                    continue;
                }
            }

            let final_url = response.url().clone();
            let response_headers = response.headers().clone();
            let bytes = response.bytes().await?;
            ::log::debug!(
                "{} {} -> {} ({} bytes, {} redirects)",
                request.method,
                request.url,
                status,
                bytes.len(),
                followed
            );

            return Ok(Response {
                status: status.as_u16(),
                url: final_url,
                headers: response_headers,
                body: bytes.to_vec(),
            });
        }
    }
}

/// The absolute redirect target, if the response names a usable one.
fn location(response: &reqwest::Response) -> Option<Url> {
    let raw = response.headers().get(LOCATION)?.to_str().ok()?;
    response.url().join(raw).ok()
}

fn switches_to_get(status: StatusCode, method: &Method) -> bool {
    match status {
        StatusCode::SEE_OTHER => *method != Method::HEAD,
        StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND => {
            *method != Method::GET && *method != Method::HEAD
        }
        _ => false,
    }
}

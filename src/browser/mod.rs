pub mod elements;
pub mod form;

#[cfg(test)]
mod tests;

use crate::attributes::{Attribute, AttributeMap, Attributes};
use crate::bookmarks::BookmarkStore;
use crate::config::BrowserConfig;
use crate::document::{Document, Selection};
use crate::errors::{Error, Result, parse_url};
use crate::history::History;
use crate::page::{PageState, Request};
use crate::redirect::RedirectGate;
use crate::refresh::{RefreshScheduler, parse_refresh_delay};
use crate::request::{FORM_URLENCODED, RequestBuilder, RequestDefaults, encode_form};
use crate::transport::Transport;
use reqwest::Method;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderMap;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::io::Write;
use std::pin::Pin;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::time::Duration;
use tokio::sync::Mutex;
use url::Url;

pub use elements::{Cookie, Image, Link, Target};
pub use form::Form;

/// A programmable web browser.
///
/// `Browser` is a cheap handle; clones share the same page, history and
/// settings. Navigations, including reloads fired by a meta refresh, run one
/// at a time: each holds the session lock from the moment the request is sent
/// until the new page is installed.
#[derive(Clone)]
pub struct Browser {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn Transport>,
    bookmarks: Arc<dyn BookmarkStore>,
    cookies: Arc<Jar>,
    attributes: Arc<Attributes>,
    gate: RedirectGate,
    defaults: RwLock<RequestDefaults>,
    session: Mutex<Session>,
}

/// Everything a navigation mutates.
#[derive(Debug, Default)]
struct Session {
    current: Option<Arc<PageState>>,
    history: History,
    refresh: RefreshScheduler,
}

impl fmt::Debug for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Browser")
            .field("attributes", &self.inner.attributes)
            .field("gate", &self.inner.gate)
            .finish_non_exhaustive()
    }
}

impl Browser {
    /// Starts building a browser.
    pub fn builder() -> crate::BrowserBuilder {
        crate::BrowserBuilder::new()
    }

    /// A browser with the default configuration and an HTTP transport.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub(crate) fn from_parts(
        config: &BrowserConfig,
        transport: Arc<dyn Transport>,
        bookmarks: Arc<dyn BookmarkStore>,
        cookies: Arc<Jar>,
    ) -> Result<Self> {
        let attributes = Arc::new(Attributes::from_map(&config.attributes));
        let gate = RedirectGate::new(attributes.clone(), config.max_redirects);
        let mut defaults = RequestDefaults::new(config.user_agent.clone());
        defaults.set_headers(&config.headers)?;

        Ok(Self {
            inner: Arc::new(Inner {
                transport,
                bookmarks,
                cookies,
                attributes,
                gate,
                defaults: RwLock::new(defaults),
                session: Mutex::new(Session::default()),
            }),
        })
    }

    // Settings

    /// The User-Agent sent with every request.
    pub fn user_agent(&self) -> String {
        self.read_defaults().user_agent.clone()
    }

    /// Changes the User-Agent for later requests.
    pub fn set_user_agent(&self, user_agent: impl Into<String>) {
        self.write_defaults().user_agent = user_agent.into();
    }

    /// Current value of an attribute.
    pub fn attribute(&self, attribute: Attribute) -> bool {
        self.inner.attributes.get(attribute)
    }

    /// Switches an attribute on or off; the next request sees the change.
    pub fn set_attribute(&self, attribute: Attribute, value: bool) {
        self.inner.attributes.set(attribute, value);
    }

    /// Sets every attribute listed in the map, leaving the others alone.
    pub fn set_attributes(&self, attributes: &AttributeMap) {
        self.inner.attributes.apply(attributes);
    }

    /// Snapshot of every attribute.
    pub fn attributes(&self) -> AttributeMap {
        self.inner.attributes.snapshot()
    }

    /// Adds a header sent with every request.
    pub fn add_header(&self, name: &str, value: &str) -> Result<()> {
        self.write_defaults().add_header(name, value)
    }

    /// Replaces the headers sent with every request.
    pub fn set_headers(&self, headers: &BTreeMap<String, String>) -> Result<()> {
        self.write_defaults().set_headers(headers)
    }

    /// The jar cookies are stored in and sent from.
    pub fn cookie_jar(&self) -> Arc<Jar> {
        self.inner.cookies.clone()
    }

    /// The bookmark store used by `bookmark_page` and `open_bookmark`.
    pub fn bookmarks(&self) -> Arc<dyn BookmarkStore> {
        self.inner.bookmarks.clone()
    }

    fn read_defaults(&self) -> RwLockReadGuard<'_, RequestDefaults> {
        match self.inner.defaults.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_defaults(&self) -> RwLockWriteGuard<'_, RequestDefaults> {
        match self.inner.defaults.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn finish(&self, builder: RequestBuilder) -> Result<Request> {
        builder.finish(&self.read_defaults(), &self.inner.attributes)
    }

    // Navigation

    /// Requests the URL with GET.
    pub async fn open(&self, url: &str) -> Result<()> {
        self.navigate(RequestBuilder::new(Method::GET, url)?).await
    }

    /// Replaces the URL's query with the encoded values and requests it with GET.
    pub async fn open_form<I, K, V>(&self, url: &str, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let target = with_query(parse_url(url)?, &encode_form(values));
        self.navigate(RequestBuilder::for_url(Method::GET, target)).await
    }

    /// Opens the URL saved under `name` in the bookmark store.
    pub async fn open_bookmark(&self, name: &str) -> Result<()> {
        let url = self.inner.bookmarks.read(name)?;
        self.open(&url).await
    }

    /// Requests the URL with POST.
    pub async fn post(&self, url: &str, body_type: &str, body: impl Into<Vec<u8>>) -> Result<()> {
        self.navigate(RequestBuilder::new(Method::POST, url)?.body(body_type, body))
            .await
    }

    /// Posts the values urlencoded.
    pub async fn post_form<I, K, V>(&self, url: &str, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.post(url, FORM_URLENCODED, encode_form(values)).await
    }

    /// Returns to the previous page.
    ///
    /// Returns false when there is no previous page.
    pub async fn back(&self) -> bool {
        let mut session = self.inner.session.lock().await;
        match session.history.pop() {
            Some(previous) => {
                session.refresh.cancel();
                ::log::info!("Back to {}", previous.url());
                session.current = Some(previous);
                true
            }
            None => false,
        }
    }

    /// Sends the request of the current page again.
    pub async fn reload(&self) -> Result<()> {
        let mut session = self.inner.session.lock().await;
        self.reload_in(&mut session).await
    }

    async fn reload_in(&self, session: &mut Session) -> Result<()> {
        let request = session
            .current
            .as_ref()
            .map(|state| state.request().clone())
            .ok_or_else(|| Error::PageNotLoaded("cannot reload, no page has been loaded".into()))?;
        ::log::debug!("Reloading {}", request.url);
        self.send(session, request).await
    }

    /// Follows the link matched by `expr`.
    ///
    /// Only anchors can be clicked; the href is resolved against the page URL
    /// and requested with GET.
    pub async fn click(&self, expr: &str) -> Result<()> {
        let mut session = self.inner.session.lock().await;
        let state = current(&session)?;
        let selection = state.document().find(expr)?;
        let element = selection
            .first()
            .ok_or_else(|| Error::not_found(expr, "no element matches"))?;
        if !element.is("a") {
            return Err(Error::not_found(expr, "must match an anchor tag"));
        }
        let href = element.attr("href").ok_or_else(|| Error::LinkNotFound {
            expr: expr.to_string(),
        })?;
        let target = state
            .url()
            .join(href)
            .map_err(|e| Error::malformed(href, e))?;

        let request =
            self.finish(RequestBuilder::for_url(Method::GET, target).via(Some(state.url())))?;
        self.send(&mut session, request).await
    }

    /// Returns the form matched by `expr`.
    pub async fn form(&self, expr: &str) -> Result<Form> {
        let state = self.page_state().await?;
        let selection = state.document().find(expr)?;
        let element = selection
            .first()
            .ok_or_else(|| Error::not_found(expr, "no form matches"))?;
        if !element.is("form") {
            return Err(Error::not_found(expr, "does not match a form tag"));
        }
        Form::from_element(self.clone(), element, state.url())
    }

    /// Every form on the current page; empty when there is none.
    pub async fn forms(&self) -> Vec<Form> {
        let Some(state) = self.page().await else {
            return Vec::new();
        };
        let Ok(selection) = state.document().find("form") else {
            return Vec::new();
        };
        selection
            .iter()
            .filter_map(
                |element| match Form::from_element(self.clone(), element, state.url()) {
                    Ok(form) => Some(form),
                    Err(e) => {
                        ::log::debug!("Skipping form on {}: {}", state.url(), e);
                        None
                    }
                },
            )
            .collect()
    }

    /// Saves the current page URL under `name`.
    pub async fn bookmark_page(&self, name: &str) -> Result<()> {
        let state = self.page_state().await?;
        self.inner.bookmarks.save(name, state.url().as_str())
    }

    /// Follows a link, opens an image or submits a form.
    pub async fn activate(&self, target: &Target) -> Result<()> {
        match target {
            Target::Form(form) => form.submit().await,
            Target::Link(link) => self.follow(link.href.clone()).await,
            Target::Image(image) => self.follow(image.src.clone()).await,
        }
    }

    /// Writes the content behind a target without navigating.
    ///
    /// Forms write their markup; links and images are fetched.
    pub async fn download_target<W: Write>(&self, target: &Target, out: &mut W) -> Result<u64> {
        let bytes = match target {
            Target::Form(form) => form.html().as_bytes().to_vec(),
            Target::Link(link) => self.fetch(&link.href).await?,
            Target::Image(image) => self.fetch(&image.src).await?,
        };
        out.write_all(&bytes)?;
        Ok(bytes.len() as u64)
    }

    pub(crate) async fn submit_form(
        &self,
        method: &Method,
        action: &Url,
        values: &[(String, String)],
        page: &Url,
    ) -> Result<()> {
        let encoded = encode_form(values.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        let builder = if *method == Method::POST {
            RequestBuilder::for_url(Method::POST, action.clone()).body(FORM_URLENCODED, encoded)
        } else {
            RequestBuilder::for_url(Method::GET, with_query(action.clone(), &encoded))
        };
        self.navigate(builder.via(Some(page))).await
    }

    async fn follow(&self, target: Url) -> Result<()> {
        let mut session = self.inner.session.lock().await;
        let via = session.current.as_ref().map(|state| state.url().clone());
        let request = self.finish(RequestBuilder::for_url(Method::GET, target).via(via.as_ref()))?;
        self.send(&mut session, request).await
    }

    async fn fetch(&self, target: &Url) -> Result<Vec<u8>> {
        let via = self.page().await.map(|state| state.url().clone());
        let request =
            self.finish(RequestBuilder::for_url(Method::GET, target.clone()).via(via.as_ref()))?;
        let response = self.inner.transport.execute(&request, &self.inner.gate).await?;
        ::log::debug!("Fetched {} bytes from {}", response.body.len(), response.url);
        Ok(response.body)
    }

    async fn navigate(&self, builder: RequestBuilder) -> Result<()> {
        let request = self.finish(builder)?;
        let mut session = self.inner.session.lock().await;
        self.send(&mut session, request).await
    }

    /// Runs one exchange and commits its result.
    ///
    /// Nothing in the session changes unless the exchange succeeds, apart from
    /// the pending refresh, which is always stopped first.
    async fn send(&self, session: &mut Session, request: Request) -> Result<()> {
        session.refresh.cancel();

        let response = self.inner.transport.execute(&request, &self.inner.gate).await?;
        let state = Arc::new(PageState::new(request, response));
        ::log::info!("Loaded {} ({})", state.url(), state.status_code());

        if let Some(previous) = session.current.replace(state.clone()) {
            session.history.push(previous);
        }
        self.schedule_refresh(session, &state);
        Ok(())
    }

    fn schedule_refresh(&self, session: &mut Session, state: &PageState) {
        if !self.inner.attributes.get(Attribute::MetaRefreshHandling) {
            return;
        }
        let Some(content) = state.document().meta_refresh() else {
            return;
        };
        let Some(delay) = parse_refresh_delay(&content) else {
            ::log::debug!("Ignoring refresh directive '{}' on {}", content, state.url());
            return;
        };
        let inner = Arc::downgrade(&self.inner);
        session
            .refresh
            .arm(delay, move |ticket| scheduled_reload(inner, ticket));
    }

    // Page accessors

    /// The current page, if any navigation has succeeded.
    pub async fn page(&self) -> Option<Arc<PageState>> {
        self.inner.session.lock().await.current.clone()
    }

    async fn page_state(&self) -> Result<Arc<PageState>> {
        self.page()
            .await
            .ok_or_else(|| Error::PageNotLoaded("no page has been loaded".into()))
    }

    /// URL of the current page, after any redirects.
    pub async fn url(&self) -> Result<Url> {
        Ok(self.page_state().await?.url().clone())
    }

    /// Status code of the current page.
    pub async fn status_code(&self) -> Result<u16> {
        Ok(self.page_state().await?.status_code())
    }

    /// Text of the current page's `<title>`.
    pub async fn title(&self) -> Result<String> {
        Ok(self.page_state().await?.document().title())
    }

    /// Response headers of the current page.
    pub async fn headers(&self) -> Result<HeaderMap> {
        Ok(self.page_state().await?.headers().clone())
    }

    /// Inner markup of the page body.
    pub async fn body(&self) -> Result<String> {
        Ok(self.page_state().await?.document().body())
    }

    /// The parsed current page.
    pub async fn dom(&self) -> Result<Document> {
        Ok(self.page_state().await?.document().clone())
    }

    /// Elements of the current page matching a CSS selector.
    pub async fn find(&self, expr: &str) -> Result<Selection> {
        self.page_state().await?.document().find(expr)
    }

    /// Every link on the page with its href resolved.
    pub async fn links(&self) -> Result<Vec<Link>> {
        let state = self.page_state().await?;
        elements::links(state.document(), state.url())
    }

    /// Every image on the page with its src resolved.
    pub async fn images(&self) -> Result<Vec<Image>> {
        let state = self.page_state().await?;
        elements::images(state.document(), state.url())
    }

    /// Cookies the jar would send to the current page.
    pub async fn site_cookies(&self) -> Result<Vec<Cookie>> {
        let url = self.url().await?;
        let cookies = self
            .inner
            .cookies
            .cookies(&url)
            .and_then(|value| value.to_str().ok().map(elements::parse_cookie_header))
            .unwrap_or_default();
        Ok(cookies)
    }

    /// Resolves a possibly relative URL against the page URL.
    pub async fn resolve_url(&self, href: &str) -> Result<Url> {
        let base = self.url().await?;
        base.join(href).map_err(|e| Error::malformed(href, e))
    }

    /// Writes the page markup and returns the number of bytes written.
    pub async fn download<W: Write>(&self, out: &mut W) -> Result<u64> {
        let html = self.page_state().await?.document().html();
        out.write_all(html.as_bytes())?;
        Ok(html.len() as u64)
    }

    /// Number of pages that `back` can return to.
    pub async fn history_len(&self) -> usize {
        self.inner.session.lock().await.history.len()
    }

    /// Delay of the pending meta refresh.
    pub async fn refresh_delay(&self) -> Option<Duration> {
        self.inner.session.lock().await.refresh.delay()
    }
}

fn current(session: &Session) -> Result<Arc<PageState>> {
    session
        .current
        .clone()
        .ok_or_else(|| Error::PageNotLoaded("no page has been loaded".into()))
}

fn with_query(mut url: Url, query: &str) -> Url {
    if query.is_empty() {
        url.set_query(None);
    } else {
        url.set_query(Some(query));
    }
    url
}

/// The reload run by a fired refresh timer.
fn scheduled_reload(inner: Weak<Inner>, ticket: u64) -> Pin<Box<dyn Future<Output = ()> + Send>> {
    Box::pin(async move {
        let Some(inner) = inner.upgrade() else {
            return;
        };
        let browser = Browser { inner };
        let mut session = browser.inner.session.lock().await;
        if !session.refresh.claim(ticket) {
            ::log::debug!("Refresh {} superseded", ticket);
            return;
        }
        if let Err(e) = browser.reload_in(&mut session).await {
            ::log::warn!("Meta refresh reload failed: {}", e);
        }
    })
}

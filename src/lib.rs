// Re-export modules
pub mod attributes;
pub mod bookmarks;
pub mod browser;
pub mod config;
pub mod document;
pub mod errors;
pub mod history;
pub mod page;
pub mod redirect;
pub mod refresh;
pub mod request;
pub mod transport;

// Re-export commonly used types for convenience
pub use attributes::{Attribute, AttributeMap};
pub use browser::{Browser, Cookie, Form, Image, Link, Target};
pub use config::BrowserConfig;
pub use errors::{Error, Result};
pub use page::PageState;

use bookmarks::{BookmarkStore, FileBookmarks, MemoryBookmarks};
use reqwest::cookie::Jar;
use std::sync::Arc;
use transport::{HttpTransport, Transport};

/// Builder for a [`Browser`]
pub struct BrowserBuilder {
    config: BrowserConfig,
    transport: Option<Arc<dyn Transport>>,
    bookmarks: Option<Arc<dyn BookmarkStore>>,
    cookies: Option<Arc<Jar>>,
}

impl BrowserBuilder {
    /// Create a builder with the default configuration
    pub fn new() -> Self {
        Self {
            config: BrowserConfig::new(),
            transport: None,
            bookmarks: None,
            cookies: None,
        }
    }

    /// Use the given configuration
    pub fn with_config(mut self, config: BrowserConfig) -> Self {
        self.config = config;
        self
    }

    /// Load the configuration from a JSON file
    pub fn with_config_file(self, path: impl AsRef<std::path::Path>) -> Result<Self> {
        let config = BrowserConfig::from_file(path)?;
        Ok(self.with_config(config))
    }

    /// Send requests through the given transport instead of HTTP
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Keep bookmarks in the given store
    pub fn with_bookmarks(mut self, bookmarks: Arc<dyn BookmarkStore>) -> Self {
        self.bookmarks = Some(bookmarks);
        self
    }

    /// Share an existing cookie jar
    pub fn with_cookie_jar(mut self, jar: Arc<Jar>) -> Self {
        self.cookies = Some(jar);
        self
    }

    /// Build the browser
    pub fn build(self) -> Result<Browser> {
        let cookies = self.cookies.unwrap_or_default();

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(&self.config, cookies.clone())?),
        };

        let bookmarks: Arc<dyn BookmarkStore> = match (self.bookmarks, &self.config.bookmarks_file) {
            (Some(bookmarks), _) => bookmarks,
            (None, Some(path)) => Arc::new(FileBookmarks::open(path)?),
            (None, None) => Arc::new(MemoryBookmarks::new()),
        };

        ::log::debug!("Building browser with user agent '{}'", self.config.user_agent);
        Browser::from_parts(&self.config, transport, bookmarks, cookies)
    }
}

impl Default for BrowserBuilder {
    fn default() -> Self {
        Self::new()
    }
}

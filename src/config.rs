use crate::attributes::AttributeMap;
use crate::errors::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Construction-time configuration for a browser
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// User-Agent header value sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Attribute overrides; attributes not listed are on
    #[serde(default)]
    pub attributes: AttributeMap,

    /// Additional headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Maximum number of redirect hops followed for one request
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Overall request timeout in seconds, left to the client default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// JSON file backing the bookmarks (kept in memory when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmarks_file: Option<PathBuf>,
}

impl BrowserConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self {
            user_agent: default_user_agent(),
            attributes: AttributeMap::new(),
            headers: BTreeMap::new(),
            max_redirects: default_max_redirects(),
            timeout_secs: None,
            bookmarks_file: None,
        }
    }

    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Request timeout, if one is configured
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Default value for user_agent
fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// Default value for max_redirects
fn default_max_redirects() -> usize {
    10
}

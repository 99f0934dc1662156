use crate::attributes::{Attribute, Attributes};
use crate::errors::{Error, Result};
use std::sync::Arc;
use url::Url;

/// Decides, hop by hop, whether a transport may follow a redirect.
#[derive(Debug, Clone)]
pub struct RedirectGate {
    attributes: Arc<Attributes>,
    max_redirects: usize,
}

impl RedirectGate {
    /// A gate reading `FollowRedirects` from the live attributes.
    pub fn new(attributes: Arc<Attributes>, max_redirects: usize) -> Self {
        Self {
            attributes,
            max_redirects,
        }
    }

    pub fn max_redirects(&self) -> usize {
        self.max_redirects
    }

    /// Called before following `target`, with the number of hops already taken.
    pub fn check(&self, target: &Url, followed: usize) -> Result<()> {
        if !self.attributes.get(Attribute::FollowRedirects) {
            ::log::debug!("Redirect to {} blocked by policy", target);
            return Err(Error::RedirectBlocked {
                url: target.clone(),
            });
        }
        if followed >= self.max_redirects {
            return Err(Error::TooManyRedirects(followed));
        }
        ::log::debug!("Following redirect {} to {}", followed + 1, target);
        Ok(())
    }
}

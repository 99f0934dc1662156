use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// A browser capability that can be switched on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    /// Send the Referer header when navigating from a page.
    SendReferer,
    /// Reload pages that carry a `<meta http-equiv="refresh">` tag.
    MetaRefreshHandling,
    /// Follow `Location` headers.
    FollowRedirects,
}

impl Attribute {
    pub const ALL: [Attribute; 3] = [
        Attribute::SendReferer,
        Attribute::MetaRefreshHandling,
        Attribute::FollowRedirects,
    ];

    /// Every attribute is on unless configured otherwise.
    pub fn default_value(self) -> bool {
        true
    }
}

/// Attribute values keyed by attribute, as found in configuration files.
pub type AttributeMap = HashMap<Attribute, bool>;

/// Live attribute values shared between the browser and its redirect gate.
///
/// Values are read on every request and every redirect hop, so changes take
/// effect on the next exchange.
#[derive(Debug)]
pub struct Attributes {
    send_referer: AtomicBool,
    meta_refresh_handling: AtomicBool,
    follow_redirects: AtomicBool,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            send_referer: AtomicBool::new(Attribute::SendReferer.default_value()),
            meta_refresh_handling: AtomicBool::new(Attribute::MetaRefreshHandling.default_value()),
            follow_redirects: AtomicBool::new(Attribute::FollowRedirects.default_value()),
        }
    }
}

impl Attributes {
    /// Builds attributes from a map; attributes missing from the map keep their default.
    pub fn from_map(map: &AttributeMap) -> Self {
        let attributes = Self::default();
        attributes.apply(map);
        attributes
    }

    fn slot(&self, attribute: Attribute) -> &AtomicBool {
        match attribute {
            Attribute::SendReferer => &self.send_referer,
            Attribute::MetaRefreshHandling => &self.meta_refresh_handling,
            Attribute::FollowRedirects => &self.follow_redirects,
        }
    }

    /// Current value of one attribute.
    pub fn get(&self, attribute: Attribute) -> bool {
        self.slot(attribute).load(Ordering::SeqCst)
    }

    /// Changes one attribute.
    pub fn set(&self, attribute: Attribute, value: bool) {
        ::log::debug!("Attribute {:?} set to {}", attribute, value);
        self.slot(attribute).store(value, Ordering::SeqCst);
    }

    /// Sets every attribute present in the map.
    pub fn apply(&self, map: &AttributeMap) {
        for (attribute, value) in map {
            self.set(*attribute, *value);
        }
    }

    /// Copies every attribute into a map.
    pub fn snapshot(&self) -> AttributeMap {
        Attribute::ALL.iter().map(|a| (*a, self.get(*a))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_on() {
        let attributes = Attributes::default();
        for attribute in Attribute::ALL {
            assert!(attributes.get(attribute), "{:?} should default to true", attribute);
        }
    }

    #[test]
    fn test_from_map_keeps_missing_defaults() {
        let mut map = AttributeMap::new();
        map.insert(Attribute::FollowRedirects, false);
        let attributes = Attributes::from_map(&map);

        assert!(!attributes.get(Attribute::FollowRedirects));
        assert!(attributes.get(Attribute::SendReferer));
        assert!(attributes.get(Attribute::MetaRefreshHandling));
    }

    #[test]
    fn test_attribute_names_in_json() {
        let map: AttributeMap =
            serde_json::from_str(r#"{"send_referer": false, "meta_refresh_handling": true}"#)
                .unwrap();
        assert_eq!(map.get(&Attribute::SendReferer), Some(&false));
        assert_eq!(map.get(&Attribute::MetaRefreshHandling), Some(&true));
        assert_eq!(map.get(&Attribute::FollowRedirects), None);
    }
}

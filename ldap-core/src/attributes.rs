//! Case-insensitive attribute map for directory entries
//!
//! LDAP attribute names are case-insensitive, so the map normalizes every
//! name to ASCII lowercase on insert and lookup. Values keep their insertion
//! order, which matters for multi-valued attributes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Ordered, case-insensitively keyed attribute map
///
/// This is an explicit data structure, not a dynamic accessor facade:
/// callers look attributes up by name and get back the full ordered value
/// list for that attribute.
///
/// # Usage Example
/// ```rust
/// use ldap_core::AttributeMap;
///
/// let mut entry = AttributeMap::new();
/// entry.insert("cn", "John Smith");
/// assert_eq!(entry.get("CN"), Some(&["John Smith".to_string()][..]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeMap {
    attributes: HashMap<String, Vec<String>>,
}

impl AttributeMap {
    /// Create an empty attribute map
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value to the named attribute
    ///
    /// The attribute name is normalized to ASCII lowercase. Existing values
    /// for the same attribute are kept; the new value is appended.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.attributes
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(value.into());
    }

    /// Look up an attribute by name, case-insensitively
    ///
    /// Returns `None` when the attribute is absent. An attribute that was
    /// never inserted has no entry, so "absent" and "empty" are the same
    /// observable state.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.attributes
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
    }

    /// Number of distinct attribute names
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Whether the map holds no attributes
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Adapter for filter evaluation: a lookup closure over this map
    pub fn lookup<'a>(&'a self) -> impl Fn(&str) -> Option<&'a [String]> + 'a {
        move |name| self.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_lookup() {
        let mut map = AttributeMap::new();
        map.insert("objectClass", "person");
        map.insert("OBJECTCLASS", "top");

        let values = map.get("objectclass").unwrap();
        assert_eq!(values, &["person".to_string(), "top".to_string()]);
    }

    #[test]
    fn test_missing_attribute() {
        let map = AttributeMap::new();
        assert_eq!(map.get("cn"), None);
    }

    #[test]
    fn test_lookup_adapter() {
        let mut map = AttributeMap::new();
        map.insert("cn", "alice");
        let lookup = map.lookup();
        assert!(lookup("CN").is_some());
        assert!(lookup("sn").is_none());
    }
}

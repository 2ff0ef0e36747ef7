use std::collections::BTreeMap;
use std::fmt;

use crate::types::SortKey;

pub const SEARCH_KEY: &str = "search";
pub const SORT_KEY: &str = "sort";
pub const CATEGORY_KEY: &str = "cats";
pub const STATUS_KEY: &str = "status";
pub const FEATURED_KEY: &str = "is_featured";
pub const ALPHABET_KEY: &str = "name_like";

/// Filter, sort and search parameters for the store list.
///
/// An unset parameter is represented by the key being absent, never by an
/// empty value. Equality is defined by the canonical serialization, which is
/// also the fingerprint the list controller uses to detect changes.
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    params: BTreeMap<String, String>,
    search: Option<String>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a URL query string such as `?cats=3&sort=name&search=coffee`.
    pub fn from_query(query: &str) -> Self {
        let mut state = Self::new();
        let query = query.strip_prefix('?').unwrap_or(query);

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let mut parts = pair.splitn(2, '=');
            let Some(key) = parts.next().map(decode_component) else {
                continue;
            };
            let value = parts.next().map(decode_component).unwrap_or_default();
            state.set(&key, &value);
        }

        state
    }

    /// Insert or overwrite a parameter. An empty value clears it.
    pub fn set(&mut self, key: &str, value: &str) {
        if key == SEARCH_KEY {
            self.set_search(value);
            return;
        }
        if key.is_empty() || value.trim().is_empty() {
            self.clear(key);
            return;
        }
        self.params.insert(key.to_string(), value.to_string());
    }

    pub fn clear(&mut self, key: &str) {
        if key == SEARCH_KEY {
            self.search = None;
        } else {
            self.params.remove(key);
        }
    }

    /// Copy of this state with the free-text search replaced.
    /// Whitespace-only text clears the search.
    pub fn with_search(&self, text: &str) -> Self {
        let mut next = self.clone();
        next.set_search(text);
        next
    }

    fn set_search(&mut self, text: &str) {
        let trimmed = text.trim();
        self.search = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        if key == SEARCH_KEY {
            return self.search();
        }
        self.params.get(key).map(String::as_str)
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn sort(&self) -> Option<SortKey> {
        self.get(SORT_KEY).and_then(SortKey::parse)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.search.is_none()
    }

    /// Non-search parameters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Canonical `key=value&...` encoding with keys in sorted order.
    pub fn serialize(&self) -> String {
        let mut pairs: Vec<(&str, &str)> = self.iter().collect();
        if let Some(search) = self.search() {
            pairs.push((SEARCH_KEY, search));
        }
        pairs.sort_by(|a, b| a.0.cmp(b.0));

        pairs
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .unwrap_or(spaced)
}

impl PartialEq for FilterState {
    fn eq(&self, other: &Self) -> bool {
        self.serialize() == other.serialize()
    }
}

impl Eq for FilterState {}

impl fmt::Display for FilterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.serialize())
    }
}

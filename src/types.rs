use serde::{Deserialize, Deserializer};
use std::fmt;

/// Anything the list controller can hold. The id is the only field it reads.
pub trait Identified {
    fn id(&self) -> &str;
}

/// Catalog ids arrive as either JSON numbers or strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

fn id_from_number_or_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}

/// A store record from the catalog
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Store {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "optional_id")]
    pub cats: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub cashback: Option<f64>,
    #[serde(default)]
    pub is_featured: bool,
}

impl Identified for Store {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Category {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub id: String,
    pub name: String,
}

/// One page of results for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub requested_page: u32,
    pub is_last: bool,
}

impl<T> Page<T> {
    /// A short (or empty) batch means the collection is exhausted.
    pub fn from_batch(items: Vec<T>, requested_page: u32, page_size: u32) -> Self {
        let is_last = items.is_empty() || items.len() < page_size as usize;
        Self {
            items,
            requested_page,
            is_last,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

impl fmt::Display for ListStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListStatus::Idle => write!(f, "Idle"),
            ListStatus::Loading => write!(f, "Loading"),
            ListStatus::Ready => write!(f, "Ready"),
            ListStatus::Error => write!(f, "Error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Logical sort keys exposed to the UI. Each maps to one or more backend
/// fields; the first field is the primary key, the rest are tiebreaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Name,
    NameDesc,
    Newest,
    Cashback,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [
        SortKey::Name,
        SortKey::NameDesc,
        SortKey::Newest,
        SortKey::Cashback,
    ];

    pub fn parse(value: &str) -> Option<SortKey> {
        Self::ALL.into_iter().find(|k| k.as_param() == value)
    }

    /// Value stored under the `sort` filter key.
    pub fn as_param(&self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::NameDesc => "name_desc",
            SortKey::Newest => "newest",
            SortKey::Cashback => "cashback",
        }
    }

    pub fn backend_fields(&self) -> &'static [(&'static str, SortOrder)] {
        match self {
            SortKey::Name => &[("name", SortOrder::Asc)],
            SortKey::NameDesc => &[("name", SortOrder::Desc)],
            SortKey::Newest => &[("id", SortOrder::Desc)],
            SortKey::Cashback => &[("cashback", SortOrder::Desc), ("name", SortOrder::Asc)],
        }
    }

    /// Next entry for the sort picker; `None` means "unsorted".
    pub fn cycle(current: Option<SortKey>) -> Option<SortKey> {
        match current {
            None => Some(SortKey::Name),
            Some(SortKey::Name) => Some(SortKey::NameDesc),
            Some(SortKey::NameDesc) => Some(SortKey::Newest),
            Some(SortKey::Newest) => Some(SortKey::Cashback),
            Some(SortKey::Cashback) => None,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Name => write!(f, "Name A-Z"),
            SortKey::NameDesc => write!(f, "Name Z-A"),
            SortKey::Newest => write!(f, "Newest"),
            SortKey::Cashback => write!(f, "Cashback"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_accepts_numeric_id() {
        let store: Store =
            serde_json::from_str(r#"{"id": 42, "name": "Acme", "cats": 3}"#).unwrap();
        assert_eq!(store.id, "42");
        assert_eq!(store.cats.as_deref(), Some("3"));
        assert!(!store.is_featured);
    }

    #[test]
    fn store_accepts_string_id_and_ignores_unknown_fields() {
        let store: Store = serde_json::from_str(
            r#"{"id": "store-7", "name": "Beta", "logo": "x.png", "is_featured": true}"#,
        )
        .unwrap();
        assert_eq!(store.id(), "store-7");
        assert!(store.is_featured);
    }

    #[test]
    fn category_ids_and_null_cats_share_id_parsing() {
        let category: Category = serde_json::from_str(r#"{"id": 3, "name": "Food"}"#).unwrap();
        assert_eq!(category.id, "3");

        let store: Store =
            serde_json::from_str(r#"{"id": 1, "name": "Acme", "cats": null}"#).unwrap();
        assert_eq!(store.cats, None);
        let store: Store =
            serde_json::from_str(r#"{"id": 1, "name": "Acme", "cats": "food"}"#).unwrap();
        assert_eq!(store.cats.as_deref(), Some("food"));
    }

    #[test]
    fn full_batch_is_not_last() {
        let page = Page::from_batch(vec![0; 20], 1, 20);
        assert!(!page.is_last);
    }

    #[test]
    fn short_or_empty_batch_is_last() {
        assert!(Page::from_batch(vec![0; 5], 2, 20).is_last);
        assert!(Page::<u8>::from_batch(vec![], 3, 20).is_last);
    }

    #[test]
    fn sort_key_param_parses_back() {
        for key in SortKey::ALL {
            assert_eq!(SortKey::parse(key.as_param()), Some(key));
        }
        assert_eq!(SortKey::parse("bogus"), None);
    }

    #[test]
    fn cashback_sort_has_tiebreak() {
        let fields = SortKey::Cashback.backend_fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0], ("cashback", SortOrder::Desc));
        assert_eq!(fields[1], ("name", SortOrder::Asc));
    }

    #[test]
    fn sort_cycle_returns_to_unsorted() {
        let mut key = None;
        for _ in 0..SortKey::ALL.len() {
            key = SortKey::cycle(key);
            assert!(key.is_some());
        }
        assert_eq!(SortKey::cycle(key), None);
    }
}

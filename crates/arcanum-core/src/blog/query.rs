//! Article list queries and their canonical cache key.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default page size for article list queries.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Filter and pagination parameters for the article list endpoint.
///
/// `keyword` and `title` are the same filter; `keyword` wins when both are
/// set. Unset and empty fields are semantically absent and never reach the
/// wire or the cache key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleListQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_num: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ArticleListQuery {
    /// Effective page number (1-based; zero and unset both resolve to 1).
    pub fn page_num(&self) -> u32 {
        match self.page_num {
            Some(n) if n > 0 => n,
            _ => 1,
        }
    }

    /// Effective page size.
    pub fn page_size(&self) -> u32 {
        match self.page_size {
            Some(n) if n > 0 => n,
            _ => DEFAULT_PAGE_SIZE,
        }
    }

    /// Effective title filter (`keyword` falling back to `title`).
    pub fn title_filter(&self) -> Option<&str> {
        self.keyword.as_deref().or(self.title.as_deref())
    }
}

/// A canonical serialization of a query's semantically meaningful fields.
///
/// Two queries that differ only in field presence (`None` vs. omitted vs.
/// empty string) or in field insertion order produce the same key, so
/// equivalent logical queries collide to the same cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(String);

impl QueryKey {
    /// Builds the key from any serializable query object.
    ///
    /// Null and empty-string fields are dropped; remaining fields are
    /// serialized as a JSON object with sorted keys.
    pub fn from_query<T: Serialize>(query: &T) -> Self {
        let value = serde_json::to_value(query).unwrap_or(Value::Null);
        Self(serde_json::to_string(&compact_object(value)).unwrap_or_default())
    }

    /// The canonical string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Drops null and empty-string members from a JSON object.
///
/// serde_json's default map is ordered by key, so the result is already
/// canonical with respect to insertion order.
pub fn compact_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map
            .into_iter()
            .filter(|(_, v)| match v {
                Value::Null => false,
                Value::String(s) => !s.is_empty(),
                _ => true,
            })
            .collect(),
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_omits_null_and_empty_fields() {
        let a = QueryKey::from_query(&json!({"a": 1, "b": null}));
        let b = QueryKey::from_query(&json!({"a": 1}));
        let c = QueryKey::from_query(&json!({"a": 1, "b": ""}));
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_key_stable_under_field_reordering() {
        let a = QueryKey::from_query(&json!({"pageNum": 2, "categoryId": 5}));
        let b = QueryKey::from_query(&json!({"categoryId": 5, "pageNum": 2}));
        assert_eq!(a, b);
    }

    #[test]
    fn test_equivalent_queries_collide() {
        let explicit = ArticleListQuery {
            page_num: Some(1),
            category_id: Some(5),
            keyword: None,
            ..Default::default()
        };
        let implicit = ArticleListQuery {
            page_num: Some(1),
            category_id: Some(5),
            ..Default::default()
        };
        assert_eq!(
            QueryKey::from_query(&explicit),
            QueryKey::from_query(&implicit)
        );
    }

    #[test]
    fn test_page_defaults() {
        let query = ArticleListQuery {
            page_num: Some(0),
            ..Default::default()
        };
        assert_eq!(query.page_num(), 1);
        assert_eq!(query.page_size(), DEFAULT_PAGE_SIZE);
    }
}

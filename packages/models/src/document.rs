//! Review documents and the pages the remote API returns them in.

use serde::{Deserialize, Serialize};

/// One review/rating record returned by the API.
///
/// The schema is opaque except for the stable unique `id` field, which is
/// what pagination dedup keys on. Everything else is carried through to the
/// result sink untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(serde_json::Value);

impl Document {
    /// Wraps a raw JSON record.
    #[must_use]
    pub const fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Returns the document's unique identifier, if it carries a non-empty
    /// string `id` field. Documents without one cannot be deduplicated.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(serde_json::Value::as_str).filter(|id| !id.is_empty())
    }

    /// Returns a top-level field of the record.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Returns the underlying JSON value.
    #[must_use]
    pub const fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    /// Unwraps into the underlying JSON value.
    #[must_use]
    pub fn into_value(self) -> serde_json::Value {
        self.0
    }
}

/// One page of a paged document query.
#[derive(Debug, Clone, Default)]
pub struct ReviewPage {
    /// The documents on this page, in server order.
    pub documents: Vec<Document>,
    /// Cursor token for the next page. `None` or empty means the server
    /// has no further pages to offer.
    pub next_cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn id_requires_a_non_empty_string() {
        assert_eq!(Document::new(json!({"id": "r-1"})).id(), Some("r-1"));
        assert_eq!(Document::new(json!({"id": ""})).id(), None);
        assert_eq!(Document::new(json!({"id": 42})).id(), None);
        assert_eq!(Document::new(json!({"rating": 5})).id(), None);
    }
}

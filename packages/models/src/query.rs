//! Wire-ready query parameters and the enumerated set of recognized keys.
//!
//! The remote API takes a flat key/value query string. Rather than building
//! ad hoc string maps per endpoint, every parameter name the API recognizes
//! is a [`ParamKey`] variant, and [`QueryParameters`] is the ordered mapping
//! sent on the wire.

use std::collections::BTreeMap;

use strum_macros::{AsRefStr, Display, EnumString, IntoStaticStr};

/// A query parameter name recognized by the remote reviews API.
///
/// The string form (via [`Display`]/[`AsRef<str>`]) is the exact wire name.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    AsRefStr,
    IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum ParamKey {
    /// Inclusive lower bound of the review date range (`YYYY-MM-DD`).
    StartDate,
    /// Inclusive upper bound of the review date range (`YYYY-MM-DD`).
    EndDate,
    /// Product category.
    Category,
    /// Product subcategory.
    Subcategory,
    /// Comma-joined brand names.
    Brand,
    /// Comma-joined country names.
    Country,
    /// Comma-joined review sources.
    Source,
    /// Comma-joined markets.
    Market,
    /// Comma-joined attribute tags (any polarity).
    Attribute,
    /// Comma-joined positively-mentioned attribute tags.
    AttributePositive,
    /// Comma-joined negatively-mentioned attribute tags.
    AttributeNegative,
    /// Comma-joined product identifiers.
    Product,
    /// Page size for paginated document queries.
    Rows,
    /// Pagination cursor token. `"*"` denotes the start of the result set.
    ///
    /// This is the single canonical cursor parameter name; the response
    /// carries the follow-up token in its `nextCursorMark` field.
    #[strum(serialize = "cursorMark")]
    Cursor,
    /// Seed requesting a stable random ordering from the server.
    Random,
    /// API authentication token. Appended by the client, never logged.
    Token,
}

impl ParamKey {
    /// Returns `true` for the fetch-control parameters that must be absent
    /// from a metrics query so its count matches the paged result set.
    #[must_use]
    pub const fn is_pagination(self) -> bool {
        matches!(self, Self::Rows | Self::Cursor | Self::Random)
    }
}

/// Flattened key/value parameter mapping sent to the remote API.
///
/// Derived deterministically from a [`crate::FilterSet`]; never converted
/// back. Iteration order is the key order, which keeps request URLs stable
/// for logging and caching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParameters(BTreeMap<ParamKey, String>);

impl QueryParameters {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Sets a parameter, replacing any previous value for the key.
    pub fn set(&mut self, key: ParamKey, value: impl Into<String>) {
        self.0.insert(key, value.into());
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, key: ParamKey, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets a list-valued parameter as a comma-joined string, or does
    /// nothing if the list is empty.
    pub fn set_list(&mut self, key: ParamKey, values: &[String]) {
        if !values.is_empty() {
            self.0.insert(key, values.join(","));
        }
    }

    /// Returns the value for a key, if present.
    #[must_use]
    pub fn get(&self, key: ParamKey) -> Option<&str> {
        self.0.get(&key).map(String::as_str)
    }

    /// Removes a parameter, returning its previous value.
    pub fn remove(&mut self, key: ParamKey) -> Option<String> {
        self.0.remove(&key)
    }

    /// Returns `true` if no parameters are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a copy with the given cursor token set.
    #[must_use]
    pub fn with_cursor(&self, cursor: &str) -> Self {
        let mut params = self.clone();
        params.set(ParamKey::Cursor, cursor);
        params
    }

    /// Returns a copy with all pagination-control parameters removed.
    ///
    /// Metrics queries must carry the same filter criteria as the paged
    /// fetch they size, minus `rows`/`cursorMark`/`random`.
    #[must_use]
    pub fn without_pagination(&self) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(key, _)| !key.is_pagination())
                .map(|(key, value)| (*key, value.clone()))
                .collect(),
        )
    }

    /// Returns `(wire name, value)` pairs suitable for
    /// `reqwest::RequestBuilder::query`.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, &str)> {
        self.0
            .iter()
            .map(|(key, value)| ((*key).into(), value.as_str()))
            .collect()
    }

    /// Iterates over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (ParamKey, &str)> {
        self.0.iter().map(|(key, value)| (*key, value.as_str()))
    }
}

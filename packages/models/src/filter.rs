//! User-chosen selection criteria and their flattening to wire parameters.

use chrono::{Local, NaiveDate};

use crate::config::ConfigError;
use crate::query::{ParamKey, QueryParameters};

/// Sentinel value meaning "no restriction" for scalar and list filters.
///
/// `ALL` (or an empty list) must be omitted from derived query parameters,
/// never sent literally.
pub const ALL: &str = "ALL";

/// A user's declarative selection criteria before translation to wire
/// parameters.
///
/// An immutable snapshot: one fetch operation consumes one `FilterSet`,
/// and changing filters produces a new one rather than mutating this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSet {
    /// Inclusive start of the review date range.
    pub start_date: NaiveDate,
    /// Inclusive end of the review date range.
    pub end_date: NaiveDate,
    /// Product category, or [`ALL`].
    pub category: String,
    /// Product subcategory, or [`ALL`].
    pub subcategory: String,
    /// Selected brands. Empty means unrestricted.
    pub brands: Vec<String>,
    /// Selected countries. Empty or containing [`ALL`] means unrestricted.
    pub countries: Vec<String>,
    /// Selected review sources. Empty or containing [`ALL`] means
    /// unrestricted.
    pub sources: Vec<String>,
    /// Selected markets. Empty or containing [`ALL`] means unrestricted.
    pub markets: Vec<String>,
    /// Attribute tags that must be mentioned (any polarity).
    pub attributes: Vec<String>,
    /// Attribute tags that must be mentioned positively.
    pub attributes_positive: Vec<String>,
    /// Attribute tags that must be mentioned negatively.
    pub attributes_negative: Vec<String>,
}

impl Default for FilterSet {
    fn default() -> Self {
        Self {
            start_date: default_start_date(),
            end_date: Local::now().date_naive(),
            category: ALL.to_owned(),
            subcategory: ALL.to_owned(),
            brands: Vec::new(),
            countries: Vec::new(),
            sources: Vec::new(),
            markets: Vec::new(),
            attributes: Vec::new(),
            attributes_positive: Vec::new(),
            attributes_negative: Vec::new(),
        }
    }
}

/// Default start of the date range when none is configured.
#[must_use]
pub fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 1).unwrap_or_default()
}

impl FilterSet {
    /// Checks the date-range invariant (`start_date <= end_date`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DateRange`] if the range is inverted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_date > self.end_date {
            return Err(ConfigError::DateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        Ok(())
    }

    /// Flattens the filter set into wire-ready query parameters.
    ///
    /// `ALL` scalars and unrestricted lists are omitted entirely; list
    /// values are comma-joined. When `product_ids` is given, the explicit
    /// product restriction is included (manual export call sites).
    #[must_use]
    pub fn to_query_parameters(&self, product_ids: Option<&[String]>) -> QueryParameters {
        let mut params = QueryParameters::new();

        params.set(
            ParamKey::StartDate,
            self.start_date.format("%Y-%m-%d").to_string(),
        );
        params.set(
            ParamKey::EndDate,
            self.end_date.format("%Y-%m-%d").to_string(),
        );

        if self.category != ALL && !self.category.is_empty() {
            params.set(ParamKey::Category, self.category.clone());
        }
        if self.subcategory != ALL && !self.subcategory.is_empty() {
            params.set(ParamKey::Subcategory, self.subcategory.clone());
        }

        params.set_list(ParamKey::Brand, &self.brands);

        if is_restricted(&self.countries) {
            params.set_list(ParamKey::Country, &self.countries);
        }
        if is_restricted(&self.sources) {
            params.set_list(ParamKey::Source, &self.sources);
        }
        if is_restricted(&self.markets) {
            params.set_list(ParamKey::Market, &self.markets);
        }

        params.set_list(ParamKey::Attribute, &self.attributes);
        params.set_list(ParamKey::AttributePositive, &self.attributes_positive);
        params.set_list(ParamKey::AttributeNegative, &self.attributes_negative);

        if let Some(ids) = product_ids {
            params.set_list(ParamKey::Product, ids);
        }

        params
    }
}

/// A list filter restricts the query only when it is non-empty and does not
/// contain the [`ALL`] sentinel.
fn is_restricted(values: &[String]) -> bool {
    !values.is_empty() && !values.iter().any(|value| value == ALL)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters() -> FilterSet {
        FilterSet {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            brands: vec!["AVENE".to_owned(), "BIODERMA".to_owned()],
            ..FilterSet::default()
        }
    }

    #[test]
    fn all_sentinel_is_omitted_from_params() {
        let params = filters().to_query_parameters(None);
        assert!(params.get(ParamKey::Category).is_none());
        assert!(params.get(ParamKey::Subcategory).is_none());
        assert_eq!(params.get(ParamKey::Brand), Some("AVENE,BIODERMA"));
    }

    #[test]
    fn list_containing_all_is_unrestricted() {
        let mut set = filters();
        set.countries = vec!["ALL".to_owned(), "France".to_owned()];
        let params = set.to_query_parameters(None);
        assert!(params.get(ParamKey::Country).is_none());
    }

    #[test]
    fn dates_are_wire_formatted() {
        let params = filters().to_query_parameters(None);
        assert_eq!(params.get(ParamKey::StartDate), Some("2024-01-01"));
        assert_eq!(params.get(ParamKey::EndDate), Some("2024-06-30"));
    }

    #[test]
    fn product_ids_only_appear_when_requested() {
        let ids = vec!["p1".to_owned(), "p2".to_owned()];
        let with = filters().to_query_parameters(Some(&ids));
        let without = filters().to_query_parameters(None);
        assert_eq!(with.get(ParamKey::Product), Some("p1,p2"));
        assert!(without.get(ParamKey::Product).is_none());
    }

    #[test]
    fn inverted_date_range_is_rejected() {
        let mut set = filters();
        set.end_date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        assert!(set.validate().is_err());
        assert!(filters().validate().is_ok());
    }
}

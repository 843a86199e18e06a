//! Human-editable JSON interchange format for export configurations.
//!
//! A configuration carries a [`FilterSet`], an optional explicit product
//! selection, and an export-mode tag. Import is all-or-nothing: a
//! configuration that fails to parse or validate is reported as a
//! [`ConfigError`] and nothing is applied.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::filter::{ALL, FilterSet, default_start_date};

/// Errors produced by configuration import.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The input is not valid JSON (or not a JSON object).
    #[error("configuration is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A date field does not parse as `YYYY-MM-DD`.
    #[error("invalid {field} '{value}': expected YYYY-MM-DD")]
    InvalidDate {
        /// Which date field was malformed.
        field: &'static str,
        /// The rejected value.
        value: String,
    },

    /// The date range is inverted.
    #[error("date range start {start} is after end {end}")]
    DateRange {
        /// Configured range start.
        start: NaiveDate,
        /// Configured range end.
        end: NaiveDate,
    },

    /// The configuration selects no brands at all.
    #[error("configuration selects no brands")]
    NoBrands,
}

/// Which export flow a configuration is meant for.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ExportKind {
    /// Manual export of an explicitly selected product list.
    Standard,
    /// Bulk export of every product of the selected brands. Any product
    /// list in the configuration is ignored.
    BulkByBrand,
}

/// The flat JSON interchange document.
///
/// Field names match the wire parameter names (`start-date`, `end-date`).
/// List fields are accepted either as JSON arrays or as comma-joined
/// strings; brand/country/source/market are always emitted comma-joined.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Inclusive range start, `YYYY-MM-DD`. Defaults to 2022-01-01.
    #[serde(rename = "start-date", default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// Inclusive range end, `YYYY-MM-DD`. Defaults to today.
    #[serde(rename = "end-date", default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    /// Category, or `ALL`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Subcategory, or `ALL`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    /// Selected brands.
    #[serde(
        default,
        deserialize_with = "list_or_string",
        serialize_with = "join_comma",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub brand: Vec<String>,
    /// Selected countries.
    #[serde(
        default,
        deserialize_with = "list_or_string",
        serialize_with = "join_comma",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub country: Vec<String>,
    /// Selected sources.
    #[serde(
        default,
        deserialize_with = "list_or_string",
        serialize_with = "join_comma",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub source: Vec<String>,
    /// Selected markets.
    #[serde(
        default,
        deserialize_with = "list_or_string",
        serialize_with = "join_comma",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub market: Vec<String>,
    /// Attribute tags (any polarity).
    #[serde(default, deserialize_with = "list_or_string", skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<String>,
    /// Positively-mentioned attribute tags.
    #[serde(default, deserialize_with = "list_or_string", skip_serializing_if = "Vec::is_empty")]
    pub attributes_positive: Vec<String>,
    /// Negatively-mentioned attribute tags.
    #[serde(default, deserialize_with = "list_or_string", skip_serializing_if = "Vec::is_empty")]
    pub attributes_negative: Vec<String>,
    /// Explicitly selected product identifiers.
    #[serde(default, deserialize_with = "list_or_string", skip_serializing_if = "Vec::is_empty")]
    pub selected_products: Vec<String>,
    /// Which export flow this configuration is meant for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_mode: Option<ExportKind>,
    /// Free-form note carried through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A configuration that parsed and validated in full.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// The validated filter snapshot.
    pub filters: FilterSet,
    /// Explicit product selection (empty for bulk exports).
    pub product_ids: Vec<String>,
    /// Which export flow to run.
    pub kind: ExportKind,
}

impl ExportConfig {
    /// Parses an interchange document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if the input is not a valid JSON
    /// object of the expected shape.
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(input.trim())?)
    }

    /// Validates the document and resolves it into a [`ResolvedConfig`].
    ///
    /// Nothing is applied on failure: the caller keeps its previous state.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a date is malformed, the range is
    /// inverted, or no brand is selected.
    pub fn resolve(&self) -> Result<ResolvedConfig, ConfigError> {
        let start_date = match &self.start_date {
            Some(value) => parse_date("start-date", value)?,
            None => default_start_date(),
        };
        let end_date = match &self.end_date {
            Some(value) => parse_date("end-date", value)?,
            None => Local::now().date_naive(),
        };

        if self.brand.is_empty() {
            return Err(ConfigError::NoBrands);
        }

        let filters = FilterSet {
            start_date,
            end_date,
            category: self.category.clone().unwrap_or_else(|| ALL.to_owned()),
            subcategory: self.subcategory.clone().unwrap_or_else(|| ALL.to_owned()),
            brands: self.brand.clone(),
            countries: self.country.clone(),
            sources: self.source.clone(),
            markets: self.market.clone(),
            attributes: self.attributes.clone(),
            attributes_positive: self.attributes_positive.clone(),
            attributes_negative: self.attributes_negative.clone(),
        };
        filters.validate()?;

        let kind = self.export_mode.unwrap_or(ExportKind::Standard);
        let product_ids = match kind {
            // Bulk mode covers every product of the selected brands.
            ExportKind::BulkByBrand => Vec::new(),
            ExportKind::Standard => self.selected_products.clone(),
        };

        Ok(ResolvedConfig {
            filters,
            product_ids,
            kind,
        })
    }

    /// Builds an interchange document from a filter snapshot.
    #[must_use]
    pub fn from_filters(
        filters: &FilterSet,
        selected_products: Option<&[String]>,
        kind: ExportKind,
    ) -> Self {
        let unrestricted = |values: &[String]| values.iter().any(|value| value == ALL);
        Self {
            start_date: Some(filters.start_date.format("%Y-%m-%d").to_string()),
            end_date: Some(filters.end_date.format("%Y-%m-%d").to_string()),
            category: Some(filters.category.clone()),
            subcategory: Some(filters.subcategory.clone()),
            brand: filters.brands.clone(),
            country: if unrestricted(&filters.countries) {
                Vec::new()
            } else {
                filters.countries.clone()
            },
            source: if unrestricted(&filters.sources) {
                Vec::new()
            } else {
                filters.sources.clone()
            },
            market: if unrestricted(&filters.markets) {
                Vec::new()
            } else {
                filters.markets.clone()
            },
            attributes: filters.attributes.clone(),
            attributes_positive: filters.attributes_positive.clone(),
            attributes_negative: filters.attributes_negative.clone(),
            selected_products: selected_products.map(<[String]>::to_vec).unwrap_or_default(),
            export_mode: Some(kind),
            note: None,
        }
    }

    /// Renders the document as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| ConfigError::InvalidDate {
        field,
        value: value.to_owned(),
    })
}

/// Accepts a list field written either as a JSON array or as a
/// comma-joined string.
fn list_or_string<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Joined(String),
        List(Vec<String>),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(Raw::Joined(joined)) => joined
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(ToOwned::to_owned)
            .collect(),
        Some(Raw::List(list)) => list,
    })
}

fn join_comma<S>(values: &[String], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&values.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_joined_and_array_lists() {
        let config = ExportConfig::parse(
            r#"{
                "start-date": "2025-01-01",
                "end-date": "2025-04-30",
                "brand": "AVENE, aderma,BIODERMA",
                "country": ["France", "Italy"]
            }"#,
        )
        .unwrap();

        assert_eq!(config.brand, vec!["AVENE", "aderma", "BIODERMA"]);
        assert_eq!(config.country, vec!["France", "Italy"]);
    }

    #[test]
    fn rejects_malformed_json_without_applying() {
        assert!(matches!(
            ExportConfig::parse("{\"brand\": \"A\","),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn rejects_bad_dates() {
        let config = ExportConfig {
            start_date: Some("01/02/2024".to_owned()),
            brand: vec!["A".to_owned()],
            ..ExportConfig::default()
        };
        assert!(matches!(
            config.resolve(),
            Err(ConfigError::InvalidDate { field: "start-date", .. })
        ));
    }

    #[test]
    fn rejects_inverted_range_and_missing_brands() {
        let inverted = ExportConfig {
            start_date: Some("2024-06-01".to_owned()),
            end_date: Some("2024-01-01".to_owned()),
            brand: vec!["A".to_owned()],
            ..ExportConfig::default()
        };
        assert!(matches!(inverted.resolve(), Err(ConfigError::DateRange { .. })));

        let empty = ExportConfig {
            start_date: Some("2024-01-01".to_owned()),
            end_date: Some("2024-06-01".to_owned()),
            ..ExportConfig::default()
        };
        assert!(matches!(empty.resolve(), Err(ConfigError::NoBrands)));
    }

    #[test]
    fn missing_dates_fall_back_to_defaults() {
        let config = ExportConfig {
            brand: vec!["A".to_owned()],
            ..ExportConfig::default()
        };
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.filters.start_date, default_start_date());
        assert_eq!(resolved.filters.end_date, Local::now().date_naive());
    }

    #[test]
    fn bulk_mode_ignores_the_product_selection() {
        let config = ExportConfig {
            brand: vec!["A".to_owned()],
            selected_products: vec!["p1".to_owned()],
            export_mode: Some(ExportKind::BulkByBrand),
            ..ExportConfig::default()
        };
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.kind, ExportKind::BulkByBrand);
        assert!(resolved.product_ids.is_empty());
    }

    #[test]
    fn round_trips_through_the_wire_shape() {
        let filters = FilterSet {
            brands: vec!["A".to_owned(), "B".to_owned()],
            countries: vec!["France".to_owned()],
            ..FilterSet::default()
        };
        let config =
            ExportConfig::from_filters(&filters, Some(&["p1".to_owned()]), ExportKind::Standard);
        let json = config.to_json_pretty().unwrap();

        // Brand lists travel as comma-joined strings.
        assert!(json.contains("\"brand\": \"A,B\""));

        let reparsed = ExportConfig::parse(&json).unwrap().resolve().unwrap();
        assert_eq!(reparsed.filters.brands, filters.brands);
        assert_eq!(reparsed.product_ids, vec!["p1".to_owned()]);
    }

    #[test]
    fn export_kind_wire_names() {
        assert_eq!(ExportKind::Standard.as_ref(), "STANDARD");
        assert_eq!(ExportKind::BulkByBrand.as_ref(), "BULK_BY_BRAND");
    }
}

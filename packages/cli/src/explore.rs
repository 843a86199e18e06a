//! Interactive filter building and product browsing over the catalogue
//! endpoints.
//!
//! Walks the user from the category taxonomy down to brands, geography,
//! and attribute tags, producing a validated [`FilterSet`]; separately
//! lists the matching products brand by brand, with per-product review
//! counts fetched on demand from the metrics endpoint.

use chrono::{Local, NaiveDate};
use dialoguer::{Input, MultiSelect, Select};
use review_harvest_api::ApiClient;
use review_harvest_models::filter::{ALL, default_start_date};
use review_harvest_models::{FilterSet, ParamKey};
use serde_json::Value;

type BoxError = Box<dyn std::error::Error>;

/// Walks the user through the catalogue endpoints to a validated
/// [`FilterSet`].
///
/// # Errors
///
/// Returns an error if a catalogue request fails, a prompt is aborted,
/// or no brand is available for the chosen category.
pub async fn build_filters(client: &ApiClient) -> Result<FilterSet, BoxError> {
    let start_date = prompt_date("Start date (YYYY-MM-DD)", default_start_date())?;
    let end_date = prompt_date("End date (YYYY-MM-DD)", Local::now().date_naive())?;

    let taxonomy = client.categories().await?;
    let category = select_one("Category", &with_all(category_names(&taxonomy)))?;
    let subcategory = select_one("Subcategory", &subcategory_options(&taxonomy, &category))?;

    let brand_options = client.brands(Some(&category), Some(&subcategory)).await?;
    if brand_options.is_empty() {
        return Err("no brands available for the chosen category".into());
    }
    let brands = loop {
        let picked = select_many("Brands", &brand_options)?;
        if !picked.is_empty() {
            break picked;
        }
        println!("Select at least one brand.");
    };

    let countries = select_many("Countries (none = all)", &client.countries().await?)?;
    // A single selected country narrows the source catalogue.
    let narrowing = match countries.as_slice() {
        [only] => Some(only.as_str()),
        _ => None,
    };
    let sources = select_many("Sources (none = all)", &client.sources(narrowing).await?)?;
    let markets = select_many("Markets (none = all)", &client.markets().await?)?;

    let attribute_options = client
        .attributes(Some(&category), Some(&subcategory), &brands)
        .await?;
    let attributes = select_many("Attributes (any polarity)", &attribute_options)?;
    let attributes_positive = select_many("Positive attributes", &attribute_options)?;
    let attributes_negative = select_many("Negative attributes", &attribute_options)?;

    let filters = FilterSet {
        start_date,
        end_date,
        category,
        subcategory,
        brands,
        countries,
        sources,
        markets,
        attributes,
        attributes_positive,
        attributes_negative,
    };
    filters.validate()?;

    Ok(filters)
}

/// One product in the browser: its brand, its name, and a lazily-loaded
/// review count.
pub struct ProductRow {
    pub brand: String,
    pub product: String,
    pub reviews: Option<u64>,
}

impl ProductRow {
    #[must_use]
    pub fn label(&self) -> String {
        match self.reviews {
            Some(count) => format!("{} - {} ({count} reviews)", self.brand, self.product),
            None => format!("{} - {}", self.brand, self.product),
        }
    }
}

/// Lists the products matching the filters, brand by brand. A brand whose
/// listing fails is skipped with a warning rather than failing the whole
/// browse.
pub async fn load_products(client: &ApiClient, filters: &FilterSet) -> Vec<ProductRow> {
    let mut rows = Vec::new();
    for brand in &filters.brands {
        let criteria = brand_criteria(filters, brand);
        match client.products(&criteria).await {
            Ok(products) => {
                for product in product_names(&products) {
                    rows.push(ProductRow {
                        brand: brand.clone(),
                        product,
                        reviews: None,
                    });
                }
            }
            Err(e) => log::warn!("Failed to list products for {brand}: {e}"),
        }
    }
    rows
}

/// Fills in per-product review counts via the metrics endpoint. Rows whose
/// count request fails keep `reviews: None`.
pub async fn load_review_counts(client: &ApiClient, filters: &FilterSet, rows: &mut [ProductRow]) {
    let total = rows.len();
    for (i, row) in rows.iter_mut().enumerate() {
        log::info!("Counting reviews {}/{total}: {}", i + 1, row.product);
        let mut criteria = brand_criteria(filters, &row.brand);
        criteria.set(ParamKey::Product, row.product.clone());
        match client.metrics(&criteria).await {
            Ok(metrics) => row.reviews = Some(metrics.nb_docs),
            Err(e) => log::warn!("No review count for {}: {e}", row.product),
        }
    }
}

/// The wire criteria for the filters, narrowed to a single brand.
fn brand_criteria(
    filters: &FilterSet,
    brand: &str,
) -> review_harvest_models::QueryParameters {
    let mut narrowed = filters.clone();
    narrowed.brands = vec![brand.to_owned()];
    narrowed.to_query_parameters(None)
}

/// Category names from the `/categories` taxonomy payload.
fn category_names(taxonomy: &Value) -> Vec<String> {
    taxonomy
        .get("categories")
        .and_then(Value::as_array)
        .map(|categories| {
            categories
                .iter()
                .filter_map(|entry| entry.get("category").and_then(Value::as_str))
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// Subcategory choices for a chosen category, always led by `ALL`.
fn subcategory_options(taxonomy: &Value, category: &str) -> Vec<String> {
    let mut options = vec![ALL.to_owned()];
    if category == ALL {
        return options;
    }
    if let Some(categories) = taxonomy.get("categories").and_then(Value::as_array) {
        for entry in categories {
            if entry.get("category").and_then(Value::as_str) == Some(category)
                && let Some(subcategories) = entry.get("subcategories").and_then(Value::as_array)
            {
                options.extend(
                    subcategories
                        .iter()
                        .filter_map(Value::as_str)
                        .map(ToOwned::to_owned),
                );
            }
        }
    }
    options
}

fn product_names(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .filter_map(Value::as_str)
        .map(ToOwned::to_owned)
        .collect()
}

fn with_all(mut names: Vec<String>) -> Vec<String> {
    names.insert(0, ALL.to_owned());
    names
}

fn select_one(prompt: &str, options: &[String]) -> Result<String, BoxError> {
    let idx = Select::new()
        .with_prompt(prompt)
        .items(options)
        .default(0)
        .interact()?;
    Ok(options[idx].clone())
}

fn select_many(prompt: &str, options: &[String]) -> Result<Vec<String>, BoxError> {
    if options.is_empty() {
        return Ok(Vec::new());
    }
    let picked = MultiSelect::new()
        .with_prompt(prompt)
        .items(options)
        .interact()?;
    Ok(picked.into_iter().map(|idx| options[idx].clone()).collect())
}

fn prompt_date(prompt: &str, default: NaiveDate) -> Result<NaiveDate, BoxError> {
    let raw: String = Input::new()
        .with_prompt(prompt)
        .default(default.format("%Y-%m-%d").to_string())
        .interact_text()?;
    Ok(NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")?)
}

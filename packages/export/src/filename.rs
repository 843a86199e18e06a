use review_harvest_models::{ParamKey, QueryParameters};

const MAX_FILENAME_LEN: usize = 100;
const MAX_PRODUCT_PART_LEN: usize = 15;

/// Which artifact a filename labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilenameMode {
    /// The complete result set.
    Complete,
    /// A capped preview fetch.
    Preview,
    /// One page of a paged hand-off.
    Page(u32),
}

/// Builds a descriptive export filename from the query criteria:
/// `reviews_<country>_<products>_<dates>[_apercu|_pageN].<ext>`, capped
/// at 100 characters.
#[must_use]
pub fn export_filename(params: &QueryParameters, mode: FilenameMode, extension: &str) -> String {
    let mut parts = vec!["reviews".to_string()];

    if let Some(country) = params.get(ParamKey::Country)
        && !country.is_empty()
    {
        parts.push(country.to_lowercase());
    }

    if let Some(products) = params.get(ParamKey::Product)
        && let Some(label) = product_label(products)
    {
        parts.push(label);
    }

    if let Some(range) = date_label(
        params.get(ParamKey::StartDate),
        params.get(ParamKey::EndDate),
    ) {
        parts.push(range);
    }

    match mode {
        FilenameMode::Complete => {}
        FilenameMode::Preview => parts.push("apercu".to_string()),
        FilenameMode::Page(n) => parts.push(format!("page{n}")),
    }

    let stem = parts.join("_");
    let name = format!("{stem}.{extension}");
    if name.chars().count() <= MAX_FILENAME_LEN {
        return name;
    }

    let truncated: String = stem
        .chars()
        .take(MAX_FILENAME_LEN - extension.chars().count() - 4)
        .collect();
    format!("{truncated}....{extension}")
}

/// Joins up to two sanitized product names; a `-plus` marker flags that
/// more were cut.
fn product_label(products: &str) -> Option<String> {
    let names: Vec<&str> = products
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect();
    if names.is_empty() {
        return None;
    }

    let mut label = names
        .iter()
        .take(2)
        .map(|name| sanitize_product(name))
        .collect::<Vec<_>>()
        .join("-");
    if names.len() > 2 {
        label.push_str("-plus");
    }

    Some(label)
}

fn sanitize_product(name: &str) -> String {
    name.to_lowercase()
        .replace(' ', "_")
        .replace('/', "-")
        .chars()
        .take(MAX_PRODUCT_PART_LEN)
        .collect()
}

/// Compresses the date range: within one year `YYYY_MMDD-MMDD`, across
/// years `YYYYMMDD-YYYYMMDD`.
fn date_label(start: Option<&str>, end: Option<&str>) -> Option<String> {
    let start: String = start?.chars().filter(char::is_ascii_digit).collect();
    let end: String = end?.chars().filter(char::is_ascii_digit).collect();
    if start.len() < 8 || end.len() < 8 {
        return None;
    }

    if start[..4] == end[..4] {
        Some(format!("{}_{}-{}", &start[..4], &start[4..8], &end[4..8]))
    } else {
        Some(format!("{}-{}", &start[..8], &end[..8]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(product: &str) -> QueryParameters {
        QueryParameters::new()
            .with(ParamKey::Country, "France")
            .with(ParamKey::Product, product)
            .with(ParamKey::StartDate, "2023-01-01")
            .with(ParamKey::EndDate, "2023-06-30")
    }

    #[test]
    fn same_year_range_is_compressed() {
        let name = export_filename(&params("Lip Gloss"), FilenameMode::Complete, "csv");
        assert_eq!(name, "reviews_france_lip_gloss_2023_0101-0630.csv");
    }

    #[test]
    fn cross_year_range_keeps_both_years() {
        let params = params("Serum")
            .with(ParamKey::StartDate, "2022-11-01")
            .with(ParamKey::EndDate, "2023-02-01");
        let name = export_filename(&params, FilenameMode::Complete, "csv");
        assert_eq!(name, "reviews_france_serum_20221101-20230201.csv");
    }

    #[test]
    fn preview_and_page_suffixes() {
        assert!(
            export_filename(&params("Serum"), FilenameMode::Preview, "csv").ends_with("_apercu.csv")
        );
        assert!(
            export_filename(&params("Serum"), FilenameMode::Page(3), "xlsx")
                .ends_with("_page3.xlsx")
        );
    }

    #[test]
    fn more_than_two_products_get_a_plus_marker() {
        let name = export_filename(&params("A, B, C"), FilenameMode::Complete, "csv");
        assert!(name.contains("a-b-plus"));
        assert!(!name.contains("a-b-c"));
    }

    #[test]
    fn long_product_names_are_sanitized_and_truncated() {
        let name = export_filename(
            &params("Ultra Repair Night/Day Cream Extreme"),
            FilenameMode::Complete,
            "csv",
        );
        assert!(name.contains("ultra_repair_ni"));
        assert!(!name.contains(' '));
        assert!(!name.contains('/'));
    }

    #[test]
    fn filenames_are_capped_at_100_chars() {
        let long = "x".repeat(90);
        let name = export_filename(
            &QueryParameters::new().with(ParamKey::Country, &long),
            FilenameMode::Complete,
            "csv",
        );
        assert!(name.chars().count() <= 100);
        assert!(name.ends_with(".csv"));
    }

    #[test]
    fn missing_criteria_still_produce_a_name() {
        let name = export_filename(&QueryParameters::new(), FilenameMode::Complete, "csv");
        assert_eq!(name, "reviews.csv");
    }
}

use std::collections::HashSet;

use chrono::NaiveDate;
use review_harvest_models::Document;

use crate::Table;

/// Attributes the downstream consumers expect a dedicated column for.
pub const PREDEFINED_ATTRIBUTES: [&str; 9] = [
    "Composition",
    "Efficiency",
    "Packaging",
    "Price",
    "Quality",
    "Safety",
    "Scent",
    "Taste",
    "Texture",
];

const SAFETY_ATTRIBUTES: [&str; 2] = ["Safety", "Composition"];

const RENAMES: [(&str, &str); 4] = [
    ("id", "guid"),
    ("category", "categories"),
    ("content trad", "verbatim_content"),
    ("product", "product_name_SEMANTIWEB"),
];

const DROPPED: [&str; 4] = [
    "content origin",
    "attributes",
    "attributes positive",
    "attributes negative",
];

/// Turns raw review documents into the flat consumer-facing layout:
/// renamed identifier columns, dates snapped to the first of the month,
/// one sentiment column per predefined attribute and a combined safety
/// verdict. The raw attribute list columns are dropped on the way out.
#[must_use]
pub fn postprocess_reviews(documents: &[Document]) -> Table {
    let raw = Table::from_documents(documents);

    let date_idx = raw.column_index("date");
    let indicator_idx = raw.column_index("business indicator");
    let attrs_idx = raw.column_index("attributes");
    let pos_idx = raw.column_index("attributes positive");
    let neg_idx = raw.column_index("attributes negative");

    let kept: Vec<usize> = raw
        .columns
        .iter()
        .enumerate()
        .filter(|(_, name)| !DROPPED.contains(&name.as_str()))
        .map(|(idx, _)| idx)
        .collect();

    let mut columns: Vec<String> = kept
        .iter()
        .map(|&idx| {
            let name = raw.columns[idx].as_str();
            RENAMES
                .iter()
                .find(|(from, _)| *from == name)
                .map_or_else(|| name.to_string(), |(_, to)| (*to).to_string())
        })
        .collect();
    if indicator_idx.is_some() {
        columns.push("Sampling".to_string());
    }
    for attribute in PREDEFINED_ATTRIBUTES {
        columns.push(format!("attribute_{attribute}"));
    }
    columns.push("safety".to_string());

    let rows = raw
        .rows
        .iter()
        .map(|row| {
            let mut out: Vec<String> = kept.iter().map(|&idx| row[idx].clone()).collect();

            if let Some(idx) = date_idx {
                let slot = kept.iter().position(|&k| k == idx);
                if let Some(slot) = slot {
                    out[slot] = month_bucket(&row[idx]);
                }
            }
            if let Some(idx) = indicator_idx {
                let sampled = row[idx].contains("Sampling Rate");
                out.push(if sampled { "1" } else { "0" }.to_string());
            }

            let all = attribute_set(attrs_idx.map(|idx| row[idx].as_str()));
            let positive = attribute_set(pos_idx.map(|idx| row[idx].as_str()));
            let negative = attribute_set(neg_idx.map(|idx| row[idx].as_str()));
            for attribute in PREDEFINED_ATTRIBUTES {
                out.push(sentiment(attribute, &all, &positive, &negative).to_string());
            }
            out.push(safety_verdict(&all, &positive, &negative).to_string());

            out
        })
        .collect();

    Table { columns, rows }
}

/// Collapses a review date onto the first day of its month, rendered
/// `01/MM/YYYY`. Values that do not lead with an ISO date pass through.
fn month_bucket(value: &str) -> String {
    let head: String = value.chars().take(10).collect();
    NaiveDate::parse_from_str(&head, "%Y-%m-%d").map_or_else(
        |_| value.to_string(),
        |date| date.format("01/%m/%Y").to_string(),
    )
}

/// Parses a JSON-array cell into the subset of predefined attributes it
/// mentions. Anything unparseable counts as no attributes.
fn attribute_set(cell: Option<&str>) -> HashSet<&'static str> {
    let Some(cell) = cell else {
        return HashSet::new();
    };
    let Ok(values) = serde_json::from_str::<Vec<String>>(cell) else {
        return HashSet::new();
    };

    PREDEFINED_ATTRIBUTES
        .into_iter()
        .filter(|known| values.iter().any(|value| value == known))
        .collect()
}

fn sentiment(
    attribute: &str,
    all: &HashSet<&'static str>,
    positive: &HashSet<&'static str>,
    negative: &HashSet<&'static str>,
) -> &'static str {
    let pos = positive.contains(attribute);
    let neg = negative.contains(attribute);

    if pos && neg {
        "neutre"
    } else if pos {
        "positive"
    } else if neg {
        "negative"
    } else if all.contains(attribute) {
        // Mentioned without polarity.
        "neutre"
    } else {
        "0"
    }
}

/// Combined verdict over the safety-adjacent attributes.
fn safety_verdict(
    all: &HashSet<&'static str>,
    positive: &HashSet<&'static str>,
    negative: &HashSet<&'static str>,
) -> &'static str {
    let pos = SAFETY_ATTRIBUTES.iter().any(|a| positive.contains(a));
    let neg = SAFETY_ATTRIBUTES.iter().any(|a| negative.contains(a));
    let mentioned = SAFETY_ATTRIBUTES.iter().any(|a| all.contains(a));

    if pos && neg {
        "neutre"
    } else if pos {
        "positive"
    } else if neg {
        "negative"
    } else if mentioned {
        "neutre"
    } else {
        "0"
    }
}

use std::collections::BTreeMap;

use review_harvest_models::Document;
use serde_json::Value;

/// A flat, column-ordered view over a batch of documents. Nested objects
/// are flattened into dotted column names; arrays are kept as JSON text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    #[must_use]
    pub fn from_documents(documents: &[Document]) -> Self {
        let flattened: Vec<BTreeMap<String, String>> = documents
            .iter()
            .map(|doc| {
                let mut cells = BTreeMap::new();
                if let Value::Object(fields) = doc.as_value() {
                    for (key, value) in fields {
                        flatten_into(key, value, &mut cells);
                    }
                }
                cells
            })
            .collect();

        // Column order is first-seen across the batch, so the leading
        // documents decide the layout and stragglers append at the end.
        let mut columns: Vec<String> = Vec::new();
        for cells in &flattened {
            for key in cells.keys() {
                if !columns.iter().any(|existing| existing == key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = flattened
            .into_iter()
            .map(|mut cells| {
                columns
                    .iter()
                    .map(|column| cells.remove(column).unwrap_or_default())
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub const fn row_count(&self) -> usize {
        self.rows.len()
    }
}

fn flatten_into(prefix: &str, value: &Value, out: &mut BTreeMap<String, String>) {
    match value {
        Value::Object(fields) => {
            for (key, nested) in fields {
                flatten_into(&format!("{prefix}.{key}"), nested, out);
            }
        }
        Value::Null => {
            out.insert(prefix.to_string(), String::new());
        }
        Value::String(text) => {
            out.insert(prefix.to_string(), text.clone());
        }
        Value::Array(_) => {
            out.insert(prefix.to_string(), value.to_string());
        }
        other => {
            out.insert(prefix.to_string(), other.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(value: Value) -> Document {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn flattens_nested_objects_with_dotted_names() {
        let table = Table::from_documents(&[doc(json!({
            "id": "r1",
            "source": { "name": "shop", "country": "FRA" },
            "rating": 4.5,
        }))]);

        assert_eq!(
            table.columns,
            vec!["id", "rating", "source.country", "source.name"]
        );
        assert_eq!(table.rows, vec![vec!["r1", "4.5", "FRA", "shop"]]);
    }

    #[test]
    fn arrays_become_json_text() {
        let table = Table::from_documents(&[doc(json!({
            "id": "r1",
            "attributes": ["Scent", "Price"],
        }))]);

        let idx = table.column_index("attributes").unwrap();
        assert_eq!(table.rows[0][idx], r#"["Scent","Price"]"#);
    }

    #[test]
    fn ragged_documents_pad_with_empty_cells() {
        let table = Table::from_documents(&[
            doc(json!({ "id": "r1", "rating": 3 })),
            doc(json!({ "id": "r2", "title": "ok" })),
        ]);

        assert_eq!(table.columns, vec!["id", "rating", "title"]);
        assert_eq!(table.rows[0], vec!["r1", "3", ""]);
        assert_eq!(table.rows[1], vec!["r2", "", "ok"]);
    }
}

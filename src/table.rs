//! # CSV Tables and Column Mapping
//!
//! Loads product rows from CSV and maps template placeholders to columns.
//!
//! Loading never fails for cosmetic problems. Dropped columns, an empty file
//! and missing suggested columns are reported as warnings next to the table;
//! only unreadable input is an error.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;

use crate::error::{LabelError, Result};
use crate::svg::PlaceholderPolicy;
use crate::template::ValueMap;

/// Columns most templates expect. Missing ones only produce a warning.
pub const SUGGESTED_COLUMNS: [&str; 5] = ["PRODUCT_NAME", "COLOUR", "STYLE", "BATCH", "Barcode"];

/// Column suggested for barcode payloads.
pub const BARCODE_COLUMN: &str = "Barcode";

/// Parsed CSV data with normalized headers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    records: Vec<Vec<String>>,
}

/// One borrowed row of a [`Table`].
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    pub index: usize,
    columns: &'a [String],
    values: &'a [String],
}

impl<'a> Row<'a> {
    /// Cell value by column name. Cells missing from short records read as `""`.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let pos = self.columns.iter().position(|c| c == column)?;
        self.values.get(pos).map(String::as_str)
    }

    /// Cell value with surrounding whitespace removed, `None` when blank.
    pub fn non_empty(&self, column: &str) -> Option<&'a str> {
        self.get(column).map(str::trim).filter(|v| !v.is_empty())
    }

    /// `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        let (columns, values) = (self.columns, self.values);
        columns
            .iter()
            .enumerate()
            .map(move |(i, c)| (c.as_str(), values.get(i).map(String::as_str).unwrap_or("")))
    }
}

impl Table {
    /// Load a CSV file, returning the table and its warnings.
    pub fn from_path(path: impl AsRef<Path>) -> Result<(Self, Vec<String>)> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|e| LabelError::Csv(format!("cannot open {}: {}", path.display(), e)))?;
        Self::from_reader(file)
    }

    /// Load CSV from any reader, returning the table and its warnings.
    pub fn from_reader<R: Read>(reader: R) -> Result<(Self, Vec<String>)> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let mut warnings = Vec::new();

        let (keep, dropped): (Vec<usize>, Vec<usize>) =
            (0..headers.len()).partition(|&i| !is_unnamed(&headers[i]));
        if !dropped.is_empty() {
            let names: Vec<String> = dropped
                .iter()
                .map(|&i| match headers[i].as_str() {
                    "" => format!("Unnamed: {}", i),
                    name => name.to_string(),
                })
                .collect();
            warnings.push(format!("Dropped columns: {}", names.join(", ")));
        }

        let columns: Vec<String> = keep.iter().map(|&i| headers[i].clone()).collect();
        let mut records = Vec::new();
        for record in rdr.records() {
            let record = record?;
            records.push(
                keep.iter()
                    .map(|&i| record.get(i).unwrap_or("").to_string())
                    .collect(),
            );
        }

        if records.is_empty() {
            warnings.push("CSV is empty.".to_string());
        }

        let missing: Vec<&str> = SUGGESTED_COLUMNS
            .into_iter()
            .filter(|s| !columns.iter().any(|c| c == s))
            .collect();
        if !missing.is_empty() {
            warnings.push(format!(
                "Suggested columns missing: {} (you can still map manually)",
                missing.join(", ")
            ));
        }

        log::debug!("loaded {} rows x {} columns", records.len(), columns.len());
        Ok((Self { columns, records }, warnings))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        self.records.get(index).map(|values| Row {
            index,
            columns: &self.columns,
            values,
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        (0..self.records.len()).filter_map(|i| self.row(i))
    }
}

fn is_unnamed(header: &str) -> bool {
    header.is_empty() || header.starts_with("Unnamed:")
}

/// Named mapping presets, e.g. `{"default": {"var_Name": "PRODUCT_NAME"}}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct MappingPresets(HashMap<String, BTreeMap<String, String>>);

impl MappingPresets {
    pub const DEFAULT: &'static str = "default";

    /// Load presets from a JSON file. A missing file gives no presets.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| LabelError::Mapping(format!("invalid mapping presets: {}", e)))
    }

    /// The named preset, if defined.
    pub fn preset(&self, name: &str) -> Option<&BTreeMap<String, String>> {
        self.0.get(name)
    }
}

/// Placeholder → column assignment for a template and a table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMapping {
    fields: BTreeMap<String, String>,
    barcode_column: Option<String>,
}

impl ColumnMapping {
    /// Guess a mapping for `placeholders` over `columns`.
    ///
    /// A preset entry wins when its column exists; otherwise a column whose
    /// trimmed, lowercased name equals the placeholder's field name is used.
    /// Barcode slots are never mapped to text, and the `Barcode` column is
    /// only picked when the template has a barcode slot.
    pub fn auto(
        placeholders: &[String],
        columns: &[String],
        preset: Option<&BTreeMap<String, String>>,
        policy: &PlaceholderPolicy,
    ) -> Self {
        let mut fields = BTreeMap::new();
        for placeholder in placeholders {
            if policy.is_barcode_slot(placeholder) {
                continue;
            }
            let from_preset = preset
                .and_then(|p| p.get(placeholder))
                .filter(|col| columns.contains(col));
            let guess = from_preset.cloned().or_else(|| {
                let field = policy.field_name(placeholder).trim().to_lowercase();
                columns
                    .iter()
                    .find(|c| c.trim().to_lowercase() == field)
                    .cloned()
            });
            if let Some(column) = guess {
                log::debug!("mapped {} -> {}", placeholder, column);
                fields.insert(placeholder.clone(), column);
            }
        }

        let has_slot = placeholders.iter().any(|p| policy.is_barcode_slot(p));
        let barcode_column = columns
            .iter()
            .find(|c| has_slot && c.as_str() == BARCODE_COLUMN)
            .cloned();

        Self {
            fields,
            barcode_column,
        }
    }

    /// Apply a `placeholder=COLUMN` override. An empty column removes the mapping.
    pub fn apply_override(&mut self, entry: &str, columns: &[String]) -> Result<()> {
        let (placeholder, column) = entry.split_once('=').ok_or_else(|| {
            LabelError::Mapping(format!("expected PLACEHOLDER=COLUMN, got '{}'", entry))
        })?;
        let (placeholder, column) = (placeholder.trim(), column.trim());
        if column.is_empty() {
            self.fields.remove(placeholder);
            return Ok(());
        }
        if !columns.iter().any(|c| c == column) {
            return Err(LabelError::Mapping(format!(
                "column '{}' not found in CSV",
                column
            )));
        }
        self.fields
            .insert(placeholder.to_string(), column.to_string());
        Ok(())
    }

    /// Use `column` for barcode payloads. `None` disables barcodes.
    pub fn set_barcode_column(&mut self, column: Option<String>) {
        self.barcode_column = column;
    }

    pub fn barcode_column(&self) -> Option<&str> {
        self.barcode_column.as_deref()
    }

    /// Column mapped to `placeholder`.
    pub fn column_for(&self, placeholder: &str) -> Option<&str> {
        self.fields.get(placeholder).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(p, c)| (p.as_str(), c.as_str()))
    }

    /// True when no text placeholder is mapped. The barcode column does not count.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build the value map for one row. Missing cells become empty strings.
    pub fn value_map(&self, row: &Row<'_>) -> ValueMap {
        self.fields
            .iter()
            .map(|(placeholder, column)| {
                (
                    placeholder.clone(),
                    row.get(column).unwrap_or("").to_string(),
                )
            })
            .collect()
    }

    /// Barcode payload for one row, if the column is mapped and the cell is non-blank.
    pub fn barcode_payload<'a>(&self, row: &Row<'a>) -> Option<&'a str> {
        row.non_empty(self.barcode_column.as_deref()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "PRODUCT_NAME, Price ,Unnamed: 2,Barcode\nWidget,9.99,,012345678905\nGadget,4.50,x\n";

    fn load(text: &str) -> (Table, Vec<String>) {
        Table::from_reader(text.as_bytes()).unwrap()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_headers_trimmed_and_unnamed_dropped() {
        let (table, warnings) = load(CSV);
        assert_eq!(table.columns(), &names(&["PRODUCT_NAME", "Price", "Barcode"])[..]);
        assert_eq!(table.len(), 2);
        assert!(warnings.contains(&"Dropped columns: Unnamed: 2".to_string()));
    }

    #[test]
    fn test_short_rows_are_padded() {
        let (table, _) = load(CSV);
        let row = table.row(1).unwrap();
        assert_eq!(row.get("Price"), Some("4.50"));
        assert_eq!(row.get("Barcode"), Some(""));
        assert_eq!(row.non_empty("Barcode"), None);
    }

    #[test]
    fn test_suggested_columns_warning() {
        let (_, warnings) = load(CSV);
        assert!(warnings.contains(
            &"Suggested columns missing: COLOUR, STYLE, BATCH (you can still map manually)"
                .to_string()
        ));
    }

    #[test]
    fn test_empty_csv_warns() {
        let (table, warnings) = load("PRODUCT_NAME,COLOUR,STYLE,BATCH,Barcode\n");
        assert!(table.is_empty());
        assert_eq!(warnings, vec!["CSV is empty.".to_string()]);
    }

    #[test]
    fn test_auto_mapping_uses_presets_then_names() {
        let policy = PlaceholderPolicy::default();
        let presets =
            MappingPresets::from_json(r#"{"default": {"var_Name": "PRODUCT_NAME", "var_Ghost": "NOPE"}}"#)
                .unwrap();
        let placeholders = names(&["var_Name", "var_price", "var_Ghost", "var_BarcodeImg"]);
        let columns = names(&["PRODUCT_NAME", "Price", "Barcode"]);
        let mapping = ColumnMapping::auto(
            &placeholders,
            &columns,
            presets.preset(MappingPresets::DEFAULT),
            &policy,
        );

        assert_eq!(mapping.column_for("var_Name"), Some("PRODUCT_NAME"));
        assert_eq!(mapping.column_for("var_price"), Some("Price"));
        assert_eq!(mapping.column_for("var_Ghost"), None);
        assert_eq!(mapping.column_for("var_BarcodeImg"), None);
        assert_eq!(mapping.barcode_column(), Some("Barcode"));
    }

    #[test]
    fn test_barcode_column_needs_a_slot() {
        let policy = PlaceholderPolicy::default();
        let columns = names(&["PRODUCT_NAME", "Barcode"]);
        let mapping = ColumnMapping::auto(&names(&["var_PRODUCT_NAME"]), &columns, None, &policy);
        assert_eq!(mapping.column_for("var_PRODUCT_NAME"), Some("PRODUCT_NAME"));
        assert_eq!(mapping.barcode_column(), None);

        let mut barcode_only = ColumnMapping::default();
        barcode_only.set_barcode_column(Some("Barcode".to_string()));
        assert!(barcode_only.is_empty());
    }

    #[test]
    fn test_blank_header_is_named_by_position() {
        let (table, warnings) = load("a,,b\n1,2,3\n");
        assert_eq!(table.columns(), &names(&["a", "b"])[..]);
        assert!(warnings.contains(&"Dropped columns: Unnamed: 1".to_string()));
    }

    #[test]
    fn test_overrides() {
        let columns = names(&["PRODUCT_NAME", "Price"]);
        let mut mapping = ColumnMapping::default();
        mapping.apply_override("var_Name=PRODUCT_NAME", &columns).unwrap();
        assert_eq!(mapping.column_for("var_Name"), Some("PRODUCT_NAME"));

        mapping.apply_override("var_Name=", &columns).unwrap();
        assert_eq!(mapping.column_for("var_Name"), None);

        assert!(matches!(
            mapping.apply_override("var_Name", &columns),
            Err(LabelError::Mapping(_))
        ));
        assert!(matches!(
            mapping.apply_override("var_Name=Missing", &columns),
            Err(LabelError::Mapping(_))
        ));
    }

    #[test]
    fn test_value_map_for_row() {
        let (table, _) = load(CSV);
        let mut mapping = ColumnMapping::default();
        mapping.apply_override("var_Name=PRODUCT_NAME", table.columns()).unwrap();
        mapping.apply_override("var_Code=Barcode", table.columns()).unwrap();
        mapping.set_barcode_column(Some("Barcode".to_string()));

        let row = table.row(1).unwrap();
        let values = mapping.value_map(&row);
        assert_eq!(values["var_Name"], "Gadget");
        assert_eq!(values["var_Code"], "");
        assert_eq!(mapping.barcode_payload(&row), None);
        assert_eq!(mapping.barcode_payload(&table.row(0).unwrap()), Some("012345678905"));
    }

    #[test]
    fn test_unreadable_csv_is_error() {
        let bytes: &[u8] = b"a,b\n\xff\xfe,1\n";
        assert!(matches!(Table::from_reader(bytes), Err(LabelError::Csv(_))));
    }

    #[test]
    fn test_missing_presets_file() {
        let presets = MappingPresets::load("/nonexistent/mapping_presets.json").unwrap();
        assert!(presets.preset(MappingPresets::DEFAULT).is_none());
    }
}

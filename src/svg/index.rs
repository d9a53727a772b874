//! # Placeholder Index
//!
//! One walk over the document builds a map from decoded element id to the
//! element's [`NodePath`], plus the ordered list of ids that carry the
//! placeholder prefix. Every later lookup is a hash map hit.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::Entry;

use super::ident::decode_id;
use super::tree::{Document, Element, NodePath};
use crate::error::Result;

/// Which element keeps a decoded id when several elements share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// The element encountered last in document order wins
    #[default]
    LastWins,
    /// The element encountered first in document order wins
    FirstWins,
}

/// Naming conventions for placeholders in a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholderPolicy {
    /// Prefix marking an element id as a placeholder
    pub prefix: String,
    /// Barcode slot names, tried in order. The first is the canonical slot.
    pub barcode_slots: Vec<String>,
    /// Resolution of duplicate decoded ids
    pub duplicates: DuplicatePolicy,
}

impl Default for PlaceholderPolicy {
    fn default() -> Self {
        Self {
            prefix: "var_".to_string(),
            barcode_slots: vec![
                "var_BarcodeImg".to_string(),
                "var_Barcode".to_string(),
                "_Image_var_Barcode".to_string(),
                "var_x5F_BarcodeImg".to_string(),
            ],
            duplicates: DuplicatePolicy::LastWins,
        }
    }
}

impl PlaceholderPolicy {
    /// The canonical barcode slot name.
    pub fn barcode_slot(&self) -> &str {
        self.barcode_slots
            .first()
            .map(String::as_str)
            .unwrap_or("var_BarcodeImg")
    }

    /// True if `name` is any of the barcode slot names.
    pub fn is_barcode_slot(&self, name: &str) -> bool {
        self.barcode_slots.iter().any(|slot| slot == name)
    }

    /// `name` with the placeholder prefix removed, if it has one.
    pub fn field_name<'a>(&self, name: &'a str) -> &'a str {
        name.strip_prefix(self.prefix.as_str()).unwrap_or(name)
    }
}

/// Decoded id → element lookup for one document instance.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderIndex {
    placeholders: Vec<String>,
    by_id: HashMap<String, NodePath>,
}

impl PlaceholderIndex {
    /// Walk `root` and index every element with an `id`.
    pub fn build(root: &Element, policy: &PlaceholderPolicy) -> Self {
        let mut index = Self::default();
        root.walk(&mut |path, el| {
            let Some(raw) = el.id() else {
                return;
            };
            let id = decode_id(raw).into_owned();

            if id.starts_with(policy.prefix.as_str()) && !index.by_id.contains_key(&id) {
                index.placeholders.push(id.clone());
            }

            match index.by_id.entry(id) {
                Entry::Occupied(mut slot) => {
                    if policy.duplicates == DuplicatePolicy::LastWins {
                        slot.insert(path.to_vec());
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(path.to_vec());
                }
            }
        });
        index
    }

    /// Placeholder names in first-encounter document order, without duplicates.
    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    /// Path of the element carrying decoded id `name` (placeholder or not).
    pub fn get(&self, name: &str) -> Option<&NodePath> {
        self.by_id.get(name)
    }

    /// Number of distinct decoded ids.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Parse `svg_text` and list its placeholders in document order.
pub fn extract_placeholders(svg_text: &str, policy: &PlaceholderPolicy) -> Result<Vec<String>> {
    let doc = Document::parse(svg_text)?;
    Ok(PlaceholderIndex::build(&doc.root, policy)
        .placeholders()
        .to_vec())
}

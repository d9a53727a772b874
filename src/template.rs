//! # Template Filling
//!
//! Produces a filled SVG document from a template, a value map and an
//! optional barcode image.
//!
//! ## Pipeline
//!
//! ```text
//! template text
//!   → [[token]] text substitution      (reaches attributes and free text)
//!   → parse into Document
//!   → PlaceholderIndex (decoded ids)
//!   → replace text of each mapped placeholder (data-maxlen truncation)
//!   → point the barcode slot's <image> at a data URI
//!   → serialize
//! ```
//!
//! Every call parses the template afresh, so one template string can be
//! reused across rows without any state leaking between them.
//!
//! ## Example
//!
//! ```
//! use labelgen::template::{fill, ValueMap};
//!
//! let template = r#"<svg xmlns="http://www.w3.org/2000/svg"><text id="var_Name">Name</text></svg>"#;
//! let mut values = ValueMap::new();
//! values.insert("var_Name".to_string(), "Widget".to_string());
//!
//! let filled = fill(template, &values, None).unwrap();
//! assert!(filled.contains(">Widget</text>"));
//! ```

use std::collections::BTreeMap;

use crate::barcode::BarcodeImage;
use crate::error::Result;
use crate::svg::{Document, Element, PlaceholderIndex, PlaceholderPolicy, XLINK_NS};

/// Placeholder name → replacement text, iterated in key order.
pub type ValueMap = BTreeMap<String, String>;

/// Attribute limiting the number of characters of a text placeholder.
pub const MAXLEN_ATTR: &str = "data-maxlen";

/// Appended to truncated values.
pub const ELLIPSIS: char = '…';

/// Fill a template using the default placeholder policy.
pub fn fill(template: &str, values: &ValueMap, barcode: Option<&BarcodeImage>) -> Result<String> {
    TemplateFiller::default().fill(template, values, barcode)
}

/// Template filler bound to a placeholder policy.
#[derive(Debug, Clone, Default)]
pub struct TemplateFiller {
    policy: PlaceholderPolicy,
}

impl TemplateFiller {
    pub fn with_policy(policy: PlaceholderPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PlaceholderPolicy {
        &self.policy
    }

    /// Fill `template` and return the serialized SVG.
    pub fn fill(
        &self,
        template: &str,
        values: &ValueMap,
        barcode: Option<&BarcodeImage>,
    ) -> Result<String> {
        self.fill_document(template, values, barcode)?.to_xml()
    }

    /// Fill `template` and return the document tree.
    pub fn fill_document(
        &self,
        template: &str,
        values: &ValueMap,
        barcode: Option<&BarcodeImage>,
    ) -> Result<Document> {
        let text = self.replace_tokens(template, values);
        let mut doc = Document::parse(&text)?;
        let index = PlaceholderIndex::build(&doc.root, &self.policy);

        for (name, value) in values {
            let Some(path) = index.get(name) else {
                continue;
            };
            let Some(node) = doc.root.at_mut(path) else {
                continue;
            };
            let Some(target) = nearest(node, "text") else {
                log::debug!("placeholder {} has no <text> to fill", name);
                continue;
            };
            let value = truncate(value, target.attr(MAXLEN_ATTR));
            target.set_text(value);
        }

        if let Some(image) = barcode {
            self.embed_barcode(&mut doc, &index, image);
        }

        Ok(doc)
    }

    /// Literal `[[name]]` substitution over the raw template text, first with
    /// the full placeholder names, then with the prefix stripped.
    pub fn replace_tokens(&self, template: &str, values: &ValueMap) -> String {
        if !template.contains("[[") {
            return template.to_string();
        }
        let mut out = template.to_string();
        for (name, value) in values {
            out = out.replace(&format!("[[{}]]", name), value);
        }
        for (name, value) in values {
            let field = self.policy.field_name(name);
            if field != name {
                out = out.replace(&format!("[[{}]]", field), value);
            }
        }
        out
    }

    fn embed_barcode(&self, doc: &mut Document, index: &PlaceholderIndex, image: &BarcodeImage) {
        let slot = self
            .policy
            .barcode_slots
            .iter()
            .find_map(|name| index.get(name).map(|path| (name, path)));
        let Some((name, path)) = slot else {
            log::debug!("template has no barcode slot; barcode image not embedded");
            return;
        };
        let Some(target) = doc.root.at_mut(path).and_then(|node| nearest(node, "image")) else {
            log::debug!("barcode slot {} has no <image>", name);
            return;
        };

        let uri = image.data_uri();
        target.set_attr("href", uri.as_str());
        target.set_attr("xlink:href", uri);
        doc.ensure_namespace("xlink", XLINK_NS);
    }
}

/// The element itself if it is a `local_name` element, else its first such
/// descendant.
fn nearest<'a>(el: &'a mut Element, local_name: &str) -> Option<&'a mut Element> {
    if el.local_name() == local_name {
        return Some(el);
    }
    let path = el.find_descendant(|d| d.local_name() == local_name)?;
    el.at_mut(&path)
}

/// Apply the `data-maxlen` policy to `value`.
///
/// Values longer than `n` characters keep `n - 1` characters plus `…`.
/// A limit of zero empties the value; negative or unparseable limits are
/// ignored.
pub fn truncate(value: &str, maxlen: Option<&str>) -> String {
    let Some(limit) = maxlen.and_then(|m| m.trim().parse::<usize>().ok()) else {
        return value.to_string();
    };
    if value.chars().count() <= limit {
        return value.to_string();
    }
    if limit == 0 {
        return String::new();
    }
    let mut out: String = value.chars().take(limit - 1).collect();
    out.push(ELLIPSIS);
    out
}

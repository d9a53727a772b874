//! # N-up Grid Sheets
//!
//! Lays out many filled documents on one page in a fixed-column grid.
//!
//! ```text
//! ┌──────────────────────────────────┐
//! │ margin                           │
//! │   ┌──────┐ gutter ┌──────┐       │
//! │   │ 0    │        │ 1    │  ...  │   row = i / columns
//! │   └──────┘        └──────┘       │   col = i % columns
//! │   ┌──────┐        ┌──────┐       │
//! │   │ c    │        │ c+1  │       │
//! │   └──────┘        └──────┘       │
//! └──────────────────────────────────┘
//! ```
//!
//! Each document is scaled uniformly to fit its cell and centered in it.
//! The sheet is assembled as one SVG page whose user unit is the point:
//! every document's root becomes a nested `<svg>` viewport at its cell, and
//! the sheet is rendered once with the regular [`Renderer`].
//!
//! Cells come from the same template, so their ids collide. Every id in cell
//! `i` is prefixed with `c{i}_`, along with the `#id` and `url(#id)`
//! references that point at it.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::Renderer;
use super::page::PageSize;
use crate::error::Result;
use crate::svg::size::{pt_to_px, view_box};
use crate::svg::{Document, Element, Node, SVG_NS, Size, XLINK_NS, intrinsic_size};

/// Grid sheet options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridOptions {
    pub page_size: PageSize,
    /// Columns per row. Values below 1 are treated as 1.
    pub columns: i32,
    /// Page margin in points
    pub margin: f32,
    /// Space between cells in points
    pub gutter: f32,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            columns: 3,
            margin: 18.0,
            gutter: 9.0,
        }
    }
}

/// Where one document lands on the sheet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub scale: f32,
}

/// Cell geometry for `count` documents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub count: usize,
    pub columns: usize,
    pub rows: usize,
    pub page: Size,
    pub cell: Size,
    pub margin: f32,
    pub gutter: f32,
}

impl GridLayout {
    pub fn new(count: usize, page: Size, columns: i32, margin: f32, gutter: f32) -> Self {
        let columns = columns.max(1) as usize;
        let rows = count.div_ceil(columns);

        let cell_width = ((page.width - 2.0 * margin - (columns - 1) as f32 * gutter)
            / columns as f32)
            .max(0.0);
        let cell_height = if rows == 0 {
            0.0
        } else {
            ((page.height - 2.0 * margin - (rows - 1) as f32 * gutter) / rows as f32).max(0.0)
        };

        Self {
            count,
            columns,
            rows,
            page,
            cell: Size::new(cell_width, cell_height),
            margin,
            gutter,
        }
    }

    /// Top-left corner of cell `index` (row-major).
    pub fn cell_origin(&self, index: usize) -> (f32, f32) {
        let row = index / self.columns;
        let col = index % self.columns;
        (
            self.margin + col as f32 * (self.cell.width + self.gutter),
            self.margin + row as f32 * (self.cell.height + self.gutter),
        )
    }

    /// Fit a document of `intrinsic` size into cell `index`, centered.
    /// Documents without a declared size take the cell size.
    pub fn place(&self, index: usize, intrinsic: Option<Size>) -> Placement {
        let size = intrinsic.filter(Size::is_drawable).unwrap_or(self.cell);
        let scale = if size.is_drawable() {
            (self.cell.width / size.width).min(self.cell.height / size.height)
        } else {
            0.0
        };
        let width = size.width * scale;
        let height = size.height * scale;
        let (x0, y0) = self.cell_origin(index);
        Placement {
            x: x0 + (self.cell.width - width) / 2.0,
            y: y0 + (self.cell.height - height) / 2.0,
            width,
            height,
            scale,
        }
    }
}

/// Build the sheet SVG for `documents`.
pub fn compose_grid_svg<S: AsRef<str>>(documents: &[S], options: &GridOptions, dpi: f32) -> Result<String> {
    let page = options.page_size.size();
    let layout = GridLayout::new(
        documents.len(),
        page,
        options.columns,
        options.margin,
        options.gutter,
    );
    log::debug!(
        "grid of {} documents: {}x{} cells of {:.1}x{:.1} pt",
        layout.count,
        layout.columns,
        layout.rows,
        layout.cell.width,
        layout.cell.height
    );

    let mut sheet = Element::new("svg");
    sheet.set_attr("xmlns", SVG_NS);
    sheet.set_attr("xmlns:xlink", XLINK_NS);
    sheet.set_attr("width", pt_to_px(page.width, dpi).to_string());
    sheet.set_attr("height", pt_to_px(page.height, dpi).to_string());
    sheet.set_attr("viewBox", format!("0 0 {} {}", page.width, page.height));

    for (index, text) in documents.iter().enumerate() {
        let doc = Document::parse(text.as_ref())?;
        let intrinsic = intrinsic_size(&doc.root, dpi);
        let placement = layout.place(index, intrinsic);
        let content = intrinsic.unwrap_or(layout.cell);

        let mut cell = doc.root;
        scope_ids(&mut cell, &format!("c{}_", index));
        if view_box(&cell).is_none() {
            cell.set_attr(
                "viewBox",
                format!(
                    "0 0 {} {}",
                    pt_to_px(content.width, dpi),
                    pt_to_px(content.height, dpi)
                ),
            );
        }
        cell.set_attr("x", placement.x.to_string());
        cell.set_attr("y", placement.y.to_string());
        cell.set_attr("width", placement.width.to_string());
        cell.set_attr("height", placement.height.to_string());
        sheet.children.push(Node::Element(cell));
    }

    Document {
        declaration: true,
        prolog: Vec::new(),
        root: sheet,
        epilog: Vec::new(),
    }
    .to_xml()
}

/// Prefix every id under `root`, and the local references to those ids.
fn scope_ids(root: &mut Element, prefix: &str) {
    let mut ids = HashSet::new();
    root.walk(&mut |_, el| {
        if let Some(id) = el.id() {
            ids.insert(id.to_string());
        }
    });
    if !ids.is_empty() {
        rewrite_refs(root, prefix, &ids);
    }
}

fn rewrite_refs(el: &mut Element, prefix: &str, ids: &HashSet<String>) {
    for (key, value) in &mut el.attributes {
        let key = key.as_str();
        let local = key.rsplit(':').next().unwrap_or(key);
        if key == "id" {
            *value = format!("{}{}", prefix, value);
        } else if local == "href" {
            if let Some(target) = value.strip_prefix('#').filter(|t| ids.contains(*t)) {
                *value = format!("#{}{}", prefix, target);
            }
        } else if value.contains("url(") {
            *value = rewrite_urls(value, prefix, ids);
        }
    }

    let is_style = el.local_name() == "style";
    for child in el.children.iter_mut() {
        match child {
            Node::Element(inner) => rewrite_refs(inner, prefix, ids),
            Node::Text(text) | Node::CData(text) if is_style => {
                *text = rewrite_urls(text, prefix, ids);
            }
            _ => {}
        }
    }
}

/// Rewrite `url(#id)` (optionally quoted) for ids in `ids`.
fn rewrite_urls(value: &str, prefix: &str, ids: &HashSet<String>) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(pos) = rest.find("url(") {
        let (head, tail) = rest.split_at(pos + "url(".len());
        out.push_str(head);
        let quote = if tail.starts_with('"') || tail.starts_with('\'') { 1 } else { 0 };
        out.push_str(&tail[..quote]);
        rest = &tail[quote..];

        if let Some(name) = rest.strip_prefix('#') {
            let end = name
                .find(|c: char| c == ')' || c == '"' || c == '\'' || c.is_whitespace())
                .unwrap_or(name.len());
            if ids.contains(&name[..end]) {
                out.push('#');
                out.push_str(prefix);
                out.push_str(&name[..end]);
                rest = &name[end..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Compose `documents` onto one page and render it.
pub fn compose_grid<S: AsRef<str>>(
    documents: &[S],
    options: &GridOptions,
    renderer: &Renderer,
) -> Result<Vec<u8>> {
    let sheet = compose_grid_svg(documents, options, renderer.options().dpi)?;
    renderer.render(&sheet)
}

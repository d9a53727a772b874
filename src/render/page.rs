//! Paper sizes for grid sheets.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::svg::Size;

/// A named paper size, in points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    A5,
    A3,
    Letter,
    Legal,
}

impl PageSize {
    pub const ALL: [PageSize; 5] = [
        PageSize::A4,
        PageSize::A5,
        PageSize::A3,
        PageSize::Letter,
        PageSize::Legal,
    ];

    /// Resolve a tag case-insensitively, falling back to A4 for unknown tags.
    pub fn from_tag(tag: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|size| size.tag().eq_ignore_ascii_case(tag.trim()))
            .unwrap_or_else(|| {
                log::warn!("unknown page size '{}', using A4", tag);
                PageSize::A4
            })
    }

    pub fn tag(&self) -> &'static str {
        match self {
            PageSize::A4 => "A4",
            PageSize::A5 => "A5",
            PageSize::A3 => "A3",
            PageSize::Letter => "Letter",
            PageSize::Legal => "Legal",
        }
    }

    /// Portrait dimensions in points.
    pub fn size(&self) -> Size {
        match self {
            PageSize::A4 => Size::new(595.0, 842.0),
            PageSize::A5 => Size::new(420.0, 595.0),
            PageSize::A3 => Size::new(842.0, 1191.0),
            PageSize::Letter => Size::new(612.0, 792.0),
            PageSize::Legal => Size::new(612.0, 1008.0),
        }
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

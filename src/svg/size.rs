//! # Intrinsic Document Size
//!
//! Reads the declared size of an SVG root element and expresses it in PDF
//! points. Unitless lengths and `px` are user pixels at the configured DPI;
//! absolute units (`in`, `cm`, `mm`, `pt`, `pc`) map to their physical size.
//!
//! | Declared | Result |
//! |----------|--------|
//! | `width` + `height` | both lengths |
//! | one of them + `viewBox` | missing side from the viewBox aspect ratio |
//! | `viewBox` only | viewBox size as user pixels |
//! | nothing usable | `None` |

use super::tree::Element;

/// Width and height in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// True when both sides are finite and strictly positive.
    pub fn is_drawable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Convert user pixels to points.
#[inline]
pub fn px_to_pt(px: f32, dpi: f32) -> f32 {
    px * 72.0 / dpi
}

/// Convert points to user pixels.
#[inline]
pub fn pt_to_px(pt: f32, dpi: f32) -> f32 {
    pt * dpi / 72.0
}

/// The `viewBox` of an element as `(min_x, min_y, width, height)`.
pub fn view_box(el: &Element) -> Option<[f32; 4]> {
    let nums: Vec<f32> = el
        .attr("viewBox")?
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f32>())
        .collect::<Result<_, _>>()
        .ok()?;
    match nums[..] {
        [x, y, w, h] if w > 0.0 && h > 0.0 => Some([x, y, w, h]),
        _ => None,
    }
}

/// Declared size of an SVG root in points, or `None` if it declares none.
pub fn intrinsic_size(root: &Element, dpi: f32) -> Option<Size> {
    let width = root.attr("width").and_then(|v| parse_length(v, dpi));
    let height = root.attr("height").and_then(|v| parse_length(v, dpi));
    let vb = view_box(root);

    let size = match (width, height, vb) {
        (Some(w), Some(h), _) => Size::new(w, h),
        (Some(w), None, Some([_, _, vw, vh])) => Size::new(w, w * vh / vw),
        (None, Some(h), Some([_, _, vw, vh])) => Size::new(h * vw / vh, h),
        (None, None, Some([_, _, vw, vh])) => Size::new(px_to_pt(vw, dpi), px_to_pt(vh, dpi)),
        _ => return None,
    };
    size.is_drawable().then_some(size)
}

/// Parse an SVG length into points. Percentages and font-relative units
/// have no intrinsic meaning at the root and yield `None`.
fn parse_length(raw: &str, dpi: f32) -> Option<f32> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| c.is_ascii_alphabetic() || c == '%')
        .unwrap_or(raw.len());
    let (number, unit) = raw.split_at(split);
    let value: f32 = number.trim().parse().ok()?;
    let points = match unit.trim() {
        "" | "px" => px_to_pt(value, dpi),
        "pt" => value,
        "pc" => value * 12.0,
        "in" => value * 72.0,
        "cm" => value * 72.0 / 2.54,
        "mm" => value * 72.0 / 25.4,
        _ => return None,
    };
    Some(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svg::tree::Document;

    fn root(svg: &str) -> Element {
        Document::parse(svg).unwrap().root
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn test_unitless_is_pixels_at_dpi() {
        let size = intrinsic_size(&root(r#"<svg width="96" height="192"/>"#), 96.0).unwrap();
        assert!(approx(size.width, 72.0));
        assert!(approx(size.height, 144.0));
    }

    #[test]
    fn test_physical_units_ignore_dpi() {
        let el = root(r#"<svg width="50mm" height="1in"/>"#);
        let a = intrinsic_size(&el, 96.0).unwrap();
        let b = intrinsic_size(&el, 300.0).unwrap();
        assert!(approx(a.width, 141.73));
        assert!(approx(a.height, 72.0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_view_box_fallbacks() {
        let only_vb = intrinsic_size(&root(r#"<svg viewBox="0 0 192 96"/>"#), 96.0).unwrap();
        assert!(approx(only_vb.width, 144.0));
        assert!(approx(only_vb.height, 72.0));

        let width_vb =
            intrinsic_size(&root(r#"<svg width="200pt" viewBox="0,0,100,50"/>"#), 96.0).unwrap();
        assert!(approx(width_vb.height, 100.0));
    }

    #[test]
    fn test_undeclared_or_relative() {
        assert!(intrinsic_size(&root("<svg/>"), 96.0).is_none());
        assert!(intrinsic_size(&root(r#"<svg width="100%" height="100%"/>"#), 96.0).is_none());
        assert!(intrinsic_size(&root(r#"<svg width="0" height="10"/>"#), 96.0).is_none());
    }
}

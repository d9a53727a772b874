//! # Escaped Identifier Decoding
//!
//! Vector authoring tools (Illustrator in particular) cannot store arbitrary
//! characters in an element `id`, so they write them as `_xHHHH_`, where
//! `HHHH` is the hex code point of the character. ASCII punctuation is
//! usually written with two digits (`_x5F_` for `_`, `_x20_` for space).
//!
//! ```text
//! var_x5F_BarcodeImg     → var_BarcodeImg
//! var_Product_x0020_Name → var_Product Name
//! ```

use std::borrow::Cow;

/// Decode every `_xHHHH_` (or two-digit `_xHH_`) escape in `raw` into the
/// character it names.
///
/// Hex digits are case-insensitive. Escapes naming an invalid code point
/// (a surrogate) are kept verbatim. Strings without escapes are borrowed.
///
/// ```
/// use labelgen::svg::decode_id;
///
/// assert_eq!(decode_id("var_x5F_BarcodeImg"), "var_BarcodeImg");
/// assert_eq!(decode_id("var_Name"), "var_Name");
/// ```
pub fn decode_id(raw: &str) -> Cow<'_, str> {
    if !raw.contains("_x") {
        return Cow::Borrowed(raw);
    }

    let bytes = raw.as_bytes();
    let mut out = String::with_capacity(raw.len());
    let mut last = 0;
    let mut i = 0;

    while i < bytes.len() {
        match escape_at(bytes, i) {
            Some((ch, len)) => {
                out.push_str(&raw[last..i]);
                out.push(ch);
                i += len;
                last = i;
            }
            None => i += 1,
        }
    }

    if last == 0 {
        return Cow::Borrowed(raw);
    }
    out.push_str(&raw[last..]);
    Cow::Owned(out)
}

/// Match `_xHHHH_` or `_xHH_` starting at `pos`, returning the decoded
/// character and the escape length in bytes.
fn escape_at(bytes: &[u8], pos: usize) -> Option<(char, usize)> {
    if bytes.get(pos) != Some(&b'_') || bytes.get(pos + 1) != Some(&b'x') {
        return None;
    }
    [4, 2].into_iter().find_map(|digits| {
        let hex = bytes.get(pos + 2..pos + 2 + digits)?;
        if bytes.get(pos + 2 + digits) != Some(&b'_') {
            return None;
        }
        let mut code = 0u32;
        for &b in hex {
            code = code * 16 + (b as char).to_digit(16)?;
        }
        char::from_u32(code).map(|ch| (ch, digits + 3))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_underscore_escape() {
        assert_eq!(decode_id("var_x5F_BarcodeImg"), "var_BarcodeImg");
    }

    #[test]
    fn test_four_digit_and_mixed_case_hex() {
        assert_eq!(decode_id("var_Product_x0020_Name"), "var_Product Name");
        assert_eq!(decode_id("a_x002f_b_x002F_c"), "a/b/c");
    }

    #[test]
    fn test_plain_id_is_borrowed() {
        assert!(matches!(decode_id("var_Name"), Cow::Borrowed("var_Name")));
        assert!(matches!(decode_id("_x_not_hex"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_idempotent_on_decoded() {
        let once = decode_id("var_Price_x0020_EUR").into_owned();
        assert_eq!(once, "var_Price EUR");
        assert_eq!(decode_id(&once), once);
    }

    #[test]
    fn test_adjacent_escapes() {
        assert_eq!(decode_id("_x0041__x0042_"), "AB");
    }

    #[test]
    fn test_surrogate_left_verbatim() {
        assert_eq!(decode_id("id_xD800_end"), "id_xD800_end");
    }

    #[test]
    fn test_non_ascii_neighbours() {
        assert_eq!(decode_id("prix_x0020_€"), "prix €");
    }
}

//! Single-page PDF assembly for rasterized documents.

use lopdf::content::{Content, Operation};
use lopdf::{Document as PdfDocument, Object, Stream, dictionary};

use crate::error::{LabelError, Result};
use crate::svg::Size;

/// Build a one-page PDF of `page` points whose content is an RGB image
/// stretched over the whole page.
pub fn image_page(page: Size, width_px: u32, height_px: u32, rgb: Vec<u8>) -> Result<Vec<u8>> {
    if rgb.len() != (width_px as usize) * (height_px as usize) * 3 {
        return Err(LabelError::Render(format!(
            "image buffer does not match {}x{} RGB",
            width_px, height_px
        )));
    }

    let mut doc = PdfDocument::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width_px as i64,
            "Height" => height_px as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        rgb,
    ));

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(page.width),
                    0.into(),
                    0.into(),
                    Object::Real(page.height),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        },
        "MediaBox" => vec![0.into(), 0.into(), Object::Real(page.width), Object::Real(page.height)],
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}

/// Read the MediaBox of the first page as `(width, height)` in points.
pub fn first_page_size(pdf: &[u8]) -> Result<Size> {
    let doc = PdfDocument::load_mem(pdf)?;
    let (_, page_id) = doc
        .get_pages()
        .into_iter()
        .next()
        .ok_or_else(|| LabelError::Render("PDF has no pages".to_string()))?;
    let page = doc.get_dictionary(page_id)?;
    let media_box = page.get(b"MediaBox").and_then(Object::as_array)?;
    let nums: Vec<f32> = media_box
        .iter()
        .map(|o| o.as_float().or_else(|_| o.as_i64().map(|i| i as f32)))
        .collect::<std::result::Result<_, lopdf::Error>>()?;
    match nums[..] {
        [x0, y0, x1, y1] => Ok(Size::new(x1 - x0, y1 - y0)),
        _ => Err(LabelError::Render("malformed MediaBox".to_string())),
    }
}

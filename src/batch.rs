//! # Batch Packaging
//!
//! Collects rendered PDFs into ZIP archives. Entries are pulled one at a time
//! from a lazy sequence, so only the PDF being written is held in memory.
//!
//! Entry names are written exactly as given; duplicates are not renamed here.
//! [`batch_entry_name`] and [`preview_name`] produce names that are unique per
//! row index.

use std::io::{Cursor, Seek, Write};
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use crate::error::Result;

/// Streaming ZIP writer for PDF entries.
pub struct ZipPackager<W: Write + Seek> {
    writer: ZipWriter<W>,
    entries: usize,
}

impl ZipPackager<Cursor<Vec<u8>>> {
    /// Package into memory
    pub fn in_memory() -> Self {
        Self::new(Cursor::new(Vec::new()))
    }
}

impl<W: Write + Seek> ZipPackager<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: ZipWriter::new(writer),
            entries: 0,
        }
    }

    /// Write one deflate-compressed member.
    pub fn add(&mut self, name: &str, content: &[u8]) -> Result<()> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.writer.start_file(name, options)?;
        self.writer.write_all(content)?;
        self.entries += 1;
        Ok(())
    }

    /// Members written so far
    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Write the central directory and hand back the underlying writer.
    pub fn finish(self) -> Result<W> {
        Ok(self.writer.finish()?)
    }
}

/// Package a lazy sequence of `(name, pdf)` entries into an in-memory ZIP.
///
/// The first `Err` stops packaging and is returned.
pub fn package_zip<I>(entries: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = Result<(String, Vec<u8>)>>,
{
    let mut packager = ZipPackager::in_memory();
    for entry in entries {
        let (name, pdf) = entry?;
        packager.add(&name, &pdf)?;
    }
    log::debug!("packaged {} entries", packager.len());
    Ok(packager.finish()?.into_inner())
}

/// Map arbitrary text to a filesystem-safe `.pdf` file name.
///
/// Whitespace runs become `_`, characters outside `[A-Za-z0-9._-]` are dropped,
/// and `.pdf` is appended unless already present.
pub fn safe_filename(name: &str) -> String {
    let name = if name.is_empty() { "file" } else { name };

    let mut out = String::with_capacity(name.len() + 4);
    let mut in_space = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('_');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            out.push(c);
        }
    }

    if !out.to_ascii_lowercase().ends_with(".pdf") {
        out.push_str(".pdf");
    }
    out
}

/// `{base}_{index}.pdf` for a batch member.
pub fn batch_entry_name(base: &str, index: usize) -> String {
    safe_filename(&format!("{}_{}.pdf", base, index))
}

/// `preview_{row}_{label}.pdf` for a single preview.
pub fn preview_name(row: usize, label: &str) -> String {
    safe_filename(&format!("preview_{}_{}.pdf", row, label))
}

/// Archive name for chunk `chunk` (0-based) of `total` chunks.
pub fn chunk_archive_name(chunk: usize, total: usize) -> String {
    if total <= 1 {
        "labels_batch.zip".to_string()
    } else {
        format!("labels_batch_{:03}.zip", chunk + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LabelError;
    use std::io::Read;

    fn read_member(zip: &[u8], name: &str) -> Vec<u8> {
        let mut archive = zip::ZipArchive::new(Cursor::new(zip)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut out = Vec::new();
        file.read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn test_package_k_entries() {
        let entries: Vec<(String, Vec<u8>)> = (0..5)
            .map(|i| (format!("label_{}.pdf", i), vec![i as u8; 100 + i]))
            .collect();
        let zip = package_zip(entries.clone().into_iter().map(Ok)).unwrap();

        let archive = zip::ZipArchive::new(Cursor::new(&zip[..])).unwrap();
        assert_eq!(archive.len(), 5);
        for (name, content) in &entries {
            assert_eq!(&read_member(&zip, name), content);
        }
    }

    #[test]
    fn test_members_are_deflated() {
        let zip = package_zip([Ok(("a.pdf".to_string(), vec![b'x'; 4096]))]).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(&zip[..])).unwrap();
        let file = archive.by_index(0).unwrap();
        assert_eq!(file.compression(), CompressionMethod::Deflated);
        assert!(file.compressed_size() < file.size());
    }

    #[test]
    fn test_empty_archive() {
        let zip = package_zip(std::iter::empty()).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(&zip[..])).unwrap();
        assert_eq!(archive.len(), 0);
    }

    #[test]
    fn test_error_stops_packaging() {
        let entries = vec![
            Ok(("a.pdf".to_string(), vec![1])),
            Err(LabelError::Render("boom".into())),
        ];
        assert!(matches!(package_zip(entries), Err(LabelError::Render(_))));
    }

    #[test]
    fn test_entries_are_pulled_lazily() {
        let mut produced = 0;
        let entries = (0..3).map(|i| {
            produced += 1;
            Ok((format!("{}.pdf", i), vec![0u8; 8]))
        });
        package_zip(entries).unwrap();
        assert_eq!(produced, 3);
    }

    #[test]
    fn test_safe_filename() {
        assert_eq!(safe_filename(""), "file.pdf");
        assert_eq!(safe_filename("Blue  Widget\tXL"), "Blue_Widget_XL.pdf");
        assert_eq!(safe_filename("a/b\\c:d*?.pdf"), "abcd.pdf");
        assert_eq!(safe_filename("REPORT.PDF"), "REPORT.PDF");
        assert_eq!(safe_filename("café"), "caf.pdf");
    }

    #[test]
    fn test_generated_names() {
        assert_eq!(batch_entry_name("Widget Pro", 3), "Widget_Pro_3.pdf");
        assert_eq!(preview_name(0, "label"), "preview_0_label.pdf");
        assert_eq!(chunk_archive_name(0, 1), "labels_batch.zip");
        assert_eq!(chunk_archive_name(1, 3), "labels_batch_002.zip");
    }
}

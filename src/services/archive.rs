// src/services/archive.rs
use crate::errors::MockitError;
use crate::models::Mockup;
use crate::services::image_processor::{ImageProcessor, split_data_uri};
use bytes::Bytes;
use log::warn;
use std::io::{Cursor, Write};
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

pub const ARCHIVE_FILENAME: &str = "mockups.zip";

/// Lowercase, with each whitespace run replaced by one hyphen. Leading and
/// trailing runs are kept.
fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_space = false;
    for c in name.to_lowercase().chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('-');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// `mockup-{product}-{placement}.png`, names lowercased with whitespace runs hyphenated.
pub fn mockup_filename(mockup: &Mockup) -> String {
    format!(
        "mockup-{}-{}.png",
        slug(&mockup.product.name),
        slug(&mockup.placement.name)
    )
}

/// Decoded archive entries in result order. A repeated filename keeps its first
/// position but takes the later image. Mockups without a payload are skipped;
/// a payload that fails to decode fails the whole archive.
pub fn archive_entries(
    processor: &ImageProcessor,
    mockups: &[Mockup],
) -> Result<Vec<(String, Vec<u8>)>, MockitError> {
    let mut entries: Vec<(String, Vec<u8>)> = Vec::with_capacity(mockups.len());
    for mockup in mockups {
        let filename = mockup_filename(mockup);
        if split_data_uri(&mockup.image_url).is_none() {
            warn!("Skipping {} in archive: no image payload", filename);
            continue;
        }
        let png = processor
            .decode_data_uri(&mockup.image_url)
            .and_then(|data| processor.to_png(&data))
            .map_err(|e| MockitError::Archive(format!("{}: {}", filename, e)))?;

        match entries.iter_mut().find(|(name, _)| *name == filename) {
            Some(existing) => existing.1 = png,
            None => entries.push((filename, png)),
        }
    }
    Ok(entries)
}

/// Package every mockup as a PNG inside one zip archive.
pub fn build_archive(processor: &ImageProcessor, mockups: &[Mockup]) -> Result<Bytes, MockitError> {
    let entries = archive_entries(processor, mockups)?;

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (filename, data) in entries {
        writer
            .start_file(filename.as_str(), options)
            .map_err(|e| MockitError::Archive(e.to_string()))?;
        writer
            .write_all(&data)
            .map_err(|e| MockitError::Archive(e.to_string()))?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| MockitError::Archive(e.to_string()))?;

    Ok(Bytes::from(cursor.into_inner()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::services::image_processor::DEFAULT_MAX_UPLOAD_BYTES;
    use image::{DynamicImage, ImageFormat, RgbaImage};
    use std::io::Read;

    fn png(shade: u8) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            1,
            1,
            image::Rgba([shade, shade, shade, 255]),
        ));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    fn mockup(product_id: &str, placement_id: &str, image_url: String) -> Mockup {
        let catalog = Catalog::builtin();
        let product = catalog.product(product_id).unwrap().clone();
        Mockup {
            placement: product.placement(placement_id).unwrap().clone(),
            product,
            image_url,
            generated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn filenames_are_hyphenated_and_lowercased() {
        let m = mockup("tote-bag-canvas", "high-center", String::new());
        assert_eq!(mockup_filename(&m), "mockup-canvas-tote-bag-high-center.png");
        let m = mockup("mug-ceramic", "front-center", String::new());
        assert_eq!(mockup_filename(&m), "mockup-ceramic-mug-front-and-center.png");
    }

    #[test]
    fn slug_keeps_edge_whitespace_as_hyphens() {
        assert_eq!(slug("Canvas  Tote\tBag"), "canvas-tote-bag");
        assert_eq!(slug(" Cap "), "-cap-");
        assert_eq!(slug("Front"), "front");
    }

    #[test]
    fn corrupt_payload_fails_the_archive() {
        let processor = ImageProcessor::new(DEFAULT_MAX_UPLOAD_BYTES);
        let mockups = vec![
            mockup("cap", "front-panel", processor.to_data_uri("image/png", &png(1))),
            mockup("cap", "side-panel", "data:image/png;base64,!!!".into()),
        ];

        let result = archive_entries(&processor, &mockups);
        assert!(matches!(result, Err(MockitError::Archive(ref msg)) if msg.contains("side-panel")));
        assert!(matches!(
            build_archive(&processor, &mockups),
            Err(MockitError::Archive(_))
        ));
    }

    #[test]
    fn duplicate_pairs_keep_the_last_image() {
        let processor = ImageProcessor::new(DEFAULT_MAX_UPLOAD_BYTES);
        let first = processor.to_data_uri("image/png", &png(1));
        let second = processor.to_data_uri("image/png", &png(2));
        let mockups = vec![
            mockup("cap", "front-panel", first),
            mockup("cap", "side-panel", processor.to_data_uri("image/png", &png(3))),
            mockup("cap", "front-panel", second),
            mockup("hoodie", "back-center", "data:image/png;base64,".into()),
        ];

        let entries = archive_entries(&processor, &mockups).unwrap();
        let names: Vec<_> = entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            [
                "mockup-baseball-cap-front-panel.png",
                "mockup-baseball-cap-side-panel.png"
            ]
        );
        assert_eq!(entries[0].1, png(2));
    }

    #[test]
    fn archive_contains_readable_pngs() {
        let processor = ImageProcessor::new(DEFAULT_MAX_UPLOAD_BYTES);
        let mockups = vec![mockup(
            "t-shirt",
            "center-chest",
            processor.to_data_uri("image/png", &png(9)),
        )];

        let bytes = build_archive(&processor, &mockups).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        assert_eq!(archive.len(), 1);

        let mut file = archive.by_name("mockup-t-shirt-center-chest.png").unwrap();
        let mut data = Vec::new();
        file.read_to_end(&mut data).unwrap();
        assert_eq!(data, png(9));
    }
}

// imgchain/src/processors/metadata.rs
use crate::core::CodecError;
use exif::{Exif, Reader, Tag};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Metadata blocks a decoder found embedded in an image, kept around so an
/// encoder can write them back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbeddedMetadata {
    pub icc_profile: Option<Vec<u8>>,
    pub exif: Option<Vec<u8>>,
}

impl EmbeddedMetadata {
    pub fn is_empty(&self) -> bool {
        self.icc_profile.is_none() && self.exif.is_none()
    }
}

pub struct MetadataProcessor;

impl MetadataProcessor {
    pub fn new() -> Self {
        Self
    }

    pub fn read_metadata(&self, path: &Path) -> Result<Option<Exif>, CodecError> {
        let file = File::open(path)?;
        let mut bufreader = BufReader::new(&file);

        match Reader::new().read_from_container(&mut bufreader) {
            Ok(exif) => {
                log::debug!("Found EXIF data in {}", path.display());
                Ok(Some(exif))
            }
            Err(exif::Error::NotFound(_)) => {
                log::debug!("No EXIF data found in {}", path.display());
                Ok(None)
            }
            Err(e) => {
                log::warn!("Failed to read EXIF from {}: {}", path.display(), e);
                Err(CodecError::Processing(format!("EXIF read error: {}", e)))
            }
        }
    }

    pub fn extract_common_metadata(&self, exif: &Exif) -> Vec<(String, String)> {
        let mut metadata = Vec::new();

        for field in exif.fields() {
            match field.tag {
                Tag::ImageDescription
                | Tag::Make
                | Tag::Model
                | Tag::DateTime
                | Tag::DateTimeOriginal
                | Tag::ExposureTime
                | Tag::FNumber
                | Tag::FocalLength
                | Tag::PhotographicSensitivity
                | Tag::Orientation
                | Tag::Software
                | Tag::Artist
                | Tag::Copyright => {
                    let value = field.display_value().with_unit(exif).to_string();
                    metadata.push((field.tag.to_string(), value));
                }
                _ => {}
            }
        }

        metadata
    }
}

impl Default for MetadataProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn freshly_encoded_png_has_no_exif() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("plain.png");
        image::RgbImage::new(2, 2).save(&path).unwrap();

        let processor = MetadataProcessor::new();
        assert!(processor.read_metadata(&path).unwrap().is_none());
    }

    #[test]
    fn embedded_metadata_emptiness() {
        assert!(EmbeddedMetadata::default().is_empty());
        let with_icc = EmbeddedMetadata {
            icc_profile: Some(vec![1, 2, 3]),
            exif: None,
        };
        assert!(!with_icc.is_empty());
    }

    #[test]
    fn non_image_has_no_metadata() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("logo.svg");
        std::fs::write(&path, b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>").unwrap();

        assert!(!matches!(MetadataProcessor::new().read_metadata(&path), Ok(Some(_))));
    }
}

// pixbatch/src/processors/metadata.rs
use crate::core::{BatchError, Result};
use exif::{Exif, In, Reader, Tag, Value};
use image::{ImageFormat, ImageReader};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const CM_PER_INCH: f64 = 2.54;
const METERS_PER_INCH: f64 = 0.0254;

/// Reads resolution metadata back out of written files.
pub struct MetadataProcessor;

impl MetadataProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Horizontal DPI stored in the file, if its container records one.
    pub fn read_dpi(&self, path: &Path) -> Result<Option<u32>> {
        let format = ImageReader::open(path)?.with_guessed_format()?.format();

        match format {
            Some(ImageFormat::Jpeg) => match self.read_jfif_dpi(path)? {
                Some(dpi) => Ok(Some(dpi)),
                None => self.read_exif_dpi(path),
            },
            Some(ImageFormat::Png) => self.read_png_dpi(path),
            Some(ImageFormat::Tiff) => self.read_exif_dpi(path),
            Some(ImageFormat::Bmp) => self.read_bmp_dpi(path),
            _ => Ok(None),
        }
    }

    pub fn read_metadata(&self, path: &Path) -> Result<Option<Exif>> {
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
                Err(BatchError::Processing(format!("EXIF read error: {}", e)))
            }
        }
    }

    fn read_exif_dpi(&self, path: &Path) -> Result<Option<u32>> {
        let Some(exif) = self.read_metadata(path)? else {
            return Ok(None);
        };

        let resolution = match exif.get_field(Tag::XResolution, In::PRIMARY).map(|f| &f.value) {
            Some(Value::Rational(values)) if !values.is_empty() && values[0].denom != 0 => {
                values[0].to_f64()
            }
            _ => return Ok(None),
        };

        // TIFF default unit is inches
        let unit = exif
            .get_field(Tag::ResolutionUnit, In::PRIMARY)
            .and_then(|f| f.value.get_uint(0))
            .unwrap_or(2);

        Ok(match unit {
            2 => Some(resolution.round() as u32),
            3 => Some((resolution * CM_PER_INCH).round() as u32),
            _ => None,
        })
    }

    fn read_jfif_dpi(&self, path: &Path) -> Result<Option<u32>> {
        let mut bytes = Vec::new();
        File::open(path)?.read_to_end(&mut bytes)?;

        let mut pos = 2;
        while pos + 4 <= bytes.len() && bytes[pos] == 0xFF {
            let marker = bytes[pos + 1];
            let length = u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]) as usize;
            let start = pos + 4;
            let end = pos + 2 + length;
            if length < 2 || end > bytes.len() {
                break;
            }

            if marker == 0xE0 && bytes[start..end].starts_with(b"JFIF\0") && end - start >= 12 {
                let segment = &bytes[start..end];
                let units = segment[7];
                let x_density = f64::from(u16::from_be_bytes([segment[8], segment[9]]));
                return Ok(match units {
                    1 => Some(x_density as u32),
                    2 => Some((x_density * CM_PER_INCH).round() as u32),
                    _ => None,
                });
            }

            // start of scan: no more header segments
            if marker == 0xDA {
                break;
            }
            pos = end;
        }

        Ok(None)
    }

    fn read_png_dpi(&self, path: &Path) -> Result<Option<u32>> {
        let decoder = png::Decoder::new(BufReader::new(File::open(path)?));
        let reader = decoder
            .read_info()
            .map_err(|e| BatchError::Processing(format!("PNG read error: {}", e)))?;

        Ok(reader.info().pixel_dims.and_then(|dims| match dims.unit {
            png::Unit::Meter => Some((f64::from(dims.xppu) * METERS_PER_INCH).round() as u32),
            png::Unit::Unspecified => None,
        }))
    }

    fn read_bmp_dpi(&self, path: &Path) -> Result<Option<u32>> {
        let mut header = [0u8; 46];
        File::open(path)?.read_exact(&mut header)?;
        let ppm = i32::from_le_bytes([header[38], header[39], header[40], header[41]]);
        if ppm <= 0 {
            return Ok(None);
        }
        Ok(Some((f64::from(ppm) * METERS_PER_INCH).round() as u32))
    }
}

impl Default for MetadataProcessor {
    fn default() -> Self {
        Self::new()
    }
}

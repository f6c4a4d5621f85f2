// pixbatch/src/processors/encoder.rs
use crate::core::{BatchError, OutputFormat, Result};
use image::codecs::jpeg::{JpegEncoder, PixelDensity};
use image::{ColorType, DynamicImage, ImageFormat};
use std::borrow::Cow;
use std::io::{Cursor, Seek, Write};
use std::path::Path;
use tiff::encoder::{colortype, Rational, TiffEncoder, TiffValue};
use tiff::tags::ResolutionUnit;

const METERS_PER_INCH: f64 = 0.0254;

// BITMAPINFOHEADER biXPelsPerMeter / biYPelsPerMeter
const BMP_X_PPM_OFFSET: usize = 38;
const BMP_Y_PPM_OFFSET: usize = 42;

/// Encodes whole images into memory, stamping DPI where the container has a
/// field for it.
pub struct Encoder {
    dpi: Option<u32>,
}

impl Encoder {
    pub fn new(dpi: Option<u32>) -> Self {
        Self { dpi }
    }

    /// Encodes fully before touching the filesystem, so a failed encode
    /// leaves nothing behind.
    pub fn save(&self, image: &DynamicImage, path: &Path, format: OutputFormat) -> Result<()> {
        log::debug!(
            "Saving image to {} with format {}, dpi: {:?}",
            path.display(),
            format,
            self.dpi
        );

        let bytes = self.encode(image, format)?;
        std::fs::write(path, &bytes)?;

        log::info!("Saved image: {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    pub fn encode(&self, image: &DynamicImage, format: OutputFormat) -> Result<Vec<u8>> {
        if self.dpi.is_some() && !embeds_dpi(format) {
            log::debug!("{} has no resolution field, DPI not embedded", format);
        }

        match format {
            OutputFormat::Jpeg => self.encode_jpeg(image),
            OutputFormat::Png => self.encode_png(image),
            OutputFormat::Tiff => self.encode_tiff(image),
            OutputFormat::Bmp => self.encode_bmp(image),
            OutputFormat::WebP => encode_generic(&rgb_or_rgba(image), ImageFormat::WebP),
            OutputFormat::Gif => encode_generic(&rgb_or_rgba(image), ImageFormat::Gif),
        }
    }

    fn encode_jpeg(&self, image: &DynamicImage) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        let mut encoder = JpegEncoder::new(&mut bytes);
        if let Some(dpi) = self.dpi {
            let density = u16::try_from(dpi).map_err(|_| {
                BatchError::InvalidParameter(format!(
                    "DPI {} exceeds the JPEG density limit of {}",
                    dpi,
                    u16::MAX
                ))
            })?;
            encoder.set_pixel_density(PixelDensity::dpi(density));
        }

        match image.color() {
            ColorType::Rgb8 | ColorType::L8 => image.write_with_encoder(encoder)?,
            _ => DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)?,
        }

        Ok(bytes)
    }

    fn encode_png(&self, image: &DynamicImage) -> Result<Vec<u8>> {
        let Some(dpi) = self.dpi else {
            return encode_generic(image, ImageFormat::Png);
        };

        let (color, depth, data) = png_layout(image);
        let ppm = dpi_to_pixels_per_meter(dpi);

        let mut bytes = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut bytes, image.width(), image.height());
            encoder.set_color(color);
            encoder.set_depth(depth);
            encoder.set_pixel_dims(Some(png::PixelDimensions {
                xppu: ppm,
                yppu: ppm,
                unit: png::Unit::Meter,
            }));

            let mut writer = encoder.write_header()?;
            writer.write_image_data(&data)?;
            writer.finish()?;
        }

        Ok(bytes)
    }

    fn encode_tiff(&self, image: &DynamicImage) -> Result<Vec<u8>> {
        let Some(dpi) = self.dpi else {
            return encode_generic(image, ImageFormat::Tiff);
        };

        let (width, height) = (image.width(), image.height());
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut encoder = TiffEncoder::new(&mut cursor)?;
            match image {
                DynamicImage::ImageLuma8(gray) => {
                    write_tiff::<colortype::Gray8, _>(&mut encoder, width, height, gray.as_raw(), dpi)?
                }
                DynamicImage::ImageLuma16(gray) => {
                    write_tiff::<colortype::Gray16, _>(&mut encoder, width, height, gray.as_raw(), dpi)?
                }
                DynamicImage::ImageRgb16(rgb) => {
                    write_tiff::<colortype::RGB16, _>(&mut encoder, width, height, rgb.as_raw(), dpi)?
                }
                DynamicImage::ImageRgba16(_) | DynamicImage::ImageLumaA16(_) => {
                    write_tiff::<colortype::RGBA16, _>(
                        &mut encoder,
                        width,
                        height,
                        image.to_rgba16().as_raw(),
                        dpi,
                    )?
                }
                other if other.color().has_alpha() => write_tiff::<colortype::RGBA8, _>(
                    &mut encoder,
                    width,
                    height,
                    other.to_rgba8().as_raw(),
                    dpi,
                )?,
                other => write_tiff::<colortype::RGB8, _>(
                    &mut encoder,
                    width,
                    height,
                    other.to_rgb8().as_raw(),
                    dpi,
                )?,
            }
        }

        Ok(cursor.into_inner())
    }

    fn encode_bmp(&self, image: &DynamicImage) -> Result<Vec<u8>> {
        let layout = match image.color() {
            ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8 => {
                Cow::Borrowed(image)
            }
            _ => rgb_or_rgba(image),
        };
        let mut bytes = encode_generic(&layout, ImageFormat::Bmp)?;

        if let Some(dpi) = self.dpi {
            if bytes.len() < BMP_Y_PPM_OFFSET + 4 {
                return Err(BatchError::Processing(
                    "BMP header too short to hold resolution".to_string(),
                ));
            }
            let ppm = i32::try_from(dpi_to_pixels_per_meter(dpi))
                .unwrap_or(i32::MAX)
                .to_le_bytes();
            bytes[BMP_X_PPM_OFFSET..BMP_X_PPM_OFFSET + 4].copy_from_slice(&ppm);
            bytes[BMP_Y_PPM_OFFSET..BMP_Y_PPM_OFFSET + 4].copy_from_slice(&ppm);
        }

        Ok(bytes)
    }
}

/// Whether `format` has a resolution field the encoder writes.
pub fn embeds_dpi(format: OutputFormat) -> bool {
    matches!(
        format,
        OutputFormat::Jpeg | OutputFormat::Png | OutputFormat::Tiff | OutputFormat::Bmp
    )
}

pub fn dpi_to_pixels_per_meter(dpi: u32) -> u32 {
    (f64::from(dpi) / METERS_PER_INCH).round() as u32
}

fn encode_generic(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    image.write_to(&mut cursor, format)?;
    Ok(cursor.into_inner())
}

fn rgb_or_rgba(image: &DynamicImage) -> Cow<'_, DynamicImage> {
    match image.color() {
        ColorType::Rgb8 | ColorType::Rgba8 => Cow::Borrowed(image),
        color if color.has_alpha() => Cow::Owned(DynamicImage::ImageRgba8(image.to_rgba8())),
        _ => Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8())),
    }
}

/// Colour type, bit depth and raw bytes for the png crate. 16-bit samples
/// stay 16-bit, written big-endian.
fn png_layout(image: &DynamicImage) -> (png::ColorType, png::BitDepth, Vec<u8>) {
    use png::BitDepth::{Eight, Sixteen};

    match image {
        DynamicImage::ImageLuma8(buf) => (png::ColorType::Grayscale, Eight, buf.as_raw().clone()),
        DynamicImage::ImageLumaA8(buf) => {
            (png::ColorType::GrayscaleAlpha, Eight, buf.as_raw().clone())
        }
        DynamicImage::ImageRgb8(buf) => (png::ColorType::Rgb, Eight, buf.as_raw().clone()),
        DynamicImage::ImageRgba8(buf) => (png::ColorType::Rgba, Eight, buf.as_raw().clone()),
        DynamicImage::ImageLuma16(buf) => (png::ColorType::Grayscale, Sixteen, be_bytes(buf.as_raw())),
        DynamicImage::ImageLumaA16(buf) => {
            (png::ColorType::GrayscaleAlpha, Sixteen, be_bytes(buf.as_raw()))
        }
        DynamicImage::ImageRgb16(buf) => (png::ColorType::Rgb, Sixteen, be_bytes(buf.as_raw())),
        DynamicImage::ImageRgba16(buf) => (png::ColorType::Rgba, Sixteen, be_bytes(buf.as_raw())),
        other if other.color().has_alpha() => {
            (png::ColorType::Rgba, Eight, other.to_rgba8().into_raw())
        }
        other => (png::ColorType::Rgb, Eight, other.to_rgb8().into_raw()),
    }
}

fn be_bytes(samples: &[u16]) -> Vec<u8> {
    samples.iter().flat_map(|sample| sample.to_be_bytes()).collect()
}

fn write_tiff<C, W>(
    encoder: &mut TiffEncoder<W>,
    width: u32,
    height: u32,
    data: &[C::Inner],
    dpi: u32,
) -> Result<()>
where
    C: colortype::ColorType,
    [C::Inner]: TiffValue,
    W: Write + Seek,
{
    let mut image = encoder.new_image::<C>(width, height)?;
    image.resolution(ResolutionUnit::Inch, Rational { n: dpi, d: 1 });
    image.write_data(data)?;
    Ok(())
}

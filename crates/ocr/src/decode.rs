use std::borrow::Cow;
use std::io::Cursor;

use image::{ColorType, DynamicImage, ImageFormat};
use tracing::debug;

use crate::error::{DecodeError, RecognitionError};
use crate::types::{DecodedImage, RawImagePayload};

/// Decode payload bytes into a bitmap. The container format is sniffed from
/// the bytes; no extension or MIME type is consulted.
pub fn decode(payload: &RawImagePayload) -> Result<DecodedImage, DecodeError> {
    decode_bytes(&payload.bytes)
}

pub fn decode_bytes(data: &[u8]) -> Result<DecodedImage, DecodeError> {
    let format = image::guess_format(data).map_err(DecodeError::UnknownFormat)?;
    let image = image::load_from_memory_with_format(data, format)?;
    debug!(?format, width = image.width(), height = image.height(), "image decoded");
    Ok(DecodedImage { format, image })
}

/// Re-encode a bitmap as PNG for engines that take encoded bytes.
/// Float bitmaps (OpenEXR, HDR) have no PNG colour type and go through 8-bit RGBA.
pub(crate) fn encode_as_png(img: &DynamicImage) -> Result<Vec<u8>, RecognitionError> {
    let img = match img.color() {
        ColorType::Rgb32F | ColorType::Rgba32F => {
            Cow::Owned(DynamicImage::ImageRgba8(img.to_rgba8()))
        }
        _ => Cow::Borrowed(img),
    };
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| RecognitionError::Encode(e.to_string()))?;
    Ok(buf)
}

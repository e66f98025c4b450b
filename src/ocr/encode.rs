use anyhow::Result;
use base64::{Engine as _, engine::general_purpose};
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;

/// Encodes an image as PNG and returns it base64-encoded for form upload.
pub fn image_to_base64_png(img: &RgbaImage) -> Result<String> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(general_purpose::STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_base64_decodes_back() {
        let img = RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 255]));
        let encoded = image_to_base64_png(&img).unwrap();
        let png = general_purpose::STANDARD.decode(encoded).unwrap();
        assert_eq!(&png[1..4], b"PNG");

        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(2, 1), &image::Rgba([1, 2, 3, 255]));
    }
}

// src/infrastructure/frame_processing.rs
//
// Still-frame framing: centered square crop, circular mask, PNG encoding.

use std::io::Cursor;

use image::{imageops, ImageFormat, RgbaImage};

use crate::error::AppResult;

/// Crop the largest square centered in `frame`.
pub fn crop_center_square(frame: &RgbaImage) -> RgbaImage {
    let (width, height) = frame.dimensions();
    let side = width.min(height);
    let x = (width - side) / 2;
    let y = (height - side) / 2;

    imageops::crop_imm(frame, x, y, side, side).to_image()
}

/// Make every pixel outside the inscribed circle fully transparent.
pub fn mask_circle(square: &mut RgbaImage) {
    let radius = f64::from(square.width().min(square.height())) / 2.0;
    let radius_sq = radius * radius;

    for (x, y, pixel) in square.enumerate_pixels_mut() {
        // Sample at the pixel center
        let dx = f64::from(x) + 0.5 - radius;
        let dy = f64::from(y) + 0.5 - radius;
        if dx * dx + dy * dy > radius_sq {
            pixel.0[3] = 0;
        }
    }
}

/// Square crop followed by the circular mask.
pub fn frame_portrait(frame: &RgbaImage) -> RgbaImage {
    let mut square = crop_center_square(frame);
    mask_circle(&mut square);
    square
}

pub fn encode_png(image: &RgbaImage) -> AppResult<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_crop_landscape_frame() {
        let frame = RgbaImage::from_fn(640, 480, |x, _| {
            if x < 80 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 255, 0, 255])
            }
        });

        let square = crop_center_square(&frame);

        assert_eq!(square.dimensions(), (480, 480));
        // The red band on the left is cropped away entirely
        assert_eq!(square.get_pixel(0, 0), &Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn test_crop_portrait_frame() {
        let frame = RgbaImage::new(300, 500);
        assert_eq!(crop_center_square(&frame).dimensions(), (300, 300));
    }

    #[test]
    fn test_mask_clears_corners_only() {
        let frame = RgbaImage::from_pixel(100, 100, Rgba([10, 20, 30, 255]));
        let masked = frame_portrait(&frame);

        assert_eq!(masked.get_pixel(0, 0).0[3], 0);
        assert_eq!(masked.get_pixel(99, 99).0[3], 0);
        assert_eq!(masked.get_pixel(50, 50).0[3], 255);
        assert_eq!(masked.get_pixel(50, 1).0[3], 255);
    }

    #[test]
    fn test_encode_png_signature() {
        let bytes = encode_png(&RgbaImage::new(4, 4)).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }
}

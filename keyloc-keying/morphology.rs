use image::{GrayImage, Luma};
use imageproc::morphology::{grayscale_close, grayscale_open, Mask};

/// Cross-shaped structuring element of side `size` (odd), centred on the origin
pub fn cross_kernel(size: u8) -> Mask {
    let centre = size / 2;
    let stencil = GrayImage::from_fn(size as u32, size as u32, |x, y| {
        if x == centre as u32 || y == centre as u32 {
            Luma([255])
        } else {
            Luma([0])
        }
    });
    Mask::from_image(&stencil, centre, centre)
}

/// Repeated opening then repeated closing.
///
/// Out-of-image neighbours never take part in a min/max, so a mask that is
/// foreground right up to the border stays foreground there.
pub fn clean_mask(mask: GrayImage, kernel: &Mask, open_passes: u8, close_passes: u8) -> GrayImage {
    let mut mask = mask;
    for _ in 0..open_passes {
        mask = grayscale_open(&mask, kernel);
    }
    for _ in 0..close_passes {
        mask = grayscale_close(&mask, kernel);
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(w: u32, h: u32) -> GrayImage {
        GrayImage::new(w, h)
    }

    #[test]
    fn test_cross_kernel_shape() {
        // A single lit pixel dilated by the cross reproduces the cross
        let mut img = blank(9, 9);
        img.put_pixel(4, 4, Luma([255]));
        let grown = imageproc::morphology::grayscale_dilate(&img, &cross_kernel(5));
        for y in 0..9 {
            for x in 0..9 {
                let on_cross = (x == 4 && (2..=6).contains(&y)) || (y == 4 && (2..=6).contains(&x));
                assert_eq!(grown.get_pixel(x, y)[0] == 255, on_cross, "at ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_speck_removed_by_opening() {
        let mut img = blank(20, 20);
        img.put_pixel(10, 10, Luma([255]));
        img.put_pixel(11, 10, Luma([255]));
        let cleaned = clean_mask(img, &cross_kernel(5), 2, 2);
        assert!(cleaned.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_hole_filled_by_closing() {
        let mut img = GrayImage::from_pixel(20, 20, Luma([255]));
        img.put_pixel(10, 10, Luma([0]));
        let cleaned = clean_mask(img, &cross_kernel(5), 2, 2);
        assert!(cleaned.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_full_mask_survives_at_border() {
        let img = GrayImage::from_pixel(7, 5, Luma([255]));
        let cleaned = clean_mask(img, &cross_kernel(5), 2, 2);
        assert!(cleaned.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_zero_passes_is_identity() {
        let mut img = blank(6, 6);
        img.put_pixel(1, 1, Luma([255]));
        let cleaned = clean_mask(img.clone(), &cross_kernel(5), 0, 0);
        assert_eq!(cleaned, img);
    }
}

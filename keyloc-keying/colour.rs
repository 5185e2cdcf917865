use image::{GrayImage, Rgb, RgbImage};
use keyloc_core::{Hsv, HsvRange};
use rayon::prelude::*;

/// Integer division rounding half up, valid for negative numerators
#[inline]
fn div_round(num: i32, den: i32) -> i32 {
    (2 * num + den).div_euclid(2 * den)
}

/// Converts one pixel to 8-bit HSV (hue halved into [0, 180)).
///
/// Ties between channels resolve red first, then green, then blue, so the
/// result matches the usual 8-bit BGR→HSV conversion for the same colour.
#[inline]
pub fn rgb_to_hsv(px: Rgb<u8>) -> Hsv {
    let [r, g, b] = px.0.map(i32::from);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = if v == 0 { 0 } else { div_round(255 * diff, v) };

    let h = if diff == 0 {
        0
    } else {
        let raw = if v == r {
            g - b
        } else if v == g {
            b - r + 2 * diff
        } else {
            r - g + 4 * diff
        };
        let h = div_round(raw * 30, diff);
        if h < 0 { h + 180 } else { h }
    };

    Hsv::new(h as u8, s as u8, v as u8)
}

/// Single-channel mask: 255 where the pixel's HSV lies inside `range`, else 0
pub fn in_range(src: &RgbImage, range: &HsvRange) -> GrayImage {
    let (w, h) = src.dimensions();
    let mut mask = GrayImage::new(w, h);
    if w == 0 || h == 0 {
        return mask;
    }

    let pixels: &[u8] = src;
    let out: &mut [u8] = &mut mask;
    out.par_chunks_mut(w as usize)
        .zip(pixels.par_chunks(w as usize * 3))
        .for_each(|(out_row, in_row)| {
            for (out, px) in out_row.iter_mut().zip(in_row.chunks_exact(3)) {
                let hsv = rgb_to_hsv(Rgb([px[0], px[1], px[2]]));
                *out = if range.contains(hsv) { 255 } else { 0 };
            }
        });

    mask
}

/// Binary threshold: 255 where the value is strictly above `thresh`, else 0
pub fn threshold_binary(mask: &GrayImage, thresh: u8) -> GrayImage {
    let mut out = mask.clone();
    let values: &mut [u8] = &mut out;
    values.par_iter_mut().for_each(|p| *p = if *p > thresh { 255 } else { 0 });
    out
}

/// Bitwise NOT of every mask value
pub fn invert(mask: &GrayImage) -> GrayImage {
    let mut out = mask.clone();
    let values: &mut [u8] = &mut out;
    values.par_iter_mut().for_each(|p| *p = !*p);
    out
}

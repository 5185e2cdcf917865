use image::{imageops, GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut};
use keyloc_core::{Keypoint, Match};

/// Outline colour of the localised object
pub const OUTLINE_COLOUR: Rgb<u8> = Rgb([0, 255, 0]);

/// Distinct, fully saturated colour for the `i`-th match
pub fn palette(i: usize) -> Rgb<u8> {
    const COLOURS: [Rgb<u8>; 8] = [
        Rgb([255, 0, 0]),
        Rgb([0, 128, 255]),
        Rgb([255, 200, 0]),
        Rgb([255, 0, 255]),
        Rgb([0, 255, 255]),
        Rgb([255, 128, 0]),
        Rgb([128, 0, 255]),
        Rgb([0, 255, 128]),
    ];
    COLOURS[i % COLOURS.len()]
}

/// Grey image expanded to three equal channels
pub fn gray_to_rgb(img: &GrayImage) -> RgbImage {
    RgbImage::from_fn(img.width(), img.height(), |x, y| {
        let v = img.get_pixel(x, y)[0];
        Rgb([v, v, v])
    })
}

/// `left` and `right` on one canvas, top-aligned, black where neither covers
pub fn side_by_side(left: &RgbImage, right: &RgbImage) -> RgbImage {
    let width = left.width() + right.width();
    let height = left.height().max(right.height());
    let mut canvas = RgbImage::new(width, height);
    imageops::replace(&mut canvas, left, 0, 0);
    imageops::replace(&mut canvas, right, left.width() as i64, 0);
    canvas
}

/// Circle of the keypoint's scale around each keypoint, shifted right by `offset_x`
pub fn draw_keypoints(canvas: &mut RgbImage, kps: &[Keypoint], offset_x: f32, colour: Rgb<u8>) {
    for kp in kps {
        let radius = (kp.size * 0.5).round().max(2.0) as i32;
        let centre = ((kp.x + offset_x).round() as i32, kp.y.round() as i32);
        draw_hollow_circle_mut(canvas, centre, radius, colour);
    }
}

/// Lines from object keypoints (left half) to scene keypoints (right half).
///
/// With `mask`, only matches whose flag is set are drawn.
pub fn draw_matches(
    canvas: &mut RgbImage,
    object_kps: &[Keypoint],
    scene_kps: &[Keypoint],
    matches: &[Match],
    offset_x: f32,
    mask: Option<&[bool]>,
) {
    for (i, m) in matches.iter().enumerate() {
        if mask.is_some_and(|mask| !mask.get(i).copied().unwrap_or(false)) {
            continue;
        }
        let (Some(a), Some(b)) = (object_kps.get(m.query_idx), scene_kps.get(m.train_idx)) else {
            continue;
        };
        let colour = palette(i);
        draw_line_segment_mut(canvas, (a.x, a.y), (b.x + offset_x, b.y), colour);
        draw_hollow_circle_mut(canvas, (a.x.round() as i32, a.y.round() as i32), 3, colour);
        draw_hollow_circle_mut(canvas, ((b.x + offset_x).round() as i32, b.y.round() as i32), 3, colour);
    }
}

/// Closed polygon through `corners`, shifted right by `offset_x`
pub fn draw_outline(canvas: &mut RgbImage, corners: &[(f64, f64)], offset_x: f32, colour: Rgb<u8>) {
    if corners.len() < 2 {
        return;
    }
    for (k, &(x0, y0)) in corners.iter().enumerate() {
        let (x1, y1) = corners[(k + 1) % corners.len()];
        // Three pixels wide
        for d in -1i32..=1 {
            let d = d as f32;
            draw_line_segment_mut(
                canvas,
                (x0 as f32 + offset_x + d, y0 as f32),
                (x1 as f32 + offset_x + d, y1 as f32),
                colour,
            );
            draw_line_segment_mut(
                canvas,
                (x0 as f32 + offset_x, y0 as f32 + d),
                (x1 as f32 + offset_x, y1 as f32 + d),
                colour,
            );
        }
    }
}

//! Scalar cues read directly off the face mesh.

use image::RgbImage;

use proctor_session_model::FaceLandmarks;

/// Eye-aspect ratio below which the eye counts as closed.
pub const BLINK_EAR_THRESHOLD: f64 = 0.18;

/// Mean iris-patch brightness above which a frame counts as a reflection hit.
pub const REFLECTION_THRESHOLD: f64 = 220.0;

/// Half the side of the square iris patch, in pixels.
pub const REFLECTION_HALF_PATCH: i64 = 8;

const UPPER_LIP: usize = 13;
const LOWER_LIP: usize = 14;
const MOUTH_LEFT: usize = 78;
const MOUTH_RIGHT: usize = 308;

const EYE_TOP: usize = 159;
const EYE_BOTTOM: usize = 145;
const EYE_OUTER: usize = 33;
const EYE_INNER: usize = 133;

const NOSE_TIP: usize = 1;
const IRIS_CENTER: usize = 468;

/// Vertical lip separation over horizontal mouth width. 0 when the width
/// collapses.
pub fn mouth_ratio(face: &FaceLandmarks) -> f64 {
    let vertical = (face.point(UPPER_LIP).y - face.point(LOWER_LIP).y).abs();
    let horizontal = (face.point(MOUTH_LEFT).x - face.point(MOUTH_RIGHT).x).abs();
    if horizontal > 0.0 {
        vertical / horizontal
    } else {
        0.0
    }
}

/// Eyelid separation over eye-corner separation. 0 when the corners coincide.
pub fn eye_aspect_ratio(face: &FaceLandmarks) -> f64 {
    let vertical = (face.point(EYE_TOP).y - face.point(EYE_BOTTOM).y).abs();
    let horizontal = face.point(EYE_INNER).x - face.point(EYE_OUTER).x;
    if horizontal != 0.0 {
        vertical / horizontal.abs()
    } else {
        0.0
    }
}

pub fn is_blink(face: &FaceLandmarks) -> bool {
    eye_aspect_ratio(face) < BLINK_EAR_THRESHOLD
}

/// Horizontal gaze proxy: the normalized x of the nose tip.
pub fn gaze_x(face: &FaceLandmarks) -> f64 {
    face.point(NOSE_TIP).x
}

/// Mean of every channel value in the patch around the iris center.
///
/// The patch covers rows `[y-8, y+8)` and columns `[x-8, x+8)` clipped to
/// the image. An empty patch scores 0.
pub fn reflection_score(image: &RgbImage, face: &FaceLandmarks) -> f64 {
    let (x, y) = face
        .point(IRIS_CENTER)
        .to_pixel(image.width(), image.height());

    let clip = |lo: i64, hi: i64, limit: u32| -> (u32, u32) {
        let limit = i64::from(limit);
        (lo.clamp(0, limit) as u32, hi.clamp(0, limit) as u32)
    };
    // Pixel positions saturate for far off-frame landmarks.
    let (x0, x1) = clip(
        x.saturating_sub(REFLECTION_HALF_PATCH),
        x.saturating_add(REFLECTION_HALF_PATCH),
        image.width(),
    );
    let (y0, y1) = clip(
        y.saturating_sub(REFLECTION_HALF_PATCH),
        y.saturating_add(REFLECTION_HALF_PATCH),
        image.height(),
    );
    if x0 >= x1 || y0 >= y1 {
        return 0.0;
    }

    let mut sum = 0u64;
    let mut count = 0u64;
    for py in y0..y1 {
        for px in x0..x1 {
            for &channel in image.get_pixel(px, py).0.iter() {
                sum += u64::from(channel);
                count += 1;
            }
        }
    }
    sum as f64 / count as f64
}

pub fn is_reflection(image: &RgbImage, face: &FaceLandmarks) -> bool {
    reflection_score(image, face) > REFLECTION_THRESHOLD
}

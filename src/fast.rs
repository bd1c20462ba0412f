//! FAST-9 corner detector backed by `imageproc`.
//! See <https://en.wikipedia.org/wiki/Features_from_accelerated_segment_test>.

use image::GrayImage;
use imageproc::corners::corners_fast9;
use imageproc::suppress::local_maxima;

use crate::error::Result;
use crate::keypoint::KeyPoint;
use crate::traits::Detector;

#[derive(Debug, Clone, PartialEq)]
pub struct FastParams {
    /// Minimum intensity difference between the center and the contiguous arc.
    pub threshold: u8,
    pub nonmax_suppression: bool,
}

impl Default for FastParams {
    fn default() -> Self {
        FastParams {
            threshold: 10,
            nonmax_suppression: true,
        }
    }
}

#[derive(Debug, Default)]
pub struct FastDetector {
    pub params: FastParams,
}

impl FastDetector {
    /// Diameter assigned to every corner, the size of the Bresenham circle.
    const KEYPOINT_SIZE: f32 = 7.0;
}

impl Detector for FastDetector {
    fn name(&self) -> &str {
        "FAST"
    }

    fn detect(&self, img: &GrayImage) -> Result<Vec<KeyPoint>> {
        let mut corners = corners_fast9(img, self.params.threshold);
        if self.params.nonmax_suppression {
            corners = local_maxima(&corners, 1);
        }
        Ok(corners
            .into_iter()
            .map(|c| KeyPoint {
                response: c.score,
                ..KeyPoint::new(c.x as f32, c.y as f32, Self::KEYPOINT_SIZE)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    #[test]
    fn finds_square_corners() {
        let mut img = GrayImage::from_pixel(40, 40, Luma([0]));
        draw_filled_rect_mut(&mut img, Rect::at(10, 10).of_size(20, 20), Luma([255]));
        let kps = FastDetector::default().detect(&img).unwrap();
        assert!(!kps.is_empty());
        // FAST-9 only fires on the top left and bottom right corners of an axis aligned square
        for (cx, cy) in [(10.0, 10.0), (29.0, 29.0)] {
            assert!(
                kps.iter()
                    .any(|kp| (kp.x - cx).abs() <= 2.0 && (kp.y - cy).abs() <= 2.0),
                "no corner near ({cx}, {cy})"
            );
        }
        assert!(kps.iter().all(|kp| kp.size == 7.0 && !kp.has_angle()));
    }

    #[test]
    fn suppression_thins_corners() {
        let mut img = GrayImage::from_pixel(40, 40, Luma([0]));
        draw_filled_rect_mut(&mut img, Rect::at(10, 10).of_size(20, 20), Luma([255]));
        let all = FastDetector {
            params: FastParams {
                nonmax_suppression: false,
                ..FastParams::default()
            },
        }
        .detect(&img)
        .unwrap();
        let thinned = FastDetector::default().detect(&img).unwrap();
        assert!(!thinned.is_empty());
        assert!(thinned.len() <= all.len());
    }

    #[test]
    fn flat_image_has_no_corners() {
        let img = GrayImage::from_pixel(32, 32, Luma([90]));
        assert!(FastDetector::default().detect(&img).unwrap().is_empty());
    }
}

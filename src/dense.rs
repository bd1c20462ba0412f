//! Dense grid "detector": places keypoints on a regular grid instead of at salient points.

use image::GrayImage;

use crate::error::Result;
use crate::keypoint::KeyPoint;
use crate::traits::Detector;

#[derive(Debug, Clone, PartialEq)]
pub struct DenseParams {
    /// Keypoint size on the first level.
    pub init_feature_scale: f32,
    pub feature_scale_levels: u32,
    /// Size factor between consecutive levels.
    pub feature_scale_mul: f32,
    /// Grid step in pixels on the first level.
    pub init_xy_step: u32,
    /// Pixels skipped along every image border on the first level.
    pub init_img_bound: u32,
    pub vary_xy_step_with_scale: bool,
    pub vary_img_bound_with_scale: bool,
}

impl DenseParams {
    /// Single level grid with step and border `cell_size` and keypoints of size `2 * cell_size`.
    pub fn from_cell_size(cell_size: u32) -> Self {
        DenseParams {
            init_feature_scale: cell_size as f32 * 2.0,
            feature_scale_levels: 1,
            feature_scale_mul: 0.1,
            init_xy_step: cell_size,
            init_img_bound: cell_size,
            vary_xy_step_with_scale: false,
            vary_img_bound_with_scale: false,
        }
    }
}

impl Default for DenseParams {
    fn default() -> Self {
        DenseParams {
            init_feature_scale: 1.0,
            feature_scale_levels: 1,
            feature_scale_mul: 0.1,
            init_xy_step: 6,
            init_img_bound: 0,
            vary_xy_step_with_scale: true,
            vary_img_bound_with_scale: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct DenseDetector {
    pub params: DenseParams,
}

impl DenseDetector {
    pub fn new(params: DenseParams) -> Self {
        DenseDetector { params }
    }
}

impl Detector for DenseDetector {
    fn name(&self) -> &str {
        "Dense"
    }

    /// Keypoints are emitted column by column (x outer, y inner), level by level.
    fn detect(&self, img: &GrayImage) -> Result<Vec<KeyPoint>> {
        let p = &self.params;
        let (width, height) = (i64::from(img.width()), i64::from(img.height()));
        let mut scale = p.init_feature_scale;
        let mut step = i64::from(p.init_xy_step);
        let mut bound = i64::from(p.init_img_bound);
        let mut keypoints = Vec::new();

        for _ in 0..p.feature_scale_levels {
            // A scaled down step can reach zero; the grid would never advance.
            let stride = step.max(1) as usize;
            for x in (bound..width - bound).step_by(stride) {
                for y in (bound..height - bound).step_by(stride) {
                    keypoints.push(KeyPoint::new(x as f32, y as f32, scale));
                }
            }
            scale *= p.feature_scale_mul;
            if p.vary_xy_step_with_scale {
                step = (step as f32 * p.feature_scale_mul + 0.5) as i64;
            }
            if p.vary_img_bound_with_scale {
                bound = (bound as f32 * p.feature_scale_mul + 0.5) as i64;
            }
        }
        log::debug!("dense grid produced {} keypoints", keypoints.len());
        Ok(keypoints)
    }
}

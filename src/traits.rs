use image::GrayImage;

use crate::error::Result;
use crate::keypoint::{DescriptorType, Features, KeyPoint};

pub trait Detector {
    fn name(&self) -> &str;

    /// Detect keypoints in `img`. Ordering is detector defined.
    fn detect(&self, img: &GrayImage) -> Result<Vec<KeyPoint>>;
}

pub trait Extractor {
    fn name(&self) -> &str;

    fn descriptor_type(&self) -> DescriptorType;

    /// Number of columns of every descriptor row.
    fn descriptor_size(&self) -> usize;

    /// Describe `keypoints`. Keypoints that cannot be described are dropped; the returned
    /// keypoints keep their relative order and line up with the descriptor rows.
    fn compute(&self, img: &GrayImage, keypoints: Vec<KeyPoint>) -> Result<Features>;
}

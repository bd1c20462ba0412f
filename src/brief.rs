//! BRIEF binary descriptor, sampled with `imageproc` on a fixed test pattern.

use image::GrayImage;
use imageproc::binary_descriptors::brief::{brief, TestPair};
use imageproc::point::Point;
use itertools::Itertools;
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;
use rand_pcg::Pcg64;

use crate::error::{Error, Result};
use crate::keypoint::{DescriptorType, Descriptors, Features, KeyPoint};
use crate::traits::Extractor;

/// Half side of the square patch the tests are drawn from.
const PATCH_RADIUS: u32 = 15;
const PATCH_DIAMETER: u32 = 2 * PATCH_RADIUS + 1;
const TEST_PATTERN_SEED: u64 = 0x5EED_B41E_F000_0001;

pub struct BriefExtractor {
    /// Descriptor length in bytes.
    bytes: usize,
    test_pairs: Vec<TestPair>,
}

impl BriefExtractor {
    /// `bytes` must be a multiple of 16.
    pub fn new(bytes: usize) -> Self {
        BriefExtractor {
            bytes,
            test_pairs: test_pattern(bytes * 8, TEST_PATTERN_SEED),
        }
    }

    /// Patches must fit into the image with a one pixel margin.
    fn can_describe(kp: &KeyPoint, width: u32, height: u32) -> bool {
        let (x, y) = (kp.x.round(), kp.y.round());
        if x < 0.0 || y < 0.0 {
            return false;
        }
        let (x, y) = (x as u32, y as u32);
        x > PATCH_RADIUS
            && y > PATCH_RADIUS
            && x + PATCH_RADIUS < width
            && y + PATCH_RADIUS < height
    }
}

impl Default for BriefExtractor {
    fn default() -> Self {
        BriefExtractor::new(32)
    }
}

/// Isotropic Gaussian test locations around the patch center (sigma = 6.6, as in imageproc),
/// drawn from a seeded generator so descriptors are reproducible between runs.
fn test_pattern(length: usize, seed: u64) -> Vec<TestPair> {
    let distribution =
        Normal::new(PATCH_RADIUS as f32 + 1.0, 6.6).expect("standard deviation is positive");
    let mut rng = Pcg64::seed_from_u64(seed);
    let mut sample = || {
        let v: f32 = rng.sample(distribution);
        (v >= 0.0 && (v as u32) < PATCH_DIAMETER).then_some(v as u32)
    };
    let mut pairs = Vec::with_capacity(length);
    while pairs.len() < length {
        if let (Some(x0), Some(y0), Some(x1), Some(y1)) = (sample(), sample(), sample(), sample())
        {
            pairs.push(TestPair {
                p0: Point::new(x0, y0),
                p1: Point::new(x1, y1),
            });
        }
    }
    pairs
}

impl Extractor for BriefExtractor {
    fn name(&self) -> &str {
        "BRIEF"
    }

    fn descriptor_type(&self) -> DescriptorType {
        DescriptorType::Binary
    }

    fn descriptor_size(&self) -> usize {
        self.bytes
    }

    fn compute(&self, img: &GrayImage, keypoints: Vec<KeyPoint>) -> Result<Features> {
        let (width, height) = img.dimensions();
        let total = keypoints.len();
        let keypoints = keypoints
            .into_iter()
            .filter(|kp| Self::can_describe(kp, width, height))
            .collect_vec();
        if keypoints.len() < total {
            log::debug!(
                "BRIEF dropped {} keypoints too close to the border",
                total - keypoints.len()
            );
        }
        if keypoints.is_empty() {
            return Ok(Features {
                keypoints,
                descriptors: Descriptors::empty(DescriptorType::Binary, self.bytes),
            });
        }

        let points = keypoints
            .iter()
            .map(|kp| Point::new(kp.x.round() as u32, kp.y.round() as u32))
            .collect_vec();
        let (briefs, _) = brief(img, &points, self.bytes * 8, Some(&self.test_pairs))
            .map_err(Error::Extraction)?;

        let mut descriptors = Array2::zeros((keypoints.len(), self.bytes));
        for (mut row, descriptor) in descriptors.rows_mut().into_iter().zip(&briefs) {
            let bytes = descriptor.bits.iter().flat_map(|chunk| chunk.to_be_bytes());
            row.iter_mut().zip(bytes).for_each(|(dst, b)| *dst = b);
        }
        Ok(Features {
            keypoints,
            descriptors: Descriptors::Binary(descriptors),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn gradient_image() -> GrayImage {
        GrayImage::from_fn(64, 64, |x, y| Luma([((x * 7 + y * 13) % 256) as u8]))
    }

    #[test]
    fn test_pattern_is_reproducible() {
        let a = test_pattern(256, TEST_PATTERN_SEED);
        let b = test_pattern(256, TEST_PATTERN_SEED);
        assert_eq!(a, b);
        assert_eq!(a.len(), 256);
        assert!(a.iter().all(|p| p.p0.x < PATCH_DIAMETER
            && p.p0.y < PATCH_DIAMETER
            && p.p1.x < PATCH_DIAMETER
            && p.p1.y < PATCH_DIAMETER));
    }

    #[test]
    fn drops_border_keypoints() {
        let img = gradient_image();
        let kps = vec![
            KeyPoint::new(32.0, 32.0, 7.0),
            KeyPoint::new(15.0, 32.0, 7.0),
            KeyPoint::new(32.0, 49.0, 7.0),
            KeyPoint::new(16.0, 48.0, 7.0),
        ];
        let features = BriefExtractor::default().compute(&img, kps).unwrap();
        let kept: Vec<(f32, f32)> = features.keypoints.iter().map(|kp| (kp.x, kp.y)).collect();
        assert_eq!(kept, vec![(32.0, 32.0), (16.0, 48.0)]);
        assert_eq!(features.descriptors.rows(), 2);
        assert_eq!(features.descriptors.cols(), 32);
        assert_eq!(features.descriptors.descriptor_type(), DescriptorType::Binary);
    }

    #[test]
    fn repeated_runs_agree() {
        let img = gradient_image();
        let kps = vec![KeyPoint::new(30.0, 20.0, 7.0), KeyPoint::new(40.0, 40.0, 7.0)];
        let a = BriefExtractor::default().compute(&img, kps.clone()).unwrap();
        let b = BriefExtractor::default().compute(&img, kps).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn no_keypoints_gives_empty_matrix() {
        let features = BriefExtractor::default()
            .compute(&gradient_image(), vec![])
            .unwrap();
        assert!(features.is_empty());
        assert_eq!(features.descriptors.cols(), 32);
    }
}

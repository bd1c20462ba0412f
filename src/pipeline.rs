use std::path::Path;
use std::time::Instant;

use image::GrayImage;

use crate::error::{Error, Result};
use crate::keypoint::Features;
use crate::traits::{Detector, Extractor};

/// Reads the image at `path` and converts it to 8 bit grayscale.
pub fn load_gray(path: &Path) -> Result<GrayImage> {
    let img = image::open(path).map_err(|source| Error::ImageRead {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!(
        "loaded {} ({}x{}, {:?})",
        path.display(),
        img.width(),
        img.height(),
        img.color()
    );
    Ok(img.into_luma8())
}

/// Detects keypoints and describes the ones the extractor accepts.
pub fn extract_features(
    img: &GrayImage,
    detector: &dyn Detector,
    extractor: &dyn Extractor,
) -> Result<Features> {
    let start = Instant::now();
    let keypoints = detector.detect(img)?;
    log::info!(
        "{} found {} keypoints in {:?}",
        detector.name(),
        keypoints.len(),
        start.elapsed()
    );

    let start = Instant::now();
    let detected = keypoints.len();
    let features = extractor.compute(img, keypoints)?;
    log::info!(
        "{} described {} of {} keypoints in {:?}",
        extractor.name(),
        features.len(),
        detected,
        start.elapsed()
    );
    debug_assert_eq!(features.keypoints.len(), features.descriptors.rows());
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brief::BriefExtractor;
    use crate::dense::{DenseDetector, DenseParams};
    use crate::keypoint::DescriptorType;
    use crate::sift::SiftExtractor;
    use image::{Luma, Rgb, RgbImage};

    fn textured(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            Luma([((x * 31 + y * 17 + (x * y) % 23) % 256) as u8])
        })
    }

    #[test]
    fn dense_sift_describes_every_grid_point() {
        let img = textured(64, 48);
        let detector = DenseDetector::new(DenseParams::from_cell_size(8));
        let features =
            extract_features(&img, &detector, &SiftExtractor::<crate::sift::ImageprocProcessing>::default())
                .unwrap();
        // x in 8..56, y in 8..40, step 8
        assert_eq!(features.len(), 6 * 4);
        assert_eq!(features.descriptors.cols(), 128);
        assert_eq!(features.descriptors.descriptor_type(), DescriptorType::Float);
    }

    #[test]
    fn dense_brief_drops_border_points() {
        let img = textured(64, 64);
        let detector = DenseDetector::new(DenseParams::from_cell_size(8));
        let features = extract_features(&img, &detector, &BriefExtractor::default()).unwrap();
        // only 16, 24, .., 48 keep 16 px of margin on a 64 px axis
        assert_eq!(features.len(), 5 * 5);
        assert!(features.keypoints.iter().all(|kp| kp.x >= 16.0 && kp.x <= 48.0));
        assert_eq!(features.descriptors.rows(), 25);
    }

    #[test]
    fn load_converts_to_gray() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("color.png");
        RgbImage::from_pixel(5, 4, Rgb([255, 255, 255]))
            .save(&path)
            .unwrap();
        let gray = load_gray(&path).unwrap();
        assert_eq!(gray.dimensions(), (5, 4));
        assert!(gray.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn unreadable_image() {
        let err = load_gray(Path::new("/nonexistent/image.png")).unwrap_err();
        assert!(matches!(err, Error::ImageRead { .. }));
        assert_eq!(err.exit_code(), 1);
    }
}

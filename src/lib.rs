//! Detect keypoints in an image, describe them and dump the result.
//!
//! Detectors and descriptor extractors are picked by name (see [`select`]) and run on the
//! grayscale version of a single input image. The keypoints and their descriptors can be
//! written to a plain text file (see [`output`] for the format) and drawn onto the image.
//!
//! Pure Rust implementations cover `SIFT`, `Dense`, `FAST` and `BRIEF`. The `opencv`
//! feature adds `SURF` and the rest of OpenCV's `features2d` algorithms, and a real
//! preview window.
//!
//! ```no_run
//! use feature_dump::{run, Config};
//!
//! let config = Config {
//!     detector: "Dense".to_string(),
//!     descriptor: "BRIEF".to_string(),
//!     descfile: Some("keypoints.txt".into()),
//!     verbose: false,
//!     ..Config::new("scene.png")
//! };
//! let features = run(&config)?;
//! println!("{} keypoints", features.len());
//! # Ok::<(), feature_dump::Error>(())
//! ```

pub mod brief;
pub mod config;
pub mod dense;
pub mod error;
pub mod fast;
pub mod keypoint;
#[cfg(feature = "opencv")]
pub mod opencv_backend;
pub mod output;
pub mod pipeline;
pub mod preview;
pub mod select;
pub mod sift;
pub mod traits;

pub use config::{Args, Config};
pub use error::{Error, Result};
pub use keypoint::{DescriptorType, Descriptors, Features, KeyPoint, ScaleLevel};
pub use traits::{Detector, Extractor};

/// Runs detection and extraction for `config` and writes the requested outputs.
///
/// With `verbose`, statistics go to stdout and the annotated image is previewed (blocking)
/// before anything is saved.
pub fn run(config: &Config) -> Result<Features> {
    let detector = select::create_detector(&config.detector, config.dense_size)?;
    let extractor = select::create_extractor(&config.descriptor)?;

    let img = pipeline::load_gray(&config.input)?;
    let features = pipeline::extract_features(&img, detector.as_ref(), extractor.as_ref())?;

    let mut annotated = None;
    if config.verbose {
        println!("Feature statistics:");
        println!("-- Features in scene1: {}", features.descriptors.rows());
        let preview_img = output::draw_keypoints(&img, &features.keypoints);
        println!("Press key to continue...");
        preview::show(&preview_img)?;
        annotated = Some(preview_img);
    }

    if let Some(path) = &config.output {
        if config.verbose {
            println!("Saving the image to {}...", path.display());
        }
        let annotated =
            annotated.unwrap_or_else(|| output::draw_keypoints(&img, &features.keypoints));
        output::save_image(path, &annotated)?;
    }

    if let Some(path) = &config.descfile {
        if config.verbose {
            println!("Saving the descriptors to {}...", path.display());
        }
        output::save_descriptors(path, &features)?;
    }

    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn write_test_image(dir: &std::path::Path) -> std::path::PathBuf {
        let path = dir.join("scene.png");
        GrayImage::from_fn(80, 64, |x, y| Luma([((x / 8 + y / 8) % 2 * 200 + 20) as u8]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn writes_both_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            detector: "Dense".to_string(),
            descriptor: "SIFT".to_string(),
            output: Some(dir.path().join("annotated.png")),
            descfile: Some(dir.path().join("desc.txt")),
            verbose: false,
            dense_size: 10,
            ..Config::new(write_test_image(dir.path()))
        };
        let features = run(&config).unwrap();
        // x in 10..70, y in 10..54
        assert_eq!(features.len(), 6 * 5);

        let annotated = image::open(dir.path().join("annotated.png")).unwrap();
        assert_eq!((annotated.width(), annotated.height()), (80, 64));
        let text = std::fs::read_to_string(dir.path().join("desc.txt")).unwrap();
        assert!(text.starts_with("30 128\n"));
        assert_eq!(text.lines().count(), 31);
    }

    #[test]
    fn selection_fails_before_reading_the_image() {
        let config = Config {
            detector: "Nonexistent".to_string(),
            verbose: false,
            ..Config::new("/does/not/exist.png")
        };
        let err = run(&config).unwrap_err();
        assert!(matches!(err, Error::UnsupportedDetector { .. }));
    }

    #[test]
    fn missing_image_is_an_io_error() {
        let config = Config {
            verbose: false,
            ..Config::new("/does/not/exist.png")
        };
        assert!(matches!(run(&config), Err(Error::ImageRead { .. })));
    }
}

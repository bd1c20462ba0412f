//! Maps algorithm names to detector and extractor instances.
//!
//! A small fixed table handles the names with tuned or argument dependent construction
//! (`SIFT`, `SURF`, `Dense`); every other name goes through a generic factory.
//! Lookups are case sensitive.

use crate::brief::BriefExtractor;
use crate::dense::{DenseDetector, DenseParams};
use crate::error::{Error, Result};
use crate::fast::FastDetector;
use crate::sift::{SiftDetector, SiftExtractor};
use crate::traits::{Detector, Extractor};

#[cfg(feature = "opencv")]
use crate::opencv_backend::{self, OpenCvFeature};

#[cfg(feature = "opencv")]
type SiftProcessing = crate::opencv_backend::OpenCVProcessing;
#[cfg(not(feature = "opencv"))]
type SiftProcessing = crate::sift::ImageprocProcessing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableDetector {
    Sift,
    Surf,
    Dense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableExtractor {
    Sift,
    Surf,
}

const DETECTOR_TABLE: &[(&str, TableDetector)] = &[
    ("SIFT", TableDetector::Sift),
    ("SURF", TableDetector::Surf),
    ("Dense", TableDetector::Dense),
];

const EXTRACTOR_TABLE: &[(&str, TableExtractor)] =
    &[("SIFT", TableExtractor::Sift), ("SURF", TableExtractor::Surf)];

/// Every detector name this build can construct.
pub fn detector_names() -> Vec<&'static str> {
    let mut names = vec!["SIFT", "Dense", "FAST"];
    #[cfg(feature = "opencv")]
    names.extend(opencv_backend::DETECTOR_NAMES);
    names
}

/// Every descriptor name this build can construct.
pub fn extractor_names() -> Vec<&'static str> {
    let mut names = vec!["SIFT", "BRIEF"];
    #[cfg(feature = "opencv")]
    names.extend(opencv_backend::EXTRACTOR_NAMES);
    names
}

fn lookup<T: Copy>(table: &[(&str, T)], name: &str) -> Option<T> {
    table.iter().find(|(n, _)| *n == name).map(|(_, kind)| *kind)
}

fn unsupported_detector(name: &str) -> Error {
    Error::UnsupportedDetector {
        name: name.to_string(),
        supported: detector_names().join(", "),
    }
}

fn unsupported_descriptor(name: &str) -> Error {
    Error::UnsupportedDescriptor {
        name: name.to_string(),
        supported: extractor_names().join(", "),
    }
}

fn factory_detector(name: &str) -> Result<Option<Box<dyn Detector>>> {
    if name == "FAST" {
        return Ok(Some(Box::new(FastDetector::default())));
    }
    #[cfg(feature = "opencv")]
    if let Some(feature) = OpenCvFeature::create(name)? {
        return Ok(Some(Box::new(feature)));
    }
    Ok(None)
}

fn factory_extractor(name: &str) -> Result<Option<Box<dyn Extractor>>> {
    if name == "BRIEF" {
        return Ok(Some(Box::new(BriefExtractor::default())));
    }
    #[cfg(feature = "opencv")]
    if opencv_backend::EXTRACTOR_NAMES.contains(&name) {
        if let Some(feature) = OpenCvFeature::create(name)? {
            return Ok(Some(Box::new(feature)));
        }
    }
    Ok(None)
}

/// Creates the detector registered as `name`. `dense_size` is the grid cell of `Dense`.
pub fn create_detector(name: &str, dense_size: u32) -> Result<Box<dyn Detector>> {
    let detector: Box<dyn Detector> = match lookup(DETECTOR_TABLE, name) {
        Some(TableDetector::Sift) => Box::new(SiftDetector::<SiftProcessing>::default()),
        Some(TableDetector::Dense) => {
            Box::new(DenseDetector::new(DenseParams::from_cell_size(dense_size)))
        }
        Some(TableDetector::Surf) => {
            #[cfg(feature = "opencv")]
            {
                Box::new(OpenCvFeature::create(name)?.ok_or_else(|| unsupported_detector(name))?)
            }
            #[cfg(not(feature = "opencv"))]
            return Err(unsupported_detector(name));
        }
        None => factory_detector(name)?.ok_or_else(|| unsupported_detector(name))?,
    };
    log::debug!("selected detector {}", detector.name());
    Ok(detector)
}

/// Creates the descriptor extractor registered as `name`.
pub fn create_extractor(name: &str) -> Result<Box<dyn Extractor>> {
    let extractor: Box<dyn Extractor> = match lookup(EXTRACTOR_TABLE, name) {
        Some(TableExtractor::Sift) => Box::new(SiftExtractor::<SiftProcessing>::default()),
        Some(TableExtractor::Surf) => {
            #[cfg(feature = "opencv")]
            {
                Box::new(OpenCvFeature::create(name)?.ok_or_else(|| unsupported_descriptor(name))?)
            }
            #[cfg(not(feature = "opencv"))]
            return Err(unsupported_descriptor(name));
        }
        None => factory_extractor(name)?.ok_or_else(|| unsupported_descriptor(name))?,
    };
    log::debug!(
        "selected extractor {} ({:?}, {} columns)",
        extractor.name(),
        extractor.descriptor_type(),
        extractor.descriptor_size()
    );
    Ok(extractor)
}

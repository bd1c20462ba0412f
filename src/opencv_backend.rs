//! Algorithms and primitives provided by OpenCV, compiled with the `opencv` feature.

use std::cell::RefCell;

use image::GrayImage;
use ndarray::Array2;
use opencv::core::{KeyPoint as CvKeyPoint, Mat, Point2f, Ptr, Size, Vector, CV_32F, CV_8U};
use opencv::features2d::{self, Feature2D};
use opencv::prelude::*;
use opencv::xfeatures2d;

use crate::error::{Error, Result};
use crate::keypoint::{DescriptorType, Descriptors, Features, KeyPoint};
use crate::sift::{LumaFImage, Processing};
use crate::traits::{Detector, Extractor};

/// Uses OpenCV's gaussian blur and resizing so the scale space matches `cv::SIFT` closely.
pub struct OpenCVProcessing;

impl OpenCVProcessing {
    fn opencv_resize(img: &LumaFImage, width: u32, height: u32, method: i32) -> LumaFImage {
        let mat = Mat::new_rows_cols_with_data(img.height() as i32, img.width() as i32, img.as_raw())
            .expect("buffer matches its dimensions");
        let mut res = Mat::default();
        opencv::imgproc::resize(
            &mat,
            &mut res,
            Size::new(width as i32, height as i32),
            0.,
            0.,
            method,
        )
        .expect("resize of a continuous f32 matrix");
        mat_to_luma_f(&res)
    }
}

fn mat_to_luma_f(mat: &Mat) -> LumaFImage {
    let data = mat
        .data_typed::<f32>()
        .expect("single channel f32 matrix")
        .to_vec();
    LumaFImage::from_vec(mat.cols() as u32, mat.rows() as u32, data)
        .expect("buffer matches its dimensions")
}

impl Processing for OpenCVProcessing {
    fn gaussian_blur(img: &LumaFImage, sigma: f64) -> LumaFImage {
        let mat = Mat::new_rows_cols_with_data(img.height() as i32, img.width() as i32, img.as_raw())
            .expect("buffer matches its dimensions");
        let mut res = Mat::default();
        opencv::imgproc::gaussian_blur_def(&mat, &mut res, Size::default(), sigma)
            .expect("blur of a continuous f32 matrix");
        mat_to_luma_f(&res)
    }

    fn resize_linear(img: &LumaFImage, width: u32, height: u32) -> LumaFImage {
        Self::opencv_resize(img, width, height, opencv::imgproc::INTER_LINEAR)
    }

    fn resize_nearest(img: &LumaFImage, width: u32, height: u32) -> LumaFImage {
        Self::opencv_resize(img, width, height, opencv::imgproc::INTER_NEAREST)
    }
}

pub const DETECTOR_NAMES: &[&str] = &["SURF", "ORB", "BRISK", "AKAZE", "KAZE", "GFTT", "MSER", "AGAST"];
pub const EXTRACTOR_NAMES: &[&str] = &["SURF", "ORB", "BRISK", "AKAZE", "KAZE"];

/// Any `cv::Feature2D`, used as a detector, an extractor or both.
pub struct OpenCvFeature {
    name: &'static str,
    // OpenCV algorithms mutate internal buffers on every call.
    inner: RefCell<Ptr<Feature2D>>,
    descriptor_type: DescriptorType,
    descriptor_size: usize,
}

impl OpenCvFeature {
    /// Instantiates the algorithm registered as `name` with OpenCV's default parameters.
    /// Returns `None` for names OpenCV does not provide here.
    pub fn create(name: &str) -> Result<Option<Self>> {
        let (name, inner): (&'static str, Ptr<Feature2D>) = match name {
            "SURF" => ("SURF", xfeatures2d::SURF::create_def()?.into()),
            "ORB" => ("ORB", features2d::ORB::create_def()?.into()),
            "BRISK" => ("BRISK", features2d::BRISK::create_def()?.into()),
            "AKAZE" => ("AKAZE", features2d::AKAZE::create_def()?.into()),
            "KAZE" => ("KAZE", features2d::KAZE::create_def()?.into()),
            "GFTT" => ("GFTT", features2d::GFTTDetector::create_def()?.into()),
            "MSER" => ("MSER", features2d::MSER::create_def()?.into()),
            "AGAST" => ("AGAST", features2d::AgastFeatureDetector::create_def()?.into()),
            _ => return Ok(None),
        };
        let descriptor_type = match inner.descriptor_type()? {
            CV_8U => DescriptorType::Binary,
            _ => DescriptorType::Float,
        };
        let descriptor_size = inner.descriptor_size()?.max(0) as usize;
        Ok(Some(OpenCvFeature {
            name,
            inner: RefCell::new(inner),
            descriptor_type,
            descriptor_size,
        }))
    }
}

fn gray_to_mat(img: &GrayImage) -> Result<Mat> {
    let mat = Mat::new_rows_cols_with_data(img.height() as i32, img.width() as i32, img.as_raw())?;
    Ok(mat.try_clone()?)
}

fn to_cv_keypoint(kp: &KeyPoint) -> Result<CvKeyPoint> {
    let mut cvkp = CvKeyPoint::default()?;
    cvkp.set_pt(Point2f::new(kp.x, kp.y));
    cvkp.set_size(kp.size);
    cvkp.set_angle(kp.angle);
    cvkp.set_response(kp.response);
    // OpenCV packs octave and layer into `octave`; foreign keypoints leave it at 0.
    Ok(cvkp)
}

fn from_cv_keypoint(cvkp: CvKeyPoint) -> KeyPoint {
    let pt = cvkp.pt();
    KeyPoint {
        angle: cvkp.angle(),
        response: cvkp.response(),
        ..KeyPoint::new(pt.x, pt.y, cvkp.size())
    }
}

fn descriptors_from_mat(mat: &Mat, kind: DescriptorType, cols: usize) -> Result<Descriptors> {
    if mat.empty() {
        return Ok(Descriptors::empty(kind, cols));
    }
    let shape = (mat.rows() as usize, mat.cols() as usize);
    let shape_err = |e: ndarray::ShapeError| Error::Extraction(e.to_string());
    match mat.typ() {
        CV_32F => Ok(Descriptors::Float(
            Array2::from_shape_vec(shape, mat.data_typed::<f32>()?.to_vec()).map_err(shape_err)?,
        )),
        CV_8U => Ok(Descriptors::Binary(
            Array2::from_shape_vec(shape, mat.data_typed::<u8>()?.to_vec()).map_err(shape_err)?,
        )),
        typ => Err(Error::Extraction(format!(
            "unsupported descriptor matrix type {typ}"
        ))),
    }
}

impl Detector for OpenCvFeature {
    fn name(&self) -> &str {
        self.name
    }

    fn detect(&self, img: &GrayImage) -> Result<Vec<KeyPoint>> {
        let mat = gray_to_mat(img)?;
        let mut cv_keypoints = Vector::<CvKeyPoint>::new();
        self.inner
            .borrow_mut()
            .detect_def(&mat, &mut cv_keypoints)?;
        Ok(cv_keypoints.into_iter().map(from_cv_keypoint).collect())
    }
}

impl Extractor for OpenCvFeature {
    fn name(&self) -> &str {
        self.name
    }

    fn descriptor_type(&self) -> DescriptorType {
        self.descriptor_type
    }

    fn descriptor_size(&self) -> usize {
        self.descriptor_size
    }

    fn compute(&self, img: &GrayImage, keypoints: Vec<KeyPoint>) -> Result<Features> {
        let mat = gray_to_mat(img)?;
        let mut cv_keypoints = keypoints
            .iter()
            .map(to_cv_keypoint)
            .collect::<Result<Vector<CvKeyPoint>>>()?;
        let mut descriptors = Mat::default();
        self.inner
            .borrow_mut()
            .compute(&mat, &mut cv_keypoints, &mut descriptors)?;
        Ok(Features {
            keypoints: cv_keypoints.into_iter().map(from_cv_keypoint).collect(),
            descriptors: descriptors_from_mat(
                &descriptors,
                self.descriptor_type,
                self.descriptor_size,
            )?,
        })
    }
}

// This implementation of SIFT is derived from works by Rob Hess and Willow Garage Inc.
// It is made available under the terms of the MIT license included in the root of this repository.
//
// Copyright 2006-2010 Rob Hess
// Copyright 2009 Willow Garage Inc.
// Copyright 2024 Thomas Nibler

//! SIFT detector and descriptor, compatible with OpenCV's `SIFT` with default parameters.
//!
//! - [1]: [Lowe 2004](https://www.cs.ubc.ca/~lowe/papers/ijcv04.pdf)
//! - [2]: [Rey-Otero 2014](https://www.ipol.im/pub/art/2014/82/article.pdf)
//!
//! Section and equation numbers refer to [2] (Anatomy of the SIFT Method) unless noted.
//! Histogram smoothing, angle conventions and descriptor normalization follow OpenCV.

use std::f32::consts::PI;
use std::marker::PhantomData;

use image::buffer::ConvertBuffer;
use image::imageops::{resize, FilterType};
use image::{GrayImage, ImageBuffer, Luma};
use imageproc::filter::gaussian_blur_f32;
use itertools::Itertools;
use ndarray::{s, Array2, Array3, ArrayView2, ArrayView3, Axis};

use crate::error::Result;
use crate::keypoint::{DescriptorType, Descriptors, Features, KeyPoint, ScaleLevel};
use crate::traits::{Detector, Extractor};

pub type LumaFImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Blur and resize primitives used to build the scale space.
/// Swapping implementations makes results bit-comparable with other SIFT implementations.
pub trait Processing {
    fn gaussian_blur(img: &LumaFImage, sigma: f64) -> LumaFImage;
    fn resize_linear(img: &LumaFImage, width: u32, height: u32) -> LumaFImage;
    fn resize_nearest(img: &LumaFImage, width: u32, height: u32) -> LumaFImage;
}

/// Uses `imageproc` implementations of gaussian blur and resizing.
pub struct ImageprocProcessing;

impl Processing for ImageprocProcessing {
    fn gaussian_blur(img: &LumaFImage, sigma: f64) -> LumaFImage {
        gaussian_blur_f32(img, sigma as f32)
    }

    fn resize_linear(img: &LumaFImage, width: u32, height: u32) -> LumaFImage {
        resize(img, width, height, FilterType::Triangle)
    }

    fn resize_nearest(img: &LumaFImage, width: u32, height: u32) -> LumaFImage {
        resize(img, width, height, FilterType::Nearest)
    }
}

const SCALES_PER_OCTAVE: usize = 3;
/// Each octave carries three extra layers so DoG extrema can be searched at every scale.
const LAYERS_PER_OCTAVE: usize = SCALES_PER_OCTAVE + 3;
const CONTRAST_THRESHOLD: f32 = 0.04;
const EDGE_THRESHOLD: f32 = 10.0;
const MAX_INTERPOLATION_STEPS: usize = 5;

/// Assumed blur of the input image, Section 2.2.
const SIGMA_IN: f64 = 0.5;
/// Blur of the seed image, Section 2.2.
const SIGMA_MIN: f64 = 0.8;
/// The seed image is upsampled by this factor.
const INV_DELTA_MIN: u32 = 2;
const DELTA_MIN: f32 = 0.5;

/// Points closer to the border than this have no complete orientation patch.
const IMAGE_BORDER: usize = 5;
const ORIENTATION_HISTOGRAM_RADIUS: f32 = 1.5;
const ORIENTATION_HISTOGRAM_BINS: usize = 36;
/// t in Section 4.1.C
const ORIENTATION_HISTOGRAM_LOCALMAX_RATIO: f32 = 0.8;
const LAMBDA_ORI: f32 = 1.5;
const LAMBDA_DESCR: f32 = 3.0;

const DESCRIPTOR_N_HISTOGRAMS: usize = 4;
const DESCRIPTOR_N_BINS: usize = 8;
pub const DESCRIPTOR_SIZE: usize =
    DESCRIPTOR_N_HISTOGRAMS * DESCRIPTOR_N_HISTOGRAMS * DESCRIPTOR_N_BINS;
const DESCRIPTOR_MAGNITUDE_CAP: f32 = 0.2;
const DESCRIPTOR_L2_NORM: f32 = 512.0;

/// Gaussian scale space and its difference of Gaussians, one `(layer, row, col)` stack per
/// octave, all in seed image coordinates.
pub struct ScaleSpace {
    gaussians: Vec<Array3<f32>>,
    dogs: Vec<Array3<f32>>,
}

impl ScaleSpace {
    pub fn build<P: Processing>(img: &GrayImage) -> Self {
        let seed = seed_image::<P>(img);
        let min_axis = seed.width().min(seed.height());
        let n_octaves = ((min_axis as f32).log2() - 2.0).round() as usize + 1;
        let gaussians = gaussian_octaves::<P>(seed, n_octaves);
        // Section 3.1
        let dogs = gaussians
            .iter()
            .map(|octave| &octave.slice(s![1.., .., ..]) - &octave.slice(s![..-1, .., ..]))
            .collect();
        ScaleSpace { gaussians, dogs }
    }

    pub fn n_octaves(&self) -> usize {
        self.gaussians.len()
    }

    /// Level whose blur best matches a keypoint of the given diameter in image coordinates.
    /// Inverse of the size assigned by the detector.
    pub fn level_for_size(&self, size: f32) -> ScaleLevel {
        let per_octave = SCALES_PER_OCTAVE as i64;
        let index = ((size / SIGMA_MIN as f32).log2() * per_octave as f32).round() as i64;
        let index = index.max(1);
        let octave = ((index - 1) / per_octave) as usize;
        if octave >= self.n_octaves() {
            return ScaleLevel {
                octave: self.n_octaves() - 1,
                scale: SCALES_PER_OCTAVE,
            };
        }
        ScaleLevel {
            octave,
            scale: (index - octave as i64 * per_octave) as usize,
        }
    }

    fn layer(&self, level: ScaleLevel) -> ArrayView2<'_, f32> {
        self.gaussians[level.octave].index_axis(Axis(0), level.scale)
    }
}

/// Upsampled and blurred seed image, Eq. (6).
fn seed_image<P: Processing>(img: &GrayImage) -> LumaFImage {
    let img: LumaFImage = img.convert();
    let upsampled = P::resize_linear(
        &img,
        img.width() * INV_DELTA_MIN,
        img.height() * INV_DELTA_MIN,
    );
    let sigma = (SIGMA_MIN * SIGMA_MIN - SIGMA_IN * SIGMA_IN).sqrt() * INV_DELTA_MIN as f64;
    P::gaussian_blur(&upsampled, sigma)
}

fn gaussian_octaves<P: Processing>(seed: LumaFImage, n_octaves: usize) -> Vec<Array3<f32>> {
    // Incremental blurs between consecutive layers, Eq. (7).
    let m = 2_f64.powf(2.0 / SCALES_PER_OCTAVE as f64);
    let sigmas = (0..LAYERS_PER_OCTAVE as i32)
        .map(|s| {
            let a = m.powi(s - 1);
            (a * m - a).sqrt() * SIGMA_MIN * INV_DELTA_MIN as f64
        })
        .collect_vec();
    let blur_octave = |base: LumaFImage| {
        let mut layers = Vec::with_capacity(LAYERS_PER_OCTAVE);
        layers.push(base);
        for sigma in &sigmas[1..] {
            let next = P::gaussian_blur(layers.last().expect("octave has a base layer"), *sigma);
            layers.push(next);
        }
        layers
    };

    let mut octaves: Vec<Vec<LumaFImage>> = Vec::with_capacity(n_octaves);
    octaves.push(blur_octave(seed));
    while octaves.len() < n_octaves {
        // Eq. (8): start from the layer with twice the base blur, subsampled by 2.
        let src = &octaves[octaves.len() - 1][SCALES_PER_OCTAVE];
        let base = P::resize_nearest(src, src.width() / 2, src.height() / 2);
        octaves.push(blur_octave(base));
    }
    octaves.iter().map(|layers| stack_layers(layers)).collect()
}

fn stack_layers(layers: &[LumaFImage]) -> Array3<f32> {
    let (width, height) = layers[0].dimensions();
    let mut stack = Array3::zeros((layers.len(), height as usize, width as usize));
    for (mut dst, layer) in stack.outer_iter_mut().zip(layers) {
        let src = ArrayView2::from_shape(
            (layer.height() as usize, layer.width() as usize),
            layer.as_raw().as_slice(),
        )
        .expect("image buffer matches its dimensions");
        dst.assign(&src);
    }
    stack
}

/// Keypoint in seed image coordinates.
struct SiftPoint {
    x: f32,
    y: f32,
    size: f32,
    angle: f32,
    response: f32,
    level: ScaleLevel,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct ScaleSpacePoint {
    scale: usize,
    x: usize,
    y: usize,
}

struct Refined {
    point: ScaleSpacePoint,
    offset_scale: f32,
    offset_x: f32,
    offset_y: f32,
}

fn find_keypoints(space: &ScaleSpace) -> Vec<SiftPoint> {
    let mut found = Vec::new();
    for octave in 0..space.n_octaves() {
        for scale in 1..=SCALES_PER_OCTAVE {
            extrema_in_layer(space, octave, scale, &mut found);
        }
    }
    found
}

fn extrema_in_layer(space: &ScaleSpace, octave: usize, scale: usize, out: &mut Vec<SiftPoint>) {
    let dog = space.dogs[octave].view();
    let (_, height, width) = dog.dim();
    if height < 2 * IMAGE_BORDER || width < 2 * IMAGE_BORDER {
        return;
    }
    let window = dog.slice(s![scale - 1..scale + 2, .., ..]);
    let candidates = (IMAGE_BORDER..height - IMAGE_BORDER)
        .cartesian_product(IMAGE_BORDER..width - IMAGE_BORDER)
        .filter(|&(y, x)| is_local_extremum(window, x, y))
        .collect_vec();

    for (y, x) in candidates {
        let Some(refined) = interpolate_extremum(dog, ScaleSpacePoint { scale, x, y }) else {
            continue;
        };
        let p = refined.point;
        let window = dog.slice(s![p.scale - 1..p.scale + 2, .., ..]);
        let contrast = extremum_contrast(window, &refined).abs();
        if contrast * SCALES_PER_OCTAVE as f32 <= CONTRAST_THRESHOLD {
            continue;
        }
        if is_on_edge(window.index_axis(Axis(0), 1), p.x, p.y) {
            continue;
        }

        let octave_factor = 2_f32.powi(octave as i32);
        // sigma in [2], relative to the octave
        let sigma = SIGMA_MIN as f32
            * 2_f32.powf((p.scale as f32 + refined.offset_scale) / SCALES_PER_OCTAVE as f32)
            * 2.;
        let x = (p.x as f32 + refined.offset_x) * octave_factor;
        let y = (p.y as f32 + refined.offset_y) * octave_factor;
        let level = ScaleLevel {
            octave,
            scale: p.scale,
        };
        let radius = (3. * ORIENTATION_HISTOGRAM_RADIUS * sigma).round() as i32;
        let hist = orientation_histogram(space.layer(level), p.x, p.y, radius, LAMBDA_ORI * sigma);
        for angle in dominant_orientations(&hist) {
            out.push(SiftPoint {
                x,
                y,
                size: sigma * octave_factor,
                angle,
                response: contrast,
                level,
            });
        }
    }
}

/// True if the center of `window[1]` at (y, x) is not smaller (or not larger) than all
/// of its 26 neighbours.
fn is_local_extremum(window: ArrayView3<f32>, x: usize, y: usize) -> bool {
    // OpenCV's threshold, scaled down to [0, 1] intensities and floored.
    let threshold = (0.5 * CONTRAST_THRESHOLD / SCALES_PER_OCTAVE as f32).floor();
    let val = window[(1, y, x)];
    if val.abs() <= threshold {
        return false;
    }
    let neighbourhood = window.slice(s![.., y - 1..y + 2, x - 1..x + 2]);
    if val > 0.0 {
        neighbourhood.iter().all(|&v| val >= v)
    } else {
        neighbourhood.iter().all(|&v| val <= v)
    }
}

/// Fit a quadratic to the DoG around a discrete extremum and move to the neighbouring sample
/// until the continuous extremum lies within half a sample. See P18-19 in [2].
fn interpolate_extremum(dog: ArrayView3<f32>, start: ScaleSpacePoint) -> Option<Refined> {
    let ScaleSpacePoint {
        mut scale,
        mut x,
        mut y,
    } = start;
    let (_, height, width) = dog.dim();
    for _ in 0..MAX_INTERPOLATION_STEPS {
        let prev = dog.index_axis(Axis(0), scale - 1);
        let curr = dog.index_axis(Axis(0), scale);
        let next = dog.index_axis(Axis(0), scale + 1);

        let g1 = (next[(y, x)] - prev[(y, x)]) / 2.;
        let g2 = (curr[(y + 1, x)] - curr[(y - 1, x)]) / 2.;
        let g3 = (curr[(y, x + 1)] - curr[(y, x - 1)]) / 2.;

        let center2 = curr[(y, x)] * 2.;
        let h11 = next[(y, x)] + prev[(y, x)] - center2;
        let h12 = (next[(y + 1, x)] - next[(y - 1, x)] - prev[(y + 1, x)] + prev[(y - 1, x)]) / 4.;
        let h13 = (next[(y, x + 1)] - next[(y, x - 1)] - prev[(y, x + 1)] + prev[(y, x - 1)]) / 4.;
        let h22 = curr[(y + 1, x)] + curr[(y - 1, x)] - center2;
        let h33 = curr[(y, x + 1)] + curr[(y, x - 1)] - center2;
        let h23 = (curr[(y + 1, x + 1)] - curr[(y + 1, x - 1)] - curr[(y - 1, x + 1)]
            + curr[(y - 1, x - 1)])
            / 4.;

        // α* = -H⁻¹g, Eq. (14)
        let det = h11 * h22 * h33 - h11 * h23 * h23 - h12 * h12 * h33 + 2. * h12 * h13 * h23
            - h13 * h13 * h22;
        let i11 = (h22 * h33 - h23 * h23) / det;
        let i12 = (h13 * h23 - h12 * h33) / det;
        let i13 = (h12 * h23 - h13 * h22) / det;
        let i22 = (h11 * h33 - h13 * h13) / det;
        let i23 = (h12 * h13 - h11 * h23) / det;
        let i33 = (h11 * h22 - h12 * h12) / det;

        let offset_scale = -(i11 * g1 + i12 * g2 + i13 * g3);
        let offset_y = -(i12 * g1 + i22 * g2 + i23 * g3);
        let offset_x = -(i13 * g1 + i23 * g2 + i33 * g3);

        if offset_scale.abs() < 0.5 && offset_x.abs() < 0.5 && offset_y.abs() < 0.5 {
            return Some(Refined {
                point: ScaleSpacePoint { scale, x, y },
                offset_scale,
                offset_x,
                offset_y,
            });
        }

        let moved = |v: usize, offset: f32| v as isize + offset.round() as isize;
        let (new_scale, new_x, new_y) = (
            moved(scale, offset_scale),
            moved(x, offset_x),
            moved(y, offset_y),
        );
        let border = IMAGE_BORDER as isize;
        if new_scale < 1
            || new_scale > SCALES_PER_OCTAVE as isize
            || new_x < border
            || new_x >= width as isize - border
            || new_y < border
            || new_y >= height as isize - border
        {
            return None;
        }
        (scale, x, y) = (new_scale as usize, new_x as usize, new_y as usize);
    }
    None
}

/// Value of the interpolating quadratic at the refined extremum, Eq. (3) in [1].
fn extremum_contrast(window: ArrayView3<f32>, refined: &Refined) -> f32 {
    let ScaleSpacePoint { x, y, .. } = refined.point;
    let prev = window.index_axis(Axis(0), 0);
    let curr = window.index_axis(Axis(0), 1);
    let next = window.index_axis(Axis(0), 2);
    let g1 = (next[(y, x)] - prev[(y, x)]) / 2.;
    let g2 = (curr[(y + 1, x)] - curr[(y - 1, x)]) / 2.;
    let g3 = (curr[(y, x + 1)] - curr[(y, x - 1)]) / 2.;
    let step = refined.offset_scale * g1 + refined.offset_y * g2 + refined.offset_x * g3;
    curr[(y, x)] + step / 2.
}

/// Edge response test on the ratio of the 2D Hessian eigenvalues, Eq. (17) and (18).
fn is_on_edge(dog: ArrayView2<f32>, x: usize, y: usize) -> bool {
    let center2 = dog[(y, x)] * 2.0;
    let dyy = dog[(y + 1, x)] + dog[(y - 1, x)] - center2;
    let dxx = dog[(y, x + 1)] + dog[(y, x - 1)] - center2;
    let dxy = (dog[(y + 1, x + 1)] - dog[(y + 1, x - 1)] - dog[(y - 1, x + 1)]
        + dog[(y - 1, x - 1)])
        / 4.;
    let tr = dxx + dyy;
    let det = dxx * dyy - dxy * dxy;
    if det <= 0. {
        return true;
    }
    tr * tr * EDGE_THRESHOLD > (EDGE_THRESHOLD + 1.0).powi(2) * det
}

/// Smoothed histogram of gradient orientations in a square patch, Section 4.1.
fn orientation_histogram(
    img: ArrayView2<f32>,
    x: usize,
    y: usize,
    radius: i32,
    sigma: f32,
) -> [f32; ORIENTATION_HISTOGRAM_BINS] {
    const N: usize = ORIENTATION_HISTOGRAM_BINS;
    let (height, width) = img.dim();
    let weight_scale = -1.0 / (2.0 * sigma * sigma);
    let bins_per_radian = N as f32 / (2.0 * PI);

    // Two bins of padding on each side so the circular smoothing below can wrap around.
    let mut raw = [0.0f32; N + 4];
    for dy in -radius..=radius {
        let py = y as i64 + i64::from(dy);
        if py <= 0 || py >= height as i64 - 1 {
            continue;
        }
        for dx in -radius..=radius {
            let px = x as i64 + i64::from(dx);
            if px <= 0 || px >= width as i64 - 1 {
                continue;
            }
            let (py, px) = (py as usize, px as usize);
            let gx = img[(py, px + 1)] - img[(py, px - 1)];
            let gy = img[(py - 1, px)] - img[(py + 1, px)];
            let weight = ((dx * dx + dy * dy) as f32 * weight_scale).exp();
            let orientation = f64::from(gy).atan2(f64::from(gx)) as f32;
            let bin = (bins_per_radian * orientation).round() as i32;
            raw[bin.rem_euclid(N as i32) as usize + 2] += weight * (gx * gx + gy * gy).sqrt();
        }
    }
    raw[1] = raw[N + 1];
    raw[0] = raw[N];
    raw[N + 2] = raw[2];
    raw[N + 3] = raw[3];

    // OpenCV smooths once with [1, 4, 6, 4, 1] / 16 instead of the box filters in [2].
    let mut hist = [0.0f32; N];
    for (i, h) in hist.iter_mut().enumerate() {
        let c = i + 2;
        *h = (raw[c - 2] + raw[c + 2]) * (1. / 16.)
            + (raw[c - 1] + raw[c + 1]) * (4. / 16.)
            + raw[c] * 6. / 16.;
    }
    hist
}

/// Reference orientations in degrees, Section 4.1.C.
fn dominant_orientations(hist: &[f32]) -> Vec<f32> {
    let n = hist.len();
    let peak = hist.iter().copied().max_by(f32::total_cmp).unwrap_or(0.0);
    let threshold = peak * ORIENTATION_HISTOGRAM_LOCALMAX_RATIO;
    (0..n)
        .filter_map(|k| {
            let left = hist[(k + n - 1) % n];
            let right = hist[(k + 1) % n];
            if hist[k] <= left || hist[k] <= right || hist[k] < threshold {
                return None;
            }
            // Eq. (23)
            let offset = 0.5 * (left - right) / (left - 2.0 * hist[k] + right);
            let bin = (k as f32 + offset).rem_euclid(n as f32);
            // Angles run clockwise to match OpenCV.
            let angle = 360.0 - 360.0 / n as f32 * bin;
            Some(if (angle - 360.0).abs() < f32::EPSILON {
                0.0
            } else {
                angle
            })
        })
        .collect()
}

/// 4x4 grid of 8-bin orientation histograms around (x, y), given in coordinates of `img`.
#[doc(hidden)]
pub fn compute_descriptor(
    img: ArrayView2<f32>,
    x: f32,
    y: f32,
    scale: f32,
    orientation: f32,
) -> [u8; DESCRIPTOR_SIZE] {
    const N: usize = DESCRIPTOR_N_HISTOGRAMS;
    const BINS: usize = DESCRIPTOR_N_BINS;
    let (height, width) = img.dim();
    let (cx, cy) = (x.round() as i64, y.round() as i64);
    let hist_width = LAMBDA_DESCR * scale;
    let radius = (hist_width * 2_f32.sqrt() * (N + 1) as f32 * 0.5).round() as i64;
    let (sin_ori, cos_ori) = orientation.to_radians().sin_cos();
    let (sin_ori, cos_ori) = (sin_ori / hist_width, cos_ori / hist_width);
    let weight_scale = -2. / (N * N) as f32;
    let bins_per_degree = BINS as f32 / 360.0;

    // One extra histogram on each side keeps the trilinear spreading branch free; the outer
    // ring is discarded afterwards.
    let mut hist: Array3<f32> = Array3::zeros((N + 2, N + 2, BINS));
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            // Sample offset in the keypoint's rotated frame, in histogram widths.
            let col_rot = dx as f32 * cos_ori - dy as f32 * sin_ori;
            let row_rot = dx as f32 * sin_ori + dy as f32 * cos_ori;
            let row_bin = row_rot + (N / 2) as f32;
            let col_bin = col_rot + (N / 2) as f32;
            let (py, px) = (cy + dy, cx + dx);
            let in_grid = row_bin > -0.5
                && row_bin < N as f32 + 0.5
                && col_bin > -0.5
                && col_bin < N as f32 + 0.5;
            let in_image = py > 0 && py < height as i64 - 1 && px > 0 && px < width as i64 - 1;
            if !(in_grid && in_image) {
                continue;
            }
            let (py, px) = (py as usize, px as usize);
            let gx = img[(py, px + 1)] - img[(py, px - 1)];
            let gy = img[(py - 1, px)] - img[(py + 1, px)];
            let weight = ((col_rot * col_rot + row_rot * row_rot) * weight_scale).exp();
            let magnitude = (gx * gx + gy * gy).sqrt() * weight;
            let theta = ((f64::from(gy).atan2(f64::from(gx)).to_degrees() + 360.0) % 360.0)
                as f32
                - orientation;
            spread(
                &mut hist,
                row_bin - 0.5,
                col_bin - 0.5,
                theta * bins_per_degree,
                magnitude,
            );
        }
    }

    let inner = hist.slice(s![1..=N, 1..=N, ..]).iter().copied().collect_vec();
    let norm = inner.iter().map(|v| v * v).sum::<f32>().sqrt();
    let cap = norm * DESCRIPTOR_MAGNITUDE_CAP;
    let capped = inner.into_iter().map(|v| v.min(cap)).collect_vec();
    let norm = capped.iter().map(|v| v * v).sum::<f32>().sqrt();
    let normalizer = DESCRIPTOR_L2_NORM / norm.max(f32::EPSILON);

    let mut descriptor = [0u8; DESCRIPTOR_SIZE];
    for (dst, v) in descriptor.iter_mut().zip(capped) {
        *dst = (v * normalizer).round().min(f32::from(u8::MAX)) as u8;
    }
    descriptor
}

/// Trilinear spreading of one gradient sample over the 8 surrounding (row, col, orientation)
/// bins. Row and column are shifted so that histogram `i` covers `[i - 1, i)`.
fn spread(hist: &mut Array3<f32>, row: f32, col: f32, ori: f32, magnitude: f32) {
    let n_bins = hist.dim().2;
    let (row0, col0, ori0) = (row.floor(), col.floor(), ori.floor());
    let (row_frac, col_frac, ori_frac) = (row - row0, col - col0, ori - ori0);
    let r = (row0 + 1.) as usize;
    let c = (col0 + 1.) as usize;
    let o = (ori0 as i64).rem_euclid(n_bins as i64) as usize;
    let o_next = (o + 1) % n_bins;

    for (dr, wr) in [(0, 1. - row_frac), (1, row_frac)] {
        for (dc, wc) in [(0, 1. - col_frac), (1, col_frac)] {
            let w = magnitude * wr * wc;
            hist[(r + dr, c + dc, o)] += w * (1. - ori_frac);
            hist[(r + dr, c + dc, o_next)] += w * ori_frac;
        }
    }
}

/// SIFT keypoint detector.
pub struct SiftDetector<P = ImageprocProcessing> {
    _processing: PhantomData<fn() -> P>,
}

impl<P> Default for SiftDetector<P> {
    fn default() -> Self {
        SiftDetector {
            _processing: PhantomData,
        }
    }
}

impl<P: Processing> Detector for SiftDetector<P> {
    fn name(&self) -> &str {
        "SIFT"
    }

    fn detect(&self, img: &GrayImage) -> Result<Vec<KeyPoint>> {
        if img.width() == 0 || img.height() == 0 {
            return Ok(Vec::new());
        }
        let space = ScaleSpace::build::<P>(img);
        Ok(find_keypoints(&space)
            .into_iter()
            .map(|p| KeyPoint {
                // Undo the seed upsampling.
                x: p.x * DELTA_MIN,
                y: p.y * DELTA_MIN,
                size: p.size * DELTA_MIN,
                angle: p.angle,
                response: p.response,
                level: Some(p.level),
            })
            .collect())
    }
}

/// SIFT descriptor extractor producing 128 float components per keypoint.
///
/// Keypoints from [`SiftDetector`] are described at the level they were found at; other
/// keypoints are assigned the level matching their size, and keypoints without an
/// orientation are described upright.
pub struct SiftExtractor<P = ImageprocProcessing> {
    _processing: PhantomData<fn() -> P>,
}

impl<P> Default for SiftExtractor<P> {
    fn default() -> Self {
        SiftExtractor {
            _processing: PhantomData,
        }
    }
}

impl<P: Processing> Extractor for SiftExtractor<P> {
    fn name(&self) -> &str {
        "SIFT"
    }

    fn descriptor_type(&self) -> DescriptorType {
        DescriptorType::Float
    }

    fn descriptor_size(&self) -> usize {
        DESCRIPTOR_SIZE
    }

    fn compute(&self, img: &GrayImage, keypoints: Vec<KeyPoint>) -> Result<Features> {
        let (width, height) = img.dimensions();
        let keypoints = keypoints
            .into_iter()
            .filter(|kp| kp.is_inside(width, height, 0.0))
            .collect_vec();
        if keypoints.is_empty() {
            return Ok(Features {
                keypoints,
                descriptors: Descriptors::empty(DescriptorType::Float, DESCRIPTOR_SIZE),
            });
        }

        let space = ScaleSpace::build::<P>(img);
        let mut descriptors = Array2::zeros((keypoints.len(), DESCRIPTOR_SIZE));
        for (mut row, kp) in descriptors.rows_mut().into_iter().zip(&keypoints) {
            let level = kp
                .level
                .filter(|l| l.octave < space.n_octaves())
                .unwrap_or_else(|| space.level_for_size(kp.size));
            // image -> seed -> octave coordinates
            let factor = 2_f32.powi(-(level.octave as i32)) / DELTA_MIN;
            let orientation = if kp.has_angle() { 360.0 - kp.angle } else { 0.0 };
            let descriptor = compute_descriptor(
                space.layer(level),
                kp.x * factor,
                kp.y * factor,
                kp.size * factor,
                orientation,
            );
            row.iter_mut()
                .zip(descriptor)
                .for_each(|(dst, v)| *dst = f32::from(v));
        }
        Ok(Features {
            keypoints,
            descriptors: Descriptors::Float(descriptors),
        })
    }
}
